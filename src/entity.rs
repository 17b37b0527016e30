use std::iter::FusedIterator;

use slotmap::hop::HopSlotMap;

use crate::ai::{AIConfig, AIEnv, AIState, Mode};
use crate::base::{RNG, Timedelta};

//////////////////////////////////////////////////////////////////////////////

// AID

slotmap::new_key_type! {
    pub struct AID;
}

//////////////////////////////////////////////////////////////////////////////

// AgentMap

// Owns every live agent's controller. Each agent's decision state belongs to
// that agent alone; the only things agents share are the read-only handles
// in their AIEnv.
#[derive(Default)]
pub struct AgentMap(HopSlotMap<AID, AIState>);

impl AgentMap {
    pub fn spawn(&mut self, config: AIConfig, env: AIEnv, rng: &mut RNG) -> AID {
        let aid = self.0.insert(AIState::new(config, env, rng));
        tracing::debug!(?aid, "spawned agent");
        aid
    }

    pub fn despawn(&mut self, aid: AID) -> Option<AIState> {
        let result = self.0.remove(aid);
        if result.is_some() { tracing::debug!(?aid, "despawned agent"); }
        result
    }

    pub fn clear(&mut self) { self.0.clear(); }

    pub fn get(&self, aid: AID) -> Option<&AIState> { self.0.get(aid) }

    pub fn get_mut(&mut self, aid: AID) -> Option<&mut AIState> { self.0.get_mut(aid) }

    pub fn has(&self, aid: AID) -> bool { self.0.contains_key(aid) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    // Runs one decision step for every agent, in slot order.
    pub fn tick_all(&mut self, dt: Timedelta) {
        for (_, ai) in self.0.iter_mut() { ai.tick(dt); }
    }

    pub fn count(&self, mode: Mode) -> usize {
        self.0.values().filter(|x| x.mode() == mode).count()
    }

    pub fn iter(&self) -> Iter<'_> { Iter(self.0.iter()) }

    pub fn iter_mut(&mut self) -> IterMut<'_> { IterMut(self.0.iter_mut()) }
}

impl std::ops::Index<AID> for AgentMap {
    type Output = AIState;
    fn index(&self, aid: AID) -> &Self::Output { &self.0[aid] }
}

impl<'a> IntoIterator for &'a AgentMap {
    type Item = (AID, &'a AIState);
    type IntoIter = Iter<'a>;
    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

impl<'a> IntoIterator for &'a mut AgentMap {
    type Item = (AID, &'a mut AIState);
    type IntoIter = IterMut<'a>;
    fn into_iter(self) -> Self::IntoIter { self.iter_mut() }
}

//////////////////////////////////////////////////////////////////////////////

// AgentMap iterators

pub struct Iter<'a>(slotmap::hop::Iter<'a, AID, AIState>);

pub struct IterMut<'a>(slotmap::hop::IterMut<'a, AID, AIState>);

impl<'a> FusedIterator for Iter<'a> {}

impl<'a> FusedIterator for IterMut<'a> {}

impl<'a> Iterator for Iter<'a> {
    type Item = (AID, &'a AIState);
    fn next(&mut self) -> Option<Self::Item> { self.0.next() }
}

impl<'a> Iterator for IterMut<'a> {
    type Item = (AID, &'a mut AIState);
    fn next(&mut self) -> Option<Self::Item> { self.0.next() }
}

//////////////////////////////////////////////////////////////////////////////
