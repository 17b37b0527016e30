use std::hash::Hash;

use crate::base::HashMap;

//////////////////////////////////////////////////////////////////////////////

// SearchProblem

// A search problem is a pure description of a graph: where we start, which
// states are goals, how to expand a state, and what each step costs. It holds
// no search state, so one problem may be solved any number of times.
pub trait SearchProblem {
    type State: Copy + Eq + Hash;
    type Action: Clone;

    fn start(&self) -> Self::State;

    fn is_goal(&self, state: Self::State) -> bool;

    fn successors(&self, state: Self::State) -> Vec<(Self::Action, Self::State)>;

    fn cost(&self, action: &Self::Action) -> i32;

    fn heuristic(&self, state: Self::State) -> i32;

    fn path_cost(&self, actions: &[Self::Action]) -> i32 {
        actions.iter().map(|x| self.cost(x)).sum()
    }
}

//////////////////////////////////////////////////////////////////////////////

// Heap, ordered by score, holding indices into the node arena

#[derive(Clone, Copy, Eq, PartialEq)] struct AStarNodeIndex(i32);

const SOURCE_NODE: AStarNodeIndex = AStarNodeIndex(-1);

struct AStarNode<S, A> {
    action: Option<A>,
    distance: i32,
    parent: AStarNodeIndex,
    score: i32,
    state: S,
}

struct AStarHeap<S, A> {
    nodes: Vec<AStarNode<S, A>>,
    heap: Vec<AStarNodeIndex>,
}

impl<S, A> Default for AStarHeap<S, A> {
    fn default() -> Self { Self { nodes: vec![], heap: vec![] } }
}

impl<S, A> AStarHeap<S, A> {
    // Heap operations

    fn is_empty(&self) -> bool { self.heap.is_empty() }

    fn extract_min(&mut self) -> Option<AStarNodeIndex> {
        let last = self.heap.pop()?;
        if self.is_empty() { return Some(last); }

        let result = self.heap[0];
        let limit = self.heap.len();
        let score = self.get_node(last).score;
        let mut index = 0;

        loop {
            let (c0, c1) = (2 * index + 1, 2 * index + 2);
            if c0 >= limit { break; }

            let mut child = c0;
            let mut child_score = self.heap_score(c0);
            if c1 < limit {
                let c1_score = self.heap_score(c1);
                if c1_score < child_score { (child, child_score) = (c1, c1_score); }
            }
            if score <= child_score { break; }

            self.heap[index] = self.heap[child];
            index = child;
        }

        self.heap[index] = last;
        Some(result)
    }

    fn push(&mut self, node: AStarNode<S, A>) -> AStarNodeIndex {
        let score = node.score;
        let result = AStarNodeIndex(self.nodes.len() as i32);
        self.nodes.push(node);

        let mut index = self.heap.len();
        self.heap.push(result);

        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap_score(parent) <= score { break; }
            self.heap[index] = self.heap[parent];
            index = parent;
        }

        self.heap[index] = result;
        result
    }

    // Lower-level helpers

    fn heap_score(&self, h: usize) -> i32 {
        self.get_node(self.heap[h]).score
    }

    fn get_node(&self, n: AStarNodeIndex) -> &AStarNode<S, A> {
        &self.nodes[n.0 as usize]
    }

    fn take_node(&mut self, n: AStarNodeIndex) -> &mut AStarNode<S, A> {
        &mut self.nodes[n.0 as usize]
    }
}

//////////////////////////////////////////////////////////////////////////////

// A*

// Returns the actions leading from the problem's start to a goal state, or
// an empty list if no goal was reached within `max_iterations` expansions.
//
// An empty result is ambiguous: the start may already be a goal. Callers
// that care must check that case separately.
#[allow(non_snake_case)]
pub fn AStar<P: SearchProblem>(problem: &P, max_iterations: i32) -> Vec<P::Action> {
    let mut heap = AStarHeap::default();
    let mut closed: HashMap<P::State, i32> = HashMap::default();
    let mut iterations = 0;

    let start = problem.start();
    heap.push(AStarNode {
        action: None, distance: 0, parent: SOURCE_NODE, score: 0, state: start });

    while !heap.is_empty() {
        let Some(prev) = heap.extract_min() else { break; };
        let AStarNode { distance, state, .. } = *heap.get_node(prev);

        if problem.is_goal(state) { return reconstruct(&mut heap, prev); }

        // A state is closed at the cheapest distance we've expanded it at.
        // Reopening it when we find a cheaper route keeps results optimal for
        // heuristics that are admissible but not consistent.
        if closed.get(&state).is_some_and(|&x| x <= distance) { continue; }
        closed.insert(state, distance);

        iterations += 1;
        if iterations > max_iterations {
            tracing::debug!(iterations, "A* gave up at the iteration limit");
            return vec![];
        }

        for (action, next) in problem.successors(state) {
            let distance = distance + problem.cost(&action);
            if closed.get(&next).is_some_and(|&x| x <= distance) { continue; }
            let score = distance + problem.heuristic(next);
            let action = Some(action);
            heap.push(AStarNode { action, distance, parent: prev, score, state: next });
        }
    }

    tracing::debug!(iterations, "A* exhausted the fringe without reaching a goal");
    vec![]
}

fn reconstruct<S, A>(heap: &mut AStarHeap<S, A>, last: AStarNodeIndex) -> Vec<A> {
    let mut result = vec![];
    let mut current = last;
    while current != SOURCE_NODE {
        let node = heap.take_node(current);
        if let Some(action) = node.action.take() { result.push(action); }
        current = node.parent;
    }
    result.reverse();
    result
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{HashMap, RNG};
    use rand::{Rng, SeedableRng};

    // A weighted digraph over small integers, with a zero heuristic unless
    // one is given explicitly.
    struct Graph {
        edges: HashMap<u32, Vec<(u32, i32)>>,
        start: u32,
        goal: u32,
        estimate: HashMap<u32, i32>,
    }

    impl Graph {
        fn new(start: u32, goal: u32, edges: &[(u32, u32, i32)]) -> Self {
            let mut map: HashMap<u32, Vec<(u32, i32)>> = HashMap::default();
            for &(a, b, c) in edges { map.entry(a).or_default().push((b, c)); }
            Self { edges: map, start, goal, estimate: HashMap::default() }
        }
    }

    impl SearchProblem for Graph {
        type State = u32;
        type Action = (u32, u32, i32);

        fn start(&self) -> u32 { self.start }

        fn is_goal(&self, state: u32) -> bool { state == self.goal }

        fn successors(&self, state: u32) -> Vec<(Self::Action, u32)> {
            let Some(edges) = self.edges.get(&state) else { return vec![]; };
            edges.iter().map(|&(b, c)| ((state, b, c), b)).collect()
        }

        fn cost(&self, action: &Self::Action) -> i32 { action.2 }

        fn heuristic(&self, state: u32) -> i32 {
            self.estimate.get(&state).copied().unwrap_or(0)
        }
    }

    #[test]
    fn test_start_is_goal() {
        let graph = Graph::new(3, 3, &[(3, 4, 1)]);
        assert!(AStar(&graph, 16).is_empty());
    }

    #[test]
    fn test_prefers_cheaper_route() {
        // 0 -> 1 -> 3 costs 2 + 2; 0 -> 2 -> 3 costs 1 + 5; 0 -> 3 costs 7.
        let graph = Graph::new(0, 3, &[
            (0, 1, 2), (1, 3, 2), (0, 2, 1), (2, 3, 5), (0, 3, 7),
        ]);
        let path = AStar(&graph, 16);
        assert!(path == vec![(0, 1, 2), (1, 3, 2)]);
        assert!(graph.path_cost(&path) == 4);
    }

    #[test]
    fn test_admissible_heuristic_keeps_optimality() {
        let mut graph = Graph::new(0, 3, &[
            (0, 1, 2), (1, 3, 2), (0, 2, 1), (2, 3, 5), (0, 3, 7),
        ]);
        graph.estimate.insert(1, 2);
        graph.estimate.insert(2, 3);
        let path = AStar(&graph, 16);
        assert!(graph.path_cost(&path) == 4);
    }

    #[test]
    fn test_unreachable_goal() {
        let graph = Graph::new(0, 9, &[(0, 1, 1), (1, 2, 1), (2, 0, 1)]);
        assert!(AStar(&graph, 1024).is_empty());
    }

    #[test]
    fn test_iteration_cap() {
        let graph = Graph::new(0, 3, &[(0, 1, 1), (1, 2, 1), (2, 3, 1)]);
        assert!(AStar(&graph, 1).is_empty());
        assert!(AStar(&graph, 2).is_empty());
        assert!(AStar(&graph, 3).len() == 3);

        // A single-step path is found with a budget of one expansion.
        let graph = Graph::new(0, 1, &[(0, 1, 1)]);
        assert!(AStar(&graph, 1).len() == 1);
        assert!(AStar(&graph, 0).is_empty());
    }

    #[test]
    fn test_random_graphs_match_dijkstra() {
        let mut rng = RNG::seed_from_u64(17);
        for _ in 0..64 {
            let n = 12;
            let mut edges = vec![];
            for a in 0..n {
                for b in 0..n {
                    if a != b && rng.gen_bool(0.25) {
                        edges.push((a, b, rng.gen_range(1..10)));
                    }
                }
            }
            let graph = Graph::new(0, n - 1, &edges);
            let path = AStar(&graph, 1024);
            let best = reference_distance(&edges, n, 0, n - 1);
            match best {
                Some(0) | None => assert!(path.is_empty()),
                Some(x) => assert!(graph.path_cost(&path) == x),
            }
        }
    }

    // Bellman-Ford style relaxation, fine at this size.
    fn reference_distance(edges: &[(u32, u32, i32)], n: u32, s: u32, t: u32) -> Option<i32> {
        let mut best = vec![None; n as usize];
        best[s as usize] = Some(0);
        for _ in 0..n {
            for &(a, b, c) in edges {
                let Some(da) = best[a as usize] else { continue; };
                let db = best[b as usize];
                if db.map_or(true, |x| da + c < x) { best[b as usize] = Some(da + c); }
            }
        }
        best[t as usize]
    }
}
