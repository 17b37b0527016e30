pub mod ai;
pub mod base;
pub mod builder;
pub mod entity;
pub mod error;
pub mod grid;
pub mod pathing;
pub mod search;
pub mod world;

pub use error::{GridError, Result};
