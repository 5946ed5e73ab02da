pub mod graph;

pub use graph::{FollowGraph, HttpFollowGraph, StaticFollowGraph};
