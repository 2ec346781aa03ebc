// src/dag/mod.rs

//! Dependency graph and partitioning.
//!
//! - [`graph`] resolves method and group dependencies into concrete edges,
//!   rejects cycles and orders methods after their dependencies.
//! - [`partition`] splits the ordered methods into a sequential and a
//!   parallel list.

pub mod graph;
pub mod partition;

pub use graph::DependencyGraph;
pub use partition::{partition, Partition};
