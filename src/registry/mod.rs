// src/registry/mod.rs

//! Method registry.
//!
//! - [`descriptor`] holds the method and class descriptors produced by the
//!   discovery layer.
//! - [`meta_groups`] expands group aliases.
//! - [`selector`] contains the selector chain and the built-in group selector.
//! - [`group_map`] maps group names to before/after-group methods.
//! - [`method_registry`] binds, filters and orders everything for a run.

pub mod descriptor;
pub mod group_map;
pub mod meta_groups;
pub mod method_registry;
pub mod selector;

pub use descriptor::{ClassDescriptor, MethodDescriptor, TestClass};
pub use group_map::GroupMethodMap;
pub use meta_groups::expand_groups;
pub use method_registry::{ExcludedMethod, MethodRegistry};
pub use selector::{GroupSelector, MethodSelector, SelectorChain, SelectorContext, GROUP_SELECTOR_PRIORITY};
