// src/config/mod.rs

//! Run configuration for suiterunner.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like thread counts and selector patterns
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{GroupsSection, RawRunConfig, RunConfig, RunSection};
