//! `filesure-worker` library crate.
//!
//! Exposes the picker flow and its configuration for integration testing.
//! The `job-picker` binary entrypoint lives in `main.rs`.

pub mod config;
pub mod picker;
