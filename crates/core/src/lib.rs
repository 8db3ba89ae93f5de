//! Domain types shared by the filesure job picker.
//!
//! Nothing in this crate talks to the job store. Store access lives in
//! `filesure-db`; the picker flow and binary live in `filesure-worker`.

pub mod dispatch;
pub mod status;
pub mod types;
