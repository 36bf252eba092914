//! Aluminum deployment tracker
//!
//! Accepts deployment requests for configuration bundles, advances each
//! one through a fixed stage sequence on its own task, and serves
//! owner-scoped status, log and cancellation endpoints.

pub mod app;
pub mod authn;
pub mod cloud;
pub mod deploy;
pub mod errors;
pub mod logs;
pub mod models;
pub mod server;
pub mod storage;
pub mod utils;
