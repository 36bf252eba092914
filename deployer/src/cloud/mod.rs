//! Cloud provider lookup and pricing

pub mod cost;
pub mod registry;
