//! Storage module

pub mod memory;
pub mod settings;
pub mod store;
