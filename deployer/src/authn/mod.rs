//! Caller identity

pub mod token;
