//! Deployment module

pub mod fsm;
pub mod projector;
pub mod sequencer;
pub mod service;
