//! Round transport adapters

pub mod local;

pub use local::LocalRoundBus;
