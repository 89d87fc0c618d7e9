//! Application configuration

pub mod execution_params;

pub use execution_params::ExecutionParams;
