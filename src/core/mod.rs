pub mod config;
pub mod error;

#[cfg(test)]
mod config_test;

pub use config::*;
pub use error::*;
