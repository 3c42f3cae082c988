//! Synthmarket - synthetic stock market price engine

pub mod config;
pub mod error;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{ConfigError, EngineError, StoreError};
pub use services::{PriceEngine, PriceStore, SqliteStore};
pub use types::*;
