//! Core types and utilities shared across skipgrad crates.
//!
//! Provides:
//! - Centralized error types via thiserror
//! - Configuration management with TOML support
//! - Structured logging setup via tracing

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{BatchConfig, CoreConfig, EmbeddingConfig, UpdateConfig};
pub use error::{Result, SkipgradError};
