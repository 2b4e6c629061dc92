//! Shared types, error model, and configuration for componentgen.
//!
//! This crate is the foundation depended on by all other componentgen crates.
//! It provides:
//! - [`ComponentGenError`] and [`ValidationError`], the unified error types
//! - Domain types ([`ComponentType`], [`ComponentFamily`], [`GenerationRequest`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GeneratorConfig, TemplateOverrides, config_dir, config_file_path,
    init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{ComponentGenError, Result, ValidationError};
pub use types::{ComponentFamily, ComponentType, GenerationRequest};
