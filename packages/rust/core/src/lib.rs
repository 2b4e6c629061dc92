//! Request validation, generation orchestration, and the client for the
//! external code-generation pipeline.
//!
//! This crate ties together the template registry and the context
//! assembler into the end-to-end `generate` workflow.

pub mod generator;
pub mod orchestrator;
pub mod validator;

pub use generator::{
    BridgeConfig, BridgeGenerator, BridgeLauncher, GenerationJob, GenerationOutput, Generator,
    GeneratorLauncher,
};
pub use orchestrator::{GenerateConfig, GenerateProgress, GenerationReport, SilentProgress, generate};
pub use validator::{ValidatedRequest, validate, validate_app};
