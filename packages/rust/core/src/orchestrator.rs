//! End-to-end `generate` flow: validate → resolve template → assemble
//! context → launch pipeline → generate.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use componentgen_context::Assembler;
use componentgen_shared::{ComponentType, GenerationRequest, Result};
use componentgen_templates::TemplateRegistry;

use crate::generator::{GenerationJob, GenerationOutput, Generator, GeneratorLauncher};
use crate::validator;

/// Configuration for the `generate` flow.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Directory holding one subdirectory per app.
    pub components_root: PathBuf,
    /// Turn on debug logging inside the generation pipeline.
    pub verbose: bool,
}

/// Outcome of a generation run. `output` is the pipeline's result as returned.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub run_id: Uuid,
    pub app: String,
    pub component_type: ComponentType,
    /// Number of files in the context document.
    pub context_files: usize,
    /// SHA-256 of the rendered context document.
    pub context_digest: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub output: GenerationOutput,
}

/// Progress callback for reporting generation status.
pub trait GenerateProgress {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl GenerateProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
}

/// Run one generation request.
///
/// 1. Validate the request (no I/O before this passes)
/// 2. Resolve the template bundle
/// 3. Assemble the context document
/// 4. Check the bundle carries system instructions
/// 5. Launch the pipeline with the requested verbosity and hand it the job
///
/// Retries are left entirely to the pipeline.
#[instrument(skip_all, fields(app = %request.app, component_type = %request.component_type))]
pub fn generate<L: GeneratorLauncher>(
    config: &GenerateConfig,
    registry: &TemplateRegistry,
    launcher: &L,
    request: GenerationRequest,
    progress: &dyn GenerateProgress,
) -> Result<GenerationReport> {
    let started_at = Utc::now();
    let run_id = Uuid::now_v7();

    progress.phase("Validating request");
    let request = validator::validate(registry, request)?;
    let bundle = registry.bundle(request.component_type)?;

    progress.phase("Assembling context");
    let context = Assembler::new(&config.components_root)
        .assemble(&request.app, request.component_type)?;

    bundle.ensure_instructions()?;

    progress.phase("Starting generation pipeline");
    let mut generator = launcher.launch(config.verbose)?;

    let rendered = context.render();
    let job = GenerationJob {
        run_id: run_id.to_string(),
        app: &request.app,
        component_type: request.component_type,
        instructions: &request.instructions,
        template: bundle,
        context: &rendered,
        tries: request.tries.get(),
    };

    progress.phase("Generating code");
    let result = generator.generate(&job);
    let shutdown = generator.finish();
    let output = result?;
    shutdown?;

    let report = GenerationReport {
        run_id,
        app: request.app.clone(),
        component_type: request.component_type,
        context_files: context.len(),
        context_digest: context.digest(),
        started_at,
        finished_at: Utc::now(),
        output,
    };

    info!(
        %run_id,
        attempts = report.output.attempts,
        tokens_in = report.output.tokens_in,
        tokens_out = report.output.tokens_out,
        "generation complete"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
