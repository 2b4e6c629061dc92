//! Client side of the external code-generation pipeline.
//!
//! The pipeline runs as a subprocess speaking a JSON-lines protocol over
//! stdin/stdout. Retries happen inside the pipeline, bounded by the job's
//! `tries`; this side sends one job and relays whatever comes back.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use componentgen_shared::{ComponentGenError, ComponentType, GeneratorConfig, Result};
use componentgen_templates::TemplateBundle;

/// Environment variable the pipeline reads its log level from.
const PIPELINE_LOG_ENV: &str = "LOGGING_LEVEL";

// ---------------------------------------------------------------------------
// Job and output
// ---------------------------------------------------------------------------

/// Everything the pipeline needs to generate one component.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationJob<'a> {
    pub run_id: String,
    pub app: &'a str,
    pub component_type: ComponentType,
    pub instructions: &'a str,
    pub template: &'a TemplateBundle,
    /// Rendered context document.
    pub context: &'a str,
    pub tries: u32,
}

/// Result returned by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// Generated component source.
    pub code: String,
    #[serde(default)]
    pub model: String,
    /// Attempts the pipeline used, at most the job's `tries`.
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub tokens_in: u64,
    #[serde(default)]
    pub tokens_out: u64,
    #[serde(default)]
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Generator traits
// ---------------------------------------------------------------------------

/// A running generation pipeline.
pub trait Generator {
    /// Run one job to completion.
    fn generate(&mut self, job: &GenerationJob<'_>) -> Result<GenerationOutput>;

    /// Release the pipeline.
    fn finish(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Starts a [`Generator`]. Verbosity is fixed at launch time.
pub trait GeneratorLauncher {
    type Generator: Generator;

    fn launch(&self, verbose: bool) -> Result<Self::Generator>;
}

// ---------------------------------------------------------------------------
// Protocol types
// ---------------------------------------------------------------------------

/// Request message sent to the bridge.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum RequestMessage<'a> {
    #[serde(rename = "generate")]
    Generate {
        id: String,
        model: &'a str,
        job: &'a GenerationJob<'a>,
    },
    #[serde(rename = "shutdown")]
    Shutdown,
}

/// Response message received from the bridge.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseMessage {
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "result")]
    Result { id: String, result: GenerationOutput },
    #[serde(rename = "error")]
    Error {
        #[allow(dead_code)]
        id: String,
        error: String,
    },
}

// ---------------------------------------------------------------------------
// Bridge launcher
// ---------------------------------------------------------------------------

/// How to start the pipeline bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Executable (e.g. `python`).
    pub bridge_cmd: String,
    /// Arguments (e.g. `["-m", "code_gen.bridge"]`).
    pub bridge_args: Vec<String>,
    /// Working directory for the subprocess.
    pub working_dir: String,
    /// Model ID forwarded with every job.
    pub model: String,
}

impl From<&GeneratorConfig> for BridgeConfig {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            bridge_cmd: config.bridge_cmd.clone(),
            bridge_args: config.bridge_args.clone(),
            working_dir: config.working_dir.clone(),
            model: config.model.clone(),
        }
    }
}

/// Launches the pipeline as a subprocess.
#[derive(Debug, Clone)]
pub struct BridgeLauncher {
    config: BridgeConfig,
}

impl BridgeLauncher {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Command used to spawn the bridge. Verbosity only reaches the child's
    /// environment, never this process's.
    fn command(&self, verbose: bool) -> Command {
        let mut cmd = Command::new(&self.config.bridge_cmd);
        cmd.args(&self.config.bridge_args)
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit()); // Bridge logs go to parent stderr
        if verbose {
            cmd.env(PIPELINE_LOG_ENV, "DEBUG");
        }
        cmd
    }
}

impl GeneratorLauncher for BridgeLauncher {
    type Generator = BridgeGenerator;

    fn launch(&self, verbose: bool) -> Result<BridgeGenerator> {
        BridgeGenerator::spawn(self.command(verbose), &self.config)
    }
}

// ---------------------------------------------------------------------------
// Bridge handle
// ---------------------------------------------------------------------------

/// Handle to the spawned bridge subprocess.
pub struct BridgeGenerator {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    model: String,
    request_counter: u64,
}

impl BridgeGenerator {
    fn spawn(mut cmd: Command, config: &BridgeConfig) -> Result<Self> {
        info!(cmd = %config.bridge_cmd, args = ?config.bridge_args, "spawning generation bridge");

        let mut child = cmd.spawn().map_err(|e| {
            ComponentGenError::Generation(format!(
                "failed to spawn bridge: {e}. Is `{}` installed?",
                config.bridge_cmd
            ))
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            ComponentGenError::Generation("failed to capture bridge stdin".into())
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ComponentGenError::Generation("failed to capture bridge stdout".into())
        })?;

        let mut handle = Self {
            child,
            stdin,
            reader: BufReader::new(stdout),
            model: config.model.clone(),
            request_counter: 0,
        };

        if let Err(e) = handle.wait_for_ready() {
            handle.terminate();
            return Err(e);
        }

        Ok(handle)
    }

    /// Kill the bridge and reap it.
    fn terminate(&mut self) {
        if let Err(e) = self.child.kill() {
            debug!("bridge kill failed: {e}");
        }
        match self.child.wait() {
            Ok(status) => debug!(?status, "bridge terminated"),
            Err(e) => warn!("bridge wait error: {e}"),
        }
    }

    fn read_message(&mut self) -> Result<ResponseMessage> {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| ComponentGenError::Generation(format!("bridge read error: {e}")))?;

        if line.is_empty() {
            return Err(ComponentGenError::Generation(
                "bridge closed stdout unexpectedly".into(),
            ));
        }

        parse_response(&line)
    }

    fn wait_for_ready(&mut self) -> Result<()> {
        match self.read_message()? {
            ResponseMessage::Ready => {
                info!("bridge is ready");
                Ok(())
            }
            other => Err(ComponentGenError::Generation(format!(
                "expected ready message, got: {other:?}"
            ))),
        }
    }
}

impl Generator for BridgeGenerator {
    #[instrument(skip_all, fields(run_id = %job.run_id, app = job.app, tries = job.tries))]
    fn generate(&mut self, job: &GenerationJob<'_>) -> Result<GenerationOutput> {
        self.request_counter += 1;
        let id = format!("req-{}", self.request_counter);

        let json = encode_request(&RequestMessage::Generate {
            id: id.clone(),
            model: &self.model,
            job,
        })?;

        writeln!(self.stdin, "{json}").map_err(|e| {
            ComponentGenError::Generation(format!("failed to write to bridge stdin: {e}"))
        })?;
        self.stdin.flush().map_err(|e| {
            ComponentGenError::Generation(format!("failed to flush bridge stdin: {e}"))
        })?;
        debug!(%id, bytes = json.len(), "job sent");

        match self.read_message()? {
            ResponseMessage::Result {
                id: resp_id,
                result,
            } if resp_id == id => Ok(result),
            ResponseMessage::Result { id: resp_id, .. } => Err(ComponentGenError::Generation(
                format!("response id mismatch: sent {id}, got {resp_id}"),
            )),
            ResponseMessage::Error { id: _, error } => Err(ComponentGenError::Generation(error)),
            ResponseMessage::Ready => Err(ComponentGenError::Generation(
                "unexpected ready message during generation".into(),
            )),
        }
    }

    /// Send shutdown and wait for the bridge to exit. A bridge that already
    /// closed its stdin is still waited for.
    fn finish(mut self) -> Result<()> {
        let json = encode_request(&RequestMessage::Shutdown)?;
        if let Err(e) = writeln!(self.stdin, "{json}").and_then(|()| self.stdin.flush()) {
            warn!("failed to send shutdown to bridge: {e}");
        }
        drop(self.stdin);

        let status = self
            .child
            .wait()
            .map_err(|e| ComponentGenError::Generation(format!("bridge wait error: {e}")))?;
        info!(?status, "bridge exited");

        if status.success() {
            Ok(())
        } else {
            Err(ComponentGenError::Generation(format!(
                "bridge exited with {status}"
            )))
        }
    }
}

fn encode_request(msg: &RequestMessage<'_>) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| {
        ComponentGenError::Generation(format!("failed to serialize request: {e}"))
    })
}

fn parse_response(line: &str) -> Result<ResponseMessage> {
    serde_json::from_str(line.trim()).map_err(|e| {
        let preview: String = line.chars().take(200).collect();
        ComponentGenError::Generation(format!("invalid bridge response: {e} (got: {preview})"))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
