//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use componentgen_context::{Assembler, Decision};
use componentgen_core::{
    BridgeConfig, BridgeLauncher, GenerateConfig, GenerateProgress, GenerationReport, validate,
    validate_app,
};
use componentgen_shared::{
    AppConfig, ComponentGenError, GenerationRequest, init_config, load_config, validate_api_key,
};
use componentgen_templates::TemplateRegistry;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// componentgen: generate integration components from existing app source.
#[derive(Parser)]
#[command(
    name = "componentgen",
    version,
    about = "Generate actions, sources and apps with existing app code as context.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Log verbosity of this tool (-v, -vv, -vvv).
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub log_verbosity: u8,

    /// Directory holding one subdirectory per app (overrides config).
    #[arg(long, global = true)]
    pub components_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate a component with the external generation pipeline.
    Generate {
        /// Which kind of code to generate: action, webhook_source, polling_source or app.
        #[arg(long = "type", value_name = "TYPE")]
        component_type: String,

        /// The app name slug.
        #[arg(long)]
        app: String,

        /// Markdown file with instructions: prompt + API docs.
        #[arg(long)]
        instructions: PathBuf,

        /// Number of times the pipeline may call the model (defaults to config).
        #[arg(long, alias = "num_tries", allow_negative_numbers = true)]
        num_tries: Option<i64>,

        /// Set the generation pipeline's logging to debug.
        #[arg(long)]
        verbose: bool,

        /// Write the generated code to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the context document assembled for an app, without generating.
    Context {
        /// Component type the context is assembled for.
        #[arg(long = "type", value_name = "TYPE")]
        component_type: String,

        /// The app name slug.
        #[arg(long)]
        app: String,

        /// Show which files are included or skipped instead of their content.
        #[arg(long)]
        plan: bool,
    },

    /// List registered component types.
    Templates,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// command output only.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.log_verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let components_root = cli.components_root;
    match cli.command {
        Command::Generate {
            component_type,
            app,
            instructions,
            num_tries,
            verbose,
            output,
        } => cmd_generate(
            components_root,
            GenerateArgs {
                component_type,
                app,
                instructions,
                num_tries,
                verbose,
                output,
            },
        ),
        Command::Context {
            component_type,
            app,
            plan,
        } => cmd_context(components_root, &component_type, &app, plan),
        Command::Templates => cmd_templates(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Parsed `generate` arguments.
struct GenerateArgs {
    component_type: String,
    app: String,
    instructions: PathBuf,
    num_tries: Option<i64>,
    verbose: bool,
    output: Option<PathBuf>,
}

fn resolve_components_root(flag: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    flag.unwrap_or_else(|| PathBuf::from(&config.defaults.components_root))
}

fn cmd_generate(components_root: Option<PathBuf>, args: GenerateArgs) -> Result<()> {
    let config = load_config()?;
    generate_with_config(&config, components_root, args)
}

/// Reject bad input before touching the instructions file, the API key or
/// the pipeline.
fn generate_with_config(
    config: &AppConfig,
    components_root: Option<PathBuf>,
    args: GenerateArgs,
) -> Result<()> {
    let registry = TemplateRegistry::with_overrides(&config.templates)?;
    registry.component_type(&args.component_type)?;
    validate_app(&args.app).map_err(ComponentGenError::from)?;

    let instructions = std::fs::read_to_string(&args.instructions)
        .map_err(|e| ComponentGenError::io(&args.instructions, e))?;

    let request = GenerationRequest {
        app: args.app,
        component_type: args.component_type,
        instructions,
        tries: args
            .num_tries
            .unwrap_or_else(|| i64::from(config.defaults.tries)),
    };
    validate(&registry, request.clone())?;

    validate_api_key(config)?;

    let generate_config = GenerateConfig {
        components_root: resolve_components_root(components_root, config),
        verbose: args.verbose,
    };
    let launcher = BridgeLauncher::new(BridgeConfig::from(&config.generator));

    info!(
        app = %request.app,
        component_type = %request.component_type,
        tries = request.tries,
        "generating component"
    );

    let progress = CliProgress::new();
    let result = componentgen_core::generate(
        &generate_config,
        &registry,
        &launcher,
        request,
        &progress,
    );
    progress.finish();
    let report = result?;

    match args.output {
        Some(path) => {
            write_output(&path, &report)?;
            print_summary(&report, Some(path.as_path()));
        }
        None => println!("{}", report.output.code),
    }

    Ok(())
}

fn write_output(path: &Path, report: &GenerationReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ComponentGenError::io(parent, e))?;
    }
    std::fs::write(path, &report.output.code).map_err(|e| ComponentGenError::io(path, e))?;
    Ok(())
}

fn print_summary(report: &GenerationReport, written_to: Option<&Path>) {
    eprintln!();
    eprintln!("  Component generated!");
    eprintln!("  Run:       {}", report.run_id);
    eprintln!("  App:       {}", report.app);
    eprintln!("  Type:      {}", report.component_type);
    eprintln!("  Context:   {} files", report.context_files);
    eprintln!("  Attempts:  {}", report.output.attempts);
    eprintln!(
        "  Tokens:    {} in / {} out",
        report.output.tokens_in, report.output.tokens_out
    );
    if let Some(path) = written_to {
        eprintln!("  Output:    {}", path.display());
    }
    eprintln!(
        "  Time:      {:.1}s",
        (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0
    );
    eprintln!();
}

fn cmd_context(
    components_root: Option<PathBuf>,
    component_type: &str,
    app: &str,
    plan: bool,
) -> Result<()> {
    let config = load_config()?;
    let registry = TemplateRegistry::with_overrides(&config.templates)?;
    let component_type = registry.component_type(component_type)?;
    validate_app(app).map_err(ComponentGenError::from)?;

    let assembler = Assembler::new(resolve_components_root(components_root, &config));

    if plan {
        let planned = assembler.plan(app, component_type)?;
        for file in &planned {
            match file.decision {
                Decision::Include => println!("+ {}", file.label),
                Decision::Skip(reason) => println!("- {} ({reason})", file.label),
            }
        }
        return Ok(());
    }

    let document = assembler
        .assemble(app, component_type)
        .wrap_err_with(|| format!("assembling context for {app}"))?;
    print!("{}", document.render());
    Ok(())
}

fn cmd_templates() -> Result<()> {
    let config = load_config()?;
    let registry = TemplateRegistry::with_overrides(&config.templates)?;
    for tag in registry.keys() {
        let bundle = registry.resolve(tag)?;
        let overridden = if config.templates.path_for(bundle.component_type).is_some() {
            " (override)"
        } else {
            ""
        };
        println!("{tag}{overridden}");
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl GenerateProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use componentgen_shared::ValidationError;

    /// Config whose API key variable is never set.
    fn config_without_key() -> AppConfig {
        let mut config = AppConfig::default();
        config.generator.api_key_env = "COMPONENTGEN_TEST_KEY_NEVER_SET".into();
        config
    }

    fn generate_args(
        component_type: &str,
        app: &str,
        instructions: PathBuf,
        tries: i64,
    ) -> GenerateArgs {
        GenerateArgs {
            component_type: component_type.into(),
            app: app.into(),
            instructions,
            num_tries: Some(tries),
            verbose: false,
            output: None,
        }
    }

    fn library_error(report: color_eyre::eyre::Report) -> ComponentGenError {
        match report.downcast::<ComponentGenError>() {
            Ok(err) => err,
            Err(other) => panic!("expected ComponentGenError, got {other:?}"),
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_like_the_original_flags() {
        let cli = Cli::try_parse_from([
            "componentgen",
            "generate",
            "--type",
            "action",
            "--app",
            "google_drive",
            "--instructions",
            "prompt.md",
            "--num_tries",
            "5",
            "--verbose",
        ])
        .unwrap();

        match cli.command {
            Command::Generate {
                component_type,
                app,
                num_tries,
                verbose,
                output,
                ..
            } => {
                assert_eq!(component_type, "action");
                assert_eq!(app, "google_drive");
                assert_eq!(num_tries, Some(5));
                assert!(verbose);
                assert!(output.is_none());
            }
            _ => panic!("expected generate"),
        }
        assert_eq!(cli.log_verbosity, 0);
    }

    #[test]
    fn negative_tries_reach_the_validator() {
        let cli = Cli::try_parse_from([
            "componentgen",
            "generate",
            "--type",
            "app",
            "--app",
            "slack",
            "--instructions",
            "p.md",
            "--num-tries",
            "-2",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Generate {
                num_tries: Some(-2),
                ..
            }
        ));
    }

    #[test]
    fn unknown_type_is_reported_before_instructions_or_api_key() {
        let missing =
            std::env::temp_dir().join(format!("cg-cli-missing-{}.md", uuid::Uuid::now_v7()));
        let err = generate_with_config(
            &config_without_key(),
            None,
            generate_args("trigger", "slack", missing, 3),
        )
        .unwrap_err();

        assert!(matches!(
            library_error(err),
            ComponentGenError::UnknownComponentType { .. }
        ));
    }

    #[test]
    fn invalid_app_is_reported_before_instructions_or_api_key() {
        let missing =
            std::env::temp_dir().join(format!("cg-cli-missing-{}.md", uuid::Uuid::now_v7()));
        let err = generate_with_config(
            &config_without_key(),
            None,
            generate_args("action", "../slack", missing, 3),
        )
        .unwrap_err();

        assert!(matches!(
            library_error(err),
            ComponentGenError::Validation(ValidationError::InvalidApp { .. })
        ));
    }

    #[test]
    fn bad_tries_are_reported_before_api_key() {
        let instructions =
            std::env::temp_dir().join(format!("cg-cli-instructions-{}.md", uuid::Uuid::now_v7()));
        std::fs::write(&instructions, "Send a message to a channel").unwrap();

        let err = generate_with_config(
            &config_without_key(),
            None,
            generate_args("action", "slack", instructions.clone(), 0),
        )
        .unwrap_err();
        assert!(matches!(
            library_error(err),
            ComponentGenError::Validation(ValidationError::NonPositiveTries { tries: 0 })
        ));

        let err = generate_with_config(
            &config_without_key(),
            None,
            generate_args("action", "slack", instructions.clone(), 3),
        )
        .unwrap_err();
        assert!(matches!(library_error(err), ComponentGenError::Configuration { .. }));

        let _ = std::fs::remove_file(&instructions);
    }

    #[test]
    fn components_root_flag_wins_over_config() {
        let config = AppConfig::default();
        assert_eq!(
            resolve_components_root(Some(PathBuf::from("/srv/components")), &config),
            PathBuf::from("/srv/components")
        );
        assert_eq!(
            resolve_components_root(None, &config),
            PathBuf::from("../../components")
        );
    }
}
