//! `cts` - train, score and sample Context Tree Switching models.
//!
//! - `evaluate`: stream a file through the model and report its log-loss
//! - `generate`: train on a file (or load a saved model) and sample text
//! - `config`: inspect and validate model configuration

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use cts_config::{
    get_preset, list_presets, load_model_config, validate_model_config, ConfigSource, ModelConfig,
    PresetName,
};
use cts_core::exit_codes::ExitCode;
use cts_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use cts_core::{ConfiguredPredictor, Error, EvaluationReport, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, info_span};

/// Context Tree Switching sequence model
#[derive(Parser)]
#[command(name = "cts")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Model configuration file (.toml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Built-in configuration preset (bytes, text, binary)
    #[arg(long, global = true)]
    preset: Option<PresetName>,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream a file through the model and report its log-loss
    Evaluate(EvaluateArgs),

    /// Sample a continuation from a trained model
    Generate(GenerateArgs),

    /// Configuration management
    Config(ConfigArgs),
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Input file
    input: PathBuf,

    /// Write the trained model to this path
    #[arg(long)]
    save: Option<PathBuf>,

    /// Drop symbols outside the alphabet instead of failing
    #[arg(long)]
    skip_unknown: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Train on this file before sampling
    #[arg(long, required_unless_present = "model", conflicts_with = "model")]
    train: Option<PathBuf>,

    /// Load a model saved by `evaluate --save`
    #[arg(long)]
    model: Option<PathBuf>,

    /// Number of symbols to generate
    #[arg(long, short = 'n', default_value_t = 256)]
    length: usize,

    /// RNG seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Sample from the full distribution, including unseen symbols
    #[arg(long)]
    no_rejection: bool,

    /// Text to condition on before sampling
    #[arg(long)]
    prompt: Option<String>,

    /// Drop training symbols outside the alphabet instead of failing
    #[arg(long)]
    skip_unknown: bool,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Check a configuration file (or the effective one)
    Validate {
        /// File to check instead of the resolved configuration
        path: Option<PathBuf>,
    },
    /// List built-in presets
    Presets,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.global.quiet || cli.global.verbose > 0 {
        Some(LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet))
    } else {
        None
    };
    init_logging(&LogConfig::from_env(level, cli.global.log_format));

    let run_id = generate_run_id();
    let span = info_span!("cts", run_id = %run_id);
    let _entered = span.enter();

    let result = match &cli.command {
        Commands::Evaluate(args) => run_evaluate(&cli.global, args),
        Commands::Generate(args) => run_generate(&cli.global, args),
        Commands::Config(args) => run_config(&cli.global, args),
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Clean,
        Err(err) => report_error(&cli.global, &err),
    };
    std::process::exit(exit_code.as_i32());
}

fn report_error(global: &GlobalOpts, err: &Error) -> ExitCode {
    let code = ExitCode::from(err);
    match global.format {
        OutputFormat::Json => {
            let mut payload = err.to_json();
            payload["exit_code"] = serde_json::json!(code.code_name());
            println!("{}", payload);
        }
        OutputFormat::Human => eprintln!("error: {}", err),
    }
    code
}

fn load_config(global: &GlobalOpts) -> Result<(ModelConfig, ConfigSource)> {
    Ok(load_model_config(global.config.as_deref(), global.preset)?)
}

fn build_model(global: &GlobalOpts) -> Result<ConfiguredPredictor> {
    let (config, source) = load_config(global)?;
    let model = ConfiguredPredictor::from_config(&config)?;
    info!(
        source = %source,
        kind = %model.kind(),
        alphabet = model.alphabet_size(),
        depth = model.max_context_length(),
        "model configured"
    );
    Ok(model)
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.flush()?;
    Ok(())
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_evaluate(global: &GlobalOpts, args: &EvaluateArgs) -> Result<()> {
    let mut model = build_model(global)?;
    let input = fs::read(&args.input)?;
    info!(input = %args.input.display(), bytes = input.len(), "evaluating");

    let report = model.train(&input, args.skip_unknown)?;
    info!(
        symbols = report.symbols,
        bits_per_symbol = report.bits_per_symbol,
        nodes = report.node_count,
        "evaluation finished"
    );

    if let Some(path) = &args.save {
        model.save(path)?;
        info!(path = %path.display(), "model saved");
    }

    match global.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "input": args.input.display().to_string(),
                "kind": model.kind(),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "report": report,
                "saved_to": args.save.as_ref().map(|p| p.display().to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => print_report(&args.input, &report),
    }
    Ok(())
}

fn print_report(input: &Path, report: &EvaluationReport) {
    println!("# {}", input.display());
    println!("symbols:            {}", report.symbols);
    if report.skipped > 0 {
        println!("skipped:            {}", report.skipped);
    }
    println!("total bits:         {:.1}", report.total_bits);
    println!("bits/symbol:        {:.4}", report.bits_per_symbol);
    println!("baseline bits/sym:  {:.4}", report.baseline_bits_per_symbol);
    println!("regret bits:        {:.1}", report.regret_bits);
    if let Some(ratio) = report.compression_ratio {
        println!("compression ratio:  {:.2}x", ratio);
    }
    println!(
        "context nodes:      {} (deepest {})",
        report.node_count, report.max_depth_reached
    );
}

fn run_generate(global: &GlobalOpts, args: &GenerateArgs) -> Result<()> {
    let mut model = match (&args.model, &args.train) {
        (Some(path), _) => ConfiguredPredictor::load(path)?,
        (None, Some(train)) => {
            let mut model = build_model(global)?;
            let data = fs::read(train)?;
            let report = model.train(&data, args.skip_unknown)?;
            info!(
                input = %train.display(),
                symbols = report.symbols,
                bits_per_symbol = report.bits_per_symbol,
                "trained"
            );
            model
        }
        (None, None) => {
            return Err(Error::invalid_config(
                "generate",
                "either --train or --model is required",
            ))
        }
    };

    if let Some(prompt) = &args.prompt {
        model.prime(prompt.as_bytes())?;
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let output = model.generate(args.length, !args.no_rejection, &mut rng);
    info!(length = args.length, rejection = !args.no_rejection, "generated");

    match global.format {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "kind": model.kind(),
                "length": args.length,
                "seed": args.seed,
                "rejection_sampling": !args.no_rejection,
                "text": String::from_utf8_lossy(&output),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Human => write_stdout(&output)?,
    }
    Ok(())
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> Result<()> {
    match &args.command {
        ConfigCommands::Show => {
            let (config, source) = load_config(global)?;
            match global.format {
                OutputFormat::Json => {
                    let payload = serde_json::json!({
                        "source": source.to_string(),
                        "config": config,
                    });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                OutputFormat::Human => {
                    println!("# source: {}", source);
                    print!("{}", config.to_toml()?);
                }
            }
        }
        ConfigCommands::Validate { path } => {
            let (config, source) = match path {
                Some(p) => (ModelConfig::from_file(p)?, ConfigSource::CliArgument),
                None => load_config(global)?,
            };
            let resolved = validate_model_config(&config)?;
            match global.format {
                OutputFormat::Json => {
                    let payload = serde_json::json!({
                        "valid": true,
                        "source": source.to_string(),
                        "alphabet_size": resolved.alphabet.len(),
                        "max_context_length": resolved.max_context_length,
                        "prior": resolved.prior.to_string(),
                        "switch_rate": resolved.switch_rate.to_string(),
                    });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                OutputFormat::Human => println!(
                    "ok: {} ({} symbols, context length {}, prior {}, switch rate {})",
                    source,
                    resolved.alphabet.len(),
                    resolved.max_context_length,
                    resolved.prior,
                    resolved.switch_rate
                ),
            }
        }
        ConfigCommands::Presets => match global.format {
            OutputFormat::Json => {
                let presets: Vec<_> = list_presets()
                    .into_iter()
                    .map(|(name, description)| {
                        serde_json::json!({
                            "name": name.as_str(),
                            "description": description,
                            "config": get_preset(name),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&presets)?);
            }
            OutputFormat::Human => {
                for (name, description) in list_presets() {
                    println!("{:<8} {}", name, description);
                }
            }
        },
    }
    Ok(())
}
