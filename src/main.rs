// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use docqa::app_config::{self, Config, default_stats_path};
use docqa::routing::{CallRecord, RoutingMode};
use docqa::Controller;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for RoutingMode to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliRoutingMode {
    BestQuality,
    CheapestGoodEnough,
    Balanced,
}

impl From<CliRoutingMode> for RoutingMode {
    fn from(cli_mode: CliRoutingMode) -> Self {
        match cli_mode {
            CliRoutingMode::BestQuality => RoutingMode::BestQuality,
            CliRoutingMode::CheapestGoodEnough => RoutingMode::CheapestGoodEnough,
            CliRoutingMode::Balanced => RoutingMode::Balanced,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score the quality of an extracted text file
    Score {
        /// Text file produced by an extraction
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Number of pages the text was extracted from
        #[arg(short, long, default_value_t = 1)]
        pages: usize,

        /// Expected ISO 639 language code of the text
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Pick a translation provider for a language pair
    Route {
        /// Language pair, e.g. 'en→fr' or 'en->fr'
        #[arg(long)]
        pair: String,

        /// Document type, e.g. 'legal' or 'technical'
        #[arg(long, default_value = "general")]
        doc_type: String,

        /// Routing mode (defaults to the configured mode)
        #[arg(short, long, value_enum)]
        mode: Option<CliRoutingMode>,

        /// Provider to leave out; may be repeated
        #[arg(short, long)]
        exclude: Vec<String>,
    },

    /// Record the outcome of a translation call
    Record(RecordArgs),

    /// Show recorded provider metrics
    Stats {
        /// Only show the aggregate of this provider
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Write a configuration file with every default filled in
    InitConfig {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completions for docqa
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct RecordArgs {
    /// Provider that served the call
    #[arg(long)]
    provider: String,

    /// Language pair, e.g. 'en→fr'
    #[arg(long)]
    pair: String,

    /// Document type
    #[arg(long, default_value = "general")]
    doc_type: String,

    /// The call succeeded
    #[arg(long, conflicts_with = "failure", required_unless_present = "failure")]
    success: bool,

    /// The call failed
    #[arg(long)]
    failure: bool,

    /// Call latency in milliseconds
    #[arg(long, default_value_t = 0.0)]
    latency_ms: f64,

    /// Quality score of the translation (0.0 - 1.0)
    #[arg(long, default_value_t = 0.0)]
    quality: f64,

    /// Cost of the call in USD
    #[arg(long, default_value_t = 0.0)]
    cost: f64,

    /// Prompt tokens
    #[arg(long, default_value_t = 0)]
    input_tokens: u64,

    /// Completion tokens
    #[arg(long, default_value_t = 0)]
    output_tokens: u64,
}

/// docqa - Document extraction quality control and provider routing
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(version)]
#[command(about = "Extraction quality scoring and quality-aware LLM provider routing")]
#[command(long_about = "docqa scores extracted document text and routes translation calls to LLM providers.

EXAMPLES:
    docqa score page.txt --pages 3 --language fr     # Score an extraction
    docqa route --pair en→ja --doc-type legal        # Pick a provider
    docqa route --pair en->fr -m cheapest-good-enough -e anthropic
    docqa record --provider openai --pair en→fr --success --quality 0.9 --latency-ms 2100
    docqa stats --provider openai                    # Show provider metrics
    docqa init-config                                # Write conf.json with defaults
    docqa completions bash > docqa.bash              # Generate bash completions

CONFIGURATION:
    Configuration is read from conf.json by default. You can specify a different
    file with --config-path. Missing settings take their default values.

STATS:
    Provider metrics are stored in the file named by stats.persist_path, or
    --stats-path, or the user's data directory when neither is set.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Provider stats file (overrides the configuration)
    #[arg(long, env = "DOCQA_STATS_PATH", global = true)]
    stats_path: Option<PathBuf>,

    /// Set logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (colour, tag) = Self::style_for_level(record.level());
        let _ = writeln!(
            std::io::stderr(),
            "\x1B[{}m{} {} {}\x1B[0m",
            colour,
            now,
            tag,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(level) = cli.log_level {
        log::set_max_level(app_config::LogLevel::from(level).into());
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "docqa", &mut std::io::stdout());
            Ok(())
        }
        Commands::InitConfig { force } => init_config(&cli.config_path, force),
        command => {
            let config = load_config(&cli.config_path, cli.stats_path, cli.log_level)?;
            let controller = Controller::with_config(config)
                .context("Configuration validation failed")?;
            run_command(&controller, command)
        }
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        warn!("Config file already exists at {:?}. Use -f to force overwrite.", path);
        return Ok(());
    }

    Config::default().save(path)?;
    info!("Wrote default configuration to {:?}", path);
    Ok(())
}

fn load_config(
    path: &Path,
    stats_path: Option<PathBuf>,
    log_level: Option<CliLogLevel>,
) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load(path)?
    } else {
        info!("Config file not found at {:?}, using defaults", path);
        Config::default()
    };

    if let Some(stats_path) = stats_path {
        config.stats.persist_path = Some(stats_path);
    } else if config.stats.persist_path.is_none() {
        config.stats.persist_path = default_stats_path();
    }

    match log_level {
        Some(level) => config.log_level = level.into(),
        None => log::set_max_level(config.log_level.into()),
    }

    Ok(config)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON output")?;
    println!("{}", rendered);
    Ok(())
}

fn run_command(controller: &Controller, command: Commands) -> Result<()> {
    match command {
        Commands::Score { file, pages, language } => {
            if let Some(code) = &language {
                docqa::language_utils::validate_language_code(code)?;
            }
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read text file: {:?}", file))?;
            let report = controller.score(&text, pages, language.as_deref());
            info!("{}", report.summary());
            print_json(&report.to_json())
        }
        Commands::Route { pair, doc_type, mode, exclude } => {
            let excluded: Vec<&str> = exclude.iter().map(String::as_str).collect();
            let decision = controller.route(&pair, &doc_type, mode.map(Into::into), &excluded);
            print_json(&decision.to_json())
        }
        Commands::Record(args) => {
            if !(0.0..=1.0).contains(&args.quality) {
                return Err(anyhow!("Quality must be between 0.0 and 1.0, got {}", args.quality));
            }
            let record = CallRecord::new(&args.provider, &args.pair, &args.doc_type, args.success)
                .with_latency_ms(args.latency_ms)
                .with_quality(args.quality)
                .with_cost(args.cost)
                .with_tokens(args.input_tokens, args.output_tokens);
            let key = record.key();
            controller.report_call(record);

            match controller.tracker().get_metrics(&key.provider, &key.language_pair, &key.document_type) {
                Some(metrics) => print_json(&metrics.to_json()),
                None => Ok(()),
            }
        }
        Commands::Stats { provider } => match provider {
            Some(provider) => print_json(&controller.provider_summary(&provider).to_json()),
            None => {
                let all: Vec<serde_json::Value> = controller
                    .tracker()
                    .get_all_metrics()
                    .iter()
                    .map(|m| m.to_json())
                    .collect();
                print_json(&serde_json::Value::Array(all))
            }
        },
        Commands::InitConfig { .. } | Commands::Completions { .. } => Ok(()),
    }
}
