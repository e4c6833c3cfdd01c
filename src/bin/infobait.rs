//! CLI binary for infobait.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalyzerConfig` / `ServerConfig` and either starts the web server or
//! checks a single screenshot.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use infobait::config::DEFAULT_TESSERACT_ARGS;
use infobait::{check_file, server, Analyzer, AnalyzerConfig, FactCheckReport, ServerConfig};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the web app on http://localhost:5002
  infobait serve

  # Another port, no OCR cleanup pass
  infobait serve --port 8080 --clean-text false

  # Check one screenshot from the terminal
  infobait check screenshot.png

  # Full report as JSON
  infobait check --json screenshot.png > report.json

  # Use OpenAI instead of Cohere
  infobait check --provider openai --model gpt-4.1-mini screenshot.png

ENVIRONMENT VARIABLES:
  COHERE_API_KEY           Cohere API key (Cohere is used when this is set)
  COHERE_MODEL             Cohere model (default: command-r7b-12-2024)
  OPENAI_API_KEY           OpenAI API key, likewise ANTHROPIC_API_KEY, GEMINI_API_KEY
  EDGEQUAKE_LLM_PROVIDER   Provider for auto-detection (with EDGEQUAKE_MODEL)
  TESSERACT_CMD            Path to the tesseract binary
  TESSERACT_CONFIG         Extra tesseract flags (default: --oem 1 --psm 3)
  HOST / PORT              Listen address (default: 0.0.0.0:5002)
  RUST_LOG                 Log filter, overrides --verbose / --quiet

A .env file in the working directory is loaded at startup.
"#;

/// Fact-check screenshots with OCR and an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "infobait",
    version,
    about = "Fact-check screenshots with OCR and an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "INFOBAIT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "INFOBAIT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web app.
    Serve {
        #[command(flatten)]
        server: ServerArgs,

        #[command(flatten)]
        analyzer: AnalyzerArgs,
    },

    /// Fact-check a single screenshot and print the verdict.
    Check {
        /// Image file to check.
        image: PathBuf,

        /// Print the full report as JSON (without the embedded image).
        #[arg(long)]
        json: bool,

        /// Disable the spinner.
        #[arg(long, env = "INFOBAIT_NO_PROGRESS")]
        no_progress: bool,

        #[command(flatten)]
        analyzer: AnalyzerArgs,
    },
}

#[derive(Args, Debug)]
struct ServerArgs {
    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// First port to try; the next free one is used when it is busy.
    #[arg(short, long, env = "PORT", default_value_t = 5002)]
    port: u16,

    /// How many consecutive ports to try.
    #[arg(long, env = "PORT_SEARCH", default_value_t = 20)]
    port_search: u16,

    /// Largest accepted upload in bytes.
    #[arg(long, env = "INFOBAIT_MAX_UPLOAD_BYTES", default_value_t = 16 * 1024 * 1024)]
    max_upload_bytes: usize,
}

#[derive(Args, Debug)]
struct AnalyzerArgs {
    /// LLM provider: cohere, openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "INFOBAIT_PROVIDER",
        long_help = "LLM provider. Defaults to Cohere when COHERE_API_KEY is set, \
          otherwise auto-detected from API key env vars."
    )]
    provider: Option<String>,

    /// LLM model ID (falls back to COHERE_MODEL for Cohere).
    #[arg(long, env = "INFOBAIT_MODEL")]
    model: Option<String>,

    /// Longest image edge in pixels before OCR.
    #[arg(long, env = "MAX_IMAGE_DIM", default_value_t = 1200)]
    max_image_dim: u32,

    /// Tesseract flags.
    #[arg(long, env = "TESSERACT_CONFIG", default_value = DEFAULT_TESSERACT_ARGS,
          allow_hyphen_values = true)]
    tesseract_config: String,

    /// Path to the tesseract binary.
    #[arg(long, env = "TESSERACT_CMD")]
    tesseract_cmd: Option<PathBuf>,

    /// Ask the LLM to fix OCR spelling before analysis.
    #[arg(long, env = "INFOBAIT_CLEAN_TEXT", default_value_t = true, action = ArgAction::Set)]
    clean_text: bool,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "INFOBAIT_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Retries per LLM call.
    #[arg(long, env = "INFOBAIT_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "INFOBAIT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The check spinner gives all the feedback a terminal user needs, so
    // library INFO logs are muted while it runs.
    let spinner = match &cli.command {
        Command::Check {
            json, no_progress, ..
        } => !cli.quiet && !json && !no_progress,
        Command::Serve { .. } => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve { server, analyzer } => {
            let config = build_config(&analyzer)?;
            let analyzer = Analyzer::new(config).context("Failed to initialise the analyzer")?;
            let server_config = ServerConfig {
                host: server.host,
                port: server.port,
                port_search: server.port_search,
                max_upload_bytes: server.max_upload_bytes,
            };
            server::serve(analyzer, &server_config)
                .await
                .context("Server failed")?;
        }
        Command::Check {
            image,
            json,
            analyzer,
            ..
        } => {
            let config = build_config(&analyzer)?;

            let bar = spinner.then(|| {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner())
                        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
                );
                bar.set_prefix("Checking");
                bar.set_message(image.display().to_string());
                bar.enable_steady_tick(Duration::from_millis(80));
                bar
            });

            let result = check_file(&image, &config).await;
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            let mut report =
                result.with_context(|| format!("Failed to check {}", image.display()))?;

            if json {
                // The preview image is only useful to the web page.
                report.image_b64.clear();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialise report")?
                );
            } else {
                print_report(&report, cli.quiet);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
fn build_config(args: &AnalyzerArgs) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder()
        .max_image_dim(args.max_image_dim)
        .tesseract_args(args.tesseract_config.clone())
        .clean_ocr_text(args.clean_text)
        .temperature(args.temperature)
        .max_retries(args.max_retries)
        .api_timeout_secs(args.api_timeout);

    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider.clone());
    }

    let cohere = args
        .provider
        .as_deref()
        .map_or(true, |p| p.eq_ignore_ascii_case("cohere"));
    let model = args.model.clone().or_else(|| {
        cohere
            .then(|| std::env::var("COHERE_MODEL").ok())
            .flatten()
            .filter(|m| !m.trim().is_empty())
    });
    if let Some(model) = model {
        builder = builder.model(model);
    }

    if let Some(ref cmd) = args.tesseract_cmd {
        builder = builder.tesseract_cmd(cmd.clone());
    }

    builder.build().context("Invalid configuration")
}

fn print_report(report: &FactCheckReport, quiet: bool) {
    let fc = &report.fact_check;

    if !quiet {
        println!("{}", bold("Extracted text"));
        println!("{}\n", report.extracted_text.trim());
    }

    println!("{}", bold("Analysis"));
    println!("{}\n", fc.analysis);

    let rating = match fc.rating {
        Some(r) if r >= 7 => green(&format!("{r}/10")),
        Some(r) if r >= 4 => yellow(&format!("{r}/10")),
        Some(r) => red(&format!("{r}/10")),
        None => dim("No rating"),
    };
    println!("{}  {}", bold("Rating"), rating);

    if !fc.sources.is_empty() {
        println!("\n{}", bold("Sources"));
        for s in &fc.sources {
            match s.href() {
                Some(url) => println!("  - {}  {}", s.name, dim(url)),
                None => println!("  - {}", s.name),
            }
        }
    }

    if !quiet {
        for w in &report.warnings {
            eprintln!("{} {}", yellow("⚠"), w);
        }
        eprintln!(
            "{}",
            dim(&format!(
                "{} LLM calls, {}ms total",
                report.stats.llm_calls, report.stats.total_duration_ms
            ))
        );
    }
}
