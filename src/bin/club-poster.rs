//! CLI binary for club-poster.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig` and writes the artifact.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use club_poster::pipeline::input;
use club_poster::{
    generate, prepare_markup, templates, ClubProfile, GenerationConfig,
    GenerationProgressCallback, GenerationRequest, GenerationStats, OutputKind, PipelineStage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner with one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Poster");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, kind: &str) {
        self.bar.set_prefix(format!("Poster ({kind})"));
    }

    fn on_stage_start(&self, stage: PipelineStage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: PipelineStage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<18} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_stage_error(&self, stage: PipelineStage, error: &str) {
        let msg = if error.chars().count() > 100 {
            format!("{}\u{2026}", error.chars().take(99).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!("  {} {:<18} {}", red("✗"), stage.to_string(), red(&msg)));
        self.bar.finish_and_clear();
    }

    fn on_generation_complete(&self, _artifact_len: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Social image from a profile file
  club-poster generate --profile chess.json --kind social

  # A4 poster from a built-in template, with a logo
  club-poster generate --template "Tech Enthusiasts" --kind document --logo logo.png

  # Logo from a URL, explicit output path
  club-poster generate -p club.json -k social --logo https://example.org/logo.svg -o out.png

  # Only write the generated HTML (no browser)
  club-poster generate --template "Debate Society" --markup-only -o debate.html

  # Serve the HTTP API
  club-poster serve --bind 0.0.0.0:8080

  # List built-in templates
  club-poster templates

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  CLUB_POSTER_CHROME      Chrome/Chromium binary used for rendering
  RUST_LOG                Log filter, e.g. club_poster=debug
"#;

/// Generate club posters and social images with an LLM and headless Chromium.
#[derive(Parser, Debug)]
#[command(
    name = "club-poster",
    version,
    about = "Generate club posters (A4 PDF) and social images (PNG) with an LLM and headless Chromium",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CLUB_POSTER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "CLUB_POSTER_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one poster or social image.
    Generate(GenerateArgs),
    /// Serve `POST /api/generate` over HTTP.
    #[cfg(feature = "server")]
    Serve(ServeArgs),
    /// List the built-in club templates.
    Templates {
        /// Print the full templates as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Club profile JSON file.
    #[arg(short, long, env = "CLUB_POSTER_PROFILE", conflicts_with = "template",
          required_unless_present = "template")]
    profile: Option<PathBuf>,

    /// Use a built-in template (name or slug) as the profile.
    #[arg(short, long)]
    template: Option<String>,

    /// Output kind: document (or pdf) or social.
    #[arg(short, long, env = "CLUB_POSTER_KIND", default_value = "document",
          value_parser = parse_kind)]
    kind: OutputKind,

    /// Logo image: local path or HTTP/HTTPS URL.
    #[arg(long, env = "CLUB_POSTER_LOGO")]
    logo: Option<String>,

    /// Media type of the logo (detected when omitted).
    #[arg(long)]
    logo_type: Option<String>,

    /// Output file. Default: <club>-poster.pdf or <club>-social.png.
    #[arg(short, long, env = "CLUB_POSTER_OUTPUT")]
    output: Option<PathBuf>,

    /// Stop before rendering and write the generated HTML instead.
    #[arg(long)]
    markup_only: bool,

    /// Print generation stats as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "CLUB_POSTER_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    generation: GenerationArgs,
}

#[cfg(feature = "server")]
#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "CLUB_POSTER_BIND", default_value = "127.0.0.1:8080")]
    bind: String,

    #[command(flatten)]
    generation: GenerationArgs,
}

/// Flags shared by `generate` and `serve`.
#[derive(Args, Debug)]
struct GenerationArgs {
    /// LLM provider: gemini, openai, anthropic, ollama.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (default for gemini: gemini-2.0-flash).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "CLUB_POSTER_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "CLUB_POSTER_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, env = "CLUB_POSTER_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Page load + network idle ceiling in seconds.
    #[arg(long, env = "CLUB_POSTER_LOAD_TIMEOUT", default_value_t = 30)]
    load_timeout: u64,

    /// Logo download timeout in seconds.
    #[arg(long, env = "CLUB_POSTER_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,

    /// Largest accepted logo in bytes.
    #[arg(long, env = "CLUB_POSTER_MAX_LOGO_BYTES", default_value_t = 5 * 1024 * 1024)]
    max_logo_bytes: usize,

    /// Chrome/Chromium binary.
    #[arg(long, env = "CLUB_POSTER_CHROME")]
    chrome: Option<PathBuf>,

    /// Keep Chromium's sandbox on (it is off by default for containers).
    #[arg(long, env = "CLUB_POSTER_SANDBOX")]
    sandbox: bool,
}

fn parse_kind(s: &str) -> std::result::Result<OutputKind, String> {
    s.parse().map_err(|e: club_poster::PosterError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active.
    let spinner = match &cli.command {
        Command::Generate(args) => !cli.quiet && !args.no_progress && !args.json,
        _ => false,
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
        Command::Generate(args) => run_generate(args, spinner, cli.quiet).await,
        #[cfg(feature = "server")]
        Command::Serve(args) => {
            let config = build_config(&args.generation, None)?;
            club_poster::server::run_server(&args.bind, config)
                .await
                .with_context(|| format!("Server on {} failed", args.bind))
        }
        Command::Templates { json } => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(templates::all())
                        .context("Failed to serialise templates")?
                );
            } else {
                for t in templates::all() {
                    println!("{:<28} {}", bold(&t.name), dim(&t.slug()));
                }
            }
            Ok(())
        }
    }
}

async fn run_generate(args: GenerateArgs, spinner: bool, quiet: bool) -> Result<()> {
    // ── Build the request ────────────────────────────────────────────────
    let profile: ClubProfile = match (&args.profile, &args.template) {
        (Some(path), _) => input::load_profile(path)
            .await
            .with_context(|| format!("Failed to load profile {}", path.display()))?,
        (None, Some(name)) => templates::find(name)?.clone(),
        (None, None) => anyhow::bail!("either --profile or --template is required"),
    };

    let mut request = GenerationRequest::new(profile, args.kind);
    if let Some(ref source) = args.logo {
        let logo = input::resolve_logo(
            source,
            args.logo_type.as_deref(),
            args.generation.download_timeout,
        )
        .await
        .with_context(|| format!("Failed to load logo {source}"))?;
        request = request.with_logo(logo);
    }

    let spinner_cb = spinner.then(CliProgressCallback::new);
    let progress = spinner_cb
        .clone()
        .map(|cb| cb as Arc<dyn GenerationProgressCallback>);
    let config = build_config(&args.generation, progress)?;

    // ── Markup-only mode ─────────────────────────────────────────────────
    if args.markup_only {
        let prepared = prepare_markup(&request, &config)
            .await
            .context("Generation failed")?;
        let path = args.output.clone().unwrap_or_else(|| {
            PathBuf::from(request.artifact_filename()).with_extension("html")
        });
        club_poster::generate::write_atomic(&path, prepared.markup.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if let Some(cb) = spinner_cb {
            cb.bar.finish_and_clear();
        }
        report(&prepared.stats, &path, args.json, quiet)?;
        return Ok(());
    }

    // ── Generate and write ───────────────────────────────────────────────
    let output = generate(&request, &config)
        .await
        .context("Generation failed")?;
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(request.artifact_filename()));
    club_poster::generate::write_atomic(&path, &output.artifact.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    report(&output.stats, &path, args.json, quiet)
}

fn report(stats: &GenerationStats, path: &std::path::Path, json: bool, quiet: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(stats).context("Failed to serialise stats")?
        );
    } else if !quiet {
        eprintln!(
            "{}  {}  {}ms  →  {}",
            green("✔"),
            stats.generator,
            stats.total_ms,
            bold(&path.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out{}",
            dim(&stats.input_tokens.to_string()),
            dim(&stats.output_tokens.to_string()),
            if stats.logo_embedded { "  ·  logo embedded" } else { "" },
        );
    }
    Ok(())
}

/// Map CLI args to `GenerationConfig`.
fn build_config(
    args: &GenerationArgs,
    progress: Option<club_poster::progress::ProgressCallback>,
) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .api_timeout_secs(args.api_timeout)
        .load_timeout_secs(args.load_timeout)
        .download_timeout_secs(args.download_timeout)
        .max_logo_bytes(args.max_logo_bytes)
        .no_sandbox(!args.sandbox);

    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref chrome) = args.chrome {
        builder = builder.chrome_executable(chrome);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
