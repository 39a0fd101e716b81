//! CLI binary for pdf2speech.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `SynthesisConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2speech::{
    convert_to_file, extract_text, ProgressCallback, ProviderKind, SynthesisConfig,
    SynthesisProgressCallback,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-segment
/// log lines using [indicatif]. Designed to work correctly when segments
/// complete out-of-order (concurrent synthesis).
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Per-segment wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
    /// Count of segments that errored out.
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically by
    /// `on_run_start` (the segment count is only known after chunking).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Extracting text…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} segments  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Synthesizing");
        self.bar.reset_eta();
    }
}

impl SynthesisProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_segments: usize) {
        self.activate_bar(total_segments);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Synthesizing {total_segments} segment(s)…"))
        ));
    }

    fn on_segment_start(&self, index: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap()
            .insert(index, Instant::now());
        self.bar.set_message(format!("segment {index}"));
    }

    fn on_segment_complete(&self, index: usize, total: usize, audio_len: usize) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&index)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} Segment {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            index + 1,
            total,
            dim(&format!("{audio_len:>7} bytes")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_segment_error(&self, index: usize, total: usize, error: &str) {
        let elapsed_ms = self
            .start_times
            .lock()
            .unwrap()
            .remove(&index)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Segment {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_segments: usize, success_count: usize) {
        let failed = total_segments.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} segment(s) synthesized",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} segments synthesized  ({} failed)",
                red("✘"),
                bold(&success_count.to_string()),
                total_segments,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Google Cloud TTS (needs GOOGLE_TTS_API_KEY)
  pdf2speech my-book.pdf my-book.mp3 --voice en-US-Studio-O --rate 1.05

  # Free endpoint (Internet only, lower quality)
  pdf2speech my-article.pdf article.mp3 --provider free --language en

  # Fully offline (espeak-ng must be installed; output is WAV)
  pdf2speech notes.pdf notes.wav --provider offline --voice en-us

  # Convert from URL
  pdf2speech https://arxiv.org/pdf/1706.03762 attention.mp3

  # Preview the text that would be read aloud (no credentials needed)
  pdf2speech my-book.pdf --extract-only

  # Machine-readable run statistics
  pdf2speech my-book.pdf my-book.mp3 --json > stats.json

PROVIDERS:
  Provider   Quality  Needs                 Per-call limit  Output
  ────────   ───────  ────────────────────  ──────────────  ──────
  cloud      ★★★★★   Google TTS API key    4900 chars      MP3
  free       ★★       Internet connection   200 chars       MP3
  offline    ★★       espeak-ng installed   8000 chars      WAV

  Provider selection is explicit; there is no automatic fallback.

ENVIRONMENT VARIABLES:
  GOOGLE_TTS_API_KEY        API key for the cloud provider
  PDF2SPEECH_PROVIDER       Override provider (cloud, free, offline)
  PDF2SPEECH_VOICE          Override voice name

SETUP (cloud):
  1. Create an API key with the Cloud Text-to-Speech API enabled.
  2. export GOOGLE_TTS_API_KEY=AIza...
  3. pdf2speech book.pdf book.mp3
"#;

/// Convert a PDF into a spoken-word audio file.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2speech",
    version,
    about = "Convert a PDF into a spoken-word audio file",
    long_about = "Convert PDF documents (local files or URLs) into a single audio file using a \
text-to-speech backend: Google Cloud TTS, the free Google Translate endpoint, or a local \
espeak-ng installation.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Output audio file (.mp3 for cloud/free, .wav for offline).
    /// Optional with --extract-only.
    output: Option<PathBuf>,

    /// TTS backend: cloud, free, offline.
    #[arg(long, env = "PDF2SPEECH_PROVIDER", default_value = "cloud")]
    provider: String,

    /// Voice name, provider-specific (e.g. en-US-Studio-M, en-us).
    #[arg(long, env = "PDF2SPEECH_VOICE", default_value = "en-US-Studio-M")]
    voice: String,

    /// Speaking-rate multiplier (0.25–4.0; 1.0 = normal speed).
    #[arg(long, env = "PDF2SPEECH_RATE", default_value_t = 1.0)]
    rate: f32,

    /// Language code used when the voice name doesn't imply one.
    #[arg(long, env = "PDF2SPEECH_LANGUAGE", default_value = "en")]
    language: String,

    /// Override the per-segment character limit (capped at the provider's own).
    #[arg(long, env = "PDF2SPEECH_CHUNK_CHARS")]
    chunk_chars: Option<usize>,

    /// Number of concurrent synthesis calls.
    #[arg(short, long, env = "PDF2SPEECH_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Retries per segment on synthesis failure.
    #[arg(long, env = "PDF2SPEECH_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Initial retry backoff in milliseconds (doubles per attempt).
    #[arg(long, env = "PDF2SPEECH_RETRY_BACKOFF_MS", default_value_t = 500)]
    retry_backoff_ms: u64,

    /// Per-synthesis-call timeout in seconds.
    #[arg(long, env = "PDF2SPEECH_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds (URL inputs).
    #[arg(long, env = "PDF2SPEECH_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Path to a file containing the cloud API key.
    #[arg(long, env = "PDF2SPEECH_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Print the extracted, cleaned text to stdout and exit (no synthesis).
    #[arg(long)]
    extract_only: bool,

    /// Output run statistics as JSON on stdout.
    #[arg(long, env = "PDF2SPEECH_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2SPEECH_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2SPEECH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2SPEECH_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.extract_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let text = extract_text(&cli.input, cli.download_timeout)
            .await
            .context("Failed to extract text")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        return Ok(());
    }

    let output_path = cli
        .output
        .clone()
        .context("OUTPUT is required unless --extract-only is given")?;

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn SynthesisProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let stats = convert_to_file(&cli.input, &output_path, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {} segments  {}ms  →  {}",
            green("✔"),
            stats.segments,
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        eprintln!(
            "   {} chars read  /  {} audio bytes  /  {} retries",
            dim(&stats.text_chars.to_string()),
            dim(&stats.audio_bytes.to_string()),
            dim(&stats.total_retries.to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `SynthesisConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SynthesisConfig> {
    let kind: ProviderKind = cli
        .provider
        .parse()
        .with_context(|| format!("Invalid --provider '{}'", cli.provider))?;

    let mut builder = SynthesisConfig::builder()
        .provider_kind(kind)
        .voice(&cli.voice)
        .language(&cli.language)
        .rate(cli.rate)
        .concurrency(cli.concurrency)
        .max_retries(cli.max_retries)
        .retry_backoff_ms(cli.retry_backoff_ms)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(limit) = cli.chunk_chars {
        builder = builder.max_chunk_chars(limit);
    }
    if let Some(ref path) = cli.credentials {
        builder = builder.credentials_path(path);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
