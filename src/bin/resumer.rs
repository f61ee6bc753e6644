//! CLI binary for resumer.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ReviewConfig`, opens the on-disk store for `--user` and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use resumer::{
    analyze, hydrate, list_files, list_reviews, resolve_resume, wipe, LocalSession, ResumeView,
    ReviewConfig, ReviewContext, ReviewError, StatusCallback, StatusUpdate, UploadRequest,
    UploadStage,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI status callback using indicatif ──────────────────────────────────────

/// Spinner that shows the current upload step, and a bar while wiping.
struct CliStatusCallback {
    bar: ProgressBar,
}

impl CliStatusCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("resumer");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl StatusCallback for CliStatusCallback {
    fn on_status(&self, update: &StatusUpdate) {
        match update {
            StatusUpdate::Stage(UploadStage::Complete) => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", green("✔"), update);
            }
            StatusUpdate::Stage(stage) => {
                self.bar.println(format!("  {} {}", dim("·"), stage.message()));
                self.bar.set_message(stage.message());
            }
            StatusUpdate::Failed { .. } => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", red("✘"), red(&update.to_string()));
            }
        }
    }

    fn on_wipe_start(&self, total_files: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        self.bar.set_length(total_files as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Wiping");
    }

    fn on_file_deleted(&self, path: &str) {
        self.bar.println(format!("  {} {}", green("✓"), dim(path)));
        self.bar.inc(1);
    }

    fn on_file_error(&self, path: &str, error: &str) {
        self.bar.println(format!("  {} {}  {}", red("✗"), path, red(error)));
        self.bar.inc(1);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Review a resume against a job posting
  resumer analyze cv.pdf --company Acme --title "Backend Engineer" \
      --description-file posting.txt

  # Review a resume hosted online
  resumer analyze https://example.com/cv.pdf --title "SRE"

  # Show a stored review, and save the PDF and preview next to it
  resumer view 6f1c…-… --out ./review

  # Past reviews and stored files
  resumer list
  resumer files

  # Delete every stored file and clear all reviews
  resumer wipe --yes

ENVIRONMENT VARIABLES:
  RESUMER_USER            Signed-in user (required for every command)
  RESUMER_STORE_DIR       Storage root (default: <data dir>/resumer)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium
"#;

/// Review PDF resumes against job postings using Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "resumer",
    version,
    about = "Review PDF resumes against job postings using Vision LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Signed-in user; every command refuses an anonymous session.
    #[arg(long, global = true, env = "RESUMER_USER")]
    user: Option<String>,

    /// Storage root; each user gets a directory below it.
    #[arg(long, global = true, env = "RESUMER_STORE_DIR")]
    store_dir: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4.1-mini, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Longest edge of rendered pages, in pixels.
    #[arg(long, global = true, env = "RESUMER_MAX_PIXELS", default_value_t = 1600)]
    max_pixels: u32,

    /// Pages sent to the model.
    #[arg(long, global = true, env = "RESUMER_PAGES", default_value_t = 2)]
    pages: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "RESUMER_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, global = true, env = "RESUMER_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, global = true, env = "RESUMER_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, global = true, env = "RESUMER_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Concurrent deletions during a wipe.
    #[arg(long, global = true, env = "RESUMER_WIPE_CONCURRENCY", default_value_t = 4)]
    wipe_concurrency: usize,

    /// Disable the spinner.
    #[arg(long, global = true, env = "RESUMER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "RESUMER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "RESUMER_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a resume and get a critique for a job posting.
    Analyze {
        /// Local PDF file path or HTTP/HTTPS URL.
        resume: String,

        #[arg(long, default_value = "")]
        company: String,

        #[arg(long, default_value = "")]
        title: String,

        /// Job description text.
        #[arg(long, conflicts_with = "description_file")]
        description: Option<String>,

        /// Read the job description from this file.
        #[arg(long)]
        description_file: Option<PathBuf>,

        /// Print the stored record as JSON instead of Markdown.
        #[arg(long)]
        json: bool,
    },
    /// Show a stored review.
    View {
        id: Uuid,

        /// Also write the resume PDF and preview image into this directory.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the record as JSON instead of Markdown.
        #[arg(long)]
        json: bool,
    },
    /// List stored files.
    Files,
    /// List stored reviews.
    List,
    /// Delete every stored file and flush the key-value store.
    Wipe {
        /// Confirm the wipe.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner carries the status lines; keep library logs quiet under it.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    let progress = show_progress.then(CliStatusCallback::new);
    let result = run(&cli, progress.clone()).await;
    if let Some(ref p) = progress {
        p.finish();
    }
    result.map_err(|e| match e.downcast_ref::<ReviewError>() {
        Some(ReviewError::Unauthenticated { redirect }) => anyhow::anyhow!(
            "not signed in; pass --user or set RESUMER_USER (would redirect to {redirect})"
        ),
        _ => e,
    })
}

async fn run(cli: &Cli, progress: Option<Arc<CliStatusCallback>>) -> Result<()> {
    let config = build_config(cli, progress.clone())?;
    let root = store_root(cli)?;
    let session = LocalSession::from_username(cli.user.as_deref());

    match &cli.command {
        Command::Analyze {
            resume,
            company,
            title,
            description,
            description_file,
            json,
        } => {
            let job_description = match (description, description_file) {
                (Some(d), _) => d.clone(),
                (None, Some(path)) => tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read job description from {:?}", path))?,
                (None, None) => String::new(),
            };
            let file = resolve_resume(resume, cli.download_timeout)
                .await
                .context("Failed to load resume")?;
            let ctx = ReviewContext::local(&root, session, config)
                .await
                .context("Failed to open review context")?;
            let request = UploadRequest {
                company_name: company.clone(),
                job_title: title.clone(),
                job_description,
                file: Some(file),
            };
            let outcome = analyze(&ctx, request).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&outcome.record)?);
            } else {
                let view = hydrate(&ctx, outcome.record.id).await?;
                print!("{}", resumer::report::render_view(&view));
                if !cli.quiet {
                    eprintln!(
                        "{}  {}  {}",
                        green("✔"),
                        bold(&outcome.next.to_string()),
                        dim(&format!("{}ms", outcome.duration_ms)),
                    );
                }
            }
        }
        Command::View { id, out, json } => {
            let ctx = open_without_ai(&root, session, config).await?;
            let view = hydrate(&ctx, *id).await?;
            if let Some(ref p) = progress {
                p.finish();
            }
            if *json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", resumer::report::render_view(&view));
            }
            if let Some(dir) = out {
                write_artifacts(&view, dir).await?;
            }
        }
        Command::Files => {
            let ctx = open_without_ai(&root, session, config).await?;
            let files = list_files(&ctx).await?;
            if let Some(ref p) = progress {
                p.finish();
            }
            if files.is_empty() && !cli.quiet {
                eprintln!("{}", dim("no files stored"));
            }
            for f in files {
                println!("{:>10}  {}", f.size, f.path);
            }
        }
        Command::List => {
            let ctx = open_without_ai(&root, session, config).await?;
            let records = list_reviews(&ctx).await?;
            if let Some(ref p) = progress {
                p.finish();
            }
            if records.is_empty() && !cli.quiet {
                eprintln!("{}", dim("no reviews stored"));
            }
            for r in records {
                let score = r
                    .feedback
                    .as_ref()
                    .map(|f| format!("ATS {:>3}", f.ats().score))
                    .unwrap_or_else(|| "pending".to_string());
                println!("{}  {:<8}  {}  {}", r.id, score, r.company_name, r.job_title);
            }
        }
        Command::Wipe { yes } => {
            if !yes {
                anyhow::bail!("refusing to wipe without --yes");
            }
            let ctx = open_without_ai(&root, session, config).await?;
            let report = wipe(&ctx).await.context("Wipe failed")?;
            if let Some(ref p) = progress {
                p.finish();
            }
            if !cli.quiet {
                eprintln!(
                    "{} {} files deleted for {}",
                    if report.failed.is_empty() {
                        green("✔")
                    } else {
                        red("⚠")
                    },
                    bold(&report.deleted.len().to_string()),
                    report.user,
                );
            }
            for failure in &report.failed {
                eprintln!("  {} {}  {}", red("✗"), failure.path, red(&failure.error));
            }
            if !report.failed.is_empty() {
                anyhow::bail!(
                    "{} files could not be deleted, {} remain",
                    report.failed.len(),
                    report.remaining.len()
                );
            }
        }
    }
    Ok(())
}

async fn open_without_ai(
    root: &Path,
    session: LocalSession,
    config: ReviewConfig,
) -> Result<ReviewContext> {
    ReviewContext::local_without_ai(root, session, config)
        .await
        .context("Failed to open store")
}

/// Map CLI args to `ReviewConfig`.
fn build_config(cli: &Cli, progress: Option<Arc<CliStatusCallback>>) -> Result<ReviewConfig> {
    let mut builder = ReviewConfig::builder()
        .max_rendered_pixels(cli.max_pixels)
        .max_analyzed_pages(cli.pages)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .wipe_concurrency(cli.wipe_concurrency);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.status_callback(cb as Arc<dyn StatusCallback>);
    }

    builder.build().context("Invalid configuration")
}

fn store_root(cli: &Cli) -> Result<PathBuf> {
    if let Some(ref dir) = cli.store_dir {
        return Ok(dir.clone());
    }
    dirs::data_dir()
        .map(|d| d.join("resumer"))
        .context("No data directory on this platform; pass --store-dir")
}

async fn write_artifacts(view: &ResumeView, dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {:?}", dir))?;
    for artifact in [view.resume.as_ref(), view.preview.as_ref()]
        .into_iter()
        .flatten()
    {
        let target = dir.join(artifact.file_name());
        tokio::fs::write(&target, &artifact.data)
            .await
            .with_context(|| format!("Failed to write {:?}", target))?;
        eprintln!("{} {}", green("✓"), target.display());
    }
    Ok(())
}
