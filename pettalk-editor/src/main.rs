//! pettalk-editor - command-line front end
//!
//! Probe media, cut a segment to WAV, validate a WAV header, or run the full
//! analysis (extract → validate → upload → poll) against the remote service.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pettalk_common::config::{load_toml_config, resolve_config_path};
use pettalk_editor::analysis::store::StoredBlob;
use pettalk_editor::analysis::{
    EmotionApiClient, FileBlobStore, FileSessionStore, ResultPoller, SessionStore,
};
use pettalk_editor::audio::{
    AudioExtractionEngine, MediaAsset, MediaDuration, MediaDurationProbe, OutputFormat,
    WavValidator,
};
use pettalk_editor::config::{EditorSettings, Overrides};
use pettalk_editor::pipeline::AnalysisPipeline;
use pettalk_editor::selection::{format_time, SelectionRange};

/// Command-line arguments for pettalk-editor
#[derive(Parser, Debug)]
#[command(name = "pettalk-editor")]
#[command(about = "Cut a dog bark segment and analyze its emotion")]
#[command(version)]
struct Args {
    /// Config file (defaults to PETTALK_CONFIG, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Analysis service base URL
    #[arg(long, global = true, env = "PETTALK_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, global = true, env = "PETTALK_CLIENT_ID")]
    client_id: Option<String>,

    #[arg(long, global = true, env = "PETTALK_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    #[arg(long, global = true, env = "PETTALK_USER_TOKEN", hide_env_values = true)]
    user_token: Option<String>,

    /// Directory for the session file and stored media
    #[arg(long, global = true, env = "PETTALK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the duration of a media file
    Probe { file: PathBuf },

    /// Cut a segment to a WAV file
    Extract {
        file: PathBuf,
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
        /// Keep source channels and rate instead of the upload format
        #[arg(long)]
        preview: bool,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Check a WAV file header
    Validate { file: PathBuf },

    /// Analyze a segment with the remote service
    Analyze {
        file: PathBuf,
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
        #[arg(long)]
        max_attempts: Option<u32>,
        #[arg(long)]
        interval_ms: Option<u64>,
        /// fail-closed or best-effort
        #[arg(long)]
        mismatch_policy: Option<String>,
    },

    /// Resume polling for the most recent upload
    Resume,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "pettalk_editor={level},pettalk_common={level}",
            level = default_level
        ))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let user_failure = err
                .downcast_ref::<pettalk_editor::Error>()
                .and_then(|e| e.user_failure());
            match user_failure {
                Some(failure) => eprintln!("{}", failure.message()),
                None => eprintln!("Error: {:#}", err),
            }
            debug!("{:?}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config_path = resolve_config_path(args.config.as_deref());
    let toml = load_toml_config(config_path.as_deref()).context("Failed to load config")?;
    init_tracing(&toml.logging.level);

    let mut overrides = Overrides {
        base_url: args.base_url,
        client_id: args.client_id,
        secret_key: args.secret_key,
        user_token: args.user_token,
        data_dir: args.data_dir,
        ..Default::default()
    };

    match args.command {
        Command::Probe { file } => {
            let asset = read_asset(&file)?;
            match MediaDurationProbe::probe(asset).await {
                MediaDuration::Playable(secs) => {
                    println!("{:.3}s ({})", secs, format_time(secs));
                }
                _ => println!("unplayable"),
            }
        }

        Command::Extract {
            file,
            start,
            end,
            preview,
            output,
        } => {
            let settings = EditorSettings::resolve(&toml, &overrides)?;
            let format = if preview {
                OutputFormat::preview()
            } else {
                settings.upload_format
            };
            let asset = read_asset(&file)?;
            let clip =
                AudioExtractionEngine::extract(asset, SelectionRange::new(start, end), format)
                    .await?;
            std::fs::write(&output, clip.as_bytes())
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "{} ({} Hz, {} channel(s), {} bytes)",
                output.display(),
                clip.sample_rate(),
                clip.channels(),
                clip.len()
            );
        }

        Command::Validate { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let report = WavValidator::validate(&bytes).into_result()?;
            println!(
                "valid: {} Hz, {} channel(s), {} bit, ~{:.2}s",
                report.sample_rate.unwrap_or(0),
                report.channels.unwrap_or(0),
                report.bits_per_sample.unwrap_or(0),
                report.duration.unwrap_or(0.0)
            );
        }

        Command::Analyze {
            file,
            start,
            end,
            max_attempts,
            interval_ms,
            mismatch_policy,
        } => {
            overrides.max_attempts = max_attempts;
            overrides.interval_ms = interval_ms;
            overrides.mismatch_policy = mismatch_policy;
            let settings = EditorSettings::resolve(&toml, &overrides)?;

            let session: Arc<dyn SessionStore> =
                Arc::new(FileSessionStore::new(settings.session_path()));
            let pipeline = AnalysisPipeline::new(
                build_poller(&settings, session.clone())?,
                session,
                settings.upload_format,
                settings.poll,
            );

            let asset = read_asset(&file)?;
            let blobs = FileBlobStore::new(settings.blob_dir());
            let stored = StoredBlob::save(&blobs, &asset)?;
            debug!("Stored {} as blob {}", asset.name, stored.id());

            let cancel = cancel_on_ctrl_c();
            let finished = pipeline
                .run(asset, SelectionRange::new(start, end), &cancel)
                .await?;
            println!("{}", finished.outcome);
        }

        Command::Resume => {
            let settings = EditorSettings::resolve(&toml, &overrides)?;
            let session: Arc<dyn SessionStore> =
                Arc::new(FileSessionStore::new(settings.session_path()));
            let poller = build_poller(&settings, session)?;

            let Some(request) = poller.resume()? else {
                warn!("No upload recorded in {}", settings.session_path().display());
                anyhow::bail!("nothing to resume");
            };
            info!("Resuming poll for {}", request.token);

            let cancel = cancel_on_ctrl_c();
            let result = poller.await_result(&request, settings.poll, &cancel).await?;
            println!("{}", result.outcome());
        }
    }

    Ok(())
}

fn build_poller(settings: &EditorSettings, session: Arc<dyn SessionStore>) -> Result<ResultPoller> {
    let client = Arc::new(EmotionApiClient::new(settings.client.clone())?);
    Ok(ResultPoller::new(
        client.clone(),
        client,
        session,
        settings.mismatch_policy,
    ))
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

fn read_asset(path: &Path) -> Result<MediaAsset> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "media".to_string());
    let mime = mime_for_path(path);
    Ok(MediaAsset::new(name, mime, bytes))
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("aac") => "audio/aac",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        _ => "application/octet-stream",
    }
}
