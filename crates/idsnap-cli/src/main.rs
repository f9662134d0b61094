use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use idsnap_client::{Config, HttpFaceService};
use idsnap_core::i18n::{self, Locale, LocaleContext};
use idsnap_core::view::{render_enrollment, render_recognition, render_validation, Line, Tone};
use idsnap_core::{
    BlobRegistry, EnrollmentStatus, EnrollmentWorkflow, FaceService, IntakeSource, MediaAsset,
    MediaIntake, RecognitionOutcome, RecognitionWorkflow, ValidationError, WorkflowError,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "idsnap", about = "IDSnap face recognition console")]
struct Cli {
    /// Display language (en or ko)
    #[arg(long, global = true, default_value = "en")]
    lang: Locale,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify the person in a photo
    Recognize {
        /// Photo to analyze
        image: PathBuf,
        /// Write the service's landmark overlay to this path
        #[arg(long)]
        save_landmarks: Option<PathBuf>,
    },
    /// Register a new person with a reference photo
    Enroll {
        /// Person's name
        #[arg(short, long)]
        name: String,
        /// Additional information about the person
        #[arg(short, long, default_value = "")]
        info: String,
        /// Reference photo
        image: PathBuf,
    },
    /// Print the translation catalog for the selected language
    Catalog,
}

/// Services shared by every command, created once at startup.
struct Host {
    config: Config,
    i18n: Arc<LocaleContext>,
    previews: Arc<BlobRegistry>,
}

impl Host {
    fn intake(&self) -> MediaIntake {
        MediaIntake::new(self.config.intake_config(), self.previews.clone())
    }

    fn service(&self) -> Result<HttpFaceService> {
        HttpFaceService::new(&self.config).context("failed to build HTTP client")
    }

    fn print(&self, lines: &[Line]) {
        for line in lines {
            match line.tone {
                Tone::Error => eprintln!("{line}"),
                Tone::Info | Tone::Success => println!("{line}"),
            }
        }
    }

    /// Log the preview handle the intake minted for the selected file.
    fn describe_preview(&self, url: Option<&str>) {
        let Some(url) = url else { return };
        let Some(blob) = self.previews.resolve(url) else { return };
        match image::load_from_memory(&blob.bytes) {
            Ok(img) => tracing::info!(preview = url, width = img.width(), height = img.height(), "preview ready"),
            Err(e) => tracing::warn!(preview = url, error = %e, "preview could not be decoded"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let host = Host {
        config: Config::from_env(),
        i18n: Arc::new(LocaleContext::new(cli.lang)),
        previews: Arc::new(BlobRegistry::new()),
    };
    tracing::debug!(api_url = %host.config.api_url, locale = %cli.lang, "idsnap starting");

    let ok = match cli.command {
        Commands::Recognize {
            image,
            save_landmarks,
        } => recognize(&host, &image, save_landmarks.as_deref()).await?,
        Commands::Enroll { name, info, image } => enroll(&host, name, info, &image).await?,
        Commands::Catalog => {
            let locale = host.i18n.locale();
            for key in i18n::keys(locale) {
                println!("{key}\t{}", i18n::lookup(locale, key));
            }
            true
        }
    };

    let leaked = host.previews.live_count();
    if leaked > 0 {
        tracing::warn!(leaked, "preview handles still live at exit");
    }
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Read a photo from disk, rejecting oversized files from their metadata so
/// they are never loaded into memory.
fn load(intake: &MediaIntake, path: &Path) -> Result<Result<MediaAsset, ValidationError>> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len();
    if let Err(err) = intake.check_size(&path.display().to_string(), size) {
        return Ok(Err(err));
    }
    let asset =
        MediaAsset::from_path(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Ok(asset))
}

async fn recognize(host: &Host, image: &Path, save_landmarks: Option<&Path>) -> Result<bool> {
    let i18n = &host.i18n;
    let mut workflow = RecognitionWorkflow::new(host.service()?, host.intake());

    let selected = load(workflow.intake(), image)?
        .map_err(WorkflowError::from)
        .and_then(|asset| workflow.select_file(IntakeSource::Picker(vec![asset])).map(drop));
    match selected {
        Ok(()) => {}
        Err(WorkflowError::Validation(err)) => {
            host.print(&[render_validation(&err, i18n)]);
            return Ok(false);
        }
        Err(err) => return Err(err.into()),
    }
    host.describe_preview(workflow.intake().preview_url());

    let request = workflow.begin()?;
    host.print(&render_recognition(workflow.outcome(), i18n));

    let result = {
        let service = workflow.service();
        tokio::select! {
            result = service.recognize(&request.asset) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        }
    };
    let Some(result) = result else {
        workflow.cancel();
        eprintln!("{}", i18n.t("error"));
        return Ok(false);
    };

    let outcome = workflow.complete(request.id, result).cloned();
    host.print(&render_recognition(outcome.as_ref(), i18n));

    match outcome {
        Some(RecognitionOutcome::Matched {
            annotated_image, ..
        }) => {
            if let (Some(path), Some(overlay)) = (save_landmarks, annotated_image) {
                std::fs::write(path, &overlay.bytes)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("{}: {}", i18n.t("faceLandmarks"), path.display());
            }
            Ok(true)
        }
        Some(RecognitionOutcome::NoMatch) => Ok(true),
        _ => Ok(false),
    }
}

async fn enroll(host: &Host, name: String, info: String, image: &Path) -> Result<bool> {
    let i18n = &host.i18n;
    let mut workflow = EnrollmentWorkflow::new(host.service()?, host.intake());
    workflow.set_name(name)?;
    workflow.set_info(info)?;

    let selected = load(workflow.intake(), image)?
        .map_err(WorkflowError::from)
        .and_then(|asset| workflow.select_file(IntakeSource::Picker(vec![asset])).map(drop));
    match selected {
        Ok(()) => {}
        Err(WorkflowError::Validation(err)) => {
            host.print(&[render_validation(&err, i18n)]);
            return Ok(false);
        }
        Err(err) => return Err(err.into()),
    }
    host.describe_preview(workflow.intake().preview_url());

    let request = match workflow.begin() {
        Ok(request) => request,
        Err(WorkflowError::Validation(_)) => {
            host.print(&render_enrollment(workflow.status(), i18n));
            return Ok(false);
        }
        Err(err) => return Err(err.into()),
    };
    println!("{}", i18n.t("loading"));

    let result = {
        let service = workflow.service();
        tokio::select! {
            result = service.enroll(&request.person) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        }
    };
    let Some(result) = result else {
        workflow.cancel();
        eprintln!("{}", i18n.t("addUserFailed"));
        return Ok(false);
    };

    let status = workflow.complete(request.id, result);
    host.print(&render_enrollment(status, i18n));
    Ok(*status == EnrollmentStatus::Succeeded)
}
