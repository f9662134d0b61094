//! Media intake — accepts a single file from a drop or a file picker,
//! validates it, and keeps one preview handle for it.
//!
//! Intake never talks to the network. The workflow that owns an intake
//! decides when (and whether) the accepted file is sent anywhere.

use crate::preview::{PreviewHost, PreviewResource};
use crate::types::MediaAsset;
use std::sync::Arc;
use thiserror::Error;

/// Default upload limit: 10 MiB.
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Default accept pattern: any image type.
pub const DEFAULT_ACCEPT: &str = "image/*";

/// Input rejected before any network attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no file was supplied")]
    NoFile,
    #[error("file is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("file type {mime:?} is not accepted")]
    UnsupportedType { mime: String },
    #[error("name is required")]
    EmptyName,
    #[error("an image is required")]
    MissingImage,
}

impl ValidationError {
    /// Catalog key for the inline message.
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationError::NoFile => "noFileSelected",
            ValidationError::TooLarge { .. } => "fileTooLarge",
            ValidationError::UnsupportedType { .. } => "unsupportedType",
            ValidationError::EmptyName | ValidationError::MissingImage => "requiredFields",
        }
    }
}

/// Where the files came from. Both carry every file of the event; only the
/// first is used.
#[derive(Debug, Clone)]
pub enum IntakeSource {
    Drop(Vec<MediaAsset>),
    Picker(Vec<MediaAsset>),
}

impl IntakeSource {
    fn kind(&self) -> &'static str {
        match self {
            IntakeSource::Drop(_) => "drop",
            IntakeSource::Picker(_) => "picker",
        }
    }

    fn into_files(self) -> Vec<MediaAsset> {
        match self {
            IntakeSource::Drop(files) | IntakeSource::Picker(files) => files,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AcceptEntry {
    Any,
    /// `image/*` — stores the lowercased top-level type.
    TopLevel(String),
    Exact(String),
    /// `.jpg` — stores the lowercased extension without the dot.
    Extension(String),
}

/// File filter in the syntax of the HTML `accept` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptPattern {
    entries: Vec<AcceptEntry>,
}

impl AcceptPattern {
    /// Parse a comma-separated list such as `"image/*,.heic"`.
    ///
    /// Empty entries are skipped; a pattern with no entries accepts anything.
    pub fn parse(pattern: &str) -> Self {
        let entries = pattern
            .split(',')
            .map(|e| e.trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .map(|e| {
                if e == "*" || e == "*/*" {
                    AcceptEntry::Any
                } else if let Some(ext) = e.strip_prefix('.') {
                    AcceptEntry::Extension(ext.to_string())
                } else if let Some(top) = e.strip_suffix("/*") {
                    AcceptEntry::TopLevel(top.to_string())
                } else {
                    AcceptEntry::Exact(e)
                }
            })
            .collect();
        Self { entries }
    }

    pub fn matches(&self, asset: &MediaAsset) -> bool {
        if self.entries.is_empty() {
            return true;
        }
        let mime = asset.mime.trim().to_ascii_lowercase();
        let top = mime.split('/').next().unwrap_or_default();
        let ext = asset.extension();

        self.entries.iter().any(|entry| match entry {
            AcceptEntry::Any => true,
            AcceptEntry::TopLevel(t) => t == top,
            AcceptEntry::Exact(m) => *m == mime,
            AcceptEntry::Extension(e) => ext.as_deref() == Some(e.as_str()),
        })
    }
}

impl Default for AcceptPattern {
    fn default() -> Self {
        Self::parse(DEFAULT_ACCEPT)
    }
}

/// Intake limits and behaviour.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub max_size_bytes: u64,
    pub accept: AcceptPattern,
    /// Create a preview handle for accepted image files.
    pub preview: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            accept: AcceptPattern::default(),
            preview: true,
        }
    }
}

/// Single-file intake with drag state and an owned preview handle.
pub struct MediaIntake {
    config: IntakeConfig,
    host: Arc<dyn PreviewHost>,
    asset: Option<MediaAsset>,
    preview: Option<PreviewResource>,
    drag_over: bool,
}

impl MediaIntake {
    pub fn new(config: IntakeConfig, host: Arc<dyn PreviewHost>) -> Self {
        Self {
            config,
            host,
            asset: None,
            preview: None,
            drag_over: false,
        }
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Accept the first file of a drop or picker event.
    ///
    /// On any validation failure nothing changes: the previous asset and its
    /// preview stay in place.
    pub fn select_file(&mut self, source: IntakeSource) -> Result<&MediaAsset, ValidationError> {
        let kind = source.kind();
        if matches!(source, IntakeSource::Drop(_)) {
            self.drag_over = false;
        }

        let mut files = source.into_files().into_iter();
        let file = files.next().ok_or(ValidationError::NoFile)?;
        let ignored = files.count();
        if ignored > 0 {
            tracing::debug!(source = kind, ignored, "extra files in event ignored");
        }

        self.validate(&file)?;

        // Release the old handle before minting the new one.
        self.preview = None;
        if self.config.preview && file.is_image() {
            self.preview = Some(PreviewResource::acquire(self.host.clone(), &file));
        }

        tracing::info!(
            source = kind,
            file = %file.name,
            mime = %file.mime,
            size = file.size(),
            "file accepted"
        );
        Ok(&*self.asset.insert(file))
    }

    /// Size check alone, for hosts that know a file's length before reading it.
    pub fn check_size(&self, name: &str, size: u64) -> Result<(), ValidationError> {
        if size > self.config.max_size_bytes {
            tracing::info!(file = %name, size, limit = self.config.max_size_bytes, "file rejected: too large");
            return Err(ValidationError::TooLarge {
                size,
                limit: self.config.max_size_bytes,
            });
        }
        Ok(())
    }

    fn validate(&self, file: &MediaAsset) -> Result<(), ValidationError> {
        self.check_size(&file.name, file.size())?;
        if !self.config.accept.matches(file) {
            tracing::info!(file = %file.name, mime = %file.mime, "file rejected: type not accepted");
            return Err(ValidationError::UnsupportedType {
                mime: file.mime.clone(),
            });
        }
        Ok(())
    }

    /// Discard the asset and revoke its preview.
    pub fn clear(&mut self) {
        if self.asset.is_some() {
            tracing::debug!("intake cleared");
        }
        self.preview = None;
        self.asset = None;
    }

    /// Take the accepted asset out of the intake, revoking its preview.
    pub fn take(&mut self) -> Option<MediaAsset> {
        self.preview = None;
        self.asset.take()
    }

    pub fn asset(&self) -> Option<&MediaAsset> {
        self.asset.as_ref()
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_ref().map(PreviewResource::url)
    }

    pub fn is_drag_over(&self) -> bool {
        self.drag_over
    }

    /// Pointer entered the drop zone. Returns true if the visual state changed.
    pub fn drag_enter(&mut self) -> bool {
        !std::mem::replace(&mut self.drag_over, true)
    }

    /// Pointer left the drop zone. Returns true if the visual state changed.
    pub fn drag_leave(&mut self) -> bool {
        std::mem::replace(&mut self.drag_over, false)
    }
}

impl std::fmt::Debug for MediaIntake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaIntake")
            .field("config", &self.config)
            .field("asset", &self.asset.as_ref().map(|a| &a.name))
            .field("preview", &self.preview)
            .field("drag_over", &self.drag_over)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{image_of_size, jpeg, RecordingHost};

    fn intake(host: &Arc<RecordingHost>) -> MediaIntake {
        MediaIntake::new(IntakeConfig::default(), host.clone())
    }

    #[test]
    fn test_accepts_valid_image_with_preview() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);

        let asset = intake.select_file(IntakeSource::Picker(vec![jpeg("a.jpg")])).unwrap();
        assert_eq!(asset.name, "a.jpg");
        assert_eq!(host.created(), 1);
        assert_eq!(intake.preview_url(), host.live().first().map(String::as_str));
    }

    #[test]
    fn test_too_large_creates_nothing() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);

        let big = image_of_size("big.jpg", 11 * 1024 * 1024);
        let err = intake.select_file(IntakeSource::Drop(vec![big])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLarge {
                size: 11 * 1024 * 1024,
                limit: DEFAULT_MAX_SIZE_BYTES
            }
        );
        assert!(intake.asset().is_none());
        assert!(intake.preview_url().is_none());
        assert_eq!(host.created(), 0);
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);
        let exact = image_of_size("exact.jpg", DEFAULT_MAX_SIZE_BYTES as usize);
        assert!(intake.select_file(IntakeSource::Picker(vec![exact])).is_ok());
    }

    #[test]
    fn test_rejection_keeps_previous_selection() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);
        intake.select_file(IntakeSource::Picker(vec![jpeg("keep.jpg")])).unwrap();
        let url = intake.preview_url().unwrap().to_string();

        let big = image_of_size("big.jpg", 11 * 1024 * 1024);
        assert!(intake.select_file(IntakeSource::Picker(vec![big])).is_err());

        assert_eq!(intake.asset().unwrap().name, "keep.jpg");
        assert_eq!(intake.preview_url(), Some(url.as_str()));
        assert_eq!(host.revocations(&url), 0);
    }

    #[test]
    fn test_size_checked_before_type() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);
        let big_text = MediaAsset::new("big.txt", "text/plain", vec![0; 11 * 1024 * 1024]);
        let err = intake.select_file(IntakeSource::Picker(vec![big_text])).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
    }

    #[test]
    fn test_unsupported_type() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);
        let pdf = MediaAsset::new("doc.pdf", "application/pdf", vec![1, 2, 3]);
        let err = intake.select_file(IntakeSource::Picker(vec![pdf])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedType {
                mime: "application/pdf".into()
            }
        );
        assert_eq!(host.created(), 0);
    }

    #[test]
    fn test_first_file_wins() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);
        let files = vec![jpeg("first.jpg"), jpeg("second.jpg"), jpeg("third.jpg")];
        let asset = intake.select_file(IntakeSource::Drop(files)).unwrap();
        assert_eq!(asset.name, "first.jpg");
        assert_eq!(host.created(), 1);
    }

    #[test]
    fn test_empty_event_is_no_file() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);
        assert_eq!(
            intake.select_file(IntakeSource::Picker(vec![])).unwrap_err(),
            ValidationError::NoFile
        );
    }

    #[test]
    fn test_successive_selections_never_overlap_handles() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);

        for i in 0..5 {
            intake
                .select_file(IntakeSource::Picker(vec![jpeg(&format!("{i}.jpg"))]))
                .unwrap();
            assert_eq!(host.live().len(), 1);
        }
        assert_eq!(host.created(), 5);
        assert_eq!(host.max_live(), 1);
        assert_eq!(host.total_revocations(), 4);
    }

    #[test]
    fn test_clear_revokes_exactly_once() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);
        intake.select_file(IntakeSource::Picker(vec![jpeg("a.jpg")])).unwrap();
        let url = intake.preview_url().unwrap().to_string();

        intake.clear();
        intake.clear();
        assert!(intake.asset().is_none());
        assert!(host.live().is_empty());
        assert_eq!(host.revocations(&url), 1);
    }

    #[test]
    fn test_drop_of_intake_revokes() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);
        intake.select_file(IntakeSource::Picker(vec![jpeg("a.jpg")])).unwrap();
        drop(intake);
        assert!(host.live().is_empty());
        assert_eq!(host.total_revocations(), 1);
    }

    #[test]
    fn test_preview_disabled() {
        let host = RecordingHost::new();
        let config = IntakeConfig {
            preview: false,
            ..IntakeConfig::default()
        };
        let mut intake = MediaIntake::new(config, host.clone());
        intake.select_file(IntakeSource::Picker(vec![jpeg("a.jpg")])).unwrap();
        assert!(intake.asset().is_some());
        assert!(intake.preview_url().is_none());
        assert_eq!(host.created(), 0);
    }

    #[test]
    fn test_non_image_accepted_without_preview_revokes_old() {
        let host = RecordingHost::new();
        let config = IntakeConfig {
            accept: AcceptPattern::parse("*/*"),
            ..IntakeConfig::default()
        };
        let mut intake = MediaIntake::new(config, host.clone());
        intake.select_file(IntakeSource::Picker(vec![jpeg("a.jpg")])).unwrap();
        let doc = MediaAsset::new("notes.txt", "text/plain", b"hi".to_vec());
        intake.select_file(IntakeSource::Picker(vec![doc])).unwrap();

        assert!(intake.preview_url().is_none());
        assert!(host.live().is_empty());
    }

    #[test]
    fn test_drag_transitions_only() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);

        assert!(intake.drag_enter());
        assert!(!intake.drag_enter());
        assert!(intake.is_drag_over());
        assert!(intake.drag_leave());
        assert!(!intake.drag_leave());
        assert!(!intake.is_drag_over());
        assert_eq!(host.created(), 0);
    }

    #[test]
    fn test_drop_ends_drag_over_even_when_rejected() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);
        intake.drag_enter();
        let _ = intake.select_file(IntakeSource::Drop(vec![]));
        assert!(!intake.is_drag_over());
    }

    #[test]
    fn test_take_revokes_and_empties() {
        let host = RecordingHost::new();
        let mut intake = intake(&host);
        intake.select_file(IntakeSource::Picker(vec![jpeg("a.jpg")])).unwrap();
        let asset = intake.take().unwrap();
        assert_eq!(asset.name, "a.jpg");
        assert!(intake.asset().is_none());
        assert!(host.live().is_empty());
    }

    #[test]
    fn test_accept_pattern_wildcard() {
        let pattern = AcceptPattern::parse("image/*");
        assert!(pattern.matches(&jpeg("a.jpg")));
        assert!(pattern.matches(&MediaAsset::new("a.webp", "IMAGE/WEBP", vec![])));
        assert!(!pattern.matches(&MediaAsset::new("a.mp4", "video/mp4", vec![])));
    }

    #[test]
    fn test_accept_pattern_exact_and_extension() {
        let pattern = AcceptPattern::parse("image/png, .JPG");
        assert!(pattern.matches(&MediaAsset::new("a.png", "image/png", vec![])));
        assert!(pattern.matches(&MediaAsset::new("photo.jpg", "application/octet-stream", vec![])));
        assert!(!pattern.matches(&MediaAsset::new("a.gif", "image/gif", vec![])));
    }

    #[test]
    fn test_accept_pattern_any() {
        assert!(AcceptPattern::parse("*/*").matches(&MediaAsset::new("x", "text/plain", vec![])));
        assert!(AcceptPattern::parse("").matches(&MediaAsset::new("x", "text/plain", vec![])));
    }

    #[test]
    fn test_validation_message_keys() {
        assert_eq!(ValidationError::EmptyName.message_key(), "requiredFields");
        assert_eq!(
            ValidationError::TooLarge { size: 2, limit: 1 }.message_key(),
            "fileTooLarge"
        );
    }

    #[test]
    fn test_check_size_matches_selection_limit() {
        let host = RecordingHost::new();
        let intake = MediaIntake::new(
            IntakeConfig {
                max_size_bytes: 1024,
                ..IntakeConfig::default()
            },
            host.clone(),
        );
        assert!(intake.check_size("a.jpg", 1024).is_ok());
        assert_eq!(
            intake.check_size("huge.jpg", 4 * 1024 * 1024 * 1024),
            Err(ValidationError::TooLarge {
                size: 4 * 1024 * 1024 * 1024,
                limit: 1024,
            })
        );
        assert_eq!(host.created(), 0);
    }
}
