//! Localized display lines for workflow state.

use crate::enrollment::EnrollmentStatus;
use crate::i18n::LocaleContext;
use crate::intake::ValidationError;
use crate::recognition::RecognitionOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Error,
}

/// One rendered line: an optional field label plus its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub tone: Tone,
    pub label: Option<String>,
    pub text: String,
}

impl Line {
    fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            label: None,
            text: text.into(),
        }
    }

    fn field(label: &str, text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            label: Some(label.to_string()),
            text: text.into(),
        }
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{label}: {}", self.text),
            None => f.write_str(&self.text),
        }
    }
}

/// Lines for the recognition result panel. Idle renders nothing.
pub fn render_recognition(outcome: Option<&RecognitionOutcome>, i18n: &LocaleContext) -> Vec<Line> {
    let Some(outcome) = outcome else {
        return Vec::new();
    };
    match outcome {
        RecognitionOutcome::Pending => vec![Line::new(Tone::Info, i18n.t("analyzing"))],
        RecognitionOutcome::Matched { name, info, .. } => vec![
            Line::new(Tone::Success, i18n.t("recognizedPerson")),
            Line::field(i18n.t("name"), name.as_str()),
            Line::field(i18n.t("info"), info.as_str()),
        ],
        RecognitionOutcome::NoMatch => vec![Line::new(Tone::Info, i18n.t("noFaceDetected"))],
        RecognitionOutcome::Failed { .. } => vec![Line::new(Tone::Error, i18n.t("error"))],
    }
}

/// Banner under the enrollment form. Idle renders nothing.
pub fn render_enrollment(status: &EnrollmentStatus, i18n: &LocaleContext) -> Vec<Line> {
    match status {
        EnrollmentStatus::Idle => Vec::new(),
        EnrollmentStatus::Rejected(err) => vec![render_validation(err, i18n)],
        EnrollmentStatus::Succeeded => vec![Line::new(Tone::Success, i18n.t("userAdded"))],
        EnrollmentStatus::Failed(_) => vec![Line::new(Tone::Error, i18n.t("addUserFailed"))],
    }
}

/// Inline message for rejected input.
pub fn render_validation(err: &ValidationError, i18n: &LocaleContext) -> Line {
    let message = i18n.t(err.message_key());
    let text = match err {
        ValidationError::TooLarge { limit, .. } => {
            format!("{message} (max {} MB)", limit / (1024 * 1024))
        }
        ValidationError::UnsupportedType { mime } => format!("{message}: {mime}"),
        _ => message.to_string(),
    };
    Line::new(Tone::Error, text)
}
