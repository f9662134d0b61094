//! Boundary to the remote face-recognition service.
//!
//! Workflows talk to the service only through [`FaceService`]; the HTTP
//! implementation lives in `idsnap-client`.

use crate::types::{AnnotatedImage, Identity, MediaAsset};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::future::Future;
use thiserror::Error;

/// MIME type assumed for an annotated image sent without a data-URL header.
const DEFAULT_ANNOTATED_MIME: &str = "image/jpeg";

/// Coarse failure category shown to the user. Raw detail stays in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Server,
    MalformedResponse,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("request could not be sent: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("service returned HTTP {status}")]
    Server { status: u16 },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ServiceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ServiceError::Network(_) | ServiceError::Timeout => FailureKind::Network,
            ServiceError::Server { .. } => FailureKind::Server,
            ServiceError::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }
}

/// Decoded answer to a recognition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionReply {
    Matched {
        identity: Identity,
        annotated_image: Option<AnnotatedImage>,
    },
    /// The service found no known face (empty or absent name).
    NoMatch,
}

/// A person to register with the service.
#[derive(Debug, Clone)]
pub struct NewPerson {
    pub name: String,
    pub info: String,
    pub image: MediaAsset,
}

/// The two operations the client needs from the recognition service.
pub trait FaceService: Send + Sync {
    /// Identify the face in `image`. Exactly one request per call; no retries.
    fn recognize(
        &self,
        image: &MediaAsset,
    ) -> impl Future<Output = Result<RecognitionReply, ServiceError>> + Send;

    /// Register a new person with a reference photo.
    fn enroll(&self, person: &NewPerson) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

#[derive(Deserialize)]
struct WireRecognition {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    info: Option<String>,
    #[serde(default)]
    image_with_landmarks: Option<String>,
}

/// Decode a successful `/recognize` response body.
///
/// An absent, null, or blank `name` means no match. The annotated image may
/// be bare base64 or a full `data:<mime>;base64,` URL.
pub fn decode_recognition(body: &[u8]) -> Result<RecognitionReply, ServiceError> {
    let wire: WireRecognition = serde_json::from_slice(body)
        .map_err(|e| ServiceError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let name = match wire.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Ok(RecognitionReply::NoMatch),
    };

    let annotated_image = match wire.image_with_landmarks.as_deref() {
        Some(encoded) if !encoded.trim().is_empty() => Some(decode_annotated(encoded)?),
        _ => None,
    };

    Ok(RecognitionReply::Matched {
        identity: Identity {
            name,
            info: wire.info.unwrap_or_default(),
        },
        annotated_image,
    })
}

fn decode_annotated(encoded: &str) -> Result<AnnotatedImage, ServiceError> {
    let (mime, payload) = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                ServiceError::MalformedResponse("annotated image data URL has no payload".into())
            })?;
            let mime = header
                .strip_suffix(";base64")
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_ANNOTATED_MIME);
            (mime, payload)
        }
        None => (DEFAULT_ANNOTATED_MIME, encoded),
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ServiceError::MalformedResponse(format!("annotated image: {e}")))?;

    Ok(AnnotatedImage {
        mime: mime.to_string(),
        bytes,
    })
}
