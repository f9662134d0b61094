//! idsnap-core — Media intake and request workflows for the IDSnap client.
//!
//! Validates and previews user-supplied photos, then drives exactly one
//! recognition or enrollment request per operator action. The remote
//! service is reached only through the [`FaceService`] trait.

pub mod enrollment;
pub mod i18n;
pub mod intake;
pub mod preview;
pub mod recognition;
pub mod service;
pub mod types;
pub mod view;

#[cfg(test)]
mod testing;

pub use enrollment::{EnrollmentStatus, EnrollmentWorkflow};
pub use i18n::{Locale, LocaleContext};
pub use intake::{AcceptPattern, IntakeConfig, IntakeSource, MediaIntake, ValidationError};
pub use preview::{BlobRegistry, PreviewHost, PreviewResource};
pub use recognition::{RecognitionOutcome, RecognitionWorkflow, WorkflowError};
pub use service::{FaceService, FailureKind, NewPerson, RecognitionReply, ServiceError};
pub use types::{AnnotatedImage, Identity, MediaAsset};
