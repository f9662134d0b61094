//! Enrollment workflow: register a new person (name, info, reference photo).
//!
//! Validation happens before any request. A failed request keeps every
//! field so the operator can retry without retyping.

use crate::intake::{IntakeSource, MediaIntake, ValidationError};
use crate::recognition::{TicketGuard, WorkflowError};
use crate::service::{FaceService, FailureKind, NewPerson, ServiceError};
use crate::types::MediaAsset;
use uuid::Uuid;

/// What the form currently shows below its fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnrollmentStatus {
    #[default]
    Idle,
    /// Submission blocked locally; nothing was sent.
    Rejected(ValidationError),
    Succeeded,
    Failed(FailureKind),
}

/// Ticket for one enrollment request, handed out by [`EnrollmentWorkflow::begin`].
#[derive(Debug, Clone)]
pub struct EnrollmentRequest {
    pub id: Uuid,
    pub person: NewPerson,
}

pub struct EnrollmentWorkflow<S> {
    service: S,
    name: String,
    info: String,
    intake: MediaIntake,
    in_flight: Option<Uuid>,
    status: EnrollmentStatus,
}

impl<S: FaceService> EnrollmentWorkflow<S> {
    pub fn new(service: S, intake: MediaIntake) -> Self {
        Self {
            service,
            name: String::new(),
            info: String::new(),
            intake,
            in_flight: None,
            status: EnrollmentStatus::Idle,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn intake(&self) -> &MediaIntake {
        &self.intake
    }

    pub fn status(&self) -> &EnrollmentStatus {
        &self.status
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), WorkflowError> {
        self.ensure_idle()?;
        self.name = name.into();
        Ok(())
    }

    pub fn set_info(&mut self, info: impl Into<String>) -> Result<(), WorkflowError> {
        self.ensure_idle()?;
        self.info = info.into();
        Ok(())
    }

    /// Accept a reference photo. A new selection clears a previous
    /// success or failure banner.
    pub fn select_file(&mut self, source: IntakeSource) -> Result<&MediaAsset, WorkflowError> {
        self.ensure_idle()?;
        self.intake.select_file(source)?;
        self.status = EnrollmentStatus::Idle;
        self.intake.asset().ok_or(WorkflowError::NoAsset)
    }

    pub fn clear_file(&mut self) -> Result<(), WorkflowError> {
        self.ensure_idle()?;
        self.intake.clear();
        Ok(())
    }

    /// Whether the submit button is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_busy() && self.validate().is_ok()
    }

    fn ensure_idle(&self) -> Result<(), WorkflowError> {
        if self.is_busy() {
            tracing::debug!("enrollment form is locked while submitting");
            return Err(WorkflowError::Busy);
        }
        Ok(())
    }

    fn validate(&self) -> Result<&MediaAsset, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        self.intake.asset().ok_or(ValidationError::MissingImage)
    }

    /// Validate the form and start a request. Invalid input never reaches
    /// the service.
    pub fn begin(&mut self) -> Result<EnrollmentRequest, WorkflowError> {
        self.ensure_idle()?;
        let image = match self.validate() {
            Ok(image) => image.clone(),
            Err(err) => {
                tracing::info!(error = %err, "enrollment rejected");
                self.status = EnrollmentStatus::Rejected(err.clone());
                return Err(err.into());
            }
        };

        let id = Uuid::new_v4();
        self.in_flight = Some(id);
        self.status = EnrollmentStatus::Idle;
        tracing::info!(request = %id, name = %self.name, file = %image.name, "enrollment started");

        Ok(EnrollmentRequest {
            id,
            person: NewPerson {
                name: self.name.clone(),
                info: self.info.clone(),
                image,
            },
        })
    }

    /// Apply the service result for ticket `id`. Stale tickets are ignored.
    pub fn complete(&mut self, id: Uuid, result: Result<(), ServiceError>) -> &EnrollmentStatus {
        if self.in_flight != Some(id) {
            tracing::debug!(request = %id, "stale enrollment result discarded");
            return &self.status;
        }
        self.in_flight = None;

        self.status = match result {
            Ok(()) => {
                tracing::info!(request = %id, name = %self.name, "person enrolled");
                self.name.clear();
                self.info.clear();
                self.intake.clear();
                EnrollmentStatus::Succeeded
            }
            Err(err) => {
                tracing::warn!(request = %id, error = %err, "enrollment failed");
                EnrollmentStatus::Failed(err.kind())
            }
        };
        &self.status
    }

    /// Abandon the in-flight request, unlocking the form.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(id) => {
                tracing::info!(request = %id, "enrollment cancelled");
                true
            }
            None => false,
        }
    }

    /// Validate and send one enrollment request.
    ///
    /// Cancel-safe: dropping the future unlocks the form and keeps every
    /// field, as [`cancel`](Self::cancel) does.
    pub async fn submit(&mut self) -> Result<&EnrollmentStatus, WorkflowError> {
        let request = self.begin()?;
        let guard = TicketGuard::new(&mut self.in_flight, &mut self.status, |status| {
            *status = EnrollmentStatus::Idle
        });
        let result = self.service.enroll(&request.person).await;
        guard.disarm();
        Ok(self.complete(request.id, result))
    }
}

impl<S> std::fmt::Debug for EnrollmentWorkflow<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrollmentWorkflow")
            .field("name", &self.name)
            .field("info", &self.info)
            .field("intake", &self.intake)
            .field("in_flight", &self.in_flight)
            .field("status", &self.status)
            .finish()
    }
}
