//! Recognition workflow: owns one intake and at most one in-flight
//! `/recognize` request.
//!
//! ```text
//! Idle ──begin──▶ Analyzing ──complete──▶ Matched | NoMatch | Failed
//!  ▲                  │ cancel                       │
//!  └──────────────────┴────── select / clear / reset ┘
//! ```

use crate::intake::{IntakeSource, MediaIntake, ValidationError};
use crate::service::{FaceService, FailureKind, RecognitionReply, ServiceError};
use crate::types::{AnnotatedImage, MediaAsset};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("a request is already in flight")]
    Busy,
    #[error("no file selected")]
    NoAsset,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Tagged result of the current (or last) analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    Pending,
    Matched {
        name: String,
        info: String,
        annotated_image: Option<AnnotatedImage>,
    },
    NoMatch,
    Failed {
        reason: FailureKind,
    },
}

impl RecognitionOutcome {
    fn from_result(result: Result<RecognitionReply, ServiceError>) -> Self {
        match result {
            Ok(RecognitionReply::Matched {
                identity,
                annotated_image,
            }) => RecognitionOutcome::Matched {
                name: identity.name,
                info: identity.info,
                annotated_image,
            },
            Ok(RecognitionReply::NoMatch) => RecognitionOutcome::NoMatch,
            Err(err) => RecognitionOutcome::Failed { reason: err.kind() },
        }
    }
}

/// Releases an in-flight ticket when the future driving it is dropped before
/// the result is applied. Disarm once the result is in hand.
pub(crate) struct TicketGuard<'a, T> {
    in_flight: &'a mut Option<Uuid>,
    state: &'a mut T,
    reset: fn(&mut T),
    armed: bool,
}

impl<'a, T> TicketGuard<'a, T> {
    pub(crate) fn new(
        in_flight: &'a mut Option<Uuid>,
        state: &'a mut T,
        reset: fn(&mut T),
    ) -> Self {
        Self {
            in_flight,
            state,
            reset,
            armed: true,
        }
    }

    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl<T> Drop for TicketGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(id) = self.in_flight.take() {
            (self.reset)(&mut *self.state);
            tracing::info!(request = %id, "request abandoned before completion");
        }
    }
}

/// Ticket for one analysis request, handed out by [`RecognitionWorkflow::begin`].
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub id: Uuid,
    pub asset: MediaAsset,
}

pub struct RecognitionWorkflow<S> {
    service: S,
    intake: MediaIntake,
    /// `None` is Idle; `Some(Pending)` is Analyzing.
    outcome: Option<RecognitionOutcome>,
    in_flight: Option<Uuid>,
}

impl<S: FaceService> RecognitionWorkflow<S> {
    pub fn new(service: S, intake: MediaIntake) -> Self {
        Self {
            service,
            intake,
            outcome: None,
            in_flight: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn intake(&self) -> &MediaIntake {
        &self.intake
    }

    pub fn outcome(&self) -> Option<&RecognitionOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.outcome.is_none()
    }

    /// Drop zone hover. Ignored while analyzing.
    pub fn drag_enter(&mut self) -> bool {
        !self.is_analyzing() && self.intake.drag_enter()
    }

    pub fn drag_leave(&mut self) -> bool {
        self.intake.drag_leave()
    }

    /// Hand a drop or picker event to the intake. Intake is disabled while a
    /// request is in flight.
    pub fn select_file(&mut self, source: IntakeSource) -> Result<&MediaAsset, WorkflowError> {
        if self.is_analyzing() {
            tracing::debug!("file selection rejected: analysis in flight");
            return Err(WorkflowError::Busy);
        }
        self.intake.select_file(source)?;
        self.outcome = None;
        self.intake.asset().ok_or(WorkflowError::NoAsset)
    }

    /// Remove the selected file and its preview.
    pub fn clear_file(&mut self) -> Result<(), WorkflowError> {
        if self.is_analyzing() {
            return Err(WorkflowError::Busy);
        }
        self.intake.clear();
        self.outcome = None;
        Ok(())
    }

    /// Return to Idle from a terminal state, keeping the selected file.
    pub fn reset(&mut self) -> Result<(), WorkflowError> {
        if self.is_analyzing() {
            return Err(WorkflowError::Busy);
        }
        self.outcome = None;
        Ok(())
    }

    /// Start an analysis. This is the only gate to the service: while a
    /// ticket is outstanding every further `begin` fails with `Busy`.
    pub fn begin(&mut self) -> Result<AnalysisRequest, WorkflowError> {
        if self.is_analyzing() {
            tracing::debug!("analysis already in flight");
            return Err(WorkflowError::Busy);
        }
        let asset = self.intake.asset().ok_or(WorkflowError::NoAsset)?.clone();
        let id = Uuid::new_v4();
        self.in_flight = Some(id);
        self.outcome = Some(RecognitionOutcome::Pending);
        tracing::info!(request = %id, file = %asset.name, size = asset.size(), "analysis started");
        Ok(AnalysisRequest { id, asset })
    }

    /// Apply the service result for ticket `id`.
    ///
    /// Results for tickets that are no longer in flight (cancelled) are
    /// discarded and leave the outcome untouched.
    pub fn complete(
        &mut self,
        id: Uuid,
        result: Result<RecognitionReply, ServiceError>,
    ) -> Option<&RecognitionOutcome> {
        if self.in_flight != Some(id) {
            tracing::debug!(request = %id, "stale analysis result discarded");
            return self.outcome.as_ref();
        }
        Some(self.finish(id, result))
    }

    fn finish(
        &mut self,
        id: Uuid,
        result: Result<RecognitionReply, ServiceError>,
    ) -> &RecognitionOutcome {
        self.in_flight = None;
        if let Err(err) = &result {
            tracing::warn!(request = %id, error = %err, "analysis failed");
        }
        let outcome = RecognitionOutcome::from_result(result);
        match &outcome {
            RecognitionOutcome::Matched { name, .. } => {
                tracing::info!(request = %id, name = %name, "analysis matched")
            }
            other => tracing::info!(request = %id, outcome = ?other, "analysis finished"),
        }
        self.outcome.insert(outcome)
    }

    /// Abandon the in-flight request; its result will be discarded.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(id) => {
                tracing::info!(request = %id, "analysis cancelled");
                self.outcome = None;
                true
            }
            None => false,
        }
    }

    /// Run one analysis of the selected file: exactly one service call.
    ///
    /// Cancel-safe: dropping the future before it resolves abandons the
    /// request and returns the workflow to Idle, as [`cancel`](Self::cancel) does.
    pub async fn submit(&mut self) -> Result<&RecognitionOutcome, WorkflowError> {
        let request = self.begin()?;
        let guard = TicketGuard::new(&mut self.in_flight, &mut self.outcome, |outcome| {
            *outcome = None
        });
        let result = self.service.recognize(&request.asset).await;
        guard.disarm();
        Ok(self.finish(request.id, result))
    }
}

impl<S> std::fmt::Debug for RecognitionWorkflow<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionWorkflow")
            .field("intake", &self.intake)
            .field("outcome", &self.outcome)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}
