//! The submission state machine.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use intake_core::{FormError, FormKind, FormModel, PayloadOptions, Validator};
use intake_transport::{Transport, TransportError};
use intake_types::{ErrorKind, Generation, Payload, SubmissionResult, SubmissionStatus, Verdict};
use tokio::sync::mpsc;

use crate::autosave::Autosave;
use crate::draft::DraftError;
use crate::error::{GENERIC_FAILURE_MESSAGE, SubmitError};
use crate::events::FormEvent;

pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct FormState {
    model: FormModel,
    status: SubmissionStatus,
    generation: Generation,
}

impl FormState {
    fn transition(&mut self, next: SubmissionStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.status
        );
        tracing::debug!(
            from = %self.status,
            to = %next,
            generation = %self.generation,
            "Submission status"
        );
        self.status = next;
    }
}

/// Owns one form and drives its submissions.
///
/// At most one attempt is in flight; a concurrent [`submit`](Self::submit)
/// is rejected with [`SubmitError::AlreadyInFlight`] without touching the
/// transport. The lock around the form is never held across an await.
pub struct SubmissionController<T> {
    kind: FormKind,
    transport: T,
    validator: Validator,
    timeout: Duration,
    payload_options: PayloadOptions,
    state: Mutex<FormState>,
    events: mpsc::UnboundedSender<FormEvent>,
    autosave: Option<Autosave>,
}

impl<T: Transport> SubmissionController<T> {
    pub fn new(kind: FormKind, transport: T, events: mpsc::UnboundedSender<FormEvent>) -> Self {
        Self {
            kind,
            transport,
            validator: Validator::default(),
            timeout: DEFAULT_SUBMIT_TIMEOUT,
            payload_options: PayloadOptions::default(),
            state: Mutex::new(FormState {
                model: kind.model(),
                status: SubmissionStatus::Idle,
                generation: Generation::default(),
            }),
            events,
            autosave: None,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_payload_options(mut self, options: PayloadOptions) -> Self {
        self.payload_options = options;
        self
    }

    pub fn with_autosave(mut self, autosave: Autosave) -> Self {
        self.autosave = Some(autosave);
        self
    }

    #[must_use]
    pub fn kind(&self) -> FormKind {
        self.kind
    }

    #[must_use]
    pub fn status(&self) -> SubmissionStatus {
        self.lock().status
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.lock().generation
    }

    /// A copy of the form as it stands.
    #[must_use]
    pub fn snapshot(&self) -> FormModel {
        self.lock().model.clone()
    }

    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        self.lock().model.progress_percent()
    }

    pub fn on_field_change(&self, id: &str, value: impl Into<String>) -> Result<(), FormError> {
        let snapshot = {
            let mut state = self.lock();
            state.model.set_value(id, value)?;
            state.model.to_payload(self.payload_options)
        };
        self.schedule_autosave(snapshot);
        Ok(())
    }

    pub fn on_checkbox_change(&self, id: &str, checked: bool) -> Result<(), FormError> {
        let snapshot = {
            let mut state = self.lock();
            state.model.set_checked(id, checked)?;
            state.model.to_payload(self.payload_options)
        };
        self.schedule_autosave(snapshot);
        Ok(())
    }

    /// Validate a single field when it loses focus.
    pub fn on_field_blur(&self, id: &str) -> Result<Verdict, FormError> {
        self.lock().model.validate_field(id, &self.validator)
    }

    /// Load the stored draft into the form. Returns how many fields changed.
    ///
    /// A form without autosave has no draft and restores nothing.
    pub fn restore_draft(&self) -> Result<usize, DraftError> {
        let Some(autosave) = &self.autosave else {
            return Ok(0);
        };
        let Some(draft) = autosave.load()? else {
            return Ok(0);
        };
        let restored = self.lock().model.restore(&draft);
        tracing::debug!(form = %self.kind, restored, "Draft restored");
        self.emit(FormEvent::DraftRestored { fields: restored });
        Ok(restored)
    }

    /// Fill the form from a payload shaped like a draft, then schedule an
    /// autosave. Unknown keys are ignored.
    pub fn prefill(&self, values: &Payload) -> usize {
        let (filled, snapshot) = {
            let mut state = self.lock();
            let filled = state.model.restore(values);
            (filled, state.model.to_payload(self.payload_options))
        };
        self.schedule_autosave(snapshot);
        filled
    }

    /// Write the current values to the draft store now, skipping the debounce.
    pub fn save_draft(&self) -> Result<(), DraftError> {
        let Some(autosave) = &self.autosave else {
            return Ok(());
        };
        let snapshot = self.lock().model.to_payload(self.payload_options);
        autosave.save_now(&snapshot, &self.events)
    }

    /// Close the form: reset to idle and invalidate any attempt in flight.
    ///
    /// A reply that arrives afterwards is discarded.
    pub fn abandon(&self) {
        let was_submitting = {
            let mut state = self.lock();
            let was_submitting = state.status == SubmissionStatus::Submitting;
            state.generation = state.generation.next();
            state.model.clear();
            state.transition(SubmissionStatus::Idle);
            was_submitting
        };
        if let Some(autosave) = &self.autosave {
            autosave.cancel();
        }
        if was_submitting {
            self.emit(FormEvent::InProgressCleared);
        }
        tracing::debug!(form = %self.kind, "Form abandoned");
    }

    pub async fn submit(&self) -> Result<(), SubmitError> {
        let (generation, payload) = self.begin()?;
        self.emit(FormEvent::InProgress);
        let mut attempt = Attempt {
            controller: self,
            generation,
            settled: false,
        };

        let endpoint = self.kind.endpoint();
        let reply = match tokio::time::timeout(self.timeout, self.transport.send(endpoint, &payload))
            .await
        {
            Ok(Ok(reply)) => reply.interpret(self.kind.rejection_fallback()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TransportError::Timeout(self.timeout.as_millis())),
        };

        attempt.settled = true;
        self.settle(generation, reply)
    }

    /// Guard, validate and project the payload, all under one lock.
    fn begin(&self) -> Result<(Generation, Payload), SubmitError> {
        let mut state = self.lock();
        if !state.status.can_start() {
            tracing::debug!(form = %self.kind, status = %state.status, "Submission already in flight");
            return Err(SubmitError::AlreadyInFlight);
        }

        state.generation = state.generation.next();
        state.transition(SubmissionStatus::Validating);

        let errors = state.model.validate_all(&self.validator);
        if !errors.is_empty() {
            state.transition(SubmissionStatus::Failed);
            drop(state);
            let err = SubmitError::ValidationFailed(errors.clone());
            self.emit(FormEvent::FieldErrors(errors));
            self.emit(FormEvent::Failed {
                kind: ErrorKind::ValidationFailed,
                message: err.user_message(),
            });
            return Err(err);
        }

        state.transition(SubmissionStatus::Submitting);
        let form = state.model.to_payload(self.payload_options);
        Ok((state.generation, self.kind.wire_payload(&form)))
    }

    fn settle(
        &self,
        generation: Generation,
        reply: Result<SubmissionResult, TransportError>,
    ) -> Result<(), SubmitError> {
        let mut state = self.lock();
        if state.generation != generation {
            tracing::debug!(
                form = %self.kind,
                attempt = %generation,
                current = %state.generation,
                "Discarding reply for abandoned attempt"
            );
            return Err(SubmitError::Abandoned);
        }

        match reply {
            Ok(SubmissionResult::Success) => {
                state.transition(SubmissionStatus::Succeeded);
                state.model.clear();
                drop(state);
                self.discard_draft();
                tracing::info!(form = %self.kind, "Submission succeeded");
                self.emit(FormEvent::Succeeded {
                    message: self.kind.success_message().to_string(),
                });
                Ok(())
            }
            Ok(SubmissionResult::Failure(message)) => {
                state.transition(SubmissionStatus::Failed);
                drop(state);
                tracing::warn!(form = %self.kind, %message, "Submission rejected by server");
                self.emit(FormEvent::Failed {
                    kind: ErrorKind::ApplicationRejected,
                    message: message.clone(),
                });
                Err(SubmitError::ApplicationRejected(message))
            }
            Err(e) => {
                state.transition(SubmissionStatus::Failed);
                drop(state);
                tracing::warn!(form = %self.kind, error = %e, "Submission transport failure");
                self.emit(FormEvent::Failed {
                    kind: ErrorKind::TransportFailure,
                    message: GENERIC_FAILURE_MESSAGE.to_string(),
                });
                Err(SubmitError::TransportFailure(e))
            }
        }
    }

    fn discard_draft(&self) {
        if let Some(autosave) = &self.autosave
            && let Err(e) = autosave.discard()
        {
            tracing::warn!(key = autosave.key(), "Failed to discard draft: {e}");
        }
    }

    fn schedule_autosave(&self, snapshot: Payload) {
        if let Some(autosave) = &self.autosave {
            autosave.schedule(snapshot, self.events.clone());
        }
    }
}

impl<T> SubmissionController<T> {
    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: FormEvent) {
        let _ = self.events.send(event);
    }
}

/// Clears the in-progress indication when an attempt ends, however it ends.
///
/// If the `submit` future is dropped before the reply is settled the attempt
/// is marked failed. An attempt already invalidated by `abandon()` was
/// cleared there and emits nothing.
struct Attempt<'a, T> {
    controller: &'a SubmissionController<T>,
    generation: Generation,
    settled: bool,
}

impl<T> Drop for Attempt<'_, T> {
    fn drop(&mut self) {
        let mut state = self.controller.lock();
        if state.generation != self.generation {
            return;
        }
        if !self.settled && state.status == SubmissionStatus::Submitting {
            tracing::debug!(attempt = %self.generation, "Submission dropped before reply");
            state.transition(SubmissionStatus::Failed);
        }
        drop(state);
        self.controller.emit(FormEvent::InProgressCleared);
    }
}
