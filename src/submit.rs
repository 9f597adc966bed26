// Submission controller: owns the request lifecycle for one form.
//
// A submission is split into `begin` (gate + snapshot), the awaited transport
// call, and `settle` (projection into the form). Drivers that run the
// transport call as a separate task use the three steps directly; the
// terminal view uses `submit_until`, which chains them and races the call
// against a cancellation future.

use crate::api::{endpoint_url, AnalysisRequest, LocalTransport, Outcome, SubmitFailure};
use crate::form::{validate, FormState, OutcomeKind, ValidationError};
use crate::project::project;
use serde::Deserialize;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// What `begin` does when a submission is already pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightPolicy {
    /// Refuse the new submission.
    #[default]
    Reject,
    /// Supersede the pending submission. Its late settlement is dropped.
    Replace,
}

impl FromStr for FlightPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "replace" => Ok(Self::Replace),
            other => Err(format!("unknown flight policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("a submission is already in progress")]
    InFlight,
}

/// Handle for one started submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    request: AnalysisRequest,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> &AnalysisRequest {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// The outcome was projected into the form.
    Applied(Outcome),
    /// A later submission started first; the form was left untouched.
    Stale,
    /// Cancelled before the transport settled; the message is unchanged.
    Cancelled,
}

pub struct SubmissionController<T> {
    transport: T,
    url: String,
    timeout: Option<Duration>,
    policy: FlightPolicy,
}

impl<T> SubmissionController<T> {
    pub fn new(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            url: endpoint_url(base_url),
            timeout: None,
            policy: FlightPolicy::default(),
        }
    }

    /// `None` waits for the transport indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_policy(mut self, policy: FlightPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Gate the form and snapshot its fields into a request.
    ///
    /// Nothing about the form changes when this returns an error.
    pub fn begin(&self, form: &mut FormState) -> Result<Ticket, SubmitRejected> {
        validate(form)?;
        if let Some(pending) = form.pending {
            match self.policy {
                FlightPolicy::Reject => {
                    tracing::debug!(pending, "submission rejected, one already in flight");
                    return Err(SubmitRejected::InFlight);
                }
                FlightPolicy::Replace => {
                    tracing::info!(pending, "superseding pending submission");
                }
            }
        }

        let generation = form.generation.wrapping_add(1);
        form.mark_submitting(generation);
        let request = AnalysisRequest {
            config_path: form.config_path().to_owned(),
            base_dir: form.base_dir().to_owned(),
        };
        tracing::info!(generation, url = %self.url, "submission started");
        Ok(Ticket {
            generation,
            request,
        })
    }

    /// Apply `outcome` if `ticket` is still the pending submission.
    pub fn settle(&self, form: &mut FormState, ticket: Ticket, outcome: Outcome) -> Settlement {
        if form.pending != Some(ticket.generation) {
            tracing::debug!(
                generation = ticket.generation,
                pending = ?form.pending,
                "dropping stale settlement"
            );
            return Settlement::Stale;
        }

        let kind = match &outcome {
            Ok(_) => OutcomeKind::Succeeded,
            Err(failure) => {
                tracing::warn!(generation = ticket.generation, %failure, "submission failed");
                OutcomeKind::Failed
            }
        };
        form.complete(project(&outcome), kind);
        tracing::info!(generation = ticket.generation, ?kind, "submission settled");
        Settlement::Applied(outcome)
    }

    /// Drop a pending submission without touching the message.
    ///
    /// Returns false if `ticket` was no longer the pending one.
    pub fn abandon(&self, form: &mut FormState, ticket: &Ticket) -> bool {
        if form.pending != Some(ticket.generation) {
            return false;
        }
        form.clear_pending();
        tracing::info!(generation = ticket.generation, "submission cancelled");
        true
    }
}

impl<T: LocalTransport> SubmissionController<T> {
    /// Issue the POST, bounded by the configured timeout.
    pub async fn dispatch(&self, request: &AnalysisRequest) -> Outcome {
        let call = self.transport.post(&self.url, request);
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SubmitFailure::Timeout(limit)),
            },
            None => call.await,
        }
    }

    pub async fn submit(&self, form: &mut FormState) -> Result<Settlement, SubmitRejected> {
        self.submit_until(form, std::future::pending::<()>()).await
    }

    /// Run one full submission, abandoning it if `cancel` resolves first.
    pub async fn submit_until<F>(
        &self,
        form: &mut FormState,
        cancel: F,
    ) -> Result<Settlement, SubmitRejected>
    where
        F: Future<Output = ()>,
    {
        let ticket = self.begin(form)?;
        let request = ticket.request().clone();

        tokio::select! {
            outcome = self.dispatch(&request) => Ok(self.settle(form, ticket, outcome)),
            _ = cancel => {
                self.abandon(form, &ticket);
                Ok(Settlement::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AnalysisResponse;
    use crate::form::Status;

    fn form() -> FormState {
        let mut form = FormState::new();
        form.set_config_path("/etc/cfg.yaml");
        form.set_base_dir("/data");
        form
    }

    fn ok(message: &str) -> Outcome {
        Ok(AnalysisResponse {
            message: message.into(),
            output_path: None,
        })
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Reject".parse::<FlightPolicy>(), Ok(FlightPolicy::Reject));
        assert_eq!(" replace ".parse::<FlightPolicy>(), Ok(FlightPolicy::Replace));
        assert!("queue".parse::<FlightPolicy>().is_err());
    }

    #[test]
    fn begin_snapshots_fields_and_marks_submitting() {
        let ctl = SubmissionController::new((), "http://svc");
        let mut form = form();
        let ticket = ctl.begin(&mut form).unwrap();
        assert_eq!(form.status(), Status::Submitting);
        assert_eq!(ticket.request().config_path, "/etc/cfg.yaml");

        // edits after begin don't leak into the in-flight request
        form.set_config_path("/other.yaml");
        assert_eq!(ticket.request().config_path, "/etc/cfg.yaml");
    }

    #[test]
    fn begin_rejects_invalid_form_without_side_effects() {
        let ctl = SubmissionController::new((), "http://svc");
        let mut form = FormState::new();
        form.set_base_dir("/data");
        assert_eq!(
            ctl.begin(&mut form),
            Err(SubmitRejected::Invalid(ValidationError::EmptyConfigPath))
        );
        assert_eq!(form.status(), Status::Idle);
        assert!(form.pending.is_none());
    }

    #[test]
    fn reject_policy_refuses_second_begin() {
        let ctl = SubmissionController::new((), "http://svc");
        let mut form = form();
        let _first = ctl.begin(&mut form).unwrap();
        assert_eq!(ctl.begin(&mut form), Err(SubmitRejected::InFlight));
        assert_eq!(form.status(), Status::Submitting);
    }

    #[test]
    fn replace_policy_drops_superseded_settlement() {
        let ctl = SubmissionController::new((), "http://svc").with_policy(FlightPolicy::Replace);
        let mut form = form();
        let first = ctl.begin(&mut form).unwrap();
        let second = ctl.begin(&mut form).unwrap();
        assert!(second.generation() > first.generation());

        assert_eq!(ctl.settle(&mut form, second, ok("second")), Settlement::Applied(ok("second")));
        assert_eq!(ctl.settle(&mut form, first, ok("first")), Settlement::Stale);
        assert_eq!(form.message(), "second");
        assert_eq!(form.status(), Status::Idle);
    }

    #[test]
    fn settling_an_old_ticket_after_a_newer_one_started_is_stale() {
        let ctl = SubmissionController::new((), "http://svc").with_policy(FlightPolicy::Replace);
        let mut form = form();
        let first = ctl.begin(&mut form).unwrap();
        let _second = ctl.begin(&mut form).unwrap();

        assert_eq!(ctl.settle(&mut form, first, ok("first")), Settlement::Stale);
        assert_eq!(form.message(), "");
        assert_eq!(form.status(), Status::Submitting);
    }

    #[test]
    fn abandon_keeps_previous_message() {
        let ctl = SubmissionController::new((), "http://svc");
        let mut form = form();
        let t = ctl.begin(&mut form).unwrap();
        ctl.settle(&mut form, t, ok("done"));

        let t = ctl.begin(&mut form).unwrap();
        assert!(ctl.abandon(&mut form, &t));
        assert_eq!(form.message(), "done");
        assert_eq!(form.status(), Status::Idle);
        assert!(!ctl.abandon(&mut form, &t));
    }
}
