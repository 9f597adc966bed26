// Result projector: maps a settled outcome to the single line shown under
// the form. Pure; the same input always renders the same text.

use crate::api::{AnalysisResponse, Outcome, SubmitFailure};

const ERROR_PREFIX: &str = "Error: ";

/// Shown when the request never produced a response.
pub const NETWORK_FALLBACK: &str = "request failed";
pub const MALFORMED_FALLBACK: &str = "malformed response from server";
pub const TIMEOUT_FALLBACK: &str = "request timed out";

pub fn project(outcome: &Outcome) -> String {
    match outcome {
        Ok(response) => project_response(response),
        Err(failure) => project_failure(failure),
    }
}

pub fn project_response(response: &AnalysisResponse) -> String {
    response.message.clone()
}

pub fn project_failure(failure: &SubmitFailure) -> String {
    let cause = match failure {
        SubmitFailure::Server { error, .. } => error.as_str(),
        SubmitFailure::Network { .. } => NETWORK_FALLBACK,
        SubmitFailure::Malformed { .. } => MALFORMED_FALLBACK,
        SubmitFailure::Timeout(_) => TIMEOUT_FALLBACK,
    };
    format!("{ERROR_PREFIX}{cause}")
}
