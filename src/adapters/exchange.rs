//! Request/response exchange shared by every relay stage.
//!
//! Sends one request through the port, logs what came back and reduces it
//! to a `RequestOutcome`.

use crate::domain::outcome::{RequestFailure, RequestOutcome, StatusPolicy};
use crate::ports::http::{HttpPort, HttpRequest};

/// What the caller needs from a successful response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyExpectation {
    /// The body is the payload; a non-JSON body is worth a warning
    Json,
    /// Only the status matters; any body is fine
    Any,
}

/// Send `request` and classify the result.
///
/// `label` names the call in log lines ("tokens", "cache", "forward").
pub async fn exchange<H>(
    http: &H,
    label: &str,
    request: HttpRequest,
    policy: StatusPolicy,
    expect: BodyExpectation,
) -> RequestOutcome
where
    H: HttpPort + ?Sized,
{
    let method = request.method.as_str();
    let url = request.full_url();
    tracing::debug!(call = label, %method, %url, "Sending request");

    let result = http.send(request).await;

    let headers = match result {
        Ok(ref response) => {
            tracing::info!(call = label, url = %response.url, status = response.status, "Response received");
            tracing::debug!(call = label, headers = ?response.headers, "Response headers");
            response.headers.clone()
        }
        Err(_) => Vec::new(),
    };

    let outcome = RequestOutcome::classify(result, policy);

    match &outcome {
        RequestOutcome::Json { body, .. } => {
            tracing::debug!(
                call = label,
                "Response body:\n{}",
                serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string())
            );
        }
        RequestOutcome::Text { status, body } => match expect {
            BodyExpectation::Json => {
                tracing::warn!(call = label, status, "Raw response text (not valid JSON):\n{}", body);
            }
            BodyExpectation::Any => {
                tracing::debug!(call = label, status, "Raw response:\n{}", body);
            }
        },
        RequestOutcome::Failed(RequestFailure::Transport(e)) => {
            tracing::error!(call = label, %url, "Error making request: {}", e);
        }
        RequestOutcome::Failed(RequestFailure::HttpStatus { status, body }) => {
            tracing::error!(
                call = label,
                %url,
                status,
                headers = ?headers,
                "Error response body{}:\n{}",
                if body.is_json() { "" } else { " (raw text)" },
                body.render()
            );
        }
    }

    outcome
}
