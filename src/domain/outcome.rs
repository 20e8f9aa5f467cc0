//! Request Outcomes
//!
//! Every call the relay makes (token list, market cache, forward) is reduced
//! to a `RequestOutcome`. Stage errors are derived from it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::ports::http::{HttpResponse, TransportError};

/// Response body, parsed when it is JSON and kept raw otherwise
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(raw.to_string()),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ResponseBody::Json(_))
    }

    /// Pretty JSON or the raw text, for logs
    pub fn render(&self) -> String {
        match self {
            ResponseBody::Json(v) => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
            ResponseBody::Text(t) => t.clone(),
        }
    }
}

/// How to treat a non-2xx response whose body is valid JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Any non-2xx status is a failure
    #[default]
    RequireSuccess,
    /// A non-2xx status with a JSON body counts as success
    AcceptJsonBody,
}

/// Why a request produced no usable result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("HTTP status {status}")]
    HttpStatus { status: u16, body: ResponseBody },
}

impl RequestFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestFailure::Transport(_) => None,
            RequestFailure::HttpStatus { status, .. } => Some(*status),
        }
    }

    pub fn body(&self) -> Option<&ResponseBody> {
        match self {
            RequestFailure::Transport(_) => None,
            RequestFailure::HttpStatus { body, .. } => Some(body),
        }
    }
}

/// Result of one HTTP call
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// Accepted status with a JSON body
    Json { status: u16, body: Value },
    /// Accepted status with a body that is not JSON
    Text { status: u16, body: String },
    Failed(RequestFailure),
}

impl RequestOutcome {
    /// Classify a transport result under the given status policy
    pub fn classify(
        result: Result<HttpResponse, TransportError>,
        policy: StatusPolicy,
    ) -> Self {
        let response = match result {
            Ok(r) => r,
            Err(e) => return RequestOutcome::Failed(e.into()),
        };

        let status = response.status;
        let body = ResponseBody::parse(&response.body);
        let accepted = response.is_success()
            || (policy == StatusPolicy::AcceptJsonBody && body.is_json());

        match (accepted, body) {
            (true, ResponseBody::Json(body)) => RequestOutcome::Json { status, body },
            (true, ResponseBody::Text(body)) => RequestOutcome::Text { status, body },
            (false, body) => RequestOutcome::Failed(RequestFailure::HttpStatus { status, body }),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RequestOutcome::Json { status, .. } | RequestOutcome::Text { status, .. } => {
                Some(*status)
            }
            RequestOutcome::Failed(f) => f.status(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RequestOutcome::Failed(_))
    }
}

/// Failure of a fetch stage (token list or market cache)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("Transport error: {0}")]
    Transport(TransportError),

    #[error("HTTP status {status}")]
    HttpStatus { status: u16, body: ResponseBody },

    #[error("Response body is not valid JSON (status {status})")]
    Decode { status: u16, text: String },

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl From<RequestFailure> for StageError {
    fn from(failure: RequestFailure) -> Self {
        match failure {
            RequestFailure::Transport(e) => StageError::Transport(e),
            RequestFailure::HttpStatus { status, body } => StageError::HttpStatus { status, body },
        }
    }
}
