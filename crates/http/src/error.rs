//! Error handling for the Libris HTTP layer
//!
//! Handlers return [`AppError`]. Turning one into a response attaches an
//! [`ErrorReport`] extension; the [`normalize_errors`] middleware then renders
//! the final envelope with the request path, method and timestamp, applying
//! the [`ErrorPolicy`] that decides what diagnostic detail leaves the process.
//! Error responses produced elsewhere (extractor rejections, 405s, timeouts)
//! are rewritten into the same envelope.

use axum::{
    body::Body,
    extract::{OriginalUri, Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

const INTERNAL_MESSAGE: &str = "Internal Server Error";
const MAX_REJECTION_BODY: usize = 64 * 1024;

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        details: Vec<String>,
        code: String,
        message: String,
    },

    #[error("bad request: {message}")]
    BadRequest {
        details: Option<Value>,
        code: String,
        message: String,
    },

    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("conflict: {message}")]
    Conflict {
        details: Value,
        code: String,
        message: String,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error listing every violated constraint
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation {
            message: errors.join(", "),
            details: errors,
            code: "validation_error".to_string(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            details: None,
            code: "bad_request".to_string(),
            message: message.into(),
        }
    }

    /// Create a conflict error; `details` should identify the offending field
    pub fn conflict(details: Value, message: impl Into<String>) -> Self {
        Self::Conflict {
            details,
            code: "conflict".to_string(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// Replace the machine-readable code
    pub fn with_code(mut self, new_code: impl Into<String>) -> Self {
        match &mut self {
            Self::Validation { code, .. }
            | Self::BadRequest { code, .. }
            | Self::NotFound { code, .. }
            | Self::Conflict { code, .. } => *code = new_code.into(),
            Self::Internal(_) => {}
        }
        self
    }

    /// Attach structured details to a bad request or conflict
    pub fn with_details(mut self, value: Value) -> Self {
        match &mut self {
            Self::BadRequest { details, .. } => *details = Some(value),
            Self::Conflict { details, .. } => *details = value,
            _ => {}
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Flatten into the transport-neutral report rendered by the normalizer
    pub fn into_report(self) -> ErrorReport {
        let status = self.status();
        let trace = format!("{self:?}");

        match self {
            Self::Validation {
                details,
                code,
                message,
            } => ErrorReport::domain(status, message, code, Some(json!(details)), trace),
            Self::BadRequest {
                details,
                code,
                message,
            } => ErrorReport::domain(status, message, code, details, trace),
            Self::NotFound { message, code } => {
                ErrorReport::domain(status, message, code, None, trace)
            }
            Self::Conflict {
                details,
                code,
                message,
            } => ErrorReport::domain(status, message, code, Some(details), trace),
            Self::Internal(e) => ErrorReport {
                status,
                message: INTERNAL_MESSAGE.to_string(),
                code: Some("internal_error".to_string()),
                details: None,
                cause: Some(format!("{e:#}")),
                trace,
            },
        }
    }
}

/// Everything known about a failure before the request context is added.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<String>,
    pub details: Option<Value>,
    /// Underlying message of an unexpected error. Never sent unless exposed.
    pub cause: Option<String>,
    pub trace: String,
}

impl ErrorReport {
    fn domain(
        status: StatusCode,
        message: String,
        code: String,
        details: Option<Value>,
        trace: String,
    ) -> Self {
        Self {
            status,
            message,
            code: Some(code),
            details,
            cause: None,
            trace,
        }
    }

    /// Report for an error response that did not come from [`AppError`]
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        let reason = status.canonical_reason().unwrap_or("Error").to_string();
        let (message, cause) = if status.is_server_error() {
            (INTERNAL_MESSAGE.to_string(), message)
        } else {
            (message.unwrap_or_else(|| reason.clone()), None)
        };
        let code = reason.to_lowercase().replace(' ', "_");

        Self {
            status,
            trace: format!("{} {}", status.as_u16(), reason),
            message,
            code: Some(code),
            details: None,
            cause,
        }
    }

    /// Render the envelope body for one request
    pub fn render(&self, method: &Method, path: &str, policy: &ErrorPolicy) -> ErrorEnvelope {
        let message = match (&self.cause, policy.expose_internal) {
            (Some(cause), true) => cause.clone(),
            _ => self.message.clone(),
        };

        ErrorEnvelope {
            error: ErrorBody {
                message,
                status: self.status.as_u16(),
                path: path.to_string(),
                method: method.to_string(),
                timestamp: now_rfc3339(),
                code: self.code.clone(),
                details: self.details.clone(),
                stack: policy.include_stack.then(|| self.trace.clone()),
            },
        }
    }
}

/// Standard error response format for all HTTP errors
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub status: u16,
    pub path: String,
    pub method: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// What diagnostic detail error responses may carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorPolicy {
    /// Attach a diagnostic trace string (`stack`).
    pub include_stack: bool,
    /// Report the underlying message of unexpected errors instead of a generic one.
    pub expose_internal: bool,
}

impl ErrorPolicy {
    pub fn from_settings(settings: &libris_kernel::settings::Settings) -> Self {
        Self {
            include_stack: !settings.environment.is_production(),
            expose_internal: settings.server.expose_internal_errors,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = self.into_report();
        // Until the normalizer adds request context this body is a best effort.
        let body = report.render(&Method::GET, "", &ErrorPolicy::default());
        let mut response = (report.status, Json(body)).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Router fallback: unroutable requests become a 404 domain error.
///
/// Nested routers inherit this fallback, so the path is read from the
/// original URI rather than the one stripped of the mount prefix.
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::not_found(format!("Route not found: {} {}", method, uri.path()))
}

/// Middleware producing the uniform error envelope for every failed request
pub async fn normalize_errors(
    State(policy): State<ErrorPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    let attached = response.extensions_mut().remove::<ErrorReport>();

    let report = match attached {
        Some(report) => report,
        None if response.status().is_client_error() || response.status().is_server_error() => {
            let status = response.status();
            let text = match axum::body::to_bytes(response.into_body(), MAX_REJECTION_BODY).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
                Err(_) => String::new(),
            };
            let message = (!text.is_empty()).then_some(text);
            let report = ErrorReport::from_status(status, message);
            return respond(report, &method, &path, &policy, Response::new(Body::empty()));
        }
        None => return response,
    };

    respond(report, &method, &path, &policy, response)
}

fn respond(
    report: ErrorReport,
    method: &Method,
    path: &str,
    policy: &ErrorPolicy,
    template: Response,
) -> Response {
    let error_id = Uuid::now_v7();
    if report.status.is_server_error() {
        tracing::error!(
            error_id = %error_id,
            error_code = report.code.as_deref().unwrap_or_default(),
            status_code = report.status.as_u16(),
            cause = report.cause.as_deref().unwrap_or_default(),
            %method,
            path,
            "request failed"
        );
    } else {
        tracing::warn!(
            error_id = %error_id,
            error_code = report.code.as_deref().unwrap_or_default(),
            status_code = report.status.as_u16(),
            %method,
            path,
            message = %report.message,
            "request rejected"
        );
    }

    let envelope = report.render(method, path, policy);
    let mut response = (report.status, Json(envelope)).into_response();
    for (name, value) in template.headers() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            response.headers_mut().append(name.clone(), value.clone());
        }
    }
    response
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339).unwrap_or_else(|_| now.to_string())
}
