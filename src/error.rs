//! Error handling

use std::time::Duration;

use axum::response::IntoResponse;
use tracing::info;

/// Failure talking to one of the hosted backends.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BackendError {
    /// The request never produced a response (connect, timeout, body read).
    Transport(String),
    /// The backend answered with a non-success status.
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for the log.
        body: String,
    },
    /// The response body was not what the backend contract promises.
    Decode(String),
    /// A backend URL could not be built.
    InvalidUrl(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "request failed: {msg}"),
            Self::Status { status, body } => write!(f, "backend returned {status}: {body}"),
            Self::Decode(msg) => write!(f, "unexpected response: {msg}"),
            Self::InvalidUrl(msg) => write!(f, "invalid backend url: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for BackendError {
    fn from(err: url::ParseError) -> Self {
        BackendError::InvalidUrl(err.to_string())
    }
}

/// Failure of a single panel's work item. Never fatal to the run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PanelError {
    /// The image-generation call failed.
    ImageRequest(BackendError),
    /// The image-generation response had no usable image URL.
    MissingImageUrl(String),
    /// Fetching the generated image failed.
    Download(BackendError),
    /// The worker running this item panicked or was aborted.
    WorkerPanicked(String),
}

impl std::fmt::Display for PanelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImageRequest(err) => write!(f, "image generation failed: {err}"),
            Self::MissingImageUrl(msg) => write!(f, "no image url in response: {msg}"),
            Self::Download(err) => write!(f, "image download failed: {err}"),
            Self::WorkerPanicked(msg) => write!(f, "worker did not finish: {msg}"),
        }
    }
}

impl std::error::Error for PanelError {}

/// Errors that fail a whole story run.
#[derive(Debug)]
pub enum StoryError {
    /// The inbound request was unusable.
    BadRequest(String),
    /// The narrative backend returned no panels.
    EmptyNarrative,
    /// The narrative backend returned something other than the panel JSON.
    MalformedResponse(String),
    /// The narrative backend could not be reached or refused the call.
    NarrativeBackend(BackendError),
    /// The rendering backend failed; there is no fallback renderer.
    RenderingBackend(BackendError),
    /// The run took longer than the configured deadline.
    DeadlineExceeded(Duration),
}

impl std::fmt::Display for StoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            Self::EmptyNarrative => write!(f, "The generated narrative contains no panels"),
            Self::MalformedResponse(msg) => {
                write!(f, "The narrative backend returned malformed JSON: {msg}")
            }
            Self::NarrativeBackend(err) => write!(f, "Narrative generation failed: {err}"),
            Self::RenderingBackend(err) => write!(f, "HTML rendering failed: {err}"),
            Self::DeadlineExceeded(deadline) => write!(
                f,
                "Story generation did not finish within {} seconds",
                deadline.as_secs()
            ),
        }
    }
}

impl std::error::Error for StoryError {}

impl IntoResponse for StoryError {
    fn into_response(self) -> axum::response::Response {
        match self {
            StoryError::BadRequest(message) => {
                info!("Bad request received: {message}");
                let mut response =
                    axum::response::Response::new(axum::body::Body::from(message));
                *response.status_mut() = axum::http::StatusCode::BAD_REQUEST;
                response
            }
            other => {
                tracing::error!("Story generation failed: {}", other);
                let mut response =
                    axum::response::Response::new(axum::body::Body::from(other.to_string()));
                *response.status_mut() = axum::http::StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_errors_map_to_internal_server_error() {
        let response = StoryError::EmptyNarrative.into_response();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );

        let response = StoryError::RenderingBackend(BackendError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        })
        .into_response();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_request_maps_to_400() {
        let response = StoryError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn panel_error_display_names_the_stage() {
        let err = PanelError::Download(BackendError::Status {
            status: 404,
            body: String::new(),
        });
        assert_eq!(
            err.to_string(),
            "image download failed: backend returned 404: "
        );
    }
}
