//! Registry error types - distinguishes error kinds so the API handlers
//! can map them to the right HTTP status codes.

use axum::http::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("No board instance named '{0}'")]
    InstanceNotFound(String),

    /// Construction failure from the board backend, passed through
    /// unmodified.
    #[error("{0}")]
    Backend(#[from] anyhow::Error),
}

impl RegistryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InstanceNotFound(_) => StatusCode::NOT_FOUND,
            Self::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InstanceNotFound(_) => "INSTANCE_NOT_FOUND",
            Self::Backend(_) => "BACKEND_ERROR",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "error": self.to_string(),
            "error_code": self.error_code(),
        })
    }
}

impl axum::response::IntoResponse for RegistryError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = axum::Json(self.to_json());
        (status, body).into_response()
    }
}
