use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::identity::SnapshotImportError;
use crate::workflows::verification::LookupError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotImportError),
    #[error("gateway error: {0}")]
    Gateway(#[from] LookupError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Snapshot(_) => StatusCode::BAD_REQUEST,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn display_prefixes_the_failing_layer() {
        let err = AppError::from(LookupError::Status { status: 503 });
        assert_eq!(err.to_string(), "gateway error: provider returned HTTP 503");
        assert!(err.source().is_some());

        let err = AppError::from(ConfigError::InvalidPort);
        assert_eq!(
            err.to_string(),
            "configuration error: APP_PORT must be a valid u16"
        );
    }

    #[test]
    fn responses_map_to_status_codes() {
        let snapshot = AppError::from(SnapshotImportError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "directory.csv",
        )));
        assert_eq!(snapshot.into_response().status(), StatusCode::BAD_REQUEST);

        let gateway = AppError::from(LookupError::Timeout(std::time::Duration::from_secs(30)));
        assert_eq!(gateway.into_response().status(), StatusCode::BAD_GATEWAY);

        let io = AppError::from(io::Error::new(io::ErrorKind::AddrInUse, "port 3000"));
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
