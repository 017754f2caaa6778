//! Error types for the dashboard host

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gizmo_engine::GizmoError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by the dashboard
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Rejected by the engine (unknown node, type mismatch, ...)
    #[error(transparent)]
    Engine(#[from] GizmoError),

    /// The engine thread is gone
    #[error("Engine host has stopped")]
    EngineStopped,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Engine(GizmoError::UnknownNode(_) | GizmoError::UnknownAttribute { .. }) => {
                StatusCode::NOT_FOUND
            }
            Self::Engine(
                GizmoError::TypeMismatch { .. }
                | GizmoError::ReadOnlyAttribute { .. }
                | GizmoError::NotBindable { .. }
                | GizmoError::BindingLoop { .. },
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::EngineStopped => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            DashboardError::from(GizmoError::UnknownNode("z".to_string())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DashboardError::from(GizmoError::ReadOnlyAttribute {
                node: "a".to_string(),
                attribute: "out_1".to_string(),
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            DashboardError::EngineStopped.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
