//! errors.rs
//! Taxonomía de errores del motor de campañas y su traducción a HTTP.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::models::campaign_model::CampaignState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CampaignError {
    /// La sesión de WhatsApp no está conectada; la campaña no arranca.
    #[error("WhatsApp session is not ready")]
    TransportNotReady,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// pause/resume/stop pedido desde un estado que no lo permite.
    #[error("cannot {action} campaign {id} while it is {from}")]
    InvalidTransition {
        id: String,
        from: CampaignState,
        action: &'static str,
    },

    #[error("campaign not found: {0}")]
    NotFound(String),

    /// Ya hay un dispatch loop dueño de esta campaña.
    #[error("campaign {0} already has a running dispatch loop")]
    AlreadyDispatching(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type CampaignResult<T> = Result<T, CampaignError>;

impl ResponseError for CampaignError {
    fn status_code(&self) -> StatusCode {
        match self {
            CampaignError::TransportNotReady => StatusCode::SERVICE_UNAVAILABLE,
            CampaignError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CampaignError::InvalidTransition { .. } | CampaignError::AlreadyDispatching(_) => {
                StatusCode::CONFLICT
            }
            CampaignError::NotFound(_) => StatusCode::NOT_FOUND,
            CampaignError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.to_string()
        }))
    }
}
