//! REST API types

use crate::services::CandleData;
use serde::{Deserialize, Serialize};

/// Response envelope shared by every endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success_with_message(message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: Some(message.to_string()),
            data: None,
        }
    }

    pub fn success_with_data(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            data: Some(data),
        }
    }
}

/// Placeholder payload for responses that carry no data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Empty {}

/// GET /api/v1/symbols query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolsQuery {
    #[serde(default)]
    pub category: Option<String>,
}

/// POST /api/v1/bars body
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    pub bars: Vec<CandleData>,
}
