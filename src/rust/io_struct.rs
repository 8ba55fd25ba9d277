use serde::{Deserialize, Serialize};

pub use crate::classifier::Classification as ClassifyResponse;

pub const SERVICE_NAME: &str = "Transaction Classification API";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifyRequest {
    pub description: String,
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub status: String,
    pub available_categories: Vec<String>,
}

impl ServiceInfo {
    pub fn running(categories: &[String]) -> Self {
        Self {
            message: SERVICE_NAME.to_string(),
            status: "running".to_string(),
            available_categories: categories.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Error body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}
