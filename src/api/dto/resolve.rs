//! Payloads for the redirect and password verification endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPasswordRequest {
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

/// Returned by the verify endpoint so the caller can navigate itself;
/// a 307 after a POST would replay the body.
#[derive(Debug, Serialize)]
pub struct ResolvedLinkResponse {
    pub original_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PasswordRequiredResponse {
    pub password_required: bool,
    pub code: String,
}

impl PasswordRequiredResponse {
    pub fn for_code(code: &str) -> Self {
        Self {
            password_required: true,
            code: code.to_string(),
        }
    }
}
