//! On-Air OpenAI: hosted generation and synthesis providers.
//!
//! Also carries the offline stand-ins the station falls back to when no
//! API key is configured.

pub mod chat;
pub mod simulated;
pub mod speech;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, InvalidHeaderValue};

/// OpenAI REST root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Builds the JSON + bearer headers every OpenAI call carries.
fn build_headers(api_key: &str) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {api_key}"))?,
    );
    Ok(headers)
}
