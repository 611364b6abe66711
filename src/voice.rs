use crate::error::ConciergeError;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

const CALLS_ENDPOINT: &str = "https://api.bland.ai/v1/calls";

/// Outbound call request for the Bland calling platform.
#[derive(Debug, Serialize)]
pub struct CallRequest {
    pub phone_number: String,
    pub task: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Call length cap in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u32>,
}

#[derive(Debug)]
pub struct CallDispatch {
    pub call_id: String,
    pub status: String,
}

#[instrument(skip(api_key, request), fields(phone = %request.phone_number))]
pub async fn place_call(
    api_key: &str,
    request: &CallRequest,
) -> Result<CallDispatch, ConciergeError> {
    info!("Dispatching outbound call");
    let client = reqwest::Client::new();
    let response = client
        .post(CALLS_ENDPOINT)
        .header("authorization", api_key)
        .json(request)
        .send()
        .await
        .map_err(|e| ConciergeError::HttpRequestFailed(e.to_string()))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ConciergeError::HttpRequestFailed(e.to_string()))?;
    if !status.is_success() {
        error!(
            "Call dispatch failed with status {}: response: {}",
            status, text
        );
        return Err(ConciergeError::ApiError(format!(
            "Status: {}, Response: {}",
            status, text
        )));
    }
    let data: Value = serde_json::from_str(&text)
        .map_err(|e| ConciergeError::HttpRequestFailed(e.to_string()))?;
    let call_id = data
        .get("call_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            ConciergeError::InvalidResponse("No call_id in dispatch response".to_string())
        })?
        .to_string();
    let status = data
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("queued")
        .to_string();
    Ok(CallDispatch { call_id, status })
}

#[instrument(skip(api_key))]
pub async fn call_status(api_key: &str, call_id: &str) -> Result<String, ConciergeError> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/{}", CALLS_ENDPOINT, call_id))
        .header("authorization", api_key)
        .send()
        .await
        .map_err(|e| ConciergeError::HttpRequestFailed(e.to_string()))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ConciergeError::HttpRequestFailed(e.to_string()))?;
    if !status.is_success() {
        return Err(ConciergeError::ApiError(format!(
            "Call status lookup failed: {}: {}",
            status, text
        )));
    }
    let data: Value = serde_json::from_str(&text)
        .map_err(|e| ConciergeError::HttpRequestFailed(e.to_string()))?;
    data.get("status")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ConciergeError::InvalidResponse("No status in call record".to_string()))
}

/// Poll a dispatched call until it settles or the attempts run out.
/// Returns the last status seen either way.
pub async fn wait_for_completion(
    api_key: &str,
    call_id: &str,
    attempts: u32,
    interval: Duration,
) -> Result<String, ConciergeError> {
    let mut last = String::from("queued");
    for attempt in 0..attempts {
        if attempt > 0 {
            tokio::time::sleep(interval).await;
        }
        last = call_status(api_key, call_id).await?;
        debug!("Call {} status after poll {}: {}", call_id, attempt + 1, last);
        if last == "completed" || last == "failed" {
            return Ok(last);
        }
    }
    Ok(last)
}
