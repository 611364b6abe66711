use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConciergeError {
    #[error("HTTP request failed: {0}")]
    HttpRequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Missing API key: {0}")]
    MissingApiKey(&'static str),
    #[error("No restaurant found for {0}")]
    NoRestaurantFound(String),
}
