use crate::error::ConciergeError;
use serde_json::Value;
use tracing::{error, info, instrument};

const SEARCH_ENDPOINT: &str = "https://api.yelp.com/v3/businesses/search";

/// Restaurant details needed to place a reservation call.
#[derive(Debug, Clone)]
pub struct Restaurant {
    pub name: String,
    pub phone: String,
    pub display_address: String,
    pub rating: Option<f64>,
}

/// Normalize a phone number to E.164 for the calling platform. Bare
/// 10-digit US numbers pick up a country code; numbers that already
/// carry one round-trip unchanged.
pub fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!("+1{}", digits)
    } else {
        format!("+{}", digits)
    }
}

/// Look up the best-matching restaurant for a search term near a location.
#[instrument(skip(api_key))]
pub async fn find_restaurant(
    api_key: &str,
    term: &str,
    location: &str,
) -> Result<Restaurant, ConciergeError> {
    let client = reqwest::Client::new();
    let response = client
        .get(SEARCH_ENDPOINT)
        .bearer_auth(api_key)
        .query(&[("term", term), ("location", location), ("limit", "1")])
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
            "Places search failed with status {}: response: {}",
            status, text
        );
        return Err(ConciergeError::ApiError(format!(
            "Status: {}, Response: {}",
            status, text
        )));
    }
    let data: Value = serde_json::from_str(&text)
        .map_err(|e| ConciergeError::HttpRequestFailed(e.to_string()))?;
    let business = data
        .get("businesses")
        .and_then(|b| b.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| ConciergeError::NoRestaurantFound(format!("'{}' near {}", term, location)))?;
    let name = business
        .get("name")
        .and_then(|n| n.as_str())
        .unwrap_or(term)
        .to_string();
    let phone = business
        .get("phone")
        .and_then(|p| p.as_str())
        .filter(|p| !p.is_empty())
        .or_else(|| {
            business
                .get("display_phone")
                .and_then(|p| p.as_str())
                .filter(|p| !p.is_empty())
        })
        .ok_or_else(|| {
            ConciergeError::InvalidResponse(format!("Business '{}' has no phone number", name))
        })?;
    let phone = format_phone(phone);
    let display_address = business
        .get("location")
        .and_then(|l| l.get("display_address"))
        .and_then(|a| a.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();
    let rating = business.get("rating").and_then(|r| r.as_f64());
    info!("Resolved restaurant '{}' at {}", name, phone);
    Ok(Restaurant {
        name,
        phone,
        display_address,
        rating,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone_bare_us_number() {
        assert_eq!(format_phone("(415) 749-2060"), "+14157492060");
        assert_eq!(format_phone("415.749.2060"), "+14157492060");
    }

    #[test]
    fn test_format_phone_already_e164() {
        assert_eq!(format_phone("+14157492060"), "+14157492060");
    }

    #[test]
    fn test_format_phone_international() {
        assert_eq!(format_phone("+44 20 7946 0958"), "+442079460958");
    }

    #[test]
    fn test_format_phone_garbage_keeps_surviving_digits() {
        assert_eq!(format_phone("call me"), "+");
        assert_eq!(format_phone("ext. 12345"), "+12345");
    }
}
