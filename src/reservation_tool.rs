use crate::dates;
use crate::error::ConciergeError;
use crate::metrics::{inc_reservation_error, inc_reservation_success};
use crate::places;
use crate::voice::{self, CallRequest};
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::Deserialize;
use serde_json::json;
use std::env;
use std::time::Duration;
use tracing::{info, instrument};

const POLL_ATTEMPTS: u32 = 10;
const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// API parameters provided by model
#[derive(Debug, Deserialize, Default)]
pub struct ReservationArgs {
    restaurant: String,
    location: String,
    date: String,
    time: Option<String>,
    party_size: Option<u8>,
    reservation_name: Option<String>,
}

#[derive(Debug)]
pub struct ReservationTool;

impl Tool for ReservationTool {
    const NAME: &'static str = "book_restaurant";
    type Error = ConciergeError;
    type Args = ReservationArgs;
    type Output = String;

    async fn definition(&self, _param: String) -> ToolDefinition {
        ToolDefinition {
            name: "book_restaurant".to_string(),
            description: "Look up a restaurant and call it to make a reservation".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "restaurant": { "type": "string", "description": "Restaurant name or search term (e.g., 'Frances' or 'sushi')" },
                    "location": { "type": "string", "description": "City or neighborhood to search in (e.g., 'San Francisco')" },
                    "date": { "type": "string", "description": "Requested date in natural language (e.g., 'tomorrow', 'next Friday', 'Jan 30th')" },
                    "time": { "type": "string", "description": "Preferred time (e.g., '7pm')" },
                    "party_size": { "type": "integer", "description": "Number of guests" },
                    "reservation_name": { "type": "string", "description": "Name the reservation should be under" }
                },
                "required": ["restaurant", "location", "date"]
            }),
        }
    }

    #[instrument(name = "call_reservation_tool")]
    async fn call(&self, args: ReservationArgs) -> Result<String, ConciergeError> {
        let places_key =
            env::var("YELP_API_KEY").map_err(|_| ConciergeError::MissingApiKey("YELP_API_KEY"))?;
        let voice_key =
            env::var("BLAND_API_KEY").map_err(|_| ConciergeError::MissingApiKey("BLAND_API_KEY"))?;
        match book(&places_key, &voice_key, args).await {
            Ok(summary) => {
                inc_reservation_success();
                Ok(summary)
            }
            Err(e) => {
                inc_reservation_error(&e);
                Err(e)
            }
        }
    }
}

async fn book(
    places_key: &str,
    voice_key: &str,
    args: ReservationArgs,
) -> Result<String, ConciergeError> {
    // An unresolved date rides through verbatim so the call script still
    // reads naturally to the restaurant host.
    let when = dates::resolve(&args.date);
    if let (Some(date), Some(day_of_week)) = (when.date, when.day_of_week.as_deref()) {
        info!("Resolved '{}' to {} ({})", when.original, date, day_of_week);
    } else {
        info!(
            "Could not resolve date expression '{}', passing it through as spoken",
            when.original
        );
    }
    let restaurant = places::find_restaurant(places_key, &args.restaurant, &args.location).await?;
    let task = reservation_prompt(
        &restaurant.name,
        &when.formatted,
        args.time.as_deref(),
        args.party_size.unwrap_or(2),
        args.reservation_name.as_deref(),
    );
    let request = CallRequest {
        phone_number: restaurant.phone.clone(),
        task,
        voice: None,
        max_duration: Some(10),
    };
    let dispatch = voice::place_call(voice_key, &request).await?;
    info!(
        "Reservation call {} dispatched to {}",
        dispatch.call_id, restaurant.name
    );
    let final_status =
        voice::wait_for_completion(voice_key, &dispatch.call_id, POLL_ATTEMPTS, POLL_INTERVAL)
            .await?;
    let rated = restaurant
        .rating
        .map(|r| format!(", rated {:.1}", r))
        .unwrap_or_default();
    Ok(format!(
        "Reservation call to {} at {}{} ({}) for {} is {} (call id {}).",
        restaurant.name,
        restaurant.display_address,
        rated,
        restaurant.phone,
        when.formatted,
        final_status,
        dispatch.call_id
    ))
}

/// Call script the voice platform reads from.
fn reservation_prompt(
    restaurant: &str,
    date: &str,
    time: Option<&str>,
    party_size: u8,
    name: Option<&str>,
) -> String {
    let mut task = format!(
        "You are an AI assistant calling {} to make a reservation on behalf of a customer. \
         Ask to book a table for {} on {}",
        restaurant, party_size, date
    );
    if let Some(time) = time {
        task.push_str(&format!(" at {}", time));
    }
    task.push('.');
    if let Some(name) = name {
        task.push_str(&format!(" The reservation should be under the name {}.", name));
    }
    task.push_str(
        " If that slot is unavailable, ask for the closest available time. Confirm the final \
         date and time back to the host, thank them, and end the call politely.",
    );
    task
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleanup_test_env() {
        unsafe {
            env::remove_var("YELP_API_KEY");
            env::remove_var("BLAND_API_KEY");
        }
    }

    #[test]
    fn test_reservation_tool_definition() {
        let tool = ReservationTool;
        let definition = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(tool.definition("test".to_string()));

        assert_eq!(definition.name, "book_restaurant");
        assert!(definition.description.contains("reservation"));
        assert!(definition.parameters.to_string().contains("restaurant"));
        assert!(definition.parameters.to_string().contains("date"));
    }

    #[test]
    fn test_missing_api_key_error() {
        cleanup_test_env();
        let tool = ReservationTool;
        let args = ReservationArgs {
            restaurant: "Frances".to_string(),
            location: "San Francisco".to_string(),
            date: "next Friday".to_string(),
            ..Default::default()
        };

        let result = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(tool.call(args));

        assert!(matches!(result, Err(ConciergeError::MissingApiKey(_))));
    }

    #[test]
    fn test_reservation_prompt_with_all_details() {
        let task = reservation_prompt("Frances", "Friday, March 22nd", Some("7pm"), 2, Some("Alex"));
        assert!(task.contains("calling Frances"));
        assert!(task.contains("a table for 2 on Friday, March 22nd at 7pm."));
        assert!(task.contains("under the name Alex"));
    }

    #[test]
    fn test_reservation_prompt_passes_unresolved_date_text_through() {
        let task = reservation_prompt("Frances", "whenever works", None, 4, None);
        assert!(task.contains("a table for 4 on whenever works."));
        assert!(!task.contains("under the name"));
    }
}
