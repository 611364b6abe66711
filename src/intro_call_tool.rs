use crate::error::ConciergeError;
use crate::metrics::{inc_intro_call_error, inc_intro_call_success};
use crate::places::format_phone;
use crate::voice::{self, CallRequest};
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::Deserialize;
use serde_json::json;
use std::env;
use tracing::{info, instrument};

const DEFAULT_ASSISTANT_NAME: &str = "Aria";

/// API parameters provided by model
#[derive(Debug, Deserialize, Default)]
pub struct IntroCallArgs {
    phone_number: String,
    recipient_name: Option<String>,
    assistant_name: Option<String>,
    purpose: Option<String>,
}

#[derive(Debug)]
pub struct IntroCallTool;

impl Tool for IntroCallTool {
    const NAME: &'static str = "place_intro_call";
    type Error = ConciergeError;
    type Args = IntroCallArgs;
    type Output = String;

    async fn definition(&self, _param: String) -> ToolDefinition {
        ToolDefinition {
            name: "place_intro_call".to_string(),
            description: "Place an outbound phone call that introduces the assistant to someone"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "phone_number": { "type": "string", "description": "Phone number to call, digits with optional country code (e.g., '+14155550123' or '(415) 555-0123')" },
                    "recipient_name": { "type": "string", "description": "Name of the person being called, if known" },
                    "assistant_name": { "type": "string", "description": "Name the assistant should introduce itself with" },
                    "purpose": { "type": "string", "description": "Short reason for the call, mentioned after the greeting" }
                },
                "required": ["phone_number"]
            }),
        }
    }

    #[instrument(name = "call_intro_call_tool")]
    async fn call(&self, args: IntroCallArgs) -> Result<String, ConciergeError> {
        let api_key =
            env::var("BLAND_API_KEY").map_err(|_| ConciergeError::MissingApiKey("BLAND_API_KEY"))?;
        let assistant = args
            .assistant_name
            .unwrap_or_else(|| DEFAULT_ASSISTANT_NAME.to_string());
        let request = CallRequest {
            phone_number: format_phone(&args.phone_number),
            task: intro_prompt(
                &assistant,
                args.recipient_name.as_deref(),
                args.purpose.as_deref(),
            ),
            voice: None,
            max_duration: Some(5),
        };
        let dispatch = match voice::place_call(&api_key, &request).await {
            Ok(dispatch) => dispatch,
            Err(e) => {
                inc_intro_call_error(&e);
                return Err(e);
            }
        };
        inc_intro_call_success();
        info!("Introduction call dispatched: {}", dispatch.call_id);
        Ok(format!(
            "Introduction call to {} dispatched (call id {}, status: {}).",
            request.phone_number, dispatch.call_id, dispatch.status
        ))
    }
}

/// Call script the voice platform reads from.
fn intro_prompt(assistant: &str, recipient: Option<&str>, purpose: Option<&str>) -> String {
    let mut task = format!(
        "You are {}, a friendly AI assistant making a brief introduction call.",
        assistant
    );
    if let Some(recipient) = recipient {
        task.push_str(&format!(" You are calling {}.", recipient));
    }
    task.push_str(
        " Greet them warmly, introduce yourself by name, and explain that you can help \
         with everyday tasks like booking restaurant reservations over the phone.",
    );
    if let Some(purpose) = purpose {
        task.push_str(&format!(" Mention that you are calling because: {}.", purpose));
    }
    task.push_str(" Keep the call short and polite, and say goodbye before hanging up.");
    task
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleanup_test_env() {
        unsafe { env::remove_var("BLAND_API_KEY") };
    }

    #[test]
    fn test_intro_call_tool_definition() {
        let tool = IntroCallTool;
        let definition = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(tool.definition("test".to_string()));

        assert_eq!(definition.name, "place_intro_call");
        assert!(definition.description.contains("introduces the assistant"));
        assert!(definition.parameters.to_string().contains("phone_number"));
    }

    #[test]
    fn test_missing_api_key_error() {
        cleanup_test_env();
        let tool = IntroCallTool;
        let args = IntroCallArgs {
            phone_number: "(415) 555-0123".to_string(),
            ..Default::default()
        };

        let result = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(tool.call(args));

        assert!(matches!(result, Err(ConciergeError::MissingApiKey(_))));
    }

    #[test]
    fn test_intro_prompt_mentions_persona_and_recipient() {
        let task = intro_prompt("Aria", Some("Jordan"), Some("your upcoming dinner"));
        assert!(task.contains("You are Aria"));
        assert!(task.contains("calling Jordan"));
        assert!(task.contains("your upcoming dinner"));
        assert!(task.contains("say goodbye"));
    }

    #[test]
    fn test_intro_prompt_without_optionals() {
        let task = intro_prompt("Aria", None, None);
        assert!(task.contains("You are Aria"));
        assert!(!task.contains("calling because"));
    }
}
