mod dates;
mod error;
mod intro_call_tool;
mod metrics;
mod otel;
mod places;
mod reservation_tool;
mod voice;

use dotenv::dotenv;
use intro_call_tool::IntroCallTool;
use reservation_tool::ReservationTool;
use rig::agent::Agent;
use rig::completion::Prompt;
use rig::providers::openai;
use rig::providers::openai::completion::CompletionModel;
use std::env;
use tracing::{info, instrument};

#[instrument(skip(agent))]
async fn run_concierge(
    agent: &Agent<CompletionModel>,
    request: &str,
) -> Result<String, anyhow::Error> {
    info!("Handling concierge request: {}", request);
    let response = agent.prompt(request).await?;
    info!("Received concierge response");
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();

    // OTEL graceful shutdown on success or error exit
    let _otel_guard = otel::init_otel()?;

    info!("Starting concierge agent");

    let openai_client = openai::Client::from_env();

    // Wire up model to the calling tools
    let agent = openai_client
        .agent("gpt-4.1")
        .preamble(
            "You are a personal concierge assistant. You can introduce yourself to new \
             contacts over the phone and call restaurants to book reservations. Use the \
             tools to place calls, and report call ids and outcomes back to the user.",
        )
        .tool(IntroCallTool)
        .tool(ReservationTool)
        .build();

    let request = env::args().skip(1).collect::<Vec<_>>().join(" ");
    let request = if request.is_empty() {
        "Book me a table for two at Frances in San Francisco next Friday at 7pm, \
         under the name Alex."
            .to_string()
    } else {
        request
    };

    let response = run_concierge(&agent, &request).await?;

    println!("Agent response:\n{}", response);
    Ok(())
}
