//! Multi-Agent Travel Planning Demo
//!
//! Plans two trips with the four stock specialists:
//! - Tokyo with a $4,500 budget (planner hands off to the budget analyst)
//! - Iceland, planned after a reset so the histories do not mix
//!
//! Progress is printed by an `EventHandler`; the orchestrator itself prints nothing.
//!
//! To run this example, set the Azure OpenAI environment variables:
//! export AZURE_OPENAI_ENDPOINT=https://your-resource.openai.azure.com
//! export AZURE_OPENAI_DEPLOYMENT_NAME=your-deployment
//! export AZURE_OPENAI_API_VERSION=2024-02-15-preview
//! export AZURE_OPENAI_API_KEY=your_key
//!
//! Then run: cargo run --example travel_planner

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tripllm::cancel::CallOptions;
use tripllm::clients::azure::AzureOpenAIClient;
use tripllm::{
    AgentEvent, AzureOpenAIConfig, EventHandler, OrchestrationEvent, Orchestrator, TravelRequest,
};

struct ProgressPrinter;

#[async_trait]
impl EventHandler for ProgressPrinter {
    async fn on_agent_event(&self, event: &AgentEvent) {
        match event {
            AgentEvent::CompletionStarted { role, .. } => {
                println!("  {} is working...", role.label());
            }
            AgentEvent::CompletionFailed { role, error } => {
                println!("  {} failed: {}", role.label(), error);
            }
            _ => {}
        }
    }

    async fn on_orchestration_event(&self, event: &OrchestrationEvent) {
        match event {
            OrchestrationEvent::AgentSelected {
                iteration, role, ..
            } => {
                println!("Iteration {}: processing with {}", iteration, role);
            }
            OrchestrationEvent::HandoffFollowed { to, reason, .. } => {
                if let Some(reason) = reason {
                    println!("  Handoff reason: {}", reason);
                }
                println!("  Handing off to: {}\n{}", to, "-".repeat(40));
            }
            OrchestrationEvent::RunCompleted {
                iterations,
                total_tokens,
                terminated_by,
                ..
            } => {
                println!(
                    "Planning stopped ({:?}) after {} iterations, {} tokens",
                    terminated_by, iterations, total_tokens
                );
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tripllm::init_logger();

    println!("=== Multi-Agent Travel Planning System ===\n");

    let config = AzureOpenAIConfig::from_env()?;
    let client = Arc::new(AzureOpenAIClient::new(config));
    let mut orchestrator =
        Orchestrator::new(client).with_event_handler(Arc::new(ProgressPrinter));

    // Trip 1: Tokyo
    let tokyo = TravelRequest::new("Tokyo, Japan", "March 15-25, 2025", 4500.0, 2)
        .with_interests(vec!["culture", "food", "technology", "temples", "shopping"])
        .with_accommodation_type("mid-range hotel");

    println!("Travel Request:\n{}\n", tokyo.to_prompt());
    let outcome = orchestrator
        .plan_with(
            &tokyo,
            CallOptions::default().with_deadline(Duration::from_secs(600)),
        )
        .await?;

    for result in &outcome.results {
        println!("\n{}\n", result.message());
    }

    let summary = orchestrator.summary();
    println!("\n=== Travel Planning Summary ===");
    println!("Total results: {}", summary.total_results);
    println!(
        "Agents involved: {}",
        summary
            .agents_involved
            .iter()
            .map(|role| role.wire_name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Status: {:?}", summary.status);

    let exported = orchestrator.export_to_file(None)?;
    println!("Travel plan exported to: {}", exported.display());

    // Trip 2: Iceland, starting from a clean history
    orchestrator.reset();

    let iceland = TravelRequest::new("Iceland", "June 10-17, 2025", 3200.0, 1)
        .with_interests(vec!["nature", "photography", "hiking", "northern lights"])
        .with_accommodation_type("guesthouse");

    println!("\n=== Second trip ===\n");
    println!("Travel Request:\n{}\n", iceland.to_prompt());
    let outcome = orchestrator.plan(&iceland).await?;
    if let Some(last) = outcome.last() {
        println!("\nFinal recommendation:\n{}", last.message());
    }

    Ok(())
}
