//! # TripLLM
//!
//! TripLLM plans trips with a small team of LLM-backed specialists that hand work to each
//! other in sequence. A [`TravelRequest`] enters at the travel planner; each agent's result
//! names the next role until the booking coordinator closes the plan.
//!
//! The crate provides:
//!
//! * **Role-driven agents**: [`Agent`] executes any [`agent::AgentDefinition`] (instructions,
//!   keyword hand-off rule, structured data keys). The four stock roles are data, not subtypes.
//! * **Sequential orchestration**: [`Orchestrator`] follows hand-offs with a hard iteration
//!   cap, keeps the planning history, and exports it as JSON.
//! * **Deadlines and cancellation**: [`cancel::CallOptions`] bounds every completion call of
//!   a session.
//! * **Observability**: [`event::EventHandler`] receives agent and orchestration events.
//! * **Provider flexibility**: [`ClientWrapper`] implemented for Azure OpenAI and any
//!   OpenAI-compatible endpoint.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tripllm::{AzureOpenAIConfig, Orchestrator, TravelRequest};
//! use tripllm::clients::azure::AzureOpenAIClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     tripllm::init_logger();
//!
//!     let client = Arc::new(AzureOpenAIClient::new(AzureOpenAIConfig::from_env()?));
//!     let mut orchestrator = Orchestrator::new(client);
//!
//!     let request = TravelRequest::new("Tokyo, Japan", "March 15-25, 2025", 4500.0, 2)
//!         .with_interests(vec!["culture", "food", "technology"])
//!         .with_accommodation_type("boutique hotel");
//!
//!     let outcome = orchestrator.plan(&request).await?;
//!     for result in &outcome.results {
//!         println!("{}\n", result.message());
//!     }
//!     println!("Stopped: {:?}", outcome.terminated_by);
//!
//!     let path = orchestrator.export_to_file(None)?;
//!     println!("Exported to {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Custom agents
//!
//! Swap any role for your own definition. A definition that hands off to its own role is
//! rejected:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tripllm::agent::{AgentDefinition, AgentRole, Handoff, HandoffRule};
//! use tripllm::clients::openai::OpenAIClient;
//! use tripllm::Orchestrator;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(OpenAIClient::new_with_model_string("sk-...", "gpt-4o-mini"));
//! let terse_analyst = AgentDefinition::new(
//!     AgentRole::BudgetAnalyst,
//!     "Give a three-line budget split.",
//!     HandoffRule::Always(Handoff::new(AgentRole::ActivitySpecialist, "Budget done")),
//!     "budget_analysis",
//! );
//!
//! let orchestrator = Orchestrator::new(client.clone()).with_agent(terse_analyst, client)?;
//! # let _ = orchestrator;
//! # Ok(())
//! # }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Applications embedding TripLLM can opt in to `RUST_LOG` driven diagnostics
/// without choosing a logging backend upfront.
///
/// ```rust
/// tripllm::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `tripllm` module.
pub mod tripllm;

// Re-exporting key items for easier external access.
pub use tripllm::agent;
pub use tripllm::agent::{Agent, AgentResult, AgentRole};
pub use tripllm::cancel;
pub use tripllm::client_wrapper;
pub use tripllm::client_wrapper::{ClientWrapper, Message, Role, ServiceError, TokenUsage};
pub use tripllm::clients;
pub use tripllm::config;
pub use tripllm::config::{AzureOpenAIConfig, OrchestratorConfig};
pub use tripllm::event;
pub use tripllm::event::{AgentEvent, EventHandler, OrchestrationEvent};
pub use tripllm::orchestration;
pub use tripllm::orchestration::{Orchestrator, PlanOutcome, PlanningError, Termination};
pub use tripllm::request;
pub use tripllm::request::TravelRequest;
