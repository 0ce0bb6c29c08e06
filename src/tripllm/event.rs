//! Agent and Orchestrator event system.
//!
//! Provides a callback-based observability layer for planning sessions.
//! Implement [`EventHandler`] to receive real-time notifications about:
//!
//! - **Completion calls**: When each agent sends to and hears back from the service
//! - **Hand-offs**: Which role was chosen next and why
//! - **Session lifecycle**: Run start/end and agent selection per iteration.
//!   A run stopped by the iteration cap is reported through
//!   [`OrchestrationEvent::RunCompleted`] with `terminated_by: Cutoff`
//!
//! Console progress output belongs in a handler, not in the orchestrator. The
//! handler is wrapped in `Arc<dyn EventHandler>`; when registered on an
//! [`Orchestrator`](crate::orchestration::Orchestrator) via
//! [`with_event_handler`](crate::orchestration::Orchestrator::with_event_handler)
//! it is propagated to every agent, so both event families arrive through a
//! single callback.
//!
//! # Example
//!
//! ```rust,no_run
//! use tripllm::event::{AgentEvent, EventHandler, OrchestrationEvent};
//! use async_trait::async_trait;
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl EventHandler for Printer {
//!     async fn on_agent_event(&self, event: &AgentEvent) {
//!         if let AgentEvent::CompletionStarted { role, .. } = event {
//!             println!("{} is thinking...", role.label());
//!         }
//!     }
//!     async fn on_orchestration_event(&self, event: &OrchestrationEvent) {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

use crate::agent::AgentRole;
use crate::client_wrapper::TokenUsage;
use crate::orchestration::Termination;
use async_trait::async_trait;

/// Events emitted by an [`Agent`](crate::agent::Agent) while processing one input.
///
/// ```text
/// CompletionStarted
///   └─ CompletionCompleted  (or CompletionFailed)
/// ```
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Fired right before the completion service is called.
    CompletionStarted {
        role: AgentRole,
        /// Character length of the context handed to the agent.
        input_length: usize,
    },

    /// Fired after the completion service returned text.
    CompletionCompleted {
        role: AgentRole,
        /// Character length of the generated text.
        response_length: usize,
        tokens_used: Option<TokenUsage>,
        /// Successor chosen by the hand-off rule, `None` when terminal.
        next_role: Option<AgentRole>,
    },

    /// Fired when the completion service failed. The agent still returns a
    /// result; this event only reports the cause.
    CompletionFailed { role: AgentRole, error: String },
}

/// Events emitted by the [`Orchestrator`](crate::orchestration::Orchestrator)
/// during [`plan`](crate::orchestration::Orchestrator::plan).
#[derive(Debug, Clone)]
pub enum OrchestrationEvent {
    /// A validated request entered the loop.
    RunStarted {
        session_id: String,
        destination: String,
        max_iterations: usize,
    },

    /// An agent was resolved for the current iteration.
    AgentSelected {
        session_id: String,
        /// 1-based iteration counter.
        iteration: usize,
        role: AgentRole,
    },

    /// The agent produced a result without an `error` entry.
    AgentResponded {
        session_id: String,
        iteration: usize,
        role: AgentRole,
        message_length: usize,
    },

    /// The agent's result carries an `error` entry; the chain stops here.
    AgentFailed {
        session_id: String,
        iteration: usize,
        role: AgentRole,
        error: String,
    },

    /// The loop is following a hand-off to the next role.
    HandoffFollowed {
        session_id: String,
        from: AgentRole,
        to: AgentRole,
        reason: Option<String>,
    },

    /// The loop ended.
    RunCompleted {
        session_id: String,
        iterations: usize,
        total_tokens: usize,
        terminated_by: Termination,
    },
}

/// Receives [`AgentEvent`]s and [`OrchestrationEvent`]s.
///
/// Both methods default to no-ops so implementors only override what they
/// care about.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Called when an agent emits an event.
    async fn on_agent_event(&self, _event: &AgentEvent) {}

    /// Called when the orchestrator emits an event.
    async fn on_orchestration_event(&self, _event: &OrchestrationEvent) {}
}
