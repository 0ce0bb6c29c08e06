//! Sequential hand-off orchestration.
//!
//! The [`Orchestrator`] owns one [`Agent`] per [`AgentRole`] and drives a
//! planning session as a chain: the planner runs first, and each result's
//! `next_role` picks the agent that runs after it. The chain stops when a
//! result names no successor, when a result records a failure, or when the
//! iteration cap is reached.
//!
//! ```text
//! travel_planner ──($ / budget)──► budget_analyst ──► activity_specialist ──► booking_coordinator
//!        └───────────(otherwise)──────────────────────────┘
//! ```
//!
//! Each agent receives the previous agent's message plus a short digest of
//! the two most recent results of the current run (see [`build_context`]).
//! Results of a run are appended to the orchestrator's history, which
//! [`Orchestrator::summary`] and [`Orchestrator::export_plan`] read.
//!
//! # Example
//!
//! ```rust,no_run
//! use tripllm::{AzureOpenAIConfig, Orchestrator, TravelRequest};
//! use tripllm::clients::azure::AzureOpenAIClient;
//! use std::sync::Arc;
//!
//! # async {
//! let client = Arc::new(AzureOpenAIClient::new(AzureOpenAIConfig::from_env().unwrap()));
//! let mut orchestrator = Orchestrator::new(client);
//!
//! let request = TravelRequest::new("Tokyo, Japan", "March 15-25, 2025", 4500.0, 2)
//!     .with_interests(vec!["culture", "food", "technology"]);
//!
//! let outcome = orchestrator.plan(&request).await.unwrap();
//! for result in &outcome.results {
//!     println!("{}", result.message());
//! }
//! # };
//! ```

use crate::agent::{Agent, AgentDefinition, AgentResult, AgentRole};
use crate::cancel::CallOptions;
use crate::client_wrapper::ClientWrapper;
use crate::config::OrchestratorConfig;
use crate::event::{EventHandler, OrchestrationEvent};
use crate::request::TravelRequest;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Errors returned by [`Orchestrator::plan`] and the orchestrator builders.
///
/// Completion-service failures are not in here: they are recorded as
/// failed [`AgentResult`]s inside the returned outcome.
///
/// ```
/// use tripllm::orchestration::PlanningError;
///
/// let err = PlanningError::InvalidRequest("traveler_count must be at least 1".into());
/// assert_eq!(err.to_string(), "Invalid travel request: traveler_count must be at least 1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanningError {
    /// The request violates a caller-side constraint. No service call was made.
    InvalidRequest(String),

    /// An agent definition was rejected (for example it hands off to itself).
    InvalidAgent(String),
}

impl fmt::Display for PlanningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanningError::InvalidRequest(msg) => write!(f, "Invalid travel request: {}", msg),
            PlanningError::InvalidAgent(msg) => write!(f, "Invalid agent definition: {}", msg),
        }
    }
}

impl Error for PlanningError {}

/// Why a planning run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The last agent named no successor.
    Natural,
    /// The iteration cap was reached while a successor was still pending.
    Cutoff,
    /// The last result records a service failure or a missing agent.
    Error,
    /// The last result records a deadline or cancellation.
    Cancelled,
}

/// Everything one [`Orchestrator::plan`] run produced.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// Fresh UUID per run, also carried by every [`OrchestrationEvent`].
    pub session_id: String,
    /// Results of this run only, in invocation order.
    pub results: Vec<AgentResult>,
    pub terminated_by: Termination,
    /// Number of agent invocations performed.
    pub iterations: usize,
    /// Sum of reported token usage; 0 when the client does not track usage.
    pub total_tokens_used: usize,
}

impl PlanOutcome {
    pub fn roles(&self) -> Vec<AgentRole> {
        self.results.iter().map(AgentResult::role).collect()
    }

    pub fn last(&self) -> Option<&AgentResult> {
        self.results.last()
    }

    pub fn is_complete(&self) -> bool {
        self.terminated_by == Termination::Natural
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Complete,
    NotStarted,
}

/// Overview of the orchestrator's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub total_results: usize,
    /// Role of every result in history order, repeats included.
    pub agents_involved: Vec<AgentRole>,
    pub distinct_roles_invoked: usize,
    pub status: PlanStatus,
    pub generated_at: DateTime<Utc>,
}

/// Build the text handed to the next agent.
///
/// With no earlier results the input is returned unchanged. Otherwise the
/// input is followed by a `Previous Agent Analysis:` header and one line per
/// result for the last `window` entries of `previous`.
///
/// ```
/// use tripllm::orchestration::build_context;
///
/// assert_eq!(build_context("plan a trip", &[], 2), "plan a trip");
/// ```
pub fn build_context(input: &str, previous: &[AgentResult], window: usize) -> String {
    if previous.is_empty() {
        return input.to_string();
    }

    let mut parts = vec![input.to_string(), "\nPrevious Agent Analysis:".to_string()];
    let start = previous.len().saturating_sub(window);
    for result in &previous[start..] {
        parts.push(format!("\n{}: {}", result.role().wire_name(), result.message()));
    }
    parts.join("\n")
}

/// Drives the hand-off chain and keeps the planning history.
///
/// `plan` takes `&mut self`: one session runs at a time per orchestrator.
pub struct Orchestrator {
    agents: BTreeMap<AgentRole, Agent>,
    config: OrchestratorConfig,
    conversation_history: Vec<AgentResult>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Orchestrator {
    /// An orchestrator with the four stock agents, all sharing `client`.
    pub fn new(client: Arc<dyn ClientWrapper>) -> Self {
        let mut agents = BTreeMap::new();
        for role in AgentRole::ALL.iter() {
            agents.insert(
                *role,
                Agent::new(AgentDefinition::for_role(*role), Arc::clone(&client)),
            );
        }

        Self {
            agents,
            config: OrchestratorConfig::default(),
            conversation_history: Vec::new(),
            event_handler: None,
        }
    }

    /// An orchestrator with no agents. Register them with [`add_agent`](Self::add_agent).
    pub fn empty() -> Self {
        Self {
            agents: BTreeMap::new(),
            config: OrchestratorConfig::default(),
            conversation_history: Vec::new(),
            event_handler: None,
        }
    }

    /// Replace the agent for `definition.role` with one built on `client`
    /// (builder pattern).
    ///
    /// # Errors
    ///
    /// [`PlanningError::InvalidAgent`] if the definition fails validation.
    pub fn with_agent(
        mut self,
        definition: AgentDefinition,
        client: Arc<dyn ClientWrapper>,
    ) -> Result<Self, PlanningError> {
        self.add_agent(Agent::new(definition, client))?;
        Ok(self)
    }

    /// Register `agent`, replacing and returning any agent already serving its role.
    pub fn add_agent(&mut self, mut agent: Agent) -> Result<Option<Agent>, PlanningError> {
        agent.definition().validate()?;
        if let Some(handler) = &self.event_handler {
            agent.set_event_handler(Arc::clone(handler));
        }
        Ok(self.agents.insert(agent.role(), agent))
    }

    pub fn remove_agent(&mut self, role: AgentRole) -> Option<Agent> {
        self.agents.remove(&role)
    }

    pub fn agent(&self, role: AgentRole) -> Option<&Agent> {
        self.agents.get(&role)
    }

    /// Replace the configuration. An iteration cap below 1 is raised to 1.
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = OrchestratorConfig {
            max_iterations: config.max_iterations.max(1),
            ..config
        };
        self
    }

    /// Override the iteration cap. Values below 1 are raised to 1.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations.max(1);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Attach an [`EventHandler`] (builder pattern).
    ///
    /// The handler is also installed on every registered agent, and on agents
    /// added later, so agent and orchestration events arrive at one place.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        for agent in self.agents.values_mut() {
            agent.set_event_handler(Arc::clone(&handler));
        }
        self.event_handler = Some(handler);
        self
    }

    async fn emit(&self, event: OrchestrationEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_orchestration_event(&event).await;
        }
    }

    /// Run one planning session with no deadline or cancellation.
    ///
    /// # Errors
    ///
    /// [`PlanningError::InvalidRequest`] if `request` fails validation. Service
    /// failures never surface here; they end the chain with a failed result.
    pub async fn plan(&mut self, request: &TravelRequest) -> Result<PlanOutcome, PlanningError> {
        self.plan_with(request, CallOptions::default()).await
    }

    /// Run one planning session, bounding every completion call by `options`.
    pub async fn plan_with(
        &mut self,
        request: &TravelRequest,
        options: CallOptions,
    ) -> Result<PlanOutcome, PlanningError> {
        request.validate()?;

        let session_id = Uuid::new_v4().to_string();
        let active = options.start();
        let max_iterations = self.config.max_iterations.max(1);

        info!(
            "tripllm::orchestration: session {} planning trip to {}",
            session_id, request.destination
        );
        self.emit(OrchestrationEvent::RunStarted {
            session_id: session_id.clone(),
            destination: request.destination.clone(),
            max_iterations,
        })
        .await;

        let mut results: Vec<AgentResult> = Vec::new();
        let mut current_role = Some(AgentRole::Planner);
        let mut current_input = request.to_prompt();
        let mut iteration = 0;

        while let Some(role) = current_role {
            if iteration >= max_iterations {
                break;
            }
            iteration += 1;
            debug!(
                "tripllm::orchestration: iteration {} processing with {}",
                iteration, role
            );

            let agent = match self.agents.get(&role) {
                Some(agent) => agent,
                None => {
                    let description = format!("no agent registered for role {}", role);
                    warn!("tripllm::orchestration: {}", description);
                    self.emit(OrchestrationEvent::AgentFailed {
                        session_id: session_id.clone(),
                        iteration,
                        role,
                        error: description.clone(),
                    })
                    .await;
                    results.push(AgentResult::failure(role, "missing_agent", &description));
                    current_role = None;
                    continue;
                }
            };

            self.emit(OrchestrationEvent::AgentSelected {
                session_id: session_id.clone(),
                iteration,
                role,
            })
            .await;

            let context = build_context(&current_input, &results, self.config.context_window);
            let result = agent.process_with(&context, &active).await;

            if let Some(error) = result.error() {
                self.emit(OrchestrationEvent::AgentFailed {
                    session_id: session_id.clone(),
                    iteration,
                    role,
                    error: error.to_string(),
                })
                .await;
            } else {
                self.emit(OrchestrationEvent::AgentResponded {
                    session_id: session_id.clone(),
                    iteration,
                    role,
                    message_length: result.message().len(),
                })
                .await;
            }

            current_role = result.next_role();
            if let Some(next) = current_role {
                info!(
                    "tripllm::orchestration: {} hands off to {} ({})",
                    role,
                    next,
                    result.handoff_reason().unwrap_or("no reason given")
                );
                self.emit(OrchestrationEvent::HandoffFollowed {
                    session_id: session_id.clone(),
                    from: role,
                    to: next,
                    reason: result.handoff_reason().map(str::to_string),
                })
                .await;
                current_input = result.message().to_string();
            }
            results.push(result);
        }

        let terminated_by = match (current_role, results.last()) {
            (Some(pending), _) => {
                warn!(
                    "tripllm::orchestration: session {} stopped after {} iterations with {} still pending",
                    session_id, iteration, pending
                );
                Termination::Cutoff
            }
            (None, Some(last)) if last.is_interrupted() => Termination::Cancelled,
            (None, Some(last)) if last.is_error() => Termination::Error,
            (None, _) => Termination::Natural,
        };

        let total_tokens_used: usize = results
            .iter()
            .filter_map(AgentResult::tokens_used)
            .map(|usage| usage.total_tokens)
            .sum();

        info!(
            "tripllm::orchestration: session {} finished: {:?} after {} iterations",
            session_id, terminated_by, iteration
        );
        self.emit(OrchestrationEvent::RunCompleted {
            session_id: session_id.clone(),
            iterations: iteration,
            total_tokens: total_tokens_used,
            terminated_by,
        })
        .await;

        self.conversation_history.extend(results.iter().cloned());

        Ok(PlanOutcome {
            session_id,
            results,
            terminated_by,
            iterations: iteration,
            total_tokens_used,
        })
    }

    /// Every result of every run since the last [`reset`](Self::reset).
    pub fn get_conversation_history(&self) -> &[AgentResult] {
        &self.conversation_history
    }

    /// Clear the history. Registered agents and configuration are kept.
    pub fn reset(&mut self) {
        self.conversation_history.clear();
    }

    pub fn summary(&self) -> PlanSummary {
        let agents_involved: Vec<AgentRole> = self
            .conversation_history
            .iter()
            .map(AgentResult::role)
            .collect();
        let mut distinct = agents_involved.clone();
        distinct.sort();
        distinct.dedup();

        PlanSummary {
            total_results: self.conversation_history.len(),
            distinct_roles_invoked: distinct.len(),
            agents_involved,
            status: if self.conversation_history.is_empty() {
                PlanStatus::NotStarted
            } else {
                PlanStatus::Complete
            },
            generated_at: Utc::now(),
        }
    }

    /// The history and its summary as one JSON document:
    /// `{"travel_plan": [...], "summary": {...}}`.
    pub fn export_plan(&self) -> serde_json::Value {
        json!({
            "travel_plan": self.conversation_history,
            "summary": self.summary(),
        })
    }

    /// Write [`export_plan`](Self::export_plan) as pretty JSON.
    ///
    /// Without a path the file is created in the working directory as
    /// `travel_plan_YYYYMMDD_HHMMSS.json`. Returns the path written.
    pub fn export_to_file(&self, path: Option<&Path>) -> io::Result<PathBuf> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(default_export_file_name(Utc::now())),
        };

        let document = serde_json::to_string_pretty(&self.export_plan())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, document)?;

        info!(
            "tripllm::orchestration: travel plan exported to {}",
            path.display()
        );
        Ok(path)
    }
}

/// `travel_plan_YYYYMMDD_HHMMSS.json` for `now`.
pub fn default_export_file_name(now: DateTime<Utc>) -> String {
    format!("travel_plan_{}.json", now.format("%Y%m%d_%H%M%S"))
}
