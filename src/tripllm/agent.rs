//! Agent System
//!
//! This module provides the travel-planning roles and the single executor that
//! runs all of them.
//!
//! There are no per-role agent types. Each role is described by an
//! [`AgentDefinition`] record (instructions, hand-off rule, data keys) and
//! executed by one generic [`Agent::process`]:
//!
//! 1. call the completion service with the role instructions plus the input,
//! 2. apply the role's keyword [`HandoffRule`] to pick a successor,
//! 3. package the role's structured data into an [`AgentResult`].
//!
//! A failing completion call never escapes `process`: it becomes a terminal
//! result carrying an `error` entry.
//!
//! # Example
//!
//! ```rust,no_run
//! use tripllm::agent::{Agent, AgentDefinition, AgentRole};
//! use tripllm::clients::openai::OpenAIClient;
//! use std::sync::Arc;
//!
//! # async {
//! let client = Arc::new(OpenAIClient::new_with_model_string("key", "gpt-4o-mini"));
//! let planner = Agent::new(AgentDefinition::for_role(AgentRole::Planner), client);
//!
//! let result = planner.process("Travel Request Details: ... Budget: $2,000.00").await;
//! assert_eq!(result.next_role(), Some(AgentRole::BudgetAnalyst));
//! # };
//! ```

use crate::cancel::ActiveCall;
use crate::client_wrapper::{ClientWrapper, ServiceError, TokenUsage};
use crate::event::{AgentEvent, EventHandler};
use crate::orchestration::PlanningError;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

/// The closed set of travel-planning roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentRole {
    #[serde(rename = "travel_planner")]
    Planner,
    #[serde(rename = "budget_analyst")]
    BudgetAnalyst,
    #[serde(rename = "activity_specialist")]
    ActivitySpecialist,
    #[serde(rename = "booking_coordinator")]
    BookingCoordinator,
}

impl AgentRole {
    /// Every role, in hand-off graph order.
    pub const ALL: [AgentRole; 4] = [
        AgentRole::Planner,
        AgentRole::BudgetAnalyst,
        AgentRole::ActivitySpecialist,
        AgentRole::BookingCoordinator,
    ];

    /// Identifier used in context digests and exported documents.
    pub fn wire_name(self) -> &'static str {
        match self {
            AgentRole::Planner => "travel_planner",
            AgentRole::BudgetAnalyst => "budget_analyst",
            AgentRole::ActivitySpecialist => "activity_specialist",
            AgentRole::BookingCoordinator => "booking_coordinator",
        }
    }

    /// Display name, used as the prefix of every successful message.
    pub fn label(self) -> &'static str {
        match self {
            AgentRole::Planner => "Travel Planner",
            AgentRole::BudgetAnalyst => "Budget Analyst",
            AgentRole::ActivitySpecialist => "Activity Specialist",
            AgentRole::BookingCoordinator => "Booking Coordinator",
        }
    }

    /// What the role does, as used in failure messages ("Error in ...").
    pub fn activity(self) -> &'static str {
        match self {
            AgentRole::Planner => "travel planning",
            AgentRole::BudgetAnalyst => "budget analysis",
            AgentRole::ActivitySpecialist => "activity planning",
            AgentRole::BookingCoordinator => "booking coordination",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A successor role together with the reason reported for choosing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    pub next: AgentRole,
    pub reason: String,
}

impl Handoff {
    pub fn new(next: AgentRole, reason: impl Into<String>) -> Self {
        Self {
            next,
            reason: reason.into(),
        }
    }
}

/// How an agent picks its successor after a successful completion.
///
/// Rules look at the agent's *input* text, never at the generated text, and
/// use plain substring tests.
///
/// ```
/// use tripllm::agent::{AgentRole, Handoff, HandoffRule};
///
/// let rule = HandoffRule::Keyword {
///     markers: vec!["$".into(), "budget".into()],
///     on_match: Handoff::new(AgentRole::BudgetAnalyst, "Budget analysis required"),
///     otherwise: Handoff::new(AgentRole::ActivitySpecialist, "Activity planning required"),
/// };
///
/// let (next, _) = rule.resolve("Our BUDGET is tight");
/// assert_eq!(next, Some(AgentRole::BudgetAnalyst));
/// let (next, _) = rule.resolve("Just vibes");
/// assert_eq!(next, Some(AgentRole::ActivitySpecialist));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffRule {
    /// `on_match` if the input contains any marker (case-insensitive),
    /// `otherwise` if it contains none.
    Keyword {
        markers: Vec<String>,
        on_match: Handoff,
        otherwise: Handoff,
    },
    /// Always hand off to the same role.
    Always(Handoff),
    /// End of the chain.
    Terminal { reason: String },
}

impl HandoffRule {
    /// Decide the successor and the hand-off reason for `input`.
    pub fn resolve(&self, input: &str) -> (Option<AgentRole>, Option<String>) {
        match self {
            HandoffRule::Keyword {
                markers,
                on_match,
                otherwise,
            } => {
                let haystack = input.to_lowercase();
                let matched = markers
                    .iter()
                    .any(|marker| haystack.contains(&marker.to_lowercase()));
                let chosen = if matched { on_match } else { otherwise };
                (Some(chosen.next), Some(chosen.reason.clone()))
            }
            HandoffRule::Always(handoff) => (Some(handoff.next), Some(handoff.reason.clone())),
            HandoffRule::Terminal { reason } => (None, Some(reason.clone())),
        }
    }

    /// Every role this rule can hand off to.
    pub fn targets(&self) -> Vec<AgentRole> {
        match self {
            HandoffRule::Keyword {
                on_match,
                otherwise,
                ..
            } => vec![on_match.next, otherwise.next],
            HandoffRule::Always(handoff) => vec![handoff.next],
            HandoffRule::Terminal { .. } => Vec::new(),
        }
    }
}

/// Everything that distinguishes one role's agent from another.
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    pub role: AgentRole,
    /// System prompt sent with every completion call.
    pub instructions: String,
    pub handoff: HandoffRule,
    /// Key under which the generated text is stored in the result data.
    pub data_key: String,
    /// Fixed entries merged into every successful result's data.
    pub static_data: Map<String, Value>,
}

impl AgentDefinition {
    pub fn new(
        role: AgentRole,
        instructions: impl Into<String>,
        handoff: HandoffRule,
        data_key: impl Into<String>,
    ) -> Self {
        Self {
            role,
            instructions: instructions.into(),
            handoff,
            data_key: data_key.into(),
            static_data: Map::new(),
        }
    }

    pub fn with_static_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.static_data.insert(key.into(), value);
        self
    }

    /// The stock definition for `role`.
    pub fn for_role(role: AgentRole) -> Self {
        match role {
            AgentRole::Planner => Self::planner(),
            AgentRole::BudgetAnalyst => Self::budget_analyst(),
            AgentRole::ActivitySpecialist => Self::activity_specialist(),
            AgentRole::BookingCoordinator => Self::booking_coordinator(),
        }
    }

    pub fn planner() -> Self {
        Self::new(
            AgentRole::Planner,
            PLANNER_INSTRUCTIONS,
            HandoffRule::Keyword {
                markers: vec!["$".to_string(), "budget".to_string()],
                on_match: Handoff::new(AgentRole::BudgetAnalyst, "Budget analysis required"),
                otherwise: Handoff::new(
                    AgentRole::ActivitySpecialist,
                    "Activity planning required",
                ),
            },
            "preliminary_plan",
        )
        .with_static_data("analysis_needed", json!(["budget", "activities", "booking"]))
    }

    pub fn budget_analyst() -> Self {
        Self::new(
            AgentRole::BudgetAnalyst,
            BUDGET_ANALYST_INSTRUCTIONS,
            HandoffRule::Always(Handoff::new(
                AgentRole::ActivitySpecialist,
                "Budget analyzed, now planning activities within budget constraints",
            )),
            "budget_analysis",
        )
        .with_static_data(
            "cost_categories",
            json!(["flights", "accommodation", "food", "activities", "transportation"]),
        )
        .with_static_data("budget_status", json!("analyzed"))
    }

    pub fn activity_specialist() -> Self {
        Self::new(
            AgentRole::ActivitySpecialist,
            ACTIVITY_SPECIALIST_INSTRUCTIONS,
            HandoffRule::Always(Handoff::new(
                AgentRole::BookingCoordinator,
                "Activities planned, ready for booking coordination",
            )),
            "activity_plan",
        )
        .with_static_data(
            "activity_types",
            json!(["cultural", "adventure", "relaxation", "dining", "shopping"]),
        )
        .with_static_data("schedule_created", json!(true))
    }

    pub fn booking_coordinator() -> Self {
        Self::new(
            AgentRole::BookingCoordinator,
            BOOKING_COORDINATOR_INSTRUCTIONS,
            HandoffRule::Terminal {
                reason: "Travel planning complete".to_string(),
            },
            "booking_plan",
        )
        .with_static_data(
            "booking_priority",
            json!(["flights", "accommodation", "activities", "restaurants"]),
        )
        .with_static_data("travel_ready", json!(true))
    }

    /// Reject definitions whose hand-off rule can point back at their own role.
    ///
    /// # Errors
    ///
    /// [`PlanningError::InvalidAgent`] naming the role.
    pub fn validate(&self) -> Result<(), PlanningError> {
        if self.handoff.targets().contains(&self.role) {
            return Err(PlanningError::InvalidAgent(format!(
                "{} hands off to itself",
                self.role
            )));
        }
        if self.data_key.is_empty() || self.data_key == ERROR_KEY {
            return Err(PlanningError::InvalidAgent(format!(
                "{} needs a data key other than '{}'",
                self.role, ERROR_KEY
            )));
        }
        Ok(())
    }
}

/// Data key present on every failed result.
pub const ERROR_KEY: &str = "error";
/// Data key carrying [`ServiceError::kind`] (or `"missing_agent"`) on failed results.
pub const ERROR_KIND_KEY: &str = "error_kind";

const PLANNER_INSTRUCTIONS: &str = "You are a Senior Travel Planner who builds complete travel itineraries.

Your responsibilities:
1. Analyze the travel request and check that its requirements are consistent
2. Draft a high-level plan covering destinations and timing
3. Call out budget constraints so the Budget Analyst can review them
4. Coordinate with the other specialists to reach a complete itinerary

For every request, produce a preliminary itinerary and state whether budget analysis,
activity planning, or booking coordination is needed next.

Explain the reasoning behind your recommendations. Keep a professional but friendly tone.";

const BUDGET_ANALYST_INSTRUCTIONS: &str = "You are a Budget Analysis Specialist for travel planning.

Your responsibilities:
1. Break the budget down by category: flights, accommodation, food, activities, transportation
2. Estimate realistic costs for each category
3. Flag likely overruns and suggest adjustments
4. Offer cost-saving alternatives where they make sense

Be precise with numbers. Once the analysis is done, the Activity Specialist plans activities
within these constraints.";

const ACTIVITY_SPECIALIST_INSTRUCTIONS: &str = "You are an Activity Planning Specialist who designs memorable travel experiences.

Your responsibilities:
1. Recommend activities that match the travelers' interests
2. Build a day-by-day schedule
3. Respect the budget constraints from the previous analysis
4. Mix well-known attractions with lesser-known local experiences

Include practical details such as opening hours and booking requirements. Once the schedule
is done, the Booking Coordinator handles reservations.";

const BOOKING_COORDINATOR_INSTRUCTIONS: &str = "You are a Booking Coordination Specialist who finalizes travel arrangements.

Your responsibilities:
1. Coordinate every booking recommended by the previous specialists
2. Give a booking timeline in priority order, time-sensitive items first
3. Suggest booking platforms and methods
4. Cover cancellation policies and travel insurance
5. Finish with a checklist that summarizes the complete travel plan

This is the final step of the planning process. Make every instruction actionable.";

/// The outcome of one agent invocation.
///
/// Results are immutable; read them through the accessors. `next_role` is
/// never equal to `role`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResult {
    #[serde(rename = "agent_type")]
    role: AgentRole,
    message: String,
    data: Map<String, Value>,
    #[serde(rename = "next_agent")]
    next_role: Option<AgentRole>,
    handoff_reason: Option<String>,
    tokens_used: Option<TokenUsage>,
    created_at: DateTime<Utc>,
}

impl AgentResult {
    fn new(
        role: AgentRole,
        message: String,
        data: Map<String, Value>,
        next_role: Option<AgentRole>,
        handoff_reason: Option<String>,
        tokens_used: Option<TokenUsage>,
    ) -> Self {
        let next_role = match next_role {
            Some(next) if next == role => {
                warn!(
                    "tripllm::agent: {} tried to hand off to itself; treating as terminal",
                    role
                );
                None
            }
            other => other,
        };

        Self {
            role,
            message,
            data,
            next_role,
            handoff_reason,
            tokens_used,
            created_at: Utc::now(),
        }
    }

    /// A terminal result describing a failure of `role`.
    pub(crate) fn failure(role: AgentRole, kind: &str, description: &str) -> Self {
        let mut data = Map::new();
        data.insert(ERROR_KEY.to_string(), Value::String(description.to_string()));
        data.insert(ERROR_KIND_KEY.to_string(), Value::String(kind.to_string()));
        Self::new(
            role,
            format!("Error in {}: {}", role.activity(), description),
            data,
            None,
            None,
            None,
        )
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    /// Human-readable output; never empty.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn next_role(&self) -> Option<AgentRole> {
        self.next_role
    }

    pub fn handoff_reason(&self) -> Option<&str> {
        self.handoff_reason.as_deref()
    }

    pub fn tokens_used(&self) -> Option<&TokenUsage> {
        self.tokens_used.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The failure description, if this result records one.
    pub fn error(&self) -> Option<&str> {
        self.data.get(ERROR_KEY).and_then(Value::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.data.contains_key(ERROR_KEY)
    }

    /// `true` when the failure came from the caller's deadline or cancellation.
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self.data.get(ERROR_KIND_KEY).and_then(Value::as_str),
            Some("deadline_exceeded") | Some("cancelled")
        )
    }
}

/// A role definition bound to a completion service.
pub struct Agent {
    definition: AgentDefinition,
    client: Arc<dyn ClientWrapper>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Agent {
    pub fn new(definition: AgentDefinition, client: Arc<dyn ClientWrapper>) -> Self {
        Self {
            definition,
            client,
            event_handler: None,
        }
    }

    pub fn role(&self) -> AgentRole {
        self.definition.role
    }

    pub fn definition(&self) -> &AgentDefinition {
        &self.definition
    }

    pub fn client(&self) -> &Arc<dyn ClientWrapper> {
        &self.client
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Set or replace the event handler on a live agent. Used by the
    /// orchestrator to propagate its own handler.
    pub fn set_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.event_handler = Some(handler);
    }

    async fn emit(&self, event: AgentEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_agent_event(&event).await;
        }
    }

    /// Turn one input into one result, with no deadline or cancellation.
    pub async fn process(&self, input: &str) -> AgentResult {
        self.process_with(input, &ActiveCall::unbounded()).await
    }

    /// Turn one input into one result; the completion call is bounded by `call`.
    pub async fn process_with(&self, input: &str, call: &ActiveCall) -> AgentResult {
        let role = self.definition.role;
        debug!(
            "tripllm::agent: {} processing {} chars with model {}",
            role,
            input.len(),
            self.client.model_name()
        );

        self.emit(AgentEvent::CompletionStarted {
            role,
            input_length: input.len(),
        })
        .await;

        let completion = call
            .run(self.client.complete(&self.definition.instructions, input))
            .await;

        match completion {
            Ok(text) => {
                let tokens_used = self.client.get_last_usage().await;
                let (next_role, handoff_reason) = self.definition.handoff.resolve(input);

                let mut data = self.definition.static_data.clone();
                data.insert(self.definition.data_key.clone(), Value::String(text.clone()));
                data.insert("timestamp".to_string(), Value::String(Utc::now().to_rfc3339()));

                let result = AgentResult::new(
                    role,
                    format!("{}: {}", role.label(), text),
                    data,
                    next_role,
                    handoff_reason,
                    tokens_used.clone(),
                );

                info!(
                    "tripllm::agent: {} done ({} chars), next: {}",
                    role,
                    text.len(),
                    result
                        .next_role()
                        .map_or("none", AgentRole::wire_name)
                );

                self.emit(AgentEvent::CompletionCompleted {
                    role,
                    response_length: text.len(),
                    tokens_used,
                    next_role: result.next_role(),
                })
                .await;

                result
            }
            Err(err) => self.fail(role, &err).await,
        }
    }

    async fn fail(&self, role: AgentRole, err: &ServiceError) -> AgentResult {
        if err.is_interruption() {
            warn!("tripllm::agent: {} interrupted: {}", role, err);
        } else {
            error!("tripllm::agent: {} completion failed: {}", role, err);
        }

        self.emit(AgentEvent::CompletionFailed {
            role,
            error: err.to_string(),
        })
        .await;

        AgentResult::failure(role, err.kind(), &err.to_string())
    }
}
