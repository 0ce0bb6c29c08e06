// src/tripllm/mod.rs

pub mod agent;
pub mod cancel;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod event;
pub mod orchestration;
pub mod request;

// Let's explicitly export the orchestrator so callers can write tripllm::Orchestrator
// instead of tripllm::orchestration::Orchestrator
pub use orchestration::Orchestrator;
pub use request::TravelRequest;
