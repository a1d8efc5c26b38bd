//! Demo workflow for the recommendations service.
//!
//! This crate provides:
//! - WorkflowOrchestrator, which sequences the client calls of one demo run
//! - BuildMonitor, the build-status poll loop
//! - WorkflowConfig with the defaults of the demo
//!
//! ## Example Usage
//! ```ignore
//! use reco_client::RecommendationClient;
//! use workflow::{WorkflowConfig, WorkflowOrchestrator};
//!
//! let client = RecommendationClient::initialize(&email, &account_key)?;
//! let orchestrator = WorkflowOrchestrator::new(WorkflowConfig::default());
//! let summary = orchestrator.run(&client, |event| println!("{event:?}")).await?;
//! ```

pub mod config;
pub mod error;
pub mod monitor;
pub mod orchestrator;

// Re-export main types
pub use config::WorkflowConfig;
pub use error::{Result, WorkflowError};
pub use monitor::{BuildMonitor, BuildStatusSource, Sleeper, TokioSleeper};
pub use orchestrator::{build_description, WorkflowEvent, WorkflowOrchestrator, WorkflowSummary};
