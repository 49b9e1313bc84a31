//! Query routing agent for tabqa.
//!
//! Given a natural-language question about the current session's table, the
//! router asks a planning model which tool to call, executes tools with
//! validated arguments, and hands the gathered observations to the composer
//! for the final answer.

/// Answer composition from gathered observations.
pub mod composer;
/// Prompt construction for planning and composition.
pub mod prompts;
/// Planner-driven tool routing with bounded rounds.
pub mod router;
/// Ingest-and-answer service over a session context.
pub mod service;

pub use composer::AnswerComposer;
pub use router::{Observation, QueryRouter, RouterOutcome};
pub use service::QueryService;
