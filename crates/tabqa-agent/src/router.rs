//! Planner-driven tool routing with bounded rounds.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tabqa_core::config::RouterConfig;
use tabqa_core::{Error, ModelProvider, Query, Result, ToolTrace};
use tabqa_tools::{ToolInput, ToolRegistry};

use crate::prompts::{PLANNING_SYSTEM, correction_prompt, planning_prompt};

/// One tool result (or recoverable tool failure) fed back to the planner.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Tool that produced this observation.
    pub source: String,
    /// Observation text shown to the planner and composer.
    pub text: String,
}

/// Everything the router gathered while processing one query.
#[derive(Debug)]
pub struct RouterOutcome {
    /// Tool observations in execution order.
    pub observations: Vec<Observation>,
    /// Record of every executed tool call.
    pub trace: ToolTrace,
}

/// Directive parsed from one planning reply.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Directive {
    /// Invoke the named tool with the given arguments.
    CallTool {
        /// Tool name from the exported schemas.
        tool: String,
        /// JSON argument object.
        #[serde(default)]
        arguments: Value,
    },
    /// The planner has enough information to answer.
    FinalAnswer,
}

/// Router processing state for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouterState {
    /// Waiting for the next planning directive.
    AwaitingPlan,
    /// A tool was just invoked; its observation is recorded.
    ToolInvoked,
    /// The planner declared it can answer.
    ReadyToAnswer,
}

/// Selects and invokes tools for a query until the planner declares it can
/// answer, within a bounded number of rounds.
pub struct QueryRouter {
    planner: Arc<dyn ModelProvider>,
    config: RouterConfig,
}

impl QueryRouter {
    /// Creates a router driven by the given planning model.
    pub fn new(planner: Arc<dyn ModelProvider>, config: RouterConfig) -> Self {
        Self { planner, config }
    }

    /// Runs the routing loop for one query.
    ///
    /// # Errors
    ///
    /// Returns `RouterExhausted` if the round cap is hit before the planner
    /// declares it can answer, `Planning` if the planner cannot produce a
    /// valid directive within the correction budget, or any non-recoverable
    /// tool/provider error.
    pub async fn run(&self, query: &Query, registry: &ToolRegistry) -> Result<RouterOutcome> {
        let schemas_json = serde_json::to_string_pretty(&registry.schemas())?;

        let mut observations = Vec::new();
        let mut trace = ToolTrace::default();
        let mut state = RouterState::AwaitingPlan;

        for round in 0..self.config.max_rounds {
            let directive = self
                .plan(&query.text, &schemas_json, &observations, registry)
                .await?;

            match directive {
                Directive::FinalAnswer => {
                    state = RouterState::ReadyToAnswer;
                    tracing::info!(round, ?state, "planner ready to answer");
                    break;
                }
                Directive::CallTool { tool, arguments } => {
                    let observation = self
                        .invoke(registry, &tool, arguments, &mut trace)
                        .await?;
                    state = RouterState::ToolInvoked;
                    tracing::info!(round, ?state, tool = observation.source.as_str(), "tool round done");
                    observations.push(observation);
                    // Back to planning; the planner sees the new observation.
                    state = RouterState::AwaitingPlan;
                }
            }
        }

        if state == RouterState::ReadyToAnswer {
            Ok(RouterOutcome {
                observations,
                trace,
            })
        } else {
            Err(Error::RouterExhausted {
                rounds: self.config.max_rounds,
            })
        }
    }

    /// Obtains one validated directive, re-prompting on malformed replies up
    /// to the correction budget.
    async fn plan(
        &self,
        question: &str,
        schemas_json: &str,
        observations: &[Observation],
        registry: &ToolRegistry,
    ) -> Result<Directive> {
        let base_prompt = planning_prompt(question, schemas_json, observations);
        let mut prompt = base_prompt.clone();

        for attempt in 0..=self.config.max_correction_attempts {
            let reply = self.planner.generate(PLANNING_SYSTEM, &prompt).await?;

            match validate_directive(&reply.text, registry) {
                Ok(directive) => return Ok(directive),
                Err(problem) => {
                    tracing::warn!(attempt, "malformed planner directive: {problem}");
                    prompt = correction_prompt(&base_prompt, &problem);
                }
            }
        }

        Err(Error::Planning(format!(
            "planner produced no valid directive after {} correction attempt(s)",
            self.config.max_correction_attempts
        )))
    }

    /// Executes one tool call; recoverable errors become observations.
    async fn invoke(
        &self,
        registry: &ToolRegistry,
        tool_name: &str,
        arguments: Value,
        trace: &mut ToolTrace,
    ) -> Result<Observation> {
        // Existence and argument shape were checked during planning.
        let tool = registry.get_tool(tool_name).ok_or_else(|| {
            Error::Planning(format!("validated tool '{tool_name}' disappeared"))
        })?;

        match tool.execute(ToolInput::new(arguments.clone())).await {
            Ok(output) => {
                let text = match &output.data {
                    Some(data) => format!("{}; data: {data}", output.message),
                    None => output.message.clone(),
                };
                trace.record(tool_name, arguments, output.message);
                Ok(Observation {
                    source: tool_name.to_owned(),
                    text,
                })
            }
            Err(err) if err.is_recoverable() => {
                // Fed back to the planner, which may pick another attribute
                // or tool on the next round.
                let text = format!("tool failed: {err}");
                trace.record(tool_name, arguments, text.clone());
                tracing::warn!(tool = tool_name, "recoverable tool error: {err}");
                Ok(Observation {
                    source: tool_name.to_owned(),
                    text,
                })
            }
            Err(err) => Err(err),
        }
    }
}

/// Parses and validates one planner reply into a directive.
///
/// Returns a human-readable problem description on failure, used verbatim in
/// the correction prompt.
fn validate_directive(
    reply: &str,
    registry: &ToolRegistry,
) -> std::result::Result<Directive, String> {
    let json_text = extract_json_object(reply).ok_or_else(|| {
        "reply contained no JSON object".to_owned()
    })?;

    let directive: Directive = serde_json::from_str(json_text)
        .map_err(|err| format!("reply was not a valid directive object: {err}"))?;

    if let Directive::CallTool { tool, arguments } = &directive {
        let schema = registry
            .get_tool(tool)
            .map(|tool| tool.schema())
            .ok_or_else(|| format!("unknown tool '{tool}'"))?;
        schema
            .validate(arguments)
            .map_err(|err| err.to_string())?;
    }

    Ok(directive)
}

/// Extracts the outermost JSON object from a reply that may carry code
/// fences or prose around it.
fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}
