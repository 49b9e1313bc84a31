//! Prompt construction for the planning and composition calls.

use crate::router::Observation;

/// System prompt for the planning model.
pub const PLANNING_SYSTEM: &str = "You are a query planner for a spreadsheet \
question-answering assistant. The data is a table of candidate records with a \
free-text skills column and columns such as experience, location, and \
compensation. At each step you either call one tool or declare you have \
enough information. Respond with exactly one JSON object and nothing else: \
either {\"action\": \"call_tool\", \"tool\": \"<name>\", \"arguments\": \
{...}} or {\"action\": \"final_answer\"}. Arguments must follow the tool \
schemas exactly.";

/// System prompt for the answer composer.
pub const COMPOSITION_SYSTEM: &str = "You are a helpful assistant answering \
questions about uploaded candidate spreadsheet data. Use only the tool \
observations provided; perform any arithmetic the question requires, such as \
averages or totals over returned values. Give a direct, accurate answer.";

/// Builds the planning user prompt for one round.
#[must_use]
pub fn planning_prompt(question: &str, schemas_json: &str, observations: &[Observation]) -> String {
    let mut prompt = format!(
        "Question: {question}\n\nAvailable tools:\n{schemas_json}\n"
    );

    if observations.is_empty() {
        prompt.push_str("\nNo tools have been called yet.\n");
    } else {
        prompt.push_str("\nObservations so far:\n");
        for (idx, observation) in observations.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. [{}] {}\n",
                idx + 1,
                observation.source,
                observation.text
            ));
        }
    }

    prompt.push_str("\nDecide the next step.");
    prompt
}

/// Appends a correction notice after a malformed directive.
#[must_use]
pub fn correction_prompt(base_prompt: &str, problem: &str) -> String {
    format!(
        "{base_prompt}\n\nYour previous reply was not a valid directive: \
         {problem}. Reply with exactly one valid JSON directive."
    )
}

/// Builds the composition user prompt from the question and observations.
#[must_use]
pub fn composition_prompt(question: &str, observations: &[Observation]) -> String {
    let mut prompt = format!("Question: {question}\n\nTool observations:\n");
    if observations.is_empty() {
        prompt.push_str("(none)\n");
    }
    for observation in observations {
        prompt.push_str(&format!("[{}] {}\n", observation.source, observation.text));
    }
    prompt.push_str("\nAnswer the question.");
    prompt
}
