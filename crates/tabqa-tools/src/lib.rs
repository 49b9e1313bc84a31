//! Tool set for the tabqa query router.
//!
//! This crate provides the tool trait and registry plus the callable
//! operations over session state:
//! - `retrieve_documents` for semantic search
//! - `get_all_numeric_values` for aggregate questions
//! - `get_filtered_projection` for structured filter questions
//! - `get_exchange_rate` for currency conversion of compensation figures

/// Currency pair-rate tool.
mod exchange;
/// Filter-and-project tool.
mod filter;
/// Numeric column fetch tool.
mod numeric;
/// Tool registry with schema export.
mod registry;
/// Semantic retrieval tool.
mod retrieve;
/// Machine-readable argument schemas.
mod schema;
/// Core abstractions shared by all tools.
mod tool;

pub use exchange::ExchangeRateTool;
pub use filter::FilteredProjectionTool;
pub use numeric::NumericValuesTool;
pub use registry::ToolRegistry;
pub use retrieve::RetrieveDocumentsTool;
pub use schema::{ArgumentSpec, ArgumentType, ToolSchema};
pub use tool::{Tool, ToolInput, ToolOutput};
