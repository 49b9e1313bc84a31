//! Tool registry with schema export for the planner.

use std::sync::Arc;

use crate::schema::ToolSchema;
use crate::tool::Tool;

type ToolList = Arc<Vec<Arc<dyn Tool>>>;

/// Registry of the tools available to the router for one query.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: ToolList,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: Arc::new(Vec::new()),
        }
    }

    /// Add a tool to the registry.
    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        Arc::make_mut(&mut self.tools).push(tool);
        self
    }

    /// Get a tool by name, if it exists.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|tool_ref| tool_ref.name() == name)
            .cloned()
    }

    /// Export every tool's schema, in registration order.
    ///
    /// This is the contract the planning policy sees; it stays in sync with
    /// the registry by construction.
    #[must_use]
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|tool| tool.schema()).collect()
    }

    /// Get number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
