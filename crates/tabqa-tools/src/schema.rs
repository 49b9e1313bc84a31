//! Machine-readable tool schemas: the contract between router and tools.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabqa_core::{Error, Result};

/// Expected JSON type of one tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentType {
    /// JSON string.
    String,
    /// JSON number (integer or float).
    Number,
    /// JSON number restricted to non-negative integers.
    Integer,
}

impl ArgumentType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_u64(),
        }
    }
}

/// Declaration of one argument: name, type, and whether it may be omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentSpec {
    /// Argument name as it appears in the JSON object.
    pub name: String,
    /// Expected JSON type.
    pub ty: ArgumentType,
    /// Whether the argument must be present.
    pub required: bool,
    /// Natural-language constraint description for the planner.
    pub description: String,
}

/// Machine-readable description of one tool, exported to the planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name the planner must use in directives.
    pub name: String,
    /// Natural-language purpose.
    pub description: String,
    /// Argument declarations.
    pub arguments: Vec<ArgumentSpec>,
}

impl ToolSchema {
    /// Creates a schema with no arguments.
    pub fn new<T: Into<String>, U: Into<String>>(name: T, description: U) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            arguments: Vec::new(),
        }
    }

    /// Declares a required argument.
    #[must_use]
    pub fn required<T: Into<String>, U: Into<String>>(
        mut self,
        name: T,
        ty: ArgumentType,
        description: U,
    ) -> Self {
        self.arguments.push(ArgumentSpec {
            name: name.into(),
            ty,
            required: true,
            description: description.into(),
        });
        self
    }

    /// Declares an optional argument.
    #[must_use]
    pub fn optional<T: Into<String>, U: Into<String>>(
        mut self,
        name: T,
        ty: ArgumentType,
        description: U,
    ) -> Self {
        self.arguments.push(ArgumentSpec {
            name: name.into(),
            ty,
            required: false,
            description: description.into(),
        });
        self
    }

    /// Validates a JSON argument object against this schema: arguments must
    /// form an object, every required argument must be present, and every
    /// supplied argument must be declared with a matching type.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` describing the first violation.
    pub fn validate(&self, arguments: &Value) -> Result<()> {
        let object = arguments.as_object().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "arguments for '{}' must be a JSON object",
                self.name
            ))
        })?;

        for spec in &self.arguments {
            match object.get(&spec.name) {
                Some(value) => {
                    if !spec.ty.accepts(value) {
                        return Err(Error::InvalidArgument(format!(
                            "argument '{}' of '{}' must be a {:?}",
                            spec.name, self.name, spec.ty
                        )));
                    }
                }
                None if spec.required => {
                    return Err(Error::InvalidArgument(format!(
                        "missing required argument '{}' for '{}'",
                        spec.name, self.name
                    )));
                }
                None => {}
            }
        }

        for key in object.keys() {
            if !self.arguments.iter().any(|spec| &spec.name == key) {
                return Err(Error::InvalidArgument(format!(
                    "unknown argument '{key}' for '{}'",
                    self.name
                )));
            }
        }

        Ok(())
    }
}
