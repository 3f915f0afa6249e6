use serde::{Deserialize, Serialize};
use std::fmt;

use crate::telemetry::generate_correlation_id;

/// A technician that tasks and orders can be assigned to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Technician(pub String);

impl Technician {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Technician {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is performing a workflow invocation.
///
/// Passed explicitly into every workflow operation instead of being read from
/// a session, so the workflows run the same way from the CLI and from tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorContext {
    pub operator: String,
    pub correlation_id: String,
}

impl OperatorContext {
    pub fn new(operator: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            correlation_id: generate_correlation_id(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }
}
