//! Schema validator collaborator interface
//!
//! The engine performs no schema interpretation itself. When a
//! validator is configured, its issue list is applied under the
//! caller's [`crate::options::ValidationPolicy`]: fatal under
//! fail-on-error, otherwise recorded as warnings on the object's
//! result.

use resource_model::ResourceObject;

/// One problem found in a resource definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Human-readable description of the problem.
    pub message: String,
}

impl ValidationIssue {
    /// Issue from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Validates resource definitions against a published schema.
pub trait SchemaValidator: Send + Sync {
    /// Returns all issues found; an empty list means the definition
    /// passed.
    fn validate(
        &self,
        obj: &ResourceObject,
        version: Option<&str>,
        strict: bool,
    ) -> Vec<ValidationIssue>;
}
