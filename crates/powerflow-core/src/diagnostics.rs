//! Collected warnings and errors from network validation.
//!
//! ```
//! use powerflow_core::diagnostics::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning("structure", "Network has no loads");
//! diag.add_error_with_entity("reference", "Generator bus does not exist", "Gen 3");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert!(diag.has_errors());
//! ```

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Suspicious but solvable
    Warning,
    /// The network cannot be solved as-is
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Grouping key such as "structure" or "reference"
    pub category: String,
    pub message: String,
    /// Element the issue refers to, e.g. "Bus 14"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.entity {
            Some(entity) => write!(f, "{level}[{}] {entity}: {}", self.category, self.message),
            None => write!(f, "{level}[{}] {}", self.category, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.add(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.add(DiagnosticIssue::new(Severity::Error, category, message));
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.add(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn issues(&self) -> &[DiagnosticIssue] {
        &self.issues
    }

    /// One line per error, joined with "; ", for error messages.
    pub fn error_summary(&self) -> String {
        self.errors()
            .map(|issue| issue.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_severity() {
        let mut diag = Diagnostics::new();
        diag.add_warning("structure", "Network has no loads");
        diag.add_error("structure", "Network has no buses");
        diag.add_error_with_entity("reference", "unknown bus 99", "Load 3");

        assert_eq!(diag.warning_count(), 1);
        assert_eq!(diag.error_count(), 2);
        assert!(diag.has_errors());
        assert_eq!(diag.issues().len(), 3);
    }

    #[test]
    fn error_summary_joins_errors_only() {
        let mut diag = Diagnostics::new();
        diag.add_warning("structure", "ignored");
        diag.add_error_with_entity("reference", "unknown bus 99", "Load 3");
        diag.add_error("structure", "Network has no buses");

        assert_eq!(
            diag.error_summary(),
            "error[reference] Load 3: unknown bus 99; error[structure] Network has no buses"
        );
    }

    #[test]
    fn issue_serializes_without_empty_entity() {
        let issue = DiagnosticIssue::new(Severity::Warning, "structure", "no loads");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["severity"], "warning");
        assert!(json.get("entity").is_none());
    }
}
