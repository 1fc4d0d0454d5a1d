//! Accumulated warnings and errors.
//!
//! Graph validation and vertex callbacks both report through [`Diagnostics`]
//! rather than returning on the first problem, so that one walk can surface
//! every independent failure at once.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::Error;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// A position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
    pub byte: usize,
}

/// A span of configuration source that a diagnostic refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub filename: String,
    pub start: SourcePos,
    pub end: SourcePos,
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{}-{},{}",
            self.filename, self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

/// A single warning or error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    severity: Severity,
    summary: String,
    detail: Option<String>,
    subject: Option<SourceRange>,
    /// Name of the graph vertex whose work produced this diagnostic
    vertex: Option<String>,
}

impl Diagnostic {
    /// Creates an error diagnostic
    pub fn error(summary: impl Into<String>) -> Self {
        Self::new(Severity::Error, summary)
    }

    /// Creates a warning diagnostic
    pub fn warning(summary: impl Into<String>) -> Self {
        Self::new(Severity::Warning, summary)
    }

    fn new(severity: Severity, summary: impl Into<String>) -> Self {
        Self {
            severity,
            summary: summary.into(),
            detail: None,
            subject: None,
            vertex: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_subject(mut self, subject: SourceRange) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_vertex(mut self, vertex: impl Into<String>) -> Self {
        self.vertex = Some(vertex.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn subject(&self) -> Option<&SourceRange> {
        self.subject.as_ref()
    }

    /// Returns the name of the vertex this diagnostic is attributed to
    pub fn vertex(&self) -> Option<&str> {
        self.vertex.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        write!(f, "{}: {}", label, self.summary)?;
        if let Some(vertex) = &self.vertex {
            write!(f, " ({})", vertex)?;
        }
        if let Some(subject) = &self.subject {
            write!(f, " at {}", subject)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, "\n\n{}", detail)?;
        }
        Ok(())
    }
}

/// An ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends one diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Appends an error built from anything displayable, typically an
    /// error value returned by a provider call.
    pub fn push_error(&mut self, err: impl fmt::Display) {
        self.0.push(Diagnostic::error(err.to_string()));
    }

    /// Moves every diagnostic from `other` to the end of this collection.
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Attributes every diagnostic that has no vertex yet to `vertex`.
    pub fn attribute_to(mut self, vertex: &str) -> Self {
        for diag in &mut self.0 {
            if diag.vertex.is_none() {
                diag.vertex = Some(vertex.to_string());
            }
        }
        self
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| !d.is_error())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Converts to `Err` when any error is present, keeping warnings out of
    /// the failure path.
    pub fn into_result(self) -> Result<Diagnostics, Error> {
        if self.has_errors() {
            Err(Error::Diagnostics(self))
        } else {
            Ok(self)
        }
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors().count();
        let warnings = self.len() - errors;
        write!(f, "{} error(s), {} warning(s)", errors, warnings)?;
        for diag in &self.0 {
            write!(f, "\n{}", diag)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_errors_ignores_warnings() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning("deprecated attribute"));
        assert!(!diags.has_errors());

        diags.push(Diagnostic::error("boom"));
        assert!(diags.has_errors());
        assert_eq!(diags.errors().count(), 1);
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn test_attribute_to_keeps_existing_vertex() {
        let diags: Diagnostics = vec![
            Diagnostic::error("a"),
            Diagnostic::error("b").with_vertex("other"),
        ]
        .into_iter()
        .collect();

        let diags = diags.attribute_to("aws_instance.web");
        let vertices: Vec<_> = diags.iter().map(|d| d.vertex().unwrap()).collect();
        assert_eq!(vertices, vec!["aws_instance.web", "other"]);
    }

    #[test]
    fn test_into_result() {
        let ok: Diagnostics = Diagnostic::warning("careful").into();
        assert!(ok.into_result().is_ok());

        let bad: Diagnostics = Diagnostic::error("broken").into();
        assert!(matches!(bad.into_result(), Err(Error::Diagnostics(_))));
    }

    #[test]
    fn test_display_includes_detail_and_subject() {
        let diag = Diagnostic::error("Invalid reference")
            .with_detail("A reference to a resource type must be followed by a name.")
            .with_subject(SourceRange {
                filename: "main.tf".to_string(),
                start: SourcePos { line: 3, column: 9, byte: 40 },
                end: SourcePos { line: 3, column: 21, byte: 52 },
            });

        let rendered = diag.to_string();
        assert!(rendered.starts_with("Error: Invalid reference at main.tf:3,9-3,21"));
        assert!(rendered.ends_with("must be followed by a name."));
    }
}
