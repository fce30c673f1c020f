//! Warnings and errors collected while loading and compiling, rendered
//! for humans.

mod message;
mod printer;


use std::ops::Range;

pub use message::{DiagnosticKind, DiagnosticMessage, Severity};
pub use printer::DiagnosticsPrinter;

use message::SourceSpan;

use crate::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a diagnostic of `kind` with the kind's default message.
    pub fn report(&mut self, kind: DiagnosticKind) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage::new(kind, kind.fallback_message()),
        }
    }

    /// Record a failed load or compile. Parse errors keep their span so the
    /// offending expression can be shown.
    pub fn report_error(&mut self, error: &Error) {
        let (profile, cause) = match error {
            Error::ProfileInvalid { profile, .. } => (Some(profile.clone()), error.root_cause()),
            other => (None, other),
        };
        let builder = match cause {
            Error::Parse(parse) => self
                .report(DiagnosticKind::ExpressionSyntax)
                .message(parse.message.clone())
                .source(parse.text.clone(), parse.span.clone()),
            other if profile.is_some() => self
                .report(DiagnosticKind::InvalidProfile)
                .message(other.to_string()),
            other => self
                .report(DiagnosticKind::InvalidApplication)
                .message(other.to_string()),
        };
        match profile {
            Some(profile) => builder.profile(profile).emit(),
            None => builder.emit(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.is_error())
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|d| d.is_warning())
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_warning()).count()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }

    pub fn printer(&self) -> DiagnosticsPrinter<'_> {
        DiagnosticsPrinter::new(self)
    }

    pub fn render(&self) -> String {
        self.printer().render()
    }

    pub fn render_colored(&self, colored: bool) -> String {
        self.printer().colored(colored).render()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticMessage;
    type IntoIter = std::slice::Iter<'a, DiagnosticMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl DiagnosticBuilder<'_> {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message.message = message.into();
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.message.profile = Some(profile.into());
        self
    }

    /// Point at `range` within the expression `text`.
    pub fn source(mut self, text: impl Into<String>, range: Range<usize>) -> Self {
        self.message.span = Some(SourceSpan {
            text: text.into(),
            range,
        });
        self
    }

    pub fn emit(self) {
        self.diagnostics.messages.push(self.message);
    }
}
