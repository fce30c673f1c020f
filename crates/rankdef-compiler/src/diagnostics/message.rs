use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // Expression text that does not parse
    ExpressionSyntax,

    // The application description is inconsistent
    InvalidApplication,
    InvalidProfile,

    // Accepted, but probably not what was meant
    UndeclaredQueryFeature,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::UndeclaredQueryFeature => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub(crate) fn fallback_message(&self) -> &'static str {
        match self {
            Self::ExpressionSyntax => "ranking expression does not parse",
            Self::InvalidApplication => "invalid application",
            Self::InvalidProfile => "invalid rank profile",
            Self::UndeclaredQueryFeature => "query feature is used without being declared",
        }
    }
}

/// Expression text and the byte range a diagnostic points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceSpan {
    pub(crate) text: String,
    pub(crate) range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    pub(crate) message: String,
    pub(crate) profile: Option<String>,
    pub(crate) span: Option<SourceSpan>,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            profile: None,
            span: None,
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn severity(&self) -> Severity {
        self.kind.default_severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }

    /// Message prefixed with the profile it concerns.
    pub(crate) fn title(&self) -> String {
        match &self.profile {
            Some(profile) => format!("rank profile '{profile}': {}", self.message),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity(), self.title())?;
        if let Some(span) = &self.span {
            write!(f, " (at {}..{})", span.range.start, span.range.end)?;
        }
        Ok(())
    }
}
