//! Builder-pattern printer for rendering diagnostics.

use std::fmt::Write;
use std::ops::Range;

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};

use super::Diagnostics;
use super::message::Severity;

pub struct DiagnosticsPrinter<'d> {
    diagnostics: &'d Diagnostics,
    colored: bool,
}

impl<'d> DiagnosticsPrinter<'d> {
    pub fn new(diagnostics: &'d Diagnostics) -> Self {
        Self {
            diagnostics,
            colored: false,
        }
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }
            let title = diag.title();
            let Some(span) = &diag.span else {
                writeln!(w, "{}: {title}", diag.severity())?;
                continue;
            };
            let snippet = Snippet::source(span.text.as_str()).line_start(1).annotation(
                AnnotationKind::Primary
                    .span(adjust_range(&span.range, span.text.len()))
                    .label(diag.message.as_str()),
            );
            let report = vec![severity_to_level(diag.severity())
                .primary_title(title.as_str())
                .element(snippet)];
            writeln!(w, "{}", renderer.render(&report))?;
        }
        Ok(())
    }
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Error => Level::ERROR,
        Severity::Warning => Level::WARNING,
    }
}

/// Empty ranges are widened to one character so they stay visible.
fn adjust_range(range: &Range<usize>, limit: usize) -> Range<usize> {
    let start = range.start.min(limit);
    let end = range.end.min(limit);
    if start == end {
        return start..(start + 1).min(limit);
    }
    start..end
}
