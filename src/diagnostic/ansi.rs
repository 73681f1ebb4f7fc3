use crate::ast::SourceMap;
use super::{Diagnostic, Severity};

pub struct AnsiRenderer {
    pub use_color: bool,
}

impl AnsiRenderer {
    fn paint(&self, style: &str, s: &str) -> String {
        if self.use_color { format!("\x1b[{style}m{s}\x1b[0m") } else { s.to_string() }
    }

    pub fn render(&self, d: &Diagnostic) -> String {
        let mut out = String::new();

        let severity = match d.severity {
            Severity::Error => self.paint("1;31", "error"),
            Severity::Warning => self.paint("1;33", "warning"),
        };
        let code = d.code.map(|c| format!("[{c}]")).unwrap_or_default();
        out.push_str(&format!("{}{}: {}\n", severity, code, self.paint("1", &d.message)));

        if let (Some(label), Some(source)) = (d.labels.first(), &d.source) {
            let map = SourceMap::new(source);
            let pos = map.position(label.span.start);
            let gutter = " ".repeat(pos.line.to_string().len());
            let pipe = self.paint("36", "|");

            out.push_str(&format!("{} {} {}:{}\n", gutter, self.paint("36", "-->"), pos.line, pos.column));
            out.push_str(&format!("{gutter} {pipe}\n"));
            out.push_str(&format!("{} {pipe} {}\n", self.paint("36", &pos.line.to_string()), map.line(pos.line)));

            let width = label.span.end.saturating_sub(label.span.start).max(1);
            let carets = self.paint("1;31", &"^".repeat(width));
            let indent = " ".repeat(pos.column - 1);
            if label.message.is_empty() {
                out.push_str(&format!("{gutter} {pipe} {indent}{carets}\n"));
            } else {
                out.push_str(&format!("{gutter} {pipe} {indent}{carets} {}\n", self.paint("1;31", &label.message)));
            }
        }

        for note in &d.notes {
            out.push_str(&format!("  {} note: {}\n", self.paint("2", "="), note));
        }
        if let Some(suggestion) = &d.suggestion {
            out.push_str(&format!("  {} suggestion: {}\n", self.paint("2", "="), suggestion));
        }

        out
    }
}
