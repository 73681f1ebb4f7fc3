use crate::ast::SourceMap;
use super::{Diagnostic, Severity};

pub fn render(d: &Diagnostic) -> String {
    let severity = match d.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };

    let source_map = d.source.as_deref().map(SourceMap::new);

    let labels: Vec<serde_json::Value> = d.labels.iter().map(|l| {
        let mut obj = serde_json::json!({
            "start": l.span.start,
            "end": l.span.end,
            "message": l.message,
        });
        if let Some(map) = &source_map {
            let pos = map.position(l.span.start);
            obj["line"] = serde_json::Value::from(pos.line);
            obj["col"] = serde_json::Value::from(pos.column);
        }
        obj
    }).collect();

    let mut obj = serde_json::json!({
        "severity": severity,
        "message": d.message,
        "labels": labels,
        "notes": d.notes,
    });

    if let Some(code) = d.code {
        obj["code"] = serde_json::Value::String(code.to_string());
    }

    if let Some(s) = &d.suggestion {
        obj["suggestion"] = serde_json::Value::String(s.clone());
    }

    serde_json::to_string(&obj).unwrap_or_else(|_| r#"{"severity":"error","message":"internal error serializing diagnostic"}"#.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;

    fn parse_json(s: &str) -> serde_json::Value {
        serde_json::from_str(s).expect("valid JSON")
    }

    #[test]
    fn render_basic_error() {
        let v = parse_json(&render(&Diagnostic::error("division by zero").with_code("DRD-R009")));
        assert_eq!(v["severity"], "error");
        assert_eq!(v["code"], "DRD-R009");
        assert_eq!(v["message"], "division by zero");
        assert!(v["labels"].as_array().unwrap().is_empty());
        assert!(v.get("suggestion").is_none());
    }

    #[test]
    fn render_warning_severity() {
        let v = parse_json(&render(&Diagnostic::warning("nothing to do")));
        assert_eq!(v["severity"], "warning");
        assert!(v.get("code").is_none());
    }

    #[test]
    fn render_label_with_line_and_col() {
        let d = Diagnostic::error("bad token")
            .with_span(Span { start: 9, end: 10 }, "here")
            .with_source("var a;\na # 1;");
        let v = parse_json(&render(&d));
        let label = &v["labels"][0];
        assert_eq!(label["start"], 9);
        assert_eq!(label["line"], 2);
        assert_eq!(label["col"], 3);
    }

    #[test]
    fn render_label_without_source_has_no_position() {
        let d = Diagnostic::error("bad").with_span(Span { start: 5, end: 8 }, "here");
        let v = parse_json(&render(&d));
        assert!(v["labels"][0].get("line").is_none());
    }

    #[test]
    fn render_notes_and_suggestion() {
        let d = Diagnostic::error("cyclic dependency found while deriving 'b'")
            .with_note("'b' would end up depending on itself")
            .with_suggestion("assign with '=' instead");
        let v = parse_json(&render(&d));
        assert_eq!(v["notes"][0], "'b' would end up depending on itself");
        assert_eq!(v["suggestion"], "assign with '=' instead");
    }
}
