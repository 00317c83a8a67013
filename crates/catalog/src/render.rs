//! Plain-text rendering of a hydrated catalog entry.

use crate::model::{EndpointDetail, Payload};
use std::fmt::Write as _;

/// Multi-line, human-readable view of `detail` for terminals and chat transcripts.
#[must_use]
pub fn render_endpoint(detail: &EndpointDetail) -> String {
    let e = &detail.endpoint;
    let mut out = format!("=== {} {} ===\n", e.method.to_uppercase(), e.path);
    for (label, value) in [
        ("Category", &e.category),
        ("Summary", &e.summary),
        ("Description", &e.description),
    ] {
        if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            let _ = writeln!(out, "{label}: {v}");
        }
    }

    if !detail.parameters.is_empty() {
        out.push_str("\nParameters:\n");
        for p in &detail.parameters {
            let _ = write!(out, "  - {} [{}]", p.name, p.location);
            if let Some(ty) = &p.param_type {
                let _ = write!(out, " ({ty})");
            }
            if p.is_required() {
                out.push_str(" required");
            }
            if let Some(desc) = p.description.as_deref().filter(|d| !d.trim().is_empty()) {
                let _ = write!(out, ": {desc}");
            }
            out.push('\n');
        }
    }

    if let Some(body) = &detail.request_body {
        out.push_str("\nRequest body:\n");
        if let Some(example) = &body.example {
            push_payload(&mut out, "  Example", example);
        } else if let Some(schema) = &body.schema {
            push_payload(&mut out, "  Schema", schema);
        }
    }

    if !detail.response_bodies.is_empty() {
        out.push_str("\nResponses:\n");
        for (status, resp) in &detail.response_bodies {
            let _ = writeln!(out, "  {status}:");
            if let Some(desc) = resp.description.as_deref().filter(|d| !d.trim().is_empty()) {
                let _ = writeln!(out, "    Description: {desc}");
            }
            if let Some(example) = &resp.example {
                push_payload(&mut out, "    Example", example);
            }
        }
    }

    out.truncate(out.trim_end().len());
    out
}

fn push_payload(out: &mut String, label: &str, payload: &Payload) {
    let text = match payload {
        Payload::Json(v) => serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
        Payload::Raw(s) => s.clone(),
    };
    let _ = writeln!(out, "{label}: {text}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EndpointRow, Parameter, RequestBody, ResponseBody};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn detail() -> EndpointDetail {
        let mut responses = BTreeMap::new();
        responses.insert(
            "200".to_string(),
            ResponseBody {
                id: 1,
                status_code: Some("200".into()),
                description: Some("OK".into()),
                schema: None,
                example: Some(Payload::Json(json!({"id": 1}))),
            },
        );
        responses.insert(
            "404".to_string(),
            ResponseBody {
                id: 2,
                status_code: Some("404".into()),
                description: None,
                schema: None,
                example: Some(Payload::Raw("not found".into())),
            },
        );
        EndpointDetail {
            endpoint: EndpointRow {
                id: 10,
                path: "/service/tickets/{id}".into(),
                method: "get".into(),
                description: Some("Fetch one ticket".into()),
                category: Some("Service".into()),
                summary: None,
                tags: None,
                keywords: None,
            },
            parameters: vec![Parameter {
                id: 1,
                endpoint_id: 10,
                name: "id".into(),
                location: "path".into(),
                required: Some(true),
                param_type: Some("integer".into()),
                description: None,
            }],
            request_body: Some(RequestBody {
                id: 3,
                schema: None,
                example: Some(Payload::Raw("<xml/>".into())),
            }),
            response_bodies: responses,
        }
    }

    #[test]
    fn renders_header_fields_and_sections() {
        let text = render_endpoint(&detail());
        assert!(text.starts_with("=== GET /service/tickets/{id} ==="));
        assert!(text.contains("Category: Service"));
        assert!(!text.contains("Summary:"));
        assert!(text.contains("  - id [path] (integer) required"));
        assert!(text.contains("Example: <xml/>"));
        assert!(text.contains("  200:\n    Description: OK\n    Example: {\n  \"id\": 1\n}"));
        assert!(text.ends_with("Example: not found"));
    }

    #[test]
    fn bare_endpoint_is_just_a_header() {
        let mut d = detail();
        d.endpoint.category = None;
        d.endpoint.description = Some("  ".into());
        d.parameters.clear();
        d.request_body = None;
        d.response_bodies.clear();
        assert_eq!(render_endpoint(&d), "=== GET /service/tickets/{id} ===");
    }
}
