use anyhow::Context as _;
use apigw_catalog::{EndpointDetail, EndpointHit, render_endpoint};
use apigw_saved_queries::SavedQuery;
use owo_colors::OwoColorize as _;
use serde::Serialize;
use std::io::IsTerminal as _;

/// Writes command results to stdout, as JSON or as human-readable text.
pub struct Printer {
    json: bool,
    color: bool,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        let color = !json
            && std::io::stdout().is_terminal()
            && std::env::var_os("NO_COLOR").is_none();
        Self { json, color }
    }

    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(value).context("serialize output as json")?;
        println!("{text}");
        Ok(())
    }

    pub fn endpoint(&self, detail: &EndpointDetail) -> anyhow::Result<()> {
        if self.json {
            return self.json(detail);
        }
        println!("{}", render_endpoint(detail));
        Ok(())
    }

    pub fn hits(&self, hits: &[EndpointHit]) -> anyhow::Result<()> {
        if self.json {
            return self.json(hits);
        }
        if hits.is_empty() {
            println!("No matching endpoints.");
            return Ok(());
        }
        for hit in hits {
            println!("{}", self.hit_line(hit));
        }
        Ok(())
    }

    pub fn categories(&self, categories: &[String]) -> anyhow::Result<()> {
        if self.json {
            return self.json(categories);
        }
        for c in categories {
            println!("{c}");
        }
        Ok(())
    }

    pub fn saved(&self, rows: &[SavedQuery]) -> anyhow::Result<()> {
        if self.json {
            return self.json(rows);
        }
        if rows.is_empty() {
            println!("No saved queries.");
            return Ok(());
        }
        for row in rows {
            println!("{}", self.saved_line(row));
        }
        Ok(())
    }

    pub fn saved_one(&self, row: &SavedQuery) -> anyhow::Result<()> {
        if self.json {
            return self.json(row);
        }
        println!("{}", self.saved_line(row));
        if let Some(params) = &row.params {
            println!("  params: {params}");
        }
        if let Some(data) = &row.data {
            println!("  data:   {data}");
        }
        Ok(())
    }

    pub fn saved_id(&self, id: i32) -> anyhow::Result<()> {
        if self.json {
            return self.json(&serde_json::json!({ "id": id }));
        }
        println!("Saved query #{id}.");
        Ok(())
    }

    /// An explicit empty result: `null` in JSON mode, `text` otherwise.
    pub fn not_found(&self, text: &str) -> anyhow::Result<()> {
        println!("{}", self.not_found_text(text));
        Ok(())
    }

    fn not_found_text<'a>(&self, text: &'a str) -> &'a str {
        if self.json { "null" } else { text }
    }

    pub fn message(&self, text: &str) -> anyhow::Result<()> {
        if self.json {
            return self.json(&serde_json::json!({ "message": text }));
        }
        println!("{text}");
        Ok(())
    }

    fn hit_line(&self, hit: &EndpointHit) -> String {
        let method = format!("{:<6}", hit.method.to_uppercase());
        let mut line = if self.color {
            format!("{} {}", method.bold(), hit.path.cyan())
        } else {
            format!("{method} {}", hit.path)
        };
        if let Some(summary) = hit
            .summary_highlight
            .as_deref()
            .or(hit.summary.as_deref())
            .filter(|s| !s.trim().is_empty())
        {
            line.push_str("  ");
            line.push_str(summary);
        }
        if let Some(category) = hit.category.as_deref() {
            let tag = format!("[{category}]");
            line.push_str("  ");
            if self.color {
                line.push_str(&tag.dimmed().to_string());
            } else {
                line.push_str(&tag);
            }
        }
        line
    }

    fn saved_line(&self, row: &SavedQuery) -> String {
        let head = format!("#{:<5} {:<6} {}", row.id, row.method, row.path);
        let head = if self.color {
            head.bold().to_string()
        } else {
            head
        };
        format!("{head}  x{}  {}", row.usage_count, row.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Printer {
        Printer {
            json: false,
            color: false,
        }
    }

    #[test]
    fn hit_line_prefers_highlighted_summary() {
        let hit = EndpointHit {
            id: 1,
            path: "/service/tickets".into(),
            method: "get".into(),
            description: None,
            category: Some("Service".into()),
            tags: None,
            summary: Some("List tickets".into()),
            rank: Some(0.5),
            summary_highlight: Some("List <b>tickets</b>".into()),
            description_highlight: None,
        };
        assert_eq!(
            plain().hit_line(&hit),
            "GET    /service/tickets  List <b>tickets</b>  [Service]"
        );
    }

    #[test]
    fn not_found_is_null_in_json_mode() {
        let json = Printer {
            json: true,
            color: false,
        };
        assert_eq!(json.not_found_text("No saved query with id 3."), "null");
        assert_eq!(
            plain().not_found_text("No saved query with id 3."),
            "No saved query with id 3."
        );
    }

    #[test]
    fn saved_line_shows_usage() {
        let row = SavedQuery {
            id: 7,
            description: "open tickets".into(),
            path: "/service/tickets".into(),
            method: "GET".into(),
            params: None,
            data: None,
            timestamp: 0,
            usage_count: 4,
        };
        assert_eq!(
            plain().saved_line(&row),
            "#7     GET    /service/tickets  x4  open tickets"
        );
    }
}
