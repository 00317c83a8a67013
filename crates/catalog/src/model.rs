use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key used for response bodies stored without a status code.
pub const DEFAULT_STATUS_KEY: &str = "default";

/// A catalog row as returned by searches and category listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EndpointHit {
    pub id: i32,
    pub path: String,
    pub method: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub summary: Option<String>,
    /// Relevance score from a ranked tier. `None` for substring matches.
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<f32>,
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_highlight: Option<String>,
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_highlight: Option<String>,
}

/// Base `endpoints` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRow {
    pub id: i32,
    pub path: String,
    pub method: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub tags: Option<String>,
    pub keywords: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub id: i32,
    pub endpoint_id: i32,
    pub name: String,
    /// `path`, `query`, `header` or `body`.
    pub location: String,
    pub required: Option<bool>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub param_type: Option<String>,
    pub description: Option<String>,
}

impl Parameter {
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}

/// A stored schema or example document.
///
/// The importer writes these as text. Text that parses as JSON is exposed as [`Payload::Json`];
/// anything else passes through untouched as [`Payload::Raw`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Json(Value),
    Raw(String),
}

impl Payload {
    /// Best-effort decode of a stored document. Blank text is treated as absent.
    #[must_use]
    pub fn from_stored(text: Option<String>) -> Option<Self> {
        let text = text?;
        if text.trim().is_empty() {
            return None;
        }
        Some(match serde_json::from_str::<Value>(&text) {
            Ok(v) => Payload::Json(v),
            Err(_) => Payload::Raw(text),
        })
    }

    #[must_use]
    pub fn is_raw(&self) -> bool {
        matches!(self, Payload::Raw(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Payload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub id: i32,
    pub status_code: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Payload>,
}

/// A fully hydrated catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDetail {
    #[serde(flatten)]
    pub endpoint: EndpointRow,
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Keyed by status code (`"200"`, `"404"`, ...); see [`DEFAULT_STATUS_KEY`].
    pub response_bodies: BTreeMap<String, ResponseBody>,
}
