//! JSON shapes of the highlight ("node location") API.

use serde::{Deserialize, Serialize};

use crate::overlay::{Highlight, HighlightDraft, HighlightId, HighlightPatch, HighlightRect};

const DEFAULT_WIDTH: f32 = 10.0;
const DEFAULT_HEIGHT: f32 = 5.0;
const DEFAULT_COLOR: &str = "#FFFF00";

/// Body of `POST /api/pid/location`.
#[derive(Debug, Serialize)]
pub struct CreateLocation<'a> {
    pub node_id: Option<&'a str>,
    pub pid_document_id: &'a str,
    pub page_number: u32,
    pub x_coordinate: f32,
    pub y_coordinate: f32,
    pub width: f32,
    pub height: f32,
    pub color: &'a str,
}

impl<'a> From<&'a HighlightDraft> for CreateLocation<'a> {
    fn from(draft: &'a HighlightDraft) -> Self {
        Self {
            node_id: draft.owner_ref.as_deref(),
            pid_document_id: &draft.document_id,
            page_number: draft.page_number,
            x_coordinate: draft.rect.center_x,
            y_coordinate: draft.rect.center_y,
            width: draft.rect.width,
            height: draft.rect.height,
            color: &draft.color,
        }
    }
}

/// Body of `PATCH /api/pid/location/{id}`; absent fields are untouched.
#[derive(Debug, Default, Serialize)]
pub struct LocationPatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_coordinate: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_coordinate: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'a str>,
}

impl<'a> From<&'a HighlightPatch> for LocationPatch<'a> {
    fn from(patch: &'a HighlightPatch) -> Self {
        Self {
            page_number: patch.page_number,
            x_coordinate: patch.rect.map(|r| r.center_x),
            y_coordinate: patch.rect.map(|r| r.center_y),
            width: patch.rect.map(|r| r.width),
            height: patch.rect.map(|r| r.height),
            color: patch.color.as_deref(),
        }
    }
}

/// A stored record as returned by create and list.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationRecord {
    pub id: String,
    #[serde(default)]
    pub node_id: Option<String>,
    pub pid_document_id: String,
    pub page_number: u32,
    pub x_coordinate: f32,
    pub y_coordinate: f32,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<LocationRecord> for Highlight {
    fn from(record: LocationRecord) -> Self {
        Highlight {
            id: HighlightId::Server(record.id),
            document_id: record.pid_document_id,
            page_number: record.page_number,
            rect: HighlightRect::new(
                record.x_coordinate,
                record.y_coordinate,
                record.width.unwrap_or(DEFAULT_WIDTH),
                record.height.unwrap_or(DEFAULT_HEIGHT),
            ),
            color: record
                .color
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            owner_ref: record.node_id,
        }
    }
}

/// FastAPI-style error body. `detail` is a string or a list of validation
/// errors.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_body_uses_center_coordinates() {
        let draft = HighlightDraft {
            document_id: "pid-1".into(),
            page_number: 3,
            rect: HighlightRect::new(20.0, 18.75, 20.0, 12.5),
            color: "#FF0000".into(),
            owner_ref: Some("node-1".into()),
        };
        let json = serde_json::to_value(CreateLocation::from(&draft)).unwrap();
        assert_eq!(json["pid_document_id"], "pid-1");
        assert_eq!(json["node_id"], "node-1");
        assert_eq!(json["page_number"], 3);
        assert_eq!(json["x_coordinate"], 20.0);
        assert_eq!(json["y_coordinate"], 18.75);
        assert_eq!(json["height"], 12.5);
    }

    #[test]
    fn test_patch_body_omits_untouched_fields() {
        let patch = HighlightPatch {
            color: Some("#00FF00".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&LocationPatch::from(&patch)).unwrap();
        assert_eq!(json, r##"{"color":"#00FF00"}"##);
    }

    #[test]
    fn test_record_defaults() {
        let json = r#"{
            "id": "9b2c",
            "pid_document_id": "pid-1",
            "page_number": 2,
            "x_coordinate": 40.0,
            "y_coordinate": 60.0,
            "width": null,
            "created_at": "2025-10-12T17:13:49"
        }"#;
        let record: LocationRecord = serde_json::from_str(json).unwrap();
        let highlight = Highlight::from(record);
        assert_eq!(highlight.id, HighlightId::Server("9b2c".into()));
        assert_eq!(highlight.rect, HighlightRect::new(40.0, 60.0, 10.0, 5.0));
        assert_eq!(highlight.color, "#FFFF00");
        assert!(highlight.owner_ref.is_none());
    }

    #[test]
    fn test_error_body_message() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"Location not found"}"#).unwrap();
        assert_eq!(body.message(), "Location not found");
        let body: ErrorBody = serde_json::from_str(r#"{"detail":[{"loc":["body"]}]}"#).unwrap();
        assert!(body.message().starts_with('['));
    }
}
