use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque per-record payload from the upstream table.
///
/// The upstream schema renames and reshapes fields often, so the payload is
/// stored as one JSON column instead of typed columns. All shape handling
/// happens once, in [`FieldMap::normalize`] at ingestion time; readers only
/// ever see canonical snake_case keys with scalar values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct FieldMap(Map<String, Value>);

/// Canonical key for the routed team, written by the assignment pass.
pub const TEAM_ROUTED: &str = "team_routed";

impl FieldMap {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Parse a stored `fields_json` column. Errors bubble up so callers can
    /// decide whether to skip the row (read paths) or fail (nothing else).
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Map raw upstream fields into the canonical shape.
    ///
    /// Upstream names drifted across table revisions ("Initial Description"
    /// vs "Notes" as the primary text, "Type of Issue" vs "Type of Report",
    /// an "Environment" select vs a "CW 2.0 Bug" checkbox), and multi-select
    /// fields arrive as arrays. Each logical field is resolved here exactly
    /// once; nothing downstream re-interprets shapes.
    pub fn normalize(raw: &Map<String, Value>) -> Self {
        let mut out = Map::new();

        let mut put = |key: &str, value: Option<Value>| {
            if let Some(v) = value {
                out.insert(key.to_string(), v);
            }
        };

        put(
            "initial_description",
            first_of(raw, &["Initial Description", "InitialDescription"]),
        );
        put("notes", scalar(raw, "Notes"));
        put("priority", scalar(raw, "Priority"));
        put("status", scalar(raw, "Status"));
        put(
            "type_of_issue",
            first_of(raw, &["Type of Issue", "Type of Report"]),
        );
        put("issue_number", scalar(raw, "Issue"));
        put("reporter_email", scalar(raw, "User Profile Email"));
        put("slack_thread", scalar(raw, "Slack Thread Link"));
        put("triage_rep", scalar(raw, "Triage Rep"));
        put("source", scalar(raw, "Source"));
        put("resolution_notes", scalar(raw, "Resolution Notes"));
        put("directory_link", scalar(raw, "Directory Link"));
        put(TEAM_ROUTED, scalar(raw, "Team Routed"));

        let mut fields = Self(out);
        fields.resolve_environment(raw);
        fields.resolve_area(raw);
        fields
    }

    /// "Environment" select when present, otherwise derived from the older
    /// "CW 2.0 Bug" checkbox.
    fn resolve_environment(&mut self, raw: &Map<String, Value>) {
        let env = match scalar(raw, "Environment") {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => match raw.get("CW 2.0 Bug").and_then(Value::as_bool) {
                Some(true) => "CW 2.0".to_string(),
                Some(false) => "CW 1.0".to_string(),
                None => return,
            },
        };
        self.0.insert("environment".to_string(), Value::String(env));
    }

    /// "Area Impacted" when present; older rows only hinted the area inside
    /// the notes text, so fall back to keyword sniffing there.
    fn resolve_area(&mut self, raw: &Map<String, Value>) {
        if let Some(Value::String(s)) = scalar(raw, "Area Impacted") {
            if !s.is_empty() {
                self.0.insert("area_impacted".to_string(), Value::String(s));
                return;
            }
        }

        let notes = self.str_field("notes").unwrap_or_default();
        let area = [
            ("Agent Portal", "Agent Portal"),
            ("Salesforce", "Salesforce"),
            ("Quote", "Quoting System"),
            ("Bind", "Binding System"),
            ("Upload", "File Upload"),
        ]
        .iter()
        .find(|(needle, _)| notes.contains(needle))
        .map(|(_, label)| label.to_string())
        .or_else(|| self.str_field("type_of_issue").map(str::to_string));

        if let Some(area) = area {
            if !area.is_empty() {
                self.0
                    .insert("area_impacted".to_string(), Value::String(area));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// String accessor; empty strings read as absent.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        match self.0.get(key).and_then(Value::as_str) {
            Some("") => None,
            other => other,
        }
    }

    pub fn team(&self) -> Option<&str> {
        self.str_field(TEAM_ROUTED)
    }

    pub fn set_team(&mut self, team: &str) {
        self.0
            .insert(TEAM_ROUTED.to_string(), Value::String(team.to_string()));
    }

    /// Display label for the numeric priority field. Absent means the
    /// reporter never set one, which the table treats as lowest.
    pub fn priority_label(&self) -> &str {
        match self.0.get("priority") {
            None => "Low",
            Some(v) => match scalar_u64(v) {
                Some(1) => "High",
                Some(2) => "Medium",
                Some(3) => "Low",
                Some(_) => "Medium",
                None => match v.as_str() {
                    Some("High") | Some("high") => "High",
                    Some("Low") | Some("low") => "Low",
                    _ => "Medium",
                },
            },
        }
    }

    pub fn environment_label(&self) -> &str {
        self.str_field("environment").unwrap_or("Unknown")
    }

    /// Primary description. "Initial Description" took over from "Notes" as
    /// the reporting form evolved; older records only populated the latter.
    pub fn description(&self) -> &str {
        self.str_field("initial_description")
            .or_else(|| self.str_field("notes"))
            .map(str::trim)
            .unwrap_or("No description")
    }

    /// Concatenated text used for similarity scoring against the reference
    /// ticket corpus.
    pub fn assignment_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if self.description() != "No description" {
            parts.push(self.description());
        }
        if let Some(area) = self.str_field("area_impacted") {
            parts.push(area);
        }
        if let Some(kind) = self.str_field("type_of_issue") {
            parts.push(kind);
        }
        parts.join(" ")
    }
}

/// Collapse an upstream value to a scalar: multi-select and lookup fields
/// arrive as arrays, of which the first entry is the meaningful one.
fn fold_scalar(value: &Value) -> Option<Value> {
    match value {
        Value::Array(items) => items.first().and_then(fold_scalar),
        Value::String(s) => Some(Value::String(s.trim().to_string())),
        other => Some(other.clone()),
    }
}

fn scalar(raw: &Map<String, Value>, key: &str) -> Option<Value> {
    raw.get(key).and_then(fold_scalar)
}

fn first_of(raw: &Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter().find_map(|key| match scalar(raw, key) {
        Some(Value::String(s)) if s.is_empty() => None,
        other => other,
    })
}

fn scalar_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
