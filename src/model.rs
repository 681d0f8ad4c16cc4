//! Data model shared by every stage of skin generation.
//!
//! Readers produce [`ColumnMap`]s, [`WorkItemRef`]s and suite trees once; the
//! adapters consume them read-only and emit fresh [`Row`]s of [`Cell`]s for
//! the renderer. Field values are resolved into [`FieldValue`] at ingestion so
//! nothing downstream has to sniff the shape of raw JSON.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Ordered reference-name → display-name mapping for one side of a comparison.
///
/// Serialized as a list of `[reference, display]` pairs so that the display
/// order chosen by the query author survives a JSON round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct ColumnMap {
    entries: Vec<(String, String)>,
}

impl ColumnMap {
    /// Builds a map from ordered pairs. A repeated reference name keeps its
    /// first position and display name.
    pub fn new<I, R, D>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (R, D)>,
        R: Into<String>,
        D: Into<String>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (reference, display) in pairs {
            let reference = reference.into();
            if entries.iter().any(|(existing, _)| *existing == reference) {
                warn!(reference = %reference, "Duplicate column reference ignored");
                continue;
            }
            entries.push((reference, display.into()));
        }
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(reference, display)| (reference.as_str(), display.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reference name of the first column shown under `display`.
    pub fn reference_for(&self, display: &str) -> Option<&str> {
        self.iter()
            .find(|(_, d)| *d == display)
            .map(|(reference, _)| reference)
    }

    pub fn has_display(&self, display: &str) -> bool {
        self.reference_for(display).is_some()
    }

    pub fn display_names(&self) -> BTreeSet<&str> {
        self.iter().map(|(_, display)| display).collect()
    }

    /// Display names present in both maps (the "common columns").
    pub fn common_display_names(&self, other: &ColumnMap) -> BTreeSet<String> {
        let theirs = other.display_names();
        self.display_names()
            .into_iter()
            .filter(|display| theirs.contains(display))
            .map(str::to_owned)
            .collect()
    }
}

impl From<Vec<(String, String)>> for ColumnMap {
    fn from(pairs: Vec<(String, String)>) -> Self {
        ColumnMap::new(pairs)
    }
}

impl From<ColumnMap> for Vec<(String, String)> {
    fn from(map: ColumnMap) -> Self {
        map.entries
    }
}

/// A resolved work-item field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    Reference {
        #[serde(rename = "displayName")]
        display_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl FieldValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        FieldValue::Scalar(value.into())
    }

    pub fn reference(display_name: impl Into<String>) -> Self {
        FieldValue::Reference {
            display_name: display_name.into(),
            id: None,
        }
    }

    /// Resolves raw JSON once. Objects exposing `displayName` (or `name`) become
    /// references, other non-null values become scalars, `null` is absent.
    pub fn from_json(raw: &Value) -> Option<FieldValue> {
        match raw {
            Value::Null => None,
            Value::String(s) => Some(FieldValue::Scalar(s.clone())),
            Value::Number(n) => Some(FieldValue::Scalar(n.to_string())),
            Value::Bool(b) => Some(FieldValue::Scalar(b.to_string())),
            Value::Array(items) => Some(FieldValue::Scalar(
                items
                    .iter()
                    .filter_map(FieldValue::from_json)
                    .map(|v| v.display().to_owned())
                    .collect::<Vec<_>>()
                    .join("; "),
            )),
            Value::Object(obj) => {
                let display_name = obj
                    .get("displayName")
                    .or_else(|| obj.get("name"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned();
                let id = obj.get("id").and_then(|id| match id {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                });
                Some(FieldValue::Reference { display_name, id })
            }
        }
    }

    /// Text shown for this value: the scalar itself or the reference's display name.
    pub fn display(&self) -> &str {
        match self {
            FieldValue::Scalar(s) => s,
            FieldValue::Reference { display_name, .. } => display_name,
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        FieldValue::from_json(&raw).ok_or_else(|| de::Error::custom("field value is null"))
    }
}

/// Deserializes a field map, dropping `null` values instead of failing on them.
pub(crate) fn deserialize_fields<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, FieldValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, Value> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| FieldValue::from_json(&value).map(|v| (key, v)))
        .collect())
}

/// A work item as returned by a query reader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItemRef {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default, deserialize_with = "deserialize_fields")]
    pub fields: BTreeMap<String, FieldValue>,
}

impl WorkItemRef {
    pub fn new(id: u64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, reference: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(reference.into(), value);
        self
    }

    pub fn field(&self, reference: &str) -> Option<&FieldValue> {
        self.fields.get(reference)
    }

    pub fn title(&self) -> &str {
        self.field("System.Title")
            .map(FieldValue::display)
            .unwrap_or_default()
    }
}

/// One source item with its ordered linked targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceTargets {
    pub source: WorkItemRef,
    #[serde(default)]
    pub targets: Vec<WorkItemRef>,
}

/// Ordered source → targets multimap.
pub type SourceTargetMapping = Vec<SourceTargets>;

/// A single styled table cell. The field names are the renderer contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Cell {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_width(mut self, width: Option<&str>) -> Self {
        self.width = width.map(str::to_owned);
        self
    }

    pub fn with_color(mut self, color: Option<&str>) -> Self {
        self.color = color.map(str::to_owned);
        self
    }

    /// Attaches a link; empty urls are treated as absent.
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = (!url.is_empty()).then(|| url.to_owned());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn names(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn values(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.value.as_str()).collect()
    }

    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteNode {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub level: u32,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub test_cases: Vec<TestCaseNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseNode {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<StepNode>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    #[serde(default)]
    pub relations: Vec<RelationRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepNode {
    /// Display position, e.g. `3` or `4.1` for a step inside a shared step.
    pub position: String,
    /// Step identifier used in run attachment comments (`[TestStep=<id>]`).
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub expected: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub is_shared_step_title: bool,
}

impl StepNode {
    pub fn marker(&self) -> Option<String> {
        (!self.identifier.is_empty()).then(|| format!("[TestStep={}]", self.identifier))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRef {
    pub file_name: String,
    pub link: String,
    #[serde(default)]
    pub step_no: Option<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// A work item linked to a test case (requirement, bug, task, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationRef {
    #[serde(rename = "type")]
    pub rel_type: String,
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub work_item_type: String,
    #[serde(default, deserialize_with = "deserialize_fields")]
    pub fields: BTreeMap<String, FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default)]
    pub created_date: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub text: String,
}

impl HistoryEntry {
    pub fn is_blank(&self) -> bool {
        self.created_date.trim().is_empty()
            && self.created_by.trim().is_empty()
            && self.text.trim().is_empty()
    }
}

/// The two history shapes upstream readers hand back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawHistory {
    Entries(Vec<HistoryEntry>),
    /// Blank-line separated `"<date> - <author>: <html>"` blocks.
    Legacy(String),
}

impl Default for RawHistory {
    fn default() -> Self {
        RawHistory::Entries(Vec::new())
    }
}
