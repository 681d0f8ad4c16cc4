//! Records handed to the document renderer.

use serde::{Deserialize, Serialize};

use crate::attachments::DocumentContent;
use crate::model::{AttachmentRef, Cell, Row};

pub const NO_DATA: &str = "No data available";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinDocument {
    pub project_name: String,
    pub plan_id: u64,
    pub suites: Vec<SuiteSkin>,
    pub traces: Vec<TraceTable>,
    /// Every attachment referenced by the document, in document order.
    pub attachment_refs: Vec<AttachmentRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteSkin {
    pub id: u64,
    pub name: String,
    pub level: u32,
    /// `None` when the suite header is suppressed by flattening.
    pub header: Option<Row>,
    pub test_cases: Vec<TestCaseSkin>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseSkin {
    pub id: u64,
    pub title: String,
    pub level: u32,
    pub header: Row,
    pub description: String,
    pub steps: Vec<Row>,
    /// One linked row per step-scoped attachment, in step order.
    pub step_attachments: Vec<Row>,
    pub attachments: Vec<Row>,
    pub documents: Vec<DocumentContent>,
    pub requirements: Vec<Row>,
    pub linked_moms: Vec<Row>,
    pub history: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceTable {
    pub title: String,
    pub rows: Vec<Row>,
    /// The query behind this table could not be fetched.
    pub no_data: bool,
}

impl TraceTable {
    pub fn no_data(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: vec![Row::new(vec![Cell::new("Message", NO_DATA)])],
            no_data: true,
        }
    }
}
