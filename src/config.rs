// ado-skin/src/config.rs

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assemble::AssemblyOptions;
use crate::error::SkinError;
use crate::trace::TraceAdapter;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub project_name: String,
    pub plan_id: Option<u64>,
    pub suite_ids: Vec<u64>,
    pub flatten_single_suite: bool,
    pub include_attachments: bool,
    pub include_attachment_content: bool,
    pub include_hard_copy_run: bool,
    pub include_step_result_detail: bool,
    pub include_history: bool,
    pub include_customer_id: bool,
    pub include_linked_moms: bool,
    pub requirements: Option<RequirementsConfig>,
    /// Offset from UTC, in minutes, used to render history dates.
    pub history_utc_offset_minutes: i32,
    pub traces: Vec<TraceConfig>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            plan_id: None,
            suite_ids: Vec::new(),
            flatten_single_suite: true,
            include_attachments: false,
            include_attachment_content: false,
            include_hard_copy_run: false,
            include_step_result_detail: false,
            include_history: false,
            include_customer_id: false,
            include_linked_moms: false,
            requirements: None,
            history_utc_offset_minutes: 0,
            traces: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RequirementsConfig {
    ByQuery { query_id: String },
    ByRelation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConfig {
    pub title: String,
    pub mode: String,
    pub query_id: String,
    pub adapter: TraceAdapter,
    #[serde(default)]
    pub exclude_common_columns: bool,
}

impl GenerationConfig {
    pub fn trace_loaded(&self) {
        info!(
            project = %self.project_name,
            plan_id = ?self.plan_id,
            suites = self.suite_ids.len(),
            traces = self.traces.len(),
            "Loaded generation config"
        );
        debug!(?self, "Generation config loaded (full debug)");
    }

    /// Checks the settings every document needs and returns the plan id.
    pub fn validate(&self) -> Result<u64, SkinError> {
        if self.project_name.trim().is_empty() {
            return Err(SkinError::configuration("no project name"));
        }
        let plan_id = self
            .plan_id
            .ok_or_else(|| SkinError::configuration("no test plan id"))?;
        if self.suite_ids.is_empty() {
            return Err(SkinError::configuration("no test suites selected"));
        }
        Ok(plan_id)
    }

    pub fn history_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.history_utc_offset_minutes.saturating_mul(60)).unwrap_or_else(
            || {
                warn!(
                    minutes = self.history_utc_offset_minutes,
                    "History offset out of range, using UTC"
                );
                Utc.fix()
            },
        )
    }

    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            include_attachments: self.include_attachments,
            include_attachment_content: self.include_attachment_content,
            include_step_result_detail: self.include_step_result_detail,
            include_hard_copy_run: self.include_hard_copy_run,
            include_customer_id: self.include_customer_id,
            include_linked_moms: self.include_linked_moms,
        }
    }
}
