//! JSON snapshot of everything the pipeline reads.
//!
//! A snapshot is exported once from a live project and replayed offline. It
//! implements every reader contract, so the CLI and the end-to-end tests run
//! the same pipeline as a live deployment.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::contract::{AttachmentStore, HistoryReader, QueryReader, TestPlanReader};
use crate::error::BoxError;
use crate::model::{AttachmentRef, RawHistory, SuiteNode, TestCaseNode};
use crate::requirements::RequirementLookup;
use crate::trace::TraceData;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStore {
    /// Every suite of the plan, in tree (pre-order) order.
    #[serde(default)]
    pub suites: Vec<SuiteNode>,
    /// Suite id → test cases directly under it.
    #[serde(default)]
    pub test_cases: BTreeMap<u64, Vec<TestCaseNode>>,
    /// Work item id → revision history.
    #[serde(default)]
    pub history: BTreeMap<u64, RawHistory>,
    /// Work item id → attachments known outside the test case record.
    #[serde(default)]
    pub attachments: BTreeMap<u64, Vec<AttachmentRef>>,
    /// Query id → trace query output.
    #[serde(default)]
    pub traces: BTreeMap<String, TraceData>,
    /// Query id → requirement lookup.
    #[serde(default)]
    pub requirement_lookups: BTreeMap<String, RequirementLookup>,
}

impl SnapshotStore {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let store: SnapshotStore = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("Failed to parse snapshot JSON: {e}"))?;
        debug!(
            suites = store.suites.len(),
            traces = store.traces.len(),
            "Parsed snapshot"
        );
        Ok(store)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        info!(snapshot_path = ?path_ref, "Loading snapshot from file");
        let content = match fs::read_to_string(path_ref) {
            Ok(content) => content,
            Err(e) => {
                error!(error = ?e, snapshot_path = ?path_ref, "Failed to read snapshot file");
                return Err(anyhow::anyhow!(
                    "Failed to read snapshot file {:?}: {}",
                    path_ref,
                    e
                ));
            }
        };
        Self::from_json_str(&content)
    }

    /// Selected suites plus all of their descendants, in stored order.
    fn select_suites(&self, suite_ids: &[u64]) -> Vec<SuiteNode> {
        let mut included: HashSet<u64> = HashSet::new();
        let mut selected = Vec::new();
        for suite in &self.suites {
            let by_parent = suite.parent_id.is_some_and(|p| included.contains(&p));
            if suite_ids.contains(&suite.id) || by_parent {
                included.insert(suite.id);
                selected.push(suite.clone());
            }
        }
        for id in suite_ids {
            if !included.contains(id) {
                warn!(suite_id = id, "Selected suite not present in snapshot");
            }
        }
        selected
    }
}

#[async_trait]
impl TestPlanReader for SnapshotStore {
    async fn fetch_suites(
        &self,
        plan_id: u64,
        suite_ids: &[u64],
    ) -> Result<Vec<SuiteNode>, BoxError> {
        let selected = self.select_suites(suite_ids);
        if selected.is_empty() {
            return Err(format!("none of suites {suite_ids:?} exist in plan {plan_id}").into());
        }
        Ok(selected)
    }

    async fn fetch_test_cases(
        &self,
        _plan_id: u64,
        suite_id: u64,
    ) -> Result<Vec<TestCaseNode>, BoxError> {
        Ok(self.test_cases.get(&suite_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl QueryReader for SnapshotStore {
    async fn fetch_trace(&self, query_id: &str) -> Result<TraceData, BoxError> {
        self.traces
            .get(query_id)
            .cloned()
            .ok_or_else(|| format!("query {query_id} not present in snapshot").into())
    }

    async fn fetch_requirement_lookup(
        &self,
        query_id: &str,
    ) -> Result<RequirementLookup, BoxError> {
        self.requirement_lookups
            .get(query_id)
            .cloned()
            .ok_or_else(|| format!("requirement query {query_id} not present in snapshot").into())
    }
}

#[async_trait]
impl HistoryReader for SnapshotStore {
    async fn fetch_history(&self, work_item_id: u64) -> Result<RawHistory, BoxError> {
        Ok(self
            .history
            .get(&work_item_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl AttachmentStore for SnapshotStore {
    async fn attachments(&self, work_item_id: u64) -> Result<Vec<AttachmentRef>, BoxError> {
        Ok(self
            .attachments
            .get(&work_item_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "suites": [
            {"id": 1, "name": "Root", "level": 1},
            {"id": 2, "name": "Login", "level": 2, "parentId": 1},
            {"id": 3, "name": "Remember me", "level": 3, "parentId": 2},
            {"id": 4, "name": "Billing", "level": 2, "parentId": 1}
        ],
        "testCases": {"2": [{"id": 42, "title": "Sign in"}]},
        "history": {"42": "2024-01-01T10:00:00Z - Ann: <p>Created</p>"},
        "traces": {
            "q-1": {"shape": "relations", "items": [], "links": [{"source": 7, "targets": [42]}]}
        }
    }"#;

    #[tokio::test]
    async fn selects_suite_with_descendants_in_tree_order() {
        let store = SnapshotStore::from_json_str(SNAPSHOT).unwrap();
        let suites = store.fetch_suites(9, &[2]).await.unwrap();
        let ids: Vec<u64> = suites.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 3]);

        let all = store.fetch_suites(9, &[1]).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn unknown_suites_are_an_error() {
        let store = SnapshotStore::from_json_str(SNAPSHOT).unwrap();
        assert!(store.fetch_suites(9, &[99]).await.is_err());
    }

    #[tokio::test]
    async fn readers_fall_back_or_fail_per_kind() {
        let store = SnapshotStore::from_json_str(SNAPSHOT).unwrap();
        assert_eq!(store.fetch_test_cases(9, 2).await.unwrap()[0].id, 42);
        assert!(store.fetch_test_cases(9, 3).await.unwrap().is_empty());

        assert!(matches!(
            store.fetch_history(42).await.unwrap(),
            RawHistory::Legacy(_)
        ));
        assert_eq!(store.fetch_history(43).await.unwrap(), RawHistory::default());
        assert!(store.attachments(42).await.unwrap().is_empty());

        assert_eq!(store.fetch_trace("q-1").await.unwrap().shape(), "relations");
        assert!(store.fetch_trace("missing").await.is_err());
        assert!(store.fetch_requirement_lookup("missing").await.is_err());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(SnapshotStore::from_json_str("{\"suites\": 3}").is_err());
    }
}
