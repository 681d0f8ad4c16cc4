//! Trace table adapters.
//!
//! Four structurally equivalent adapters cover the requirement ↔ test case and
//! change request (PCR) ↔ test case traces over three input shapes: live query
//! results with dynamic column maps, typed snapshot records, and precomputed
//! relation maps. Each one normalizes its input to a [`SourceTargetMapping`]
//! plus column maps and hands off to [`PairRowBuilder`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, info};

use crate::error::SkinError;
use crate::model::{ColumnMap, FieldValue, Row, SourceTargetMapping, SourceTargets, WorkItemRef};
use crate::pairing::{PairRowBuilder, TraceMode};
use crate::reconcile::{FieldMapReconciler, SharedColumns, FIXED_SHARED_COLUMNS};

/// Live query output: the pairing plus the field selection for each side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceQueryResult {
    pub mapping: SourceTargetMapping,
    pub source_columns: ColumnMap,
    pub target_columns: ColumnMap,
}

/// A work item captured by a snapshot exporter with a fixed field set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotItem {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub work_item_type: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub area_path: String,
    #[serde(default)]
    pub priority: Option<String>,
}

impl SnapshotItem {
    pub fn to_work_item(&self) -> WorkItemRef {
        let mut item = WorkItemRef::new(self.id, self.url.clone())
            .with_field("System.Title", FieldValue::scalar(&self.title))
            .with_field("System.WorkItemType", FieldValue::scalar(&self.work_item_type))
            .with_field("System.State", FieldValue::scalar(&self.state))
            .with_field("System.AreaPath", FieldValue::scalar(&self.area_path));
        if let Some(name) = &self.assigned_to {
            item = item.with_field("System.AssignedTo", FieldValue::reference(name));
        }
        if let Some(priority) = &self.priority {
            item = item.with_field("Microsoft.VSTS.Common.Priority", FieldValue::scalar(priority));
        }
        item
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSnapshot {
    pub source: SnapshotItem,
    #[serde(default)]
    pub targets: Vec<SnapshotItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationLink {
    pub source: u64,
    #[serde(default)]
    pub targets: Vec<u64>,
}

/// Precomputed id links plus the items they point at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationMap {
    #[serde(default)]
    pub items: Vec<WorkItemRef>,
    #[serde(default)]
    pub links: Vec<RelationLink>,
}

impl RelationMap {
    /// Resolves ids to items. A missing item becomes an id-only stub whose
    /// fields all render blank.
    pub fn to_mapping(&self) -> SourceTargetMapping {
        let by_id: HashMap<u64, &WorkItemRef> = self.items.iter().map(|i| (i.id, i)).collect();
        let resolve = |id: u64| match by_id.get(&id) {
            Some(item) => (*item).clone(),
            None => {
                debug!(id, "Linked work item missing from relation map, using blank item");
                WorkItemRef::new(id, "")
            }
        };
        self.links
            .iter()
            .map(|link| SourceTargets {
                source: resolve(link.source),
                targets: link.targets.iter().map(|id| resolve(*id)).collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum TraceData {
    Live(TraceQueryResult),
    Snapshot { pairs: Vec<TraceSnapshot> },
    Relations(RelationMap),
}

impl TraceData {
    pub fn shape(&self) -> &'static str {
        match self {
            TraceData::Live(_) => "live",
            TraceData::Snapshot { .. } => "snapshot",
            TraceData::Relations(_) => "relations",
        }
    }
}

/// Columns used by adapters whose input carries no field selection.
pub fn standard_columns() -> ColumnMap {
    ColumnMap::new([
        ("System.Title", "Title"),
        ("System.WorkItemType", "Work Item Type"),
        ("System.State", "State"),
        ("System.AssignedTo", "Assigned To"),
        ("Microsoft.VSTS.Common.Priority", "Priority"),
        ("System.AreaPath", "Area Path"),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceAdapter {
    RequirementQuery,
    RequirementSnapshot,
    PcrQuery,
    PcrRelations,
}

impl TraceAdapter {
    pub fn name(self) -> &'static str {
        match self {
            TraceAdapter::RequirementQuery => "requirement query",
            TraceAdapter::RequirementSnapshot => "requirement snapshot",
            TraceAdapter::PcrQuery => "pcr query",
            TraceAdapter::PcrRelations => "pcr relations",
        }
    }

    fn accepts(self, mode: TraceMode) -> bool {
        match self {
            TraceAdapter::RequirementQuery | TraceAdapter::RequirementSnapshot => {
                !mode.is_change_request()
            }
            TraceAdapter::PcrQuery | TraceAdapter::PcrRelations => mode.is_change_request(),
        }
    }

    fn expected_shape(self) -> &'static str {
        match self {
            TraceAdapter::RequirementQuery | TraceAdapter::PcrQuery => "live",
            TraceAdapter::RequirementSnapshot => "snapshot",
            TraceAdapter::PcrRelations => "relations",
        }
    }

    /// Builds the trace rows, reporting an unsupported mode or input shape.
    pub fn try_adapt(
        self,
        mode: &str,
        data: &TraceData,
        exclude_common: bool,
    ) -> Result<Vec<Row>, SkinError> {
        let unsupported = || SkinError::UnsupportedMode {
            adapter: self.name(),
            mode: mode.trim().to_owned(),
        };
        let mode: TraceMode = mode.parse().map_err(|_| unsupported())?;
        if !self.accepts(mode) {
            return Err(unsupported());
        }
        if data.shape() != self.expected_shape() {
            return Err(SkinError::UnexpectedInput {
                adapter: self.name(),
                found: data.shape(),
            });
        }

        let rows = match data {
            TraceData::Live(result) => {
                let reconciler =
                    FieldMapReconciler::new(&result.source_columns, &result.target_columns);
                PairRowBuilder::new(reconciler, exclude_common).build_for(&result.mapping, mode)
            }
            TraceData::Snapshot { pairs } => {
                let mapping: SourceTargetMapping = pairs
                    .iter()
                    .map(|pair| SourceTargets {
                        source: pair.source.to_work_item(),
                        targets: pair.targets.iter().map(SnapshotItem::to_work_item).collect(),
                    })
                    .collect();
                fixed_rows(&mapping, mode, exclude_common)
            }
            TraceData::Relations(map) => fixed_rows(&map.to_mapping(), mode, exclude_common),
        };
        info!(adapter = self.name(), %mode, rows = rows.len(), "Built trace rows");
        Ok(rows)
    }

    /// Like [`TraceAdapter::try_adapt`], but a failure is logged once and
    /// yields zero rows so sibling adapters keep going.
    pub fn adapt(self, mode: &str, data: &TraceData, exclude_common: bool) -> Vec<Row> {
        match self.try_adapt(mode, data, exclude_common) {
            Ok(rows) => rows,
            Err(e) => {
                error!(adapter = self.name(), error = %e, "Trace adapter failed");
                Vec::new()
            }
        }
    }
}

fn fixed_rows(mapping: &SourceTargetMapping, mode: TraceMode, exclude_common: bool) -> Vec<Row> {
    let columns = standard_columns();
    let reconciler = FieldMapReconciler::new(&columns, &columns)
        .with_shared(SharedColumns::Fixed(&FIXED_SHARED_COLUMNS));
    PairRowBuilder::new(reconciler, exclude_common).build_for(mapping, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::Level;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::Registry;

    fn live() -> TraceData {
        let columns = ColumnMap::new([("System.Title", "Title"), ("System.AreaPath", "Area Path")]);
        TraceData::Live(TraceQueryResult {
            mapping: vec![SourceTargets {
                source: WorkItemRef::new(1, "")
                    .with_field("System.AreaPath", FieldValue::scalar("Root\\Area")),
                targets: vec![WorkItemRef::new(2, "")
                    .with_field("System.AreaPath", FieldValue::scalar("Root\\Sub"))],
            }],
            source_columns: columns.clone(),
            target_columns: columns,
        })
    }

    #[test]
    fn live_requirement_trace() {
        let rows = TraceAdapter::RequirementQuery.adapt("req-test", &live(), false);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values(), vec!["1", "", "Area", "2", "", "Sub"]);
    }

    #[test]
    fn unknown_mode_yields_zero_rows() {
        for adapter in [
            TraceAdapter::RequirementQuery,
            TraceAdapter::RequirementSnapshot,
            TraceAdapter::PcrQuery,
            TraceAdapter::PcrRelations,
        ] {
            assert!(adapter.adapt("foo-bar", &live(), false).is_empty());
            assert!(matches!(
                adapter.try_adapt("foo-bar", &live(), false),
                Err(SkinError::UnsupportedMode { .. })
            ));
        }
    }

    /// Counts ERROR-level events.
    struct ErrorCounter {
        errors: Arc<AtomicUsize>,
    }

    impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                self.errors.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn unknown_mode_logs_a_single_error() {
        let errors = Arc::new(AtomicUsize::new(0));
        let subscriber = Registry::default().with(ErrorCounter {
            errors: errors.clone(),
        });

        let rows = tracing::subscriber::with_default(subscriber, || {
            TraceAdapter::RequirementQuery.adapt("foo-bar", &live(), false)
        });

        assert!(rows.is_empty());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn mode_from_other_family_is_unsupported() {
        let err = TraceAdapter::PcrQuery
            .try_adapt("req-test", &live(), false)
            .unwrap_err();
        assert!(matches!(err, SkinError::UnsupportedMode { adapter: "pcr query", .. }));
    }

    #[test]
    fn wrong_shape_is_reported() {
        let err = TraceAdapter::PcrRelations
            .try_adapt("pcr-test", &live(), false)
            .unwrap_err();
        assert!(matches!(err, SkinError::UnexpectedInput { found: "live", .. }));
    }

    #[test]
    fn snapshot_uses_standard_columns_and_fixed_shared_set() {
        let data = TraceData::Snapshot {
            pairs: vec![TraceSnapshot {
                source: SnapshotItem {
                    id: 4,
                    title: "Req four".into(),
                    work_item_type: "Requirement".into(),
                    state: "Active".into(),
                    assigned_to: Some("Dana".into()),
                    area_path: "Root\\Auth".into(),
                    ..SnapshotItem::default()
                },
                targets: vec![],
            }],
        };
        let rows = TraceAdapter::RequirementSnapshot.adapt("req-test", &data, true);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].names(),
            vec![
                "Req ID",
                "Req Title",
                "Work Item Type",
                "State",
                "Assigned To",
                "Priority",
                "Node Name",
                "Test Case ID",
                "Test Case Title",
                "Priority"
            ]
        );
        assert_eq!(rows[0].cell("Assigned To").unwrap().value, "Dana");
    }

    #[test]
    fn relation_map_degrades_missing_items() {
        let items = vec![
            WorkItemRef::new(7, "u7").with_field("System.Title", FieldValue::scalar("PCR seven")),
        ];
        let data = TraceData::Relations(RelationMap {
            items,
            links: vec![RelationLink {
                source: 7,
                targets: vec![70, 71],
            }],
        });
        let rows = TraceAdapter::PcrRelations.adapt("pcr-test", &data, false);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell("PCR Title").unwrap().value, "PCR seven");
        assert_eq!(rows[1].cell("Test Case ID").unwrap().value, "71");
        assert_eq!(rows[1].cell("Test Case Title").unwrap().value, "");
        assert_eq!(rows[0].cells.len(), rows[1].cells.len());
    }
}
