//! Pairs source items with their linked targets into banded rows.

use std::fmt;
use std::str::FromStr;

use crate::error::SkinError;
use crate::model::{Cell, Row, SourceTargetMapping, WorkItemRef};
use crate::reconcile::{FieldMapReconciler, Side};

/// Banding palettes, one per side, so repeated cell names stay distinguishable.
pub const SOURCE_PALETTE: [&str; 2] = ["DCE6F1", "B8CCE4"];
pub const TARGET_PALETTE: [&str; 2] = ["EBF1DE", "D8E4BC"];

pub const REQ_LABEL: &str = "Req";
pub const TEST_CASE_LABEL: &str = "Test Case";
pub const PCR_LABEL: &str = "PCR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceMode {
    ReqToTest,
    TestToReq,
    PcrToTest,
    TestToPcr,
}

impl TraceMode {
    pub fn source_label(self) -> &'static str {
        match self {
            TraceMode::ReqToTest => REQ_LABEL,
            TraceMode::PcrToTest => PCR_LABEL,
            TraceMode::TestToReq | TraceMode::TestToPcr => TEST_CASE_LABEL,
        }
    }

    pub fn target_label(self) -> &'static str {
        match self {
            TraceMode::ReqToTest | TraceMode::PcrToTest => TEST_CASE_LABEL,
            TraceMode::TestToReq => REQ_LABEL,
            TraceMode::TestToPcr => PCR_LABEL,
        }
    }

    pub fn is_change_request(self) -> bool {
        matches!(self, TraceMode::PcrToTest | TraceMode::TestToPcr)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TraceMode::ReqToTest => "req-test",
            TraceMode::TestToReq => "test-req",
            TraceMode::PcrToTest => "pcr-test",
            TraceMode::TestToPcr => "test-pcr",
        }
    }
}

impl fmt::Display for TraceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraceMode {
    type Err = SkinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "req-test" => Ok(TraceMode::ReqToTest),
            "test-req" => Ok(TraceMode::TestToReq),
            "pcr-test" => Ok(TraceMode::PcrToTest),
            "test-pcr" => Ok(TraceMode::TestToPcr),
            other => Err(SkinError::UnsupportedMode {
                adapter: "pair row",
                mode: other.to_owned(),
            }),
        }
    }
}

pub fn band(palette: &[&'static str; 2], index: usize) -> &'static str {
    palette[index % palette.len()]
}

/// Builds one row per (source, target) pairing.
#[derive(Debug, Clone)]
pub struct PairRowBuilder<'a> {
    reconciler: FieldMapReconciler<'a>,
    exclude_common: bool,
}

impl<'a> PairRowBuilder<'a> {
    /// `exclude_common` drops common columns from the target side, so shared
    /// fields are shown once, under the source.
    pub fn new(reconciler: FieldMapReconciler<'a>, exclude_common: bool) -> Self {
        Self {
            reconciler,
            exclude_common,
        }
    }

    pub fn build(&self, mapping: &SourceTargetMapping, mode: &str) -> Result<Vec<Row>, SkinError> {
        let mode: TraceMode = mode.parse()?;
        Ok(self.build_for(mapping, mode))
    }

    /// Emits exactly `sum(max(1, targets.len()))` rows, in mapping order.
    ///
    /// A source without targets gets one placeholder row whose target cells
    /// are blank but follow the target column map, so it carries the same
    /// columns as a filled row. A target map without Title yields no blank
    /// Title cell either.
    pub fn build_for(&self, mapping: &SourceTargetMapping, mode: TraceMode) -> Vec<Row> {
        let source_label = mode.source_label();
        let target_label = mode.target_label();
        let mut rows = Vec::with_capacity(mapping.len());

        for (index, entry) in mapping.iter().enumerate() {
            let source_color = band(&SOURCE_PALETTE, index);
            let target_color = band(&TARGET_PALETTE, index);

            let mut source_cells = vec![id_cell(Some(&entry.source), source_label, source_color)];
            source_cells.extend(self.reconciler.reconcile(
                Some(&entry.source),
                Some(source_color),
                Side::Source,
                source_label,
                false,
            ));

            if entry.targets.is_empty() {
                let mut cells = source_cells;
                cells.push(id_cell(None, target_label, target_color));
                cells.extend(self.reconciler.reconcile(
                    None,
                    Some(target_color),
                    Side::Target,
                    target_label,
                    self.exclude_common,
                ));
                rows.push(Row::new(cells));
                continue;
            }

            for target in &entry.targets {
                let mut cells = source_cells.clone();
                cells.push(id_cell(Some(target), target_label, target_color));
                cells.extend(self.reconciler.reconcile(
                    Some(target),
                    Some(target_color),
                    Side::Target,
                    target_label,
                    self.exclude_common,
                ));
                rows.push(Row::new(cells));
            }
        }
        rows
    }
}

fn id_cell(item: Option<&WorkItemRef>, label: &str, color: &str) -> Cell {
    let name = format!("{label} ID");
    match item {
        Some(item) => Cell::new(name, item.id.to_string())
            .with_url(&item.url)
            .with_color(Some(color)),
        None => Cell::new(name, "").with_color(Some(color)),
    }
}
