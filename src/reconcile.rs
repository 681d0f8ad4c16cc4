//! Field-map reconciliation: one work item plus one side's [`ColumnMap`]
//! becomes an ordered list of styled cells.
//!
//! The emitted name/width sequence depends only on the column maps and the
//! type label, never on the item, so a missing linked item cannot shift the
//! table layout.

use std::collections::BTreeSet;
use tracing::debug;

use crate::model::{Cell, ColumnMap, FieldValue, WorkItemRef};

pub const WIDTH_PRIORITY: &str = "6.5%";
pub const WIDTH_NODE_NAME: &str = "18%";
pub const WIDTH_CUSTOMER_ID: &str = "9.7%";

/// Display names treated as shared by adapters that have no dynamic column maps.
pub const FIXED_SHARED_COLUMNS: [&str; 3] = ["State", "Assigned To", "Area Path"];

const ALWAYS_SKIPPED: [&str; 2] = ["Title", "ID"];
const WORK_ITEM_TYPE: &str = "Work Item Type";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

/// How a column's value and width are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    Default,
    FixedWidth(&'static str),
    ObjectDisplayName,
    PathTail {
        rename: &'static str,
        width: &'static str,
    },
}

const FORMATTERS: &[(&str, Formatter)] = &[
    ("Priority", Formatter::FixedWidth(WIDTH_PRIORITY)),
    ("Assigned To", Formatter::ObjectDisplayName),
    (
        "Area Path",
        Formatter::PathTail {
            rename: "Node Name",
            width: WIDTH_NODE_NAME,
        },
    ),
    ("Customer ID", Formatter::FixedWidth(WIDTH_CUSTOMER_ID)),
];

pub fn formatter_for(display: &str) -> Formatter {
    FORMATTERS
        .iter()
        .find(|(name, _)| *name == display)
        .map(|(_, formatter)| *formatter)
        .unwrap_or(Formatter::Default)
}

impl Formatter {
    fn cell(self, display: &str, value: Option<&FieldValue>) -> Cell {
        match self {
            Formatter::Default => {
                Cell::new(display, value.map(FieldValue::display).unwrap_or_default())
            }
            Formatter::FixedWidth(width) => {
                Cell::new(display, value.map(FieldValue::display).unwrap_or_default())
                    .with_width(Some(width))
            }
            Formatter::ObjectDisplayName => {
                let shown = match value {
                    Some(FieldValue::Reference { display_name, .. }) => display_name.as_str(),
                    _ => "",
                };
                Cell::new(display, shown)
            }
            Formatter::PathTail { rename, width } => {
                let tail = value
                    .map(FieldValue::display)
                    .and_then(|path| path.rsplit('\\').next())
                    .unwrap_or_default();
                Cell::new(rename, tail).with_width(Some(width))
            }
        }
    }
}

/// Where the "common column" set comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharedColumns {
    /// Intersection of the source and target column maps.
    Intersection,
    /// A fixed, known-shared set of display names.
    Fixed(&'static [&'static str]),
}

pub fn is_test_case_label(type_label: &str) -> bool {
    type_label.to_ascii_lowercase().contains("test case")
}

#[derive(Debug, Clone)]
pub struct FieldMapReconciler<'a> {
    source: &'a ColumnMap,
    target: &'a ColumnMap,
    shared: SharedColumns,
}

impl<'a> FieldMapReconciler<'a> {
    pub fn new(source: &'a ColumnMap, target: &'a ColumnMap) -> Self {
        Self {
            source,
            target,
            shared: SharedColumns::Intersection,
        }
    }

    pub fn with_shared(mut self, shared: SharedColumns) -> Self {
        self.shared = shared;
        self
    }

    pub fn columns(&self, side: Side) -> &'a ColumnMap {
        match side {
            Side::Source => self.source,
            Side::Target => self.target,
        }
    }

    pub fn common_columns(&self) -> BTreeSet<String> {
        match &self.shared {
            SharedColumns::Intersection => self.source.common_display_names(self.target),
            SharedColumns::Fixed(names) => names.iter().map(|n| (*n).to_owned()).collect(),
        }
    }

    /// Reconciles `item` against the `side` column map.
    ///
    /// A `None` item yields blank values with exactly the same names and widths.
    pub fn reconcile(
        &self,
        item: Option<&WorkItemRef>,
        color: Option<&str>,
        side: Side,
        type_label: &str,
        exclude_common: bool,
    ) -> Vec<Cell> {
        let columns = self.columns(side);
        let mut cells = Vec::with_capacity(columns.len());

        if let Some(reference) = columns.reference_for("Title") {
            let title = lookup(item, reference)
                .map(FieldValue::display)
                .unwrap_or_default();
            cells.push(Cell::new(format!("{type_label} Title"), title).with_color(color));
        }

        let common = if exclude_common {
            self.common_columns()
        } else {
            BTreeSet::new()
        };
        let test_case = is_test_case_label(type_label);

        for (reference, display) in columns.iter() {
            if ALWAYS_SKIPPED.contains(&display) || common.contains(display) {
                continue;
            }
            if test_case && display == WORK_ITEM_TYPE {
                continue;
            }
            let value = lookup(item, reference);
            cells.push(formatter_for(display).cell(display, value).with_color(color));
        }
        cells
    }
}

fn lookup<'i>(item: Option<&'i WorkItemRef>, reference: &str) -> Option<&'i FieldValue> {
    let item = item?;
    let value = item.field(reference);
    if value.is_none() {
        debug!(item = item.id, field = reference, "Field missing on work item, leaving blank");
    }
    value
}
