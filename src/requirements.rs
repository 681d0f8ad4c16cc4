//! Requirement and linked MOM tables for a single test case.

use std::collections::{BTreeMap, HashSet};

use crate::model::{Cell, FieldValue, RelationRef, Row, TestCaseNode, WorkItemRef};

pub const WIDTH_REQUIREMENT_ID: &str = "13.6%";
pub const WIDTH_REQUIREMENT_CUSTOMER_ID: &str = "18%";

/// Work-item types accepted as linked "Minutes of Meeting" items.
pub const MOM_WORK_ITEM_TYPES: [&str; 15] = [
    "task",
    "bug",
    "change request",
    "epic",
    "feature",
    "user story",
    "feedback request",
    "feedback response",
    "issue",
    "risk",
    "review",
    "test plan",
    "test suite",
    "code review request",
    "code review response",
];

/// Test case id → requirements, as computed by a saved query.
pub type RequirementLookup = BTreeMap<u64, Vec<WorkItemRef>>;

#[derive(Debug, Clone, Copy)]
pub enum RequirementSource<'a> {
    ByQuery(&'a RequirementLookup),
    ByRelation,
}

struct RequirementView<'a> {
    id: u64,
    url: &'a str,
    title: &'a str,
    fields: &'a BTreeMap<String, FieldValue>,
}

fn customer_id(fields: &BTreeMap<String, FieldValue>) -> Option<&str> {
    fields
        .iter()
        .find(|(key, _)| key.to_ascii_lowercase().contains("customer"))
        .map(|(_, value)| value.display())
}

/// One row per linked requirement: index, ID, optional customer id, title.
pub fn requirement_rows(
    test_case: &TestCaseNode,
    source: RequirementSource<'_>,
    include_customer_id: bool,
) -> Vec<Row> {
    let views: Vec<RequirementView<'_>> = match source {
        RequirementSource::ByQuery(lookup) => lookup
            .get(&test_case.id)
            .map(|items| {
                items
                    .iter()
                    .map(|item| RequirementView {
                        id: item.id,
                        url: &item.url,
                        title: item.title(),
                        fields: &item.fields,
                    })
                    .collect()
            })
            .unwrap_or_default(),
        RequirementSource::ByRelation => test_case
            .relations
            .iter()
            .filter(|r| r.rel_type.eq_ignore_ascii_case("requirement"))
            .map(|r| RequirementView {
                id: r.id,
                url: &r.url,
                title: &r.title,
                fields: &r.fields,
            })
            .collect(),
    };

    let mut seen = HashSet::new();
    views
        .into_iter()
        .filter(|view| seen.insert(view.id))
        .enumerate()
        .map(|(index, view)| {
            let mut cells = vec![
                Cell::new("#", (index + 1).to_string()),
                Cell::new("Req ID", view.id.to_string())
                    .with_width(Some(WIDTH_REQUIREMENT_ID))
                    .with_url(view.url),
            ];
            if include_customer_id {
                if let Some(customer) = customer_id(view.fields) {
                    cells.push(
                        Cell::new("Customer ID", customer)
                            .with_width(Some(WIDTH_REQUIREMENT_CUSTOMER_ID)),
                    );
                }
            }
            cells.push(Cell::new("Req Title", view.title));
            Row::new(cells)
        })
        .collect()
}

pub fn is_mom_type(work_item_type: &str) -> bool {
    let normalized = work_item_type.trim().to_ascii_lowercase();
    MOM_WORK_ITEM_TYPES.contains(&normalized.as_str())
}

/// Index/ID/Type/Title/Status rows for linked items of an allowed MOM type.
pub fn mom_rows(relations: &[RelationRef]) -> Vec<Row> {
    relations
        .iter()
        .filter(|r| is_mom_type(&r.work_item_type))
        .enumerate()
        .map(|(index, relation)| {
            Row::new(vec![
                Cell::new("#", (index + 1).to_string()),
                Cell::new("ID", relation.id.to_string()).with_url(&relation.url),
                Cell::new("Type", relation.work_item_type.as_str()),
                Cell::new("Title", relation.title.as_str()),
                Cell::new("Status", relation.state.as_str()),
            ])
        })
        .collect()
}
