//! Row assembly for a single test case.
//!
//! Everything asynchronous (rich-text conversion, attachment and history
//! fetches) has already happened by the time [`assemble_test_case`] runs; it
//! only arranges resolved values into rows, preserving step order.

use crate::attachments::{
    calculate_column_width, classify, expected_column_width, ClassifyOptions, DocumentContent,
    Scope,
};
use crate::model::{AttachmentRef, Cell, Row, StepNode, TestCaseNode};
use crate::requirements::{mom_rows, requirement_rows, RequirementSource};
use crate::skin::TestCaseSkin;

#[derive(Debug, Clone, Copy, Default)]
pub struct AssemblyOptions {
    pub include_attachments: bool,
    pub include_attachment_content: bool,
    pub include_step_result_detail: bool,
    pub include_hard_copy_run: bool,
    pub include_customer_id: bool,
    pub include_linked_moms: bool,
}

impl AssemblyOptions {
    fn classify_options(&self) -> ClassifyOptions {
        ClassifyOptions {
            include_content: self.include_attachment_content,
            step_result_detail: self.include_step_result_detail,
            hard_copy_run: self.include_hard_copy_run,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedStep {
    pub action: String,
    pub expected: String,
}

/// Leaf values resolved for one test case, in original step order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTestCase {
    pub description: String,
    pub steps: Vec<ResolvedStep>,
    pub attachments: Vec<AttachmentRef>,
    pub history: Vec<String>,
}

/// A step's row plus the attachments and document blocks scoped to it.
struct StepOutput {
    row: Row,
    attachments: Vec<AttachmentRef>,
    documents: Vec<DocumentContent>,
}

fn step_row(
    step: &StepNode,
    resolved: Option<&ResolvedStep>,
    attachments: &[AttachmentRef],
    width: &'static str,
    options: &AssemblyOptions,
) -> StepOutput {
    let action = resolved.map_or(step.action.as_str(), |r| r.action.as_str());
    let expected = if step.is_shared_step_title {
        ""
    } else {
        resolved.map_or(step.expected.as_str(), |r| r.expected.as_str())
    };

    let mut cells = vec![
        Cell::new("#", step.position.as_str()),
        Cell::new("Action", action).with_width(Some(width)),
        Cell::new("Expected Result", expected).with_width(expected_column_width(width)),
    ];
    if options.include_step_result_detail {
        cells.push(Cell::new("Run Status", step.status.as_str()));
        cells.push(Cell::new("Actual Result", step.comment.as_str()));
    } else if options.include_hard_copy_run {
        cells.push(Cell::new("Actual Result", ""));
        cells.push(Cell::new("Pass/Fail", ""));
    }

    if attachments.is_empty() {
        return StepOutput {
            row: Row::new(cells),
            attachments: Vec::new(),
            documents: Vec::new(),
        };
    }
    let classified = classify(attachments, Scope::Step(step), options.classify_options());
    let names = classified
        .step_scoped
        .iter()
        .map(|a| a.file_name.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let mut cell = Cell::new("Attachments", names);
    if let [only] = classified.step_scoped.as_slice() {
        cell = cell.with_url(&only.link);
    }
    cells.push(cell);
    StepOutput {
        row: Row::new(cells),
        attachments: classified.step_scoped,
        documents: classified.doc_content,
    }
}

/// Step / Attachment (linked) / Comment rows, one per step-scoped attachment.
fn step_attachment_rows(position: &str, attachments: &[AttachmentRef]) -> Vec<Row> {
    attachments
        .iter()
        .map(|a| {
            Row::new(vec![
                Cell::new("Step", position),
                Cell::new("Attachment", a.file_name.as_str()).with_url(&a.link),
                Cell::new("Comment", a.comment.as_str()),
            ])
        })
        .collect()
}

pub fn assemble_test_case(
    test_case: &TestCaseNode,
    resolved: ResolvedTestCase,
    level: u32,
    requirements: Option<RequirementSource<'_>>,
    options: &AssemblyOptions,
) -> TestCaseSkin {
    let attachments: &[AttachmentRef] = if options.include_attachments {
        &resolved.attachments
    } else {
        &[]
    };
    let width = calculate_column_width(
        options.include_step_result_detail,
        !attachments.is_empty(),
        options.include_hard_copy_run,
    );

    let mut documents = Vec::new();
    let mut steps = Vec::with_capacity(test_case.steps.len());
    let mut step_attachments = Vec::new();
    for (index, step) in test_case.steps.iter().enumerate() {
        let output = step_row(step, resolved.steps.get(index), attachments, width, options);
        step_attachments.extend(step_attachment_rows(&step.position, &output.attachments));
        documents.extend(output.documents);
        steps.push(output.row);
    }

    let case_level = classify(
        attachments,
        Scope::TestCase(&test_case.steps),
        options.classify_options(),
    );
    let attachment_rows = case_level
        .case_scoped
        .iter()
        .enumerate()
        .map(|(index, a)| {
            Row::new(vec![
                Cell::new("#", (index + 1).to_string()),
                Cell::new("Attachment", a.file_name.as_str()).with_url(&a.link),
                Cell::new("Comment", a.comment.as_str()),
            ])
        })
        .collect();
    documents.extend(case_level.doc_content);

    TestCaseSkin {
        id: test_case.id,
        title: test_case.title.clone(),
        level,
        header: Row::new(vec![
            Cell::new("Test Case ID", test_case.id.to_string()).with_url(&test_case.url),
            Cell::new("Test Case Title", test_case.title.as_str()),
        ]),
        description: resolved.description,
        steps,
        step_attachments,
        attachments: attachment_rows,
        documents,
        requirements: requirements
            .map(|source| requirement_rows(test_case, source, options.include_customer_id))
            .unwrap_or_default(),
        linked_moms: if options.include_linked_moms {
            mom_rows(&test_case.relations)
        } else {
            Vec::new()
        },
        history: resolved.history,
    }
}
