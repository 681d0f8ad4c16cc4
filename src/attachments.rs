//! Attachment scoping and layout widths for step tables.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{AttachmentRef, StepNode};

pub const WIDTH_NARROW: &str = "20.8%";
pub const WIDTH_DETAIL: &str = "31%";
pub const WIDTH_WITH_ATTACHMENT: &str = "26.9%";
/// Widest layout. For the Expected Result column it means "no explicit width".
pub const WIDTH_UNCONSTRAINED: &str = "45.8%";

const STEP_MARKER_PREFIX: &str = "[TestStep=";

/// Width of the Action / Expected Result columns.
pub fn calculate_column_width(
    has_step_result_detail: bool,
    has_attachment: bool,
    include_hard_copy_run: bool,
) -> &'static str {
    match (has_step_result_detail || include_hard_copy_run, has_attachment) {
        (true, true) => WIDTH_NARROW,
        (true, false) => WIDTH_DETAIL,
        (false, true) => WIDTH_WITH_ATTACHMENT,
        (false, false) => WIDTH_UNCONSTRAINED,
    }
}

/// Width for the Expected Result column, where the widest layout is left unset.
pub fn expected_column_width(width: &'static str) -> Option<&'static str> {
    (width != WIDTH_UNCONSTRAINED).then_some(width)
}

/// A `.doc`/`.docx` attachment to be inlined as its own block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContent {
    pub heading: String,
    pub file_name: String,
    pub link: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyOptions {
    pub include_content: bool,
    pub step_result_detail: bool,
    pub hard_copy_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedAttachments {
    pub step_scoped: Vec<AttachmentRef>,
    pub case_scoped: Vec<AttachmentRef>,
    pub doc_content: Vec<DocumentContent>,
    pub width: &'static str,
}

pub fn is_document(attachment: &AttachmentRef) -> bool {
    let name = attachment.file_name.to_ascii_lowercase();
    name.ends_with(".doc") || name.ends_with(".docx")
}

/// Step-scoped iff the recorded step number equals the step position or the
/// comment carries the step's `[TestStep=<id>]` marker.
pub fn belongs_to_step(attachment: &AttachmentRef, step: &StepNode) -> bool {
    let by_number = attachment
        .step_no
        .as_deref()
        .is_some_and(|no| no.trim() == step.position.trim());
    let by_marker = step
        .marker()
        .is_some_and(|marker| attachment.comment.contains(&marker));
    by_number || by_marker
}

fn references_a_step(attachment: &AttachmentRef) -> bool {
    attachment
        .step_no
        .as_deref()
        .is_some_and(|no| !no.trim().is_empty())
        || attachment.comment.contains(STEP_MARKER_PREFIX)
}

/// What an attachment list is being classified for.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// One step row: attachments tied to this step are active.
    Step(&'a StepNode),
    /// The test case itself: attachments tied to none of its steps are
    /// active, including ones whose step reference matches no existing step.
    TestCase(&'a [StepNode]),
}

/// Partitions `attachments` for one step or for the test case. Document
/// files in the active partition are moved into `doc_content` when content
/// inclusion is on.
pub fn classify(
    attachments: &[AttachmentRef],
    scope: Scope<'_>,
    options: ClassifyOptions,
) -> ClassifiedAttachments {
    let (mut step_scoped, mut case_scoped): (Vec<_>, Vec<_>) =
        attachments.iter().cloned().partition(|a| match scope {
            Scope::Step(step) => belongs_to_step(a, step),
            Scope::TestCase(steps) => steps.iter().any(|step| belongs_to_step(a, step)),
        });

    if let Scope::TestCase(_) = scope {
        for orphan in case_scoped.iter().filter(|a| references_a_step(a)) {
            debug!(
                file = %orphan.file_name,
                step_no = ?orphan.step_no,
                "Attachment points at no existing step, listing it on the test case"
            );
        }
    }

    let mut doc_content = Vec::new();
    if options.include_content {
        let active = match scope {
            Scope::Step(_) => &mut step_scoped,
            Scope::TestCase(_) => &mut case_scoped,
        };
        let (docs, rest): (Vec<_>, Vec<_>) = active.drain(..).partition(is_document);
        *active = rest;
        doc_content = docs
            .into_iter()
            .map(|doc| DocumentContent {
                heading: match scope {
                    Scope::Step(step) => {
                        format!("Step {} attachment: {}", step.position, doc.file_name)
                    }
                    Scope::TestCase(_) => format!("Test case attachment: {}", doc.file_name),
                },
                file_name: doc.file_name,
                link: doc.link,
            })
            .collect();
    }

    ClassifiedAttachments {
        step_scoped,
        case_scoped,
        doc_content,
        width: calculate_column_width(
            options.step_result_detail,
            !attachments.is_empty(),
            options.hard_copy_run,
        ),
    }
}
