//! High-level pipeline: turns a validated generation config into a skin document.
//!
//! The pipeline is the only asynchronous part of the crate. It:
//!   - validates the config (missing plan, suites or project abort generation)
//!   - enumerates suites and their test cases (fatal on failure)
//!   - flattens the suite tree once
//!   - resolves every test case's leaves concurrently (rich text, attachments,
//!     history) and gathers them back in original order
//!   - builds trace tables, substituting a "no data" table for failed queries
//!
//! # Error Handling
//! Plan-level enumeration and history fetches propagate as
//! [`SkinError::UpstreamFetch`]. Everything else degrades locally: a failed
//! rich-text conversion becomes an empty value, a failed attachment fetch
//! leaves only the attachments the test case already carried, a failed trace
//! query yields a placeholder table, and an unsupported trace mode yields an
//! empty table.

use futures::future::{join, join_all, try_join_all};
use tracing::{error, info, info_span, warn, Instrument};

use crate::assemble::{assemble_test_case, ResolvedStep, ResolvedTestCase};
use crate::config::{GenerationConfig, RequirementsConfig};
use crate::contract::{
    AttachmentStore, HistoryReader, HtmlUtility, QueryReader, RichTextConverter, TestPlanReader,
};
use crate::error::SkinError;
use crate::history::HistoryMerger;
use crate::model::{AttachmentRef, Cell, Row, SuiteNode, TestCaseNode};
use crate::requirements::{RequirementLookup, RequirementSource};
use crate::skin::{SkinDocument, SuiteSkin, TraceTable};
use crate::suite::flatten;

/// Everything the pipeline reads from.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub plan: &'a dyn TestPlanReader,
    pub queries: &'a dyn QueryReader,
    pub history: &'a dyn HistoryReader,
    pub attachments: &'a dyn AttachmentStore,
    pub rich_text: &'a dyn RichTextConverter,
    pub html: &'a dyn HtmlUtility,
}

pub async fn generate(
    config: &GenerationConfig,
    collaborators: &Collaborators<'_>,
) -> Result<SkinDocument, SkinError> {
    let span = info_span!("generate", project = %config.project_name);
    run_pipeline(config, collaborators).instrument(span).await
}

async fn run_pipeline(
    config: &GenerationConfig,
    c: &Collaborators<'_>,
) -> Result<SkinDocument, SkinError> {
    let plan_id = config.validate().map_err(|e| {
        error!(error = %e, "[GENERATE][ERROR] Invalid generation config");
        e
    })?;
    info!(plan_id, suites = ?config.suite_ids, "[GENERATE] Starting skin generation");

    let mut suites = c
        .plan
        .fetch_suites(plan_id, &config.suite_ids)
        .await
        .map_err(|e| {
            error!(plan_id, error = %e, "[GENERATE][ERROR] Suite enumeration failed");
            SkinError::upstream(format!("suites of plan {plan_id}"), e)
        })?;
    let test_case_lists = try_join_all(
        suites
            .iter()
            .map(|suite| c.plan.fetch_test_cases(plan_id, suite.id)),
    )
    .await
    .map_err(|e| {
        error!(plan_id, error = %e, "[GENERATE][ERROR] Test case enumeration failed");
        SkinError::upstream(format!("test cases of plan {plan_id}"), e)
    })?;
    for (suite, test_cases) in suites.iter_mut().zip(test_case_lists) {
        suite.test_cases = test_cases;
    }
    info!(suites = suites.len(), "[GENERATE] Enumerated suites and test cases");

    let lookup = requirement_lookup(config, c).await;
    let requirement_source = match &config.requirements {
        None => None,
        Some(RequirementsConfig::ByRelation) => Some(RequirementSource::ByRelation),
        Some(RequirementsConfig::ByQuery { .. }) => {
            lookup.as_ref().map(RequirementSource::ByQuery)
        }
    };

    let plan = flatten(&suites, config.flatten_single_suite);
    let merger = HistoryMerger::new(c.html, config.history_offset());
    let options = config.assembly_options();

    let mut suite_skins = Vec::with_capacity(suites.len());
    let mut attachment_refs: Vec<AttachmentRef> = Vec::new();
    for (index, suite) in suites.iter().enumerate() {
        let resolved = join_all(
            suite
                .test_cases
                .iter()
                .map(|test_case| resolve_test_case(test_case, config, c, &merger)),
        )
        .await;

        let mut test_cases = Vec::with_capacity(resolved.len());
        for (test_case, resolved) in suite.test_cases.iter().zip(resolved) {
            let resolved = resolved?;
            attachment_refs.extend(resolved.attachments.iter().cloned());
            test_cases.push(assemble_test_case(
                test_case,
                resolved,
                plan.test_case_level(index),
                requirement_source,
                &options,
            ));
        }

        suite_skins.push(SuiteSkin {
            id: suite.id,
            name: suite.name.clone(),
            level: plan.effective_level(index),
            header: plan.shows_header(index).then(|| suite_header(suite)),
            test_cases,
        });
    }

    let traces = trace_tables(config, c).await;

    info!(
        suites = suite_skins.len(),
        traces = traces.len(),
        attachments = attachment_refs.len(),
        header_suppressed = plan.header_suppressed(),
        "[GENERATE] Skin generation complete"
    );
    Ok(SkinDocument {
        project_name: config.project_name.clone(),
        plan_id,
        suites: suite_skins,
        traces,
        attachment_refs,
    })
}

fn suite_header(suite: &SuiteNode) -> Row {
    Row::new(vec![
        Cell::new("Suite ID", suite.id.to_string()).with_url(&suite.url),
        Cell::new("Suite Name", suite.name.as_str()),
    ])
}

async fn requirement_lookup(
    config: &GenerationConfig,
    c: &Collaborators<'_>,
) -> Option<RequirementLookup> {
    let Some(RequirementsConfig::ByQuery { query_id }) = &config.requirements else {
        return None;
    };
    match c.queries.fetch_requirement_lookup(query_id).await {
        Ok(lookup) => {
            info!(query_id = %query_id, test_cases = lookup.len(), "[GENERATE] Loaded requirement lookup");
            Some(lookup)
        }
        Err(e) => {
            warn!(query_id = %query_id, error = %e, "[GENERATE] Requirement query failed, continuing without requirements");
            Some(RequirementLookup::new())
        }
    }
}

async fn trace_tables(config: &GenerationConfig, c: &Collaborators<'_>) -> Vec<TraceTable> {
    let fetched = join_all(
        config
            .traces
            .iter()
            .map(|trace| c.queries.fetch_trace(&trace.query_id)),
    )
    .await;

    config
        .traces
        .iter()
        .zip(fetched)
        .map(|(trace, result)| match result {
            Ok(data) => TraceTable {
                title: trace.title.clone(),
                rows: trace
                    .adapter
                    .adapt(&trace.mode, &data, trace.exclude_common_columns),
                no_data: false,
            },
            Err(e) => {
                warn!(
                    title = %trace.title,
                    query_id = %trace.query_id,
                    error = %e,
                    "[GENERATE] Trace query failed, substituting placeholder"
                );
                TraceTable::no_data(trace.title.as_str())
            }
        })
        .collect()
}

/// Converts one rich-text leaf. A failure degrades to an empty value.
async fn convert_leaf(
    converter: &dyn RichTextConverter,
    html: &str,
    work_item: u64,
    leaf: &'static str,
) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    match converter.convert(html).await {
        Ok(converted) => converted,
        Err(e) => {
            warn!(work_item, leaf, error = %e, "Rich text conversion failed, leaving blank");
            String::new()
        }
    }
}

async fn fetch_attachments(
    test_case: &TestCaseNode,
    config: &GenerationConfig,
    c: &Collaborators<'_>,
) -> Vec<AttachmentRef> {
    if !config.include_attachments {
        return Vec::new();
    }
    let mut attachments = test_case.attachments.clone();
    match c.attachments.attachments(test_case.id).await {
        Ok(found) => {
            for attachment in found {
                if !attachments.iter().any(|a| a.link == attachment.link) {
                    attachments.push(attachment);
                }
            }
        }
        Err(e) => {
            warn!(work_item = test_case.id, error = %e, "Attachment fetch failed, using known attachments only");
        }
    }
    attachments
}

/// Resolves every leaf of one test case. Leaves are converted concurrently;
/// results come back in step order regardless of completion order.
async fn resolve_test_case(
    test_case: &TestCaseNode,
    config: &GenerationConfig,
    c: &Collaborators<'_>,
    merger: &HistoryMerger<'_>,
) -> Result<ResolvedTestCase, SkinError> {
    let description = convert_leaf(c.rich_text, &test_case.description, test_case.id, "description");
    let steps = join_all(test_case.steps.iter().map(|step| async move {
        let (action, expected) = join(
            convert_leaf(c.rich_text, &step.action, test_case.id, "step action"),
            convert_leaf(c.rich_text, &step.expected, test_case.id, "step expected"),
        )
        .await;
        ResolvedStep { action, expected }
    }));
    let attachments = fetch_attachments(test_case, config, c);
    let (description, steps, attachments) = futures::join!(description, steps, attachments);

    let history = if config.include_history {
        let raw = c.history.fetch_history(test_case.id).await.map_err(|e| {
            error!(work_item = test_case.id, error = %e, "[GENERATE][ERROR] History fetch failed");
            SkinError::upstream(format!("history of work item {}", test_case.id), e)
        })?;
        merger.merge(&raw)
    } else {
        Vec::new()
    };

    Ok(ResolvedTestCase {
        description,
        steps,
        attachments,
        history,
    })
}
