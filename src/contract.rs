//! # contract: collaborator interfaces for skin generation
//!
//! The generation pipeline never talks to Azure DevOps, object storage or an
//! HTML sanitizer directly. Everything it consumes comes through the traits
//! below, which are implemented by live providers elsewhere, by the JSON
//! [`SnapshotStore`](crate::snapshot::SnapshotStore) in this crate, and by
//! `mockall` generated mocks in tests.
//!
//! ## Error handling
//! - Async readers return [`BoxError`]; the pipeline decides whether a failure
//!   is fatal (plan-level enumeration, history) or degrades to a placeholder
//!   (trace queries, attachments, rich text).
//!
//! ## Mocking & Testing
//! - Every async trait is annotated for `mockall` (behind the
//!   `test-export-mocks` feature) so integration tests can script readers.

use async_trait::async_trait;
#[allow(unused_imports)]
use mockall::{automock, predicate::*};

use crate::error::BoxError;
use crate::model::{AttachmentRef, RawHistory, SuiteNode, TestCaseNode};
use crate::requirements::RequirementLookup;
use crate::trace::TraceData;

/// Hierarchical reader for test plans.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TestPlanReader: Send + Sync {
    /// Suites selected for the document, in tree (pre-order) order, including
    /// the descendants of each selected suite.
    async fn fetch_suites(&self, plan_id: u64, suite_ids: &[u64])
        -> Result<Vec<SuiteNode>, BoxError>;

    /// Test cases directly under one suite, in suite order.
    async fn fetch_test_cases(
        &self,
        plan_id: u64,
        suite_id: u64,
    ) -> Result<Vec<TestCaseNode>, BoxError>;
}

/// Work-item query reader used for trace tables and requirement lookups.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait QueryReader: Send + Sync {
    async fn fetch_trace(&self, query_id: &str) -> Result<TraceData, BoxError>;

    /// Test case id → linked requirements, as computed by a saved query.
    async fn fetch_requirement_lookup(&self, query_id: &str)
        -> Result<RequirementLookup, BoxError>;
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait HistoryReader: Send + Sync {
    async fn fetch_history(&self, work_item_id: u64) -> Result<RawHistory, BoxError>;
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn attachments(&self, work_item_id: u64) -> Result<Vec<AttachmentRef>, BoxError>;
}

/// Converts one rich-text leaf (description, step action/expected) into
/// renderer-ready markup.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RichTextConverter: Send + Sync {
    async fn convert(&self, html: &str) -> Result<String, BoxError>;
}

/// Synchronous HTML helpers.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait HtmlUtility: Send + Sync {
    fn clean_html(&self, html: &str, trim: bool) -> String;

    fn html_to_plain_text(&self, html: &str, preserve_line_breaks: bool) -> String;
}
