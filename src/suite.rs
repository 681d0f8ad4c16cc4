//! Suite tree flattening.
//!
//! When a plan has exactly one top-level suite, its header adds nothing to
//! the document: the header is suppressed and every other suite moves up one
//! level. The suites themselves are never mutated; [`FlattenPlan`] carries
//! the effective levels, so flattening twice cannot promote twice.

use tracing::debug;

use crate::model::SuiteNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenPlan {
    header_suppressed: bool,
    original: Vec<u32>,
    levels: Vec<u32>,
}

impl FlattenPlan {
    pub fn header_suppressed(&self) -> bool {
        self.header_suppressed
    }

    /// Level the suite at `index` is rendered at.
    pub fn effective_level(&self, index: usize) -> u32 {
        self.levels.get(index).copied().unwrap_or(1)
    }

    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    pub fn shows_header(&self, index: usize) -> bool {
        !(self.header_suppressed && index == 0)
    }

    /// Depth of the test cases directly under the suite at `index`. The
    /// suppressed suite's own test cases keep their original depth.
    pub fn test_case_level(&self, index: usize) -> u32 {
        if self.shows_header(index) {
            self.effective_level(index) + 1
        } else {
            self.original.get(index).copied().unwrap_or(1) + 1
        }
    }
}

/// Decides whether `suites[0]`'s header is suppressed and computes effective
/// levels. Applies exactly one promotion pass.
pub fn flatten(suites: &[SuiteNode], enabled: bool) -> FlattenPlan {
    let original: Vec<u32> = suites.iter().map(|s| s.level).collect();
    let top_level = suites.iter().filter(|s| s.level == 1).count();
    let triggered = enabled && suites.first().is_some_and(|s| s.level == 1) && top_level == 1;

    if !triggered {
        return FlattenPlan {
            header_suppressed: false,
            levels: original.clone(),
            original,
        };
    }

    debug!(suite = suites[0].id, "Suppressing sole top-level suite header");
    let levels = original
        .iter()
        .enumerate()
        .map(|(index, level)| {
            if index == 0 {
                *level
            } else {
                level.saturating_sub(1).max(1)
            }
        })
        .collect();
    FlattenPlan {
        header_suppressed: true,
        original,
        levels,
    }
}
