use thiserror::Error;

/// Boxed error returned by external collaborators (readers, stores, converters).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum SkinError {
    /// Missing plan id, no suites selected, no project name. Aborts generation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A trace adapter was asked for a mode it does not know. Fatal to that call only.
    #[error("unsupported trace mode '{mode}' for the {adapter} adapter")]
    UnsupportedMode { adapter: &'static str, mode: String },

    /// A trace adapter was handed data in a shape it does not read.
    #[error("the {adapter} adapter cannot read {found} trace data")]
    UnexpectedInput {
        adapter: &'static str,
        found: &'static str,
    },

    #[error("failed to fetch {what}")]
    UpstreamFetch {
        what: String,
        #[source]
        source: BoxError,
    },
}

impl SkinError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        SkinError::Configuration(msg.into())
    }

    pub fn upstream(what: impl Into<String>, source: BoxError) -> Self {
        SkinError::UpstreamFetch {
            what: what.into(),
            source,
        }
    }
}
