pub mod assemble;
pub mod attachments;
pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod generate;
pub mod history;
pub mod html;
pub mod load_config;
pub mod model;
pub mod pairing;
pub mod reconcile;
pub mod requirements;
pub mod skin;
pub mod snapshot;
pub mod suite;
pub mod trace;

pub use config::GenerationConfig;
pub use error::SkinError;
pub use generate::{generate, Collaborators};
pub use skin::SkinDocument;
