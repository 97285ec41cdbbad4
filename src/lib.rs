pub mod data;
pub mod error;
pub mod events;
mod findings;
mod history;
pub mod render;
pub mod tree;

pub use data::{Confidence, Finding, RecordOrigin, RequestRecord, Severity};
pub use error::TreeError;
pub use events::{TreeEvent, spawn_observer};
pub use render::{NodeLabel, node_label};
pub use tree::{NodeId, SiteTree};
