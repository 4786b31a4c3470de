//! Encode→analyze round-trip harness for Eclipsera
//!
//! Every cover in a directory is encoded with a known message under a set of
//! scenarios, then analyzed blind. A run passes when the analysis finds the
//! message again. Results are written as JSON, Markdown and one folder of
//! plane images, artifacts and text per run.

pub mod error;
pub mod output;
pub mod runner;
pub mod scenario;
pub mod types;

pub use error::{Error, Result};
pub use output::{render_markdown, write_json, write_markdown, write_run_folder};
pub use runner::{RoundtripRunner, discover_covers, message_found};
pub use scenario::{GOLDEN_MESSAGE, Scenario, default_scenarios};
pub use types::{RoundtripReport, RunRecord, ScenarioRecord};
