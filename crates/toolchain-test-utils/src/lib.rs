//! Shared test utilities for the toolchain workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixture`] - [`ToolFixture`] builder laying out an install root on disk
//! - [`recorder`] - [`RecordingReporter`] capturing user-visible output
//! - [`runner`] - [`ScriptedRunner`] replaying canned process results
//! - [`selector`] - [`FixedSelector`] answering path selection with a fixed choice

pub mod fixture;
pub mod recorder;
pub mod runner;
pub mod selector;

pub use fixture::ToolFixture;
pub use recorder::{RecordedLine, RecordingReporter};
pub use runner::ScriptedRunner;
pub use selector::FixedSelector;
