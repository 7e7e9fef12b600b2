//! The roverctl agent: the turn loop that drives a task to completion.
//!
//! A task run is: seed the log with the task text and an initial photo,
//! then loop — ask the reasoning engine for a turn, execute any requested
//! actions against the device, append the results, prune the log — until
//! the engine completes or the turn budget runs out.

pub mod pruning;
pub mod stream_event;
pub mod task_runner;

pub use pruning::{prune, PruneReport, PruningPolicy};
pub use stream_event::TaskEvent;
pub use task_runner::TaskRunner;
