//! Monster AI scheduling.

pub mod scheduler;

pub use scheduler::{TickReport, TickScheduler};
