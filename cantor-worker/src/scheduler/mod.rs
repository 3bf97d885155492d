//! Scheduler layer for the worker
//!
//! This layer polls the job store for pending renders and drives them to a
//! terminal status. At most one render runs at a time; a watchdog fails a
//! render that outlives its budget.

pub mod guard;
pub mod poller;
pub mod settle;

pub use poller::RenderScheduler;
