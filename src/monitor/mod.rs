//! The monitoring pipeline: scheduler, dispatcher, and per-link processor.
//!
//! Control flows top-down: [`MonitorScheduler`] ticks on a fixed interval
//! and awaits one [`LinkDispatcher`] batch per tick; the dispatcher fans
//! eligible links out to parallel [`LinkProcessor`] runs bounded by a
//! counting semaphore; each processor drives one link through its status
//! transitions, the downloader, and the history recorder.
//!
//! Failures stay local: a failing link ends in error status with a failure
//! history row, a panicking processor task is logged by the dispatcher,
//! and a failing batch is logged by the scheduler. Nothing below the
//! scheduler can stop the loop.

mod dispatcher;
mod processor;
mod scheduler;

pub use dispatcher::{LinkDispatcher, TriggerError};
pub use processor::LinkProcessor;
pub use scheduler::MonitorScheduler;
