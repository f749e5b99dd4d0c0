//! Background jobs for the loyalty backend.
//!
//! - [`scheduler`] -- [`ScheduledJob`](scheduler::ScheduledJob), an owned
//!   handle over a recurring task.
//! - [`tier_downgrade`] -- the monthly pass that moves customers who no
//!   longer qualify down one tier.

pub mod config;
pub mod scheduler;
pub mod tier_downgrade;
