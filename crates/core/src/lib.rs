//! Loyalty domain core.
//!
//! Pure domain logic with no database or cache dependencies:
//!
//! - [`eligibility`] -- windowed net-earning evaluation of tier criteria.
//! - [`cache_keys`] -- closed registry of response-cache keys and
//!   invalidation patterns.
//! - [`schedule`] -- fire-time arithmetic for recurring jobs.
//! - [`membership`] -- customer tier membership port.
//!
//! Persistence is reached only through the ports in
//! [`eligibility::ports`] and [`membership`], implemented by the `db` crate.

pub mod cache_keys;
pub mod eligibility;
pub mod error;
pub mod membership;
pub mod schedule;
pub mod tier;
pub mod types;
