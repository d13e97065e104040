//! Cache module for storing API responses in memory
//!
//! This module provides a time-expiring response cache shared by every API call.
//! Entries live for a configurable TTL and are evicted by a cancellable background
//! sweep task. Nothing is written to disk.

mod store;

pub use store::{ResponseCache, SweepHandle};
