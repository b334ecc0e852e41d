//! Shared test helpers for `eventhub-core` integration tests.
//!
//! In-memory implementations of every core port plus small fixtures, so the
//! service tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod calendar;
pub mod fixtures;
pub mod notifier;
pub mod store;
