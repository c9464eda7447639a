//! Pure policy evaluation (no IO).
//!
//! Input: a policy set model constructed elsewhere, the effective config, and the
//! exception registry.
//! Output: findings + verdict + summary data.

#![forbid(unsafe_code)]

pub mod decision;
pub mod exceptions;
pub mod matcher;
pub mod model;
pub mod policy;
pub mod report;

mod checks;
mod engine;
mod fingerprint;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use decision::{AccessRequest, Decision, decide};
pub use engine::evaluate;
