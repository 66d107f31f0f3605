//! Test doubles and fixtures for the pipeline's collaborator contracts.
//!
//! Public so downstream crates that implement the contracts can reuse
//! the same doubles in their own tests.

pub mod fixtures;
pub mod mocks;
