//! Core business logic for Fabriq.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. The approval workflow engine lives here: rule resolution,
//! the request state machine, and recipient resolution.

pub mod approvals;
