//! Domain logic for the crowdsourcing platform's audit trail.
//!
//! This crate performs no I/O. It owns the audit vocabulary, the tables of
//! tracked attributes, change detection, record building, and the access
//! policy for reading a project's audit log.

pub mod access;
pub mod audit;
pub mod error;
pub mod scheduler;
pub mod types;
