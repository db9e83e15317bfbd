//! Shared configuration, errors, constants and small types for the signage
//! display workspace.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
