//! Filegate - a guarded file-access gateway for LLM agent tools
//!
//! This crate provides the core functionality for Filegate, including:
//! - Gateway core with the list/read/write/mkdir/delete/verify operations
//! - Protected-file guard (basename + symlink-resolution checks)
//! - Tool schemas for agent-side auto-discovery
//! - HTTP server exposing the tool surface
//! - Hash-chained audit log of denied operations

pub mod cli;
pub mod config;
pub mod gateway;
pub mod paths;
pub mod security;
pub mod server;
pub mod tools;

pub use config::Config;
pub use gateway::{FailureKind, Gateway, Outcome, Payload};
