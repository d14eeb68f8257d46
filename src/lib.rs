//! Issue Autopatch - a GitHub App that answers an activation comment on an
//! issue with a generated patch, a fix branch and a pull request.
//!
//! The library holds the pipeline components; the binary wires them to the
//! process environment and an HTTP listener.

pub mod agent;
pub mod auth;
pub mod commands;
pub mod config;
pub mod context;
pub mod effects;
pub mod error;
pub mod github;
pub mod patch;
pub mod publish;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
