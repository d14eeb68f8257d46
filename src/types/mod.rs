//! Core domain identifiers for the autopatch agent.
//!
//! Newtypes keep issue numbers, installation ids and object SHAs from being
//! mixed up as they flow from the webhook payload to the Git publisher.

pub mod ids;

pub use ids::{DeliveryId, InstallationId, IssueNumber, RepoId, Sha};
