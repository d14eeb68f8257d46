//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Typed parsing of the events the agent reacts to

pub mod events;
pub mod parser;
pub mod signature;

pub use events::{CommentAction, GitHubEvent, IssueCommentEvent, IssueDetails};
pub use parser::{ParseError, parse_webhook};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
