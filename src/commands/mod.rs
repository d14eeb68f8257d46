//! Activation-phrase parsing for issue comments.
//!
//! A comment activates the agent when it contains one of the configured
//! aliases (by default `@bot` or `/bot`). Path-like tokens after the alias on
//! the same line name the files the model should see.
//!
//! # Example
//!
//! ```
//! use issue_autopatch::commands::{parse_activation, ActivationCommand};
//!
//! let comment = "Thanks for the report.\n\n@bot fix notes.md";
//! assert_eq!(
//!     parse_activation(comment, &["@bot"]),
//!     ActivationCommand::activated(vec!["notes.md".to_string()])
//! );
//! ```

mod parser;
mod types;

pub use parser::parse_activation;
pub use types::ActivationCommand;
