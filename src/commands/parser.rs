//! Parser for activation phrases in comment text.
//!
//! This module provides a pure parser that extracts the activation intent and
//! any explicitly named file paths from unstructured GitHub comment text.

use super::types::ActivationCommand;

/// Scans comment text for the first activation alias.
///
/// # Parsing Rules
///
/// - Aliases (e.g. `@bot`, `/bot`) are matched case-insensitively
/// - An alias must sit at a word boundary on both sides
/// - The first line containing an alias wins; the rest of that line is
///   split on whitespace and every token that looks like a path (contains
///   `/`, `\` or `.`) is kept, in order, duplicates included
/// - No alias anywhere means `activated = false` and no paths
///
/// # Examples
///
/// ```
/// use issue_autopatch::commands::parse_activation;
///
/// let aliases = ["@bot", "/bot"];
/// let cmd = parse_activation("@bot fix src/lib.rs README.md", &aliases);
/// assert!(cmd.activated);
/// assert_eq!(cmd.target_paths, vec!["src/lib.rs", "README.md"]);
///
/// let cmd = parse_activation("/BOT please", &aliases);
/// assert!(cmd.activated);
/// assert!(cmd.target_paths.is_empty());
///
/// assert!(!parse_activation("thanks everyone", &aliases).activated);
/// ```
pub fn parse_activation<S: AsRef<str>>(text: &str, aliases: &[S]) -> ActivationCommand {
    for line in text.lines() {
        let hit = aliases
            .iter()
            .filter_map(|alias| {
                let alias = alias.as_ref();
                find_trigger(line, alias).map(|pos| (pos, alias.len()))
            })
            .min_by_key(|(pos, _)| *pos);

        if let Some((pos, len)) = hit {
            let rest = &line[pos + len..];
            return ActivationCommand::activated(extract_paths(rest));
        }
    }

    ActivationCommand::inactive()
}

/// Finds the first occurrence of `trigger` (case-insensitive) at a word
/// boundary. Returns the byte position of its first character.
fn find_trigger(line: &str, trigger: &str) -> Option<usize> {
    if trigger.is_empty() {
        return None;
    }
    let first = trigger.chars().next()?;
    let mut search_pos = 0;

    while search_pos < line.len() {
        let rel = line[search_pos..].find(|c: char| c.eq_ignore_ascii_case(&first))?;
        let abs_pos = search_pos + rel;

        // The slice end may land inside a multi-byte character; `get` then
        // yields None and we move on.
        if let Some(candidate) = line.get(abs_pos..abs_pos + trigger.len()) {
            if candidate.eq_ignore_ascii_case(trigger)
                && left_boundary(line, abs_pos)
                && right_boundary(line, abs_pos + trigger.len())
            {
                return Some(abs_pos);
            }
        }

        search_pos = abs_pos + first.len_utf8();
    }
    None
}

fn left_boundary(line: &str, pos: usize) -> bool {
    match line[..pos].chars().next_back() {
        None => true,
        Some(c) => !c.is_alphanumeric() && c != '/' && c != '@',
    }
}

fn right_boundary(line: &str, pos: usize) -> bool {
    match line[pos..].chars().next() {
        None => true,
        Some(c) => !c.is_alphanumeric() && c != '-' && c != '_' && c != '/',
    }
}

/// Keeps the path-like tokens of `rest`, cleaned of wrapping punctuation.
fn extract_paths(rest: &str) -> Vec<String> {
    rest.split_whitespace()
        .map(clean_token)
        .filter(|token| looks_like_path(token))
        .map(str::to_string)
        .collect()
}

fn clean_token(token: &str) -> &str {
    let token = token.trim_end_matches(|c: char| {
        matches!(c, '`' | '"' | '\'' | ')' | ',' | ';' | ':' | '!' | '?' | '.')
    });
    let token = token.trim_start_matches(|c: char| matches!(c, '`' | '"' | '\'' | '('));
    token.strip_prefix("./").unwrap_or(token)
}

fn looks_like_path(token: &str) -> bool {
    !token.is_empty() && token.contains(['/', '\\', '.'])
}
