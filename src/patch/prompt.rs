//! Prompt construction for patch generation.

use std::fmt::Write as _;

use crate::context::{RepositoryContext, RepositoryFile};
use crate::types::RepoId;
use crate::webhooks::IssueDetails;

use super::validate::{MAX_TITLE_CHARS, PlanRules, SchemaViolation};

/// A system and user prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// The inputs a prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub repo: &'a RepoId,
    pub issue: &'a IssueDetails,
    pub comment: &'a str,
    pub context: &'a RepositoryContext,
    pub rules: &'a PlanRules,
}

const RESPOND_WITH_JSON_ONLY: &str =
    "Respond with the JSON object only: no prose, no explanation, no Markdown fences.";

/// Builds the first-attempt prompt.
pub fn build_prompt(input: &PromptInput<'_>) -> Prompt {
    Prompt {
        system: system_prompt(),
        user: user_prompt(input),
    }
}

/// Builds a correction prompt quoting the rejected response and what was wrong with it.
pub fn build_retry_prompt(
    original: &Prompt,
    previous_response: &str,
    violations: &[SchemaViolation],
) -> Prompt {
    let mut user = original.user.clone();
    user.push_str("\n\n## Your previous response\n\n");
    user.push_str("Your previous response could not be used. It was:\n\n");
    user.push_str("<previous_response>\n");
    user.push_str(previous_response);
    user.push_str("\n</previous_response>\n\n");
    user.push_str("## Validation errors\n\n");
    for violation in violations {
        let _ = writeln!(user, "- {}", violation);
    }
    user.push_str("\nReturn a corrected JSON object that fixes every error above. ");
    user.push_str(RESPOND_WITH_JSON_ONLY);

    Prompt {
        system: original.system.clone(),
        user,
    }
}

fn system_prompt() -> String {
    format!(
        "You are an automated software engineer. You receive a GitHub issue, the comment \
that asked you to act on it, and selected files from the repository. You answer with \
exactly one JSON object describing whole-file changes that resolve the issue.\n\n\
The object has these fields:\n\
- \"commit_title\": string, at most {} characters\n\
- \"branch_name\": string, exactly the branch name given in the request\n\
- \"pr_description\": string, Markdown explaining the change\n\
- \"file_changes\": non-empty array of objects with \"path\" (relative to the repository \
root), \"operation\" (one of \"add\", \"modify\", \"delete\") and \"content\" (the complete \
new file content; omit it for \"delete\")\n\n{}",
        MAX_TITLE_CHARS, RESPOND_WITH_JSON_ONLY
    )
}

fn user_prompt(input: &PromptInput<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Repository: {}\n", input.repo);

    if let Some(standards) = &input.context.standards {
        out.push_str("## Repository standards\n\n");
        out.push_str(standards.trim_end());
        out.push_str("\n\n");
    }

    let _ = writeln!(out, "## Issue {}: {}\n", input.issue.number, input.issue.title);
    if input.issue.body.trim().is_empty() {
        out.push_str("(no description)\n\n");
    } else {
        out.push_str(input.issue.body.trim_end());
        out.push_str("\n\n");
    }

    out.push_str("## Triggering comment\n\n");
    out.push_str(input.comment.trim_end());
    out.push_str("\n\n");

    if input.context.files.is_empty() {
        out.push_str("No files were attached; work from the issue text alone.\n\n");
    } else {
        out.push_str("## Files\n\n");
        for file in &input.context.files {
            write_file(&mut out, file);
        }
    }

    let _ = writeln!(
        out,
        "Use branch_name `{}`.\n{}",
        input.rules.expected_branch(),
        RESPOND_WITH_JSON_ONLY
    );
    out
}

fn write_file(out: &mut String, file: &RepositoryFile) {
    let fence = fence_for(&file.content);
    let hint = language_hint(&file.path).unwrap_or("");

    let _ = writeln!(out, "### {}\n", file.path);
    let _ = writeln!(out, "{}{}", fence, hint);
    out.push_str(&file.content);
    if !file.content.ends_with('\n') {
        out.push('\n');
    }
    let _ = writeln!(out, "{}", fence);
    if file.truncated {
        out.push_str("(file truncated; only the beginning is shown)\n");
    }
    out.push('\n');
}

/// A backtick fence longer than any backtick run inside `content`.
fn fence_for(content: &str) -> String {
    let longest = content
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Maps a file extension to a Markdown language tag.
pub fn language_hint(path: &str) -> Option<&'static str> {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let (_, extension) = file_name.rsplit_once('.')?;
    let hint = match extension.to_ascii_lowercase().as_str() {
        "rs" => "rust",
        "ts" => "typescript",
        "tsx" => "tsx",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "jsx",
        "py" => "python",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "rb" => "ruby",
        "php" => "php",
        "cs" => "csharp",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" => "cpp",
        "swift" => "swift",
        "md" => "markdown",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "html" | "htm" => "html",
        "css" => "css",
        "scss" => "scss",
        "sh" | "bash" => "bash",
        "sql" => "sql",
        _ => return None,
    };
    Some(hint)
}
