//! Model response parsing and validation.
//!
//! Parsing happens in two passes. The shape pass walks the decoded JSON field
//! by field and reports every missing or mistyped field at once. The rules
//! pass runs on the typed plan. Both return violations as data so the
//! generator can quote them back to the model.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::types::IssueNumber;

use super::plan::{ChangeKind, FileChange, PatchPlan};

/// Maximum length of a commit title, in characters.
pub const MAX_TITLE_CHARS: usize = 72;

static BRANCH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+/fix-issue-[0-9]+$").unwrap());

/// One problem with a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON path of the offending field, e.g. `file_changes[1].operation`.
    pub field: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaViolation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Per-delivery expectations a plan must meet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRules {
    pub branch_prefix: String,
    pub issue: IssueNumber,
}

impl PlanRules {
    pub fn new(branch_prefix: impl Into<String>, issue: IssueNumber) -> Self {
        PlanRules {
            branch_prefix: branch_prefix.into(),
            issue,
        }
    }

    /// The only branch name a plan for this issue may use.
    pub fn expected_branch(&self) -> String {
        self.issue.fix_branch(&self.branch_prefix)
    }
}

/// Parses and validates a raw model response.
pub fn parse_plan(text: &str, rules: &PlanRules) -> Result<PatchPlan, Vec<SchemaViolation>> {
    let body = strip_fences(text);
    let value: Value = serde_json::from_str(body).map_err(|e| {
        vec![SchemaViolation::new(
            "response",
            format!("is not a valid JSON object: {}", e),
        )]
    })?;

    let plan = decode_plan(&value)?;
    let violations = validate(&plan, rules);
    if violations.is_empty() {
        Ok(plan)
    } else {
        Err(violations)
    }
}

/// Removes a surrounding Markdown code fence, if any.
///
/// ```
/// use issue_autopatch::patch::strip_fences;
///
/// assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
/// assert_eq!(strip_fences("  {\"a\":1}  "), "{\"a\":1}");
/// ```
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `JSON`, ...) on the opening line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Checks the shape of a decoded response and builds the typed plan.
pub fn decode_plan(value: &Value) -> Result<PatchPlan, Vec<SchemaViolation>> {
    let Some(object) = value.as_object() else {
        return Err(vec![SchemaViolation::new(
            "response",
            "must be a JSON object",
        )]);
    };

    let mut violations = Vec::new();
    let commit_title = required_string(object, "commit_title", "commit_title", &mut violations);
    let branch_name = required_string(object, "branch_name", "branch_name", &mut violations);
    let description = required_string(object, "pr_description", "pr_description", &mut violations);

    let file_changes = match object.get("file_changes") {
        None | Some(Value::Null) => {
            violations.push(SchemaViolation::new("file_changes", "is required"));
            None
        }
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| decode_change(index, item, &mut violations))
                .collect::<Vec<_>>(),
        ),
        Some(_) => {
            violations.push(SchemaViolation::new("file_changes", "must be an array"));
            None
        }
    };

    match (commit_title, branch_name, description, file_changes) {
        (Some(commit_title), Some(branch_name), Some(description), Some(file_changes))
            if violations.is_empty() =>
        {
            Ok(PatchPlan {
                commit_title,
                branch_name,
                description,
                file_changes,
            })
        }
        _ => Err(violations),
    }
}

fn required_string(
    object: &Map<String, Value>,
    key: &str,
    field: &str,
    violations: &mut Vec<SchemaViolation>,
) -> Option<String> {
    match object.get(key) {
        None | Some(Value::Null) => {
            violations.push(SchemaViolation::new(field, "is required"));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            violations.push(SchemaViolation::new(field, "must be a string"));
            None
        }
    }
}

fn decode_change(
    index: usize,
    item: &Value,
    violations: &mut Vec<SchemaViolation>,
) -> Option<FileChange> {
    let prefix = format!("file_changes[{}]", index);
    let Some(object) = item.as_object() else {
        violations.push(SchemaViolation::new(prefix, "must be an object"));
        return None;
    };

    let path = required_string(object, "path", &format!("{}.path", prefix), violations);
    let operation = required_string(
        object,
        "operation",
        &format!("{}.operation", prefix),
        violations,
    );

    let content_field = format!("{}.content", prefix);
    let kind = match operation.as_deref() {
        Some("add") => required_string(object, "content", &content_field, violations)
            .map(ChangeKind::Add),
        Some("modify") => required_string(object, "content", &content_field, violations)
            .map(ChangeKind::Modify),
        Some("delete") => Some(ChangeKind::Delete),
        Some(other) => {
            violations.push(SchemaViolation::new(
                format!("{}.operation", prefix),
                format!("must be one of add, modify, delete (got `{}`)", other),
            ));
            None
        }
        None => None,
    };

    Some(FileChange {
        path: path?,
        kind: kind?,
    })
}

/// Checks a typed plan against the delivery's rules.
pub fn validate(plan: &PatchPlan, rules: &PlanRules) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    let title_chars = plan.commit_title.chars().count();
    if plan.commit_title.trim().is_empty() {
        violations.push(SchemaViolation::new("commit_title", "must not be empty"));
    } else if title_chars > MAX_TITLE_CHARS {
        violations.push(SchemaViolation::new(
            "commit_title",
            format!(
                "must be at most {} characters (got {})",
                MAX_TITLE_CHARS, title_chars
            ),
        ));
    }

    let expected = rules.expected_branch();
    if !BRANCH_PATTERN.is_match(&plan.branch_name) {
        violations.push(SchemaViolation::new(
            "branch_name",
            format!(
                "must match `<prefix>/fix-issue-<number>`, expected `{}` (got `{}`)",
                expected, plan.branch_name
            ),
        ));
    } else if plan.branch_name != expected {
        violations.push(SchemaViolation::new(
            "branch_name",
            format!("must be `{}` (got `{}`)", expected, plan.branch_name),
        ));
    }

    if plan.file_changes.is_empty() {
        violations.push(SchemaViolation::new(
            "file_changes",
            "must contain at least one change",
        ));
    }

    let mut seen = HashSet::new();
    for (index, change) in plan.file_changes.iter().enumerate() {
        let field = format!("file_changes[{}].path", index);
        if let Some(problem) = path_problem(&change.path) {
            violations.push(SchemaViolation::new(field, problem));
        } else if !seen.insert(change.path.as_str()) {
            violations.push(SchemaViolation::new(
                field,
                format!("duplicates an earlier change to `{}`", change.path),
            ));
        }
    }

    violations
}

fn path_problem(path: &str) -> Option<&'static str> {
    if path.trim().is_empty() {
        Some("must not be empty")
    } else if path.starts_with('/') || path.starts_with('\\') {
        Some("must be relative to the repository root")
    } else if path.split(['/', '\\']).any(|segment| segment == "..") {
        Some("must not contain `..` segments")
    } else {
        None
    }
}
