//! Schema Validator: turns raw agent text into a `ClassificationResultSet`.
//!
//! Only shape is enforced here: JSON syntax, the code pattern, string lengths and
//! the candidate count. Whether a code/title pair actually exists in the taxonomy
//! is the reconciler's concern.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::classification::code::OccupationCode;
use crate::classification::models::{
    ClassificationCandidate, ClassificationResultSet, MAX_CANDIDATES, MAX_EXPLANATION_CHARS,
    MAX_TITLE_CHARS,
};

/// The constraint a field failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SchemaRule {
    Pattern { expected: &'static str },
    MaxLength { max: usize, actual: usize },
    MaxItems { max: usize, actual: usize },
    Shape { detail: String },
}

impl fmt::Display for SchemaRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaRule::Pattern { expected } => write!(f, "must match pattern {expected}"),
            SchemaRule::MaxLength { max, actual } => {
                write!(f, "length {actual} exceeds max length {max}")
            }
            SchemaRule::MaxItems { max, actual } => {
                write!(f, "{actual} items exceeds max items {max}")
            }
            SchemaRule::Shape { detail } => write!(f, "unexpected shape: {detail}"),
        }
    }
}

/// Fatal failures for a submission. Never retried here.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Agent output is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Schema violation at `{field}`: {rule}")]
    SchemaViolation { field: String, rule: SchemaRule },
}

impl ClassificationError {
    fn violation(field: impl Into<String>, rule: SchemaRule) -> Self {
        ClassificationError::SchemaViolation {
            field: field.into(),
            rule,
        }
    }
}

const CODE_PATTERN_DESCRIPTION: &str = r"\d{2}-\d{4}\.\d{2}";

/// Removes a markdown code fence only when a well-formed pair wraps the whole
/// payload: an opening ``` (optionally followed by a language tag such as
/// `json`) at the start and a closing ``` at the end. Anything else is returned
/// unchanged, so backticks inside legitimate content are never touched.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return raw;
    };

    let tag_len = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
        .unwrap_or(inner.len());

    inner[tag_len..].trim()
}

/// Parses and shape-validates agent output. On any failure nothing is returned
/// besides the error; a result set is never partially built.
pub fn parse_result_set(raw: &str) -> Result<ClassificationResultSet, ClassificationError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body).map_err(ClassificationError::Parse)?;

    let root = match value {
        Value::Object(root) => root,
        other => {
            return Err(ClassificationError::violation(
                "$",
                SchemaRule::Shape {
                    detail: format!("expected a JSON object, found {}", kind_of(&other)),
                },
            ))
        }
    };

    if root.contains_key("job_classifications") {
        parse_wrapped(root)
    } else if root.contains_key("occupation_code") {
        parse_bare(root)
    } else {
        Err(ClassificationError::violation(
            "job_classifications",
            SchemaRule::Shape {
                detail: "missing field".to_string(),
            },
        ))
    }
}

fn parse_wrapped(mut root: Map<String, Value>) -> Result<ClassificationResultSet, ClassificationError> {
    let items = match root.remove("job_classifications") {
        Some(Value::Array(items)) => items,
        Some(Value::Null) => Vec::new(),
        Some(other) => {
            return Err(ClassificationError::violation(
                "job_classifications",
                SchemaRule::Shape {
                    detail: format!("expected an array, found {}", kind_of(&other)),
                },
            ))
        }
        None => Vec::new(),
    };

    if items.len() > MAX_CANDIDATES {
        return Err(ClassificationError::violation(
            "job_classifications",
            SchemaRule::MaxItems {
                max: MAX_CANDIDATES,
                actual: items.len(),
            },
        ));
    }

    let overall_explanation =
        optional_string(root.remove("overall_explanation"), "overall_explanation")?;
    check_length(
        overall_explanation.as_deref(),
        "overall_explanation",
        MAX_EXPLANATION_CHARS,
    )?;

    let job_classifications = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| parse_candidate(item, &format!("job_classifications[{i}].")))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClassificationResultSet {
        job_classifications,
        overall_explanation,
    })
}

/// Bare single-candidate object, as returned by older prompt versions.
fn parse_bare(mut root: Map<String, Value>) -> Result<ClassificationResultSet, ClassificationError> {
    let overall_explanation =
        optional_string(root.remove("overall_explanation"), "overall_explanation")?;
    check_length(
        overall_explanation.as_deref(),
        "overall_explanation",
        MAX_EXPLANATION_CHARS,
    )?;

    let candidate = parse_candidate(Value::Object(root), "")?;
    Ok(ClassificationResultSet {
        job_classifications: vec![candidate],
        overall_explanation,
    })
}

#[derive(Deserialize)]
struct RawCandidate {
    occupation_code: String,
    occupation_title: String,
    #[serde(default)]
    explanation: Option<String>,
}

fn parse_candidate(
    value: Value,
    prefix: &str,
) -> Result<ClassificationCandidate, ClassificationError> {
    let field = |name: &str| format!("{prefix}{name}");

    let raw: RawCandidate = serde_json::from_value(value).map_err(|e| {
        let at = if prefix.is_empty() {
            "$".to_string()
        } else {
            prefix.trim_end_matches('.').to_string()
        };
        ClassificationError::violation(
            at,
            SchemaRule::Shape {
                detail: e.to_string(),
            },
        )
    })?;

    let occupation_code = OccupationCode::parse(&raw.occupation_code).map_err(|_| {
        ClassificationError::violation(
            field("occupation_code"),
            SchemaRule::Pattern {
                expected: CODE_PATTERN_DESCRIPTION,
            },
        )
    })?;

    check_length(
        Some(raw.occupation_title.as_str()),
        &field("occupation_title"),
        MAX_TITLE_CHARS,
    )?;
    check_length(
        raw.explanation.as_deref(),
        &field("explanation"),
        MAX_EXPLANATION_CHARS,
    )?;

    Ok(ClassificationCandidate {
        occupation_code,
        occupation_title: raw.occupation_title,
        explanation: raw.explanation,
    })
}

fn optional_string(value: Option<Value>, field: &str) -> Result<Option<String>, ClassificationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ClassificationError::violation(
            field,
            SchemaRule::Shape {
                detail: format!("expected a string, found {}", kind_of(&other)),
            },
        )),
    }
}

/// Lengths are counted in characters, not bytes.
fn check_length(value: Option<&str>, field: &str, max: usize) -> Result<(), ClassificationError> {
    let Some(value) = value else {
        return Ok(());
    };
    let actual = value.chars().count();
    if actual > max {
        return Err(ClassificationError::violation(
            field,
            SchemaRule::MaxLength { max, actual },
        ));
    }
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
