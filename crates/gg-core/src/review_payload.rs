use crate::error::PayloadError;
use crate::types::NotifyLevel;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

// `[warning] my-check:12:4: did a bad thing`
static POSITIONED_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?P<severity>\[[^\]]+\])\s*[^\s:]+:\d+:\d+:\s*(?P<message>.*)$")
        .expect("message pattern compiles")
});

const RUN_ID_LEN: usize = 8;

pub type CommentRecord = Map<String, Value>;

/// Body of a robot-comment review posted on a revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Value>,
    pub robot_comments: BTreeMap<String, Vec<CommentRecord>>,
    pub omit_duplicate_comments: bool,
    pub notify: NotifyLevel,
}

impl ReviewPayload {
    pub fn comment_count(&self) -> usize {
        self.robot_comments.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub keep_labels: bool,
    pub path_prefixes: Vec<String>,
    pub robot_id: String,
    pub notify: NotifyLevel,
}

pub fn load(path: &Path) -> Result<Value, PayloadError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(PayloadError::NotFound { path: display });
    }
    let content = std::fs::read_to_string(path).map_err(|err| PayloadError::Unreadable {
        path: display.clone(),
        reason: err.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|err| PayloadError::InvalidJson {
        path: display,
        reason: err.to_string(),
    })
}

pub fn load_and_transform(
    path: &Path,
    options: &TransformOptions,
) -> Result<ReviewPayload, PayloadError> {
    let raw = load(path)?;
    transform(raw, options)
}

/// Converts a generic review-tool payload (`comments` keyed by file path) into
/// Gerrit robot comments.
pub fn transform(raw: Value, options: &TransformOptions) -> Result<ReviewPayload, PayloadError> {
    let Value::Object(mut root) = raw else {
        return Err(malformed("payload must be a json object"));
    };

    let labels = root.remove("labels").filter(|_| options.keep_labels);
    let message = optional_string(&mut root, "message")?;
    let tag = optional_string(&mut root, "tag")?;

    let comments = match root.remove("comments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(comments)) => comments,
        Some(_) => return Err(malformed("'comments' must map file paths to comment lists")),
    };

    let prefixes = sorted_prefixes(&options.path_prefixes);
    let mut robot_comments: BTreeMap<String, Vec<CommentRecord>> = BTreeMap::new();
    for (path, records) in comments {
        let Value::Array(records) = records else {
            return Err(malformed(&format!("comments for '{path}' must be a list")));
        };
        let key = trim_path(&path, &prefixes);
        let converted = records
            .into_iter()
            .map(|record| convert_record(record, &options.robot_id))
            .collect::<Result<Vec<_>, _>>()?;
        robot_comments.entry(key).or_default().extend(converted);
    }

    Ok(ReviewPayload {
        message,
        tag,
        labels,
        robot_comments,
        omit_duplicate_comments: true,
        notify: options.notify,
    })
}

fn optional_string(root: &mut Map<String, Value>, key: &str) -> Result<Option<String>, PayloadError> {
    match root.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(malformed(&format!("'{key}' must be a string"))),
    }
}

fn convert_record(record: Value, robot_id: &str) -> Result<CommentRecord, PayloadError> {
    let run_id = run_id(&record);
    let Value::Object(mut record) = record else {
        return Err(malformed("comment records must be json objects"));
    };
    if let Some(Value::String(message)) = record.get_mut("message") {
        *message = strip_position(message);
    }
    record.insert("robot_id".to_string(), Value::String(robot_id.to_string()));
    record.insert("robot_run_id".to_string(), Value::String(run_id));
    Ok(record)
}

/// Short digest of the record as the tool produced it; identical findings map to the
/// same id on every run so Gerrit can drop the repeats.
pub fn run_id(record: &Value) -> String {
    let canonical = record.to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(RUN_ID_LEN);
    id
}

/// `[severity] rule:line:col: text` becomes `[severity] text`; anything else is kept.
pub fn strip_position(message: &str) -> String {
    match POSITIONED_MESSAGE.captures(message) {
        Some(caps) => format!("{} {}", &caps["severity"], &caps["message"]),
        None => message.to_string(),
    }
}

fn sorted_prefixes(prefixes: &[String]) -> Vec<String> {
    let mut prefixes: Vec<String> = prefixes
        .iter()
        .filter(|prefix| !prefix.is_empty())
        .map(|prefix| normalize_separators(prefix))
        .collect();
    prefixes.sort_by_key(String::len);
    prefixes
}

/// Strips every matching prefix, shortest first.
pub fn trim_path(path: &str, sorted_prefixes: &[String]) -> String {
    let mut trimmed = normalize_separators(path);
    for prefix in sorted_prefixes {
        if let Some(rest) = trimmed.strip_prefix(prefix.as_str()) {
            trimmed = rest.to_string();
        }
    }
    trimmed
}

fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

fn malformed(message: &str) -> PayloadError {
    PayloadError::Malformed {
        message: message.to_string(),
    }
}
