use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored launcher shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub name: String,
    pub url: String,
    pub category: Option<String>,
    pub position: i32,
}

impl Entry {
    /// Null and empty categories both count as uncategorized.
    pub fn is_uncategorized(&self) -> bool {
        self.category.as_deref().is_none_or(str::is_empty)
    }
}

/// Payload for creating an entry. The store assigns `id` and `position`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// One `{id, position}` pair of a reorder batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: String,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Every problem found in a payload, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid payload: {}", summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| {
            if i.path.is_empty() {
                i.message.clone()
            } else {
                format!("{}: {}", i.path, i.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    fn single(path: &str, message: &str) -> Self {
        Self {
            issues: vec![ValidationIssue::new(path, message)],
        }
    }
}

pub const INVALID_URL_MESSAGE: &str = "Please enter a valid URL";

/// True when `raw` parses as an absolute URL.
pub fn is_valid_url(raw: &str) -> bool {
    url::Url::parse(raw).is_ok()
}

impl NewEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        if self.name.is_empty() {
            issues.push(ValidationIssue::new("name", "Name is required"));
        }
        if !is_valid_url(&self.url) {
            issues.push(ValidationIssue::new("url", INVALID_URL_MESSAGE));
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Validate an untyped JSON body field by field. Unknown keys are ignored.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let Some(obj) = value.as_object() else {
            return Err(ValidationError::single("", "Expected object"));
        };

        let mut issues = Vec::new();
        let name = required_string(obj, "name", &mut issues);
        let url = required_string(obj, "url", &mut issues);
        let category = match obj.get("category") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                issues.push(ValidationIssue::new("category", "Expected string or null"));
                None
            }
        };

        if let Some(name) = &name
            && name.is_empty()
        {
            issues.push(ValidationIssue::new("name", "Name is required"));
        }
        if let Some(url) = &url
            && !is_valid_url(url)
        {
            issues.push(ValidationIssue::new("url", INVALID_URL_MESSAGE));
        }

        match (name, url) {
            (Some(name), Some(url)) if issues.is_empty() => Ok(Self {
                name,
                url,
                category,
            }),
            _ => Err(ValidationError { issues }),
        }
    }
}

fn required_string(
    obj: &Map<String, Value>,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        None | Some(Value::Null) => {
            issues.push(ValidationIssue::new(key, "Required"));
            None
        }
        Some(_) => {
            issues.push(ValidationIssue::new(key, "Expected string"));
            None
        }
    }
}

impl PositionUpdate {
    pub fn new(id: impl Into<String>, position: i32) -> Self {
        Self {
            id: id.into(),
            position,
        }
    }

    /// Validate a reorder body: an array of `{id: string, position: integer}`.
    pub fn batch_from_value(value: &Value) -> Result<Vec<Self>, ValidationError> {
        let Some(items) = value.as_array() else {
            return Err(ValidationError::single("", "Expected array"));
        };

        let mut issues = Vec::new();
        let mut updates = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let Some(obj) = item.as_object() else {
                issues.push(ValidationIssue::new(format!("[{}]", index), "Expected object"));
                continue;
            };
            let id = match obj.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                None | Some(Value::Null) => {
                    issues.push(ValidationIssue::new(format!("[{}].id", index), "Required"));
                    None
                }
                Some(_) => {
                    issues.push(ValidationIssue::new(format!("[{}].id", index), "Expected string"));
                    None
                }
            };
            let position = match obj.get("position") {
                None | Some(Value::Null) => {
                    issues.push(ValidationIssue::new(
                        format!("[{}].position", index),
                        "Required",
                    ));
                    None
                }
                Some(v) => {
                    let parsed = as_i32(v);
                    if parsed.is_none() {
                        issues.push(ValidationIssue::new(
                            format!("[{}].position", index),
                            "Expected integer",
                        ));
                    }
                    parsed
                }
            };
            if let (Some(id), Some(position)) = (id, position) {
                updates.push(Self { id, position });
            }
        }

        if issues.is_empty() {
            Ok(updates)
        } else {
            Err(ValidationError { issues })
        }
    }
}

fn as_i32(value: &Value) -> Option<i32> {
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) {
        Some(f as i32)
    } else {
        None
    }
}

/// Assign positions `0..n-1` following the iteration order of `ids`.
pub fn dense_positions<'a, I>(ids: I) -> Vec<PositionUpdate>
where
    I: IntoIterator<Item = &'a str>,
{
    ids.into_iter()
        .enumerate()
        .map(|(index, id)| PositionUpdate::new(id, index as i32))
        .collect()
}
