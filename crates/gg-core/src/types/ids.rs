use crate::error::ResolutionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Any identifier Gerrit accepts for a change: `I…` change-id, change number,
/// or a project-qualified form. Only checked for being a usable path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ChangeId(String);

impl ChangeId {
    pub fn new(value: impl Into<String>) -> Result<Self, ResolutionError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ResolutionError::InvalidChangeId {
                value,
                reason: "empty",
            });
        }
        if value.chars().any(char::is_whitespace) {
            return Err(ResolutionError::InvalidChangeId {
                value,
                reason: "contains whitespace",
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChangeId {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for ChangeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}
