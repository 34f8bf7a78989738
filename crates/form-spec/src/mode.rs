use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operating context of a form, usually derived from a route parameter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Create,
    Edit,
    View,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Create => "create",
            Mode::Edit => "edit",
            Mode::View => "view",
        }
    }

    /// Only view mode forbids every edit.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Mode::View)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown form mode '{0}' (expected create, edit or view)")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "create" | "new" => Ok(Mode::Create),
            "edit" | "update" => Ok(Mode::Edit),
            "view" | "show" => Ok(Mode::View),
            _ => Err(ParseModeError(raw.to_string())),
        }
    }
}
