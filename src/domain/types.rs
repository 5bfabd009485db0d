//! Shared domain enumerations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Governs when a preview is rebuilt after its fragments change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Edits accumulate until the user explicitly runs the preview.
    #[default]
    Manual,
    /// Every edit (re)arms a quiet-period timer; the preview rebuilds when it expires.
    AutoDebounced,
}

impl TriggerMode {
    pub fn from_auto_refresh(auto_refresh: bool) -> Self {
        if auto_refresh {
            TriggerMode::AutoDebounced
        } else {
            TriggerMode::Manual
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TriggerMode::Manual => "manual",
            TriggerMode::AutoDebounced => "auto_debounced",
        }
    }
}

/// One of the three editable source fragments of a repl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Html,
    Css,
    Js,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 3] = [FragmentKind::Html, FragmentKind::Css, FragmentKind::Js];

    pub fn as_str(self) -> &'static str {
        match self {
            FragmentKind::Html => "html",
            FragmentKind::Css => "css",
            FragmentKind::Js => "js",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FragmentKind::Html => "HTML",
            FragmentKind::Css => "CSS",
            FragmentKind::Js => "JS",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FragmentKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "html" => Ok(FragmentKind::Html),
            "css" => Ok(FragmentKind::Css),
            "js" => Ok(FragmentKind::Js),
            other => Err(DomainError::validation(format!(
                "unknown fragment kind `{other}`"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_kind_round_trips_through_str() {
        for kind in FragmentKind::ALL {
            assert_eq!(kind.as_str().parse::<FragmentKind>().unwrap(), kind);
        }
        assert!("markdown".parse::<FragmentKind>().is_err());
    }

    #[test]
    fn trigger_mode_defaults_to_manual() {
        assert_eq!(TriggerMode::default(), TriggerMode::Manual);
        assert_eq!(TriggerMode::from_auto_refresh(true), TriggerMode::AutoDebounced);
    }

    #[test]
    fn trigger_mode_serializes_snake_case() {
        let json = serde_json::to_string(&TriggerMode::AutoDebounced).unwrap();
        assert_eq!(json, "\"auto_debounced\"");
    }
}
