//! The editable source fragments of one repl.

use serde::{Deserialize, Serialize};

use super::types::FragmentKind;

/// Markup, style and script sources of a single document version.
///
/// Every field is always present; a fragment the user never touched is the
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentSet {
    pub markup: String,
    pub style: String,
    pub script: String,
}

impl FragmentSet {
    pub fn new(
        markup: impl Into<String>,
        style: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            markup: markup.into(),
            style: style.into(),
            script: script.into(),
        }
    }

    pub fn get(&self, kind: FragmentKind) -> &str {
        match kind {
            FragmentKind::Html => &self.markup,
            FragmentKind::Css => &self.style,
            FragmentKind::Js => &self.script,
        }
    }

    /// Replace one fragment with its full updated content.
    pub fn set(&mut self, kind: FragmentKind, content: String) {
        match kind {
            FragmentKind::Html => self.markup = content,
            FragmentKind::Css => self.style = content,
            FragmentKind::Js => self.script = content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_only_the_named_fragment() {
        let mut fragments = FragmentSet::new("<p>a</p>", "p{}", "1;");
        fragments.set(FragmentKind::Css, "p{color:blue}".to_string());

        assert_eq!(fragments.get(FragmentKind::Html), "<p>a</p>");
        assert_eq!(fragments.get(FragmentKind::Css), "p{color:blue}");
        assert_eq!(fragments.get(FragmentKind::Js), "1;");
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let fragments: FragmentSet = serde_json::from_str(r#"{"markup":"<i>x</i>"}"#).unwrap();
        assert_eq!(fragments.style, "");
        assert_eq!(fragments.script, "");
    }
}
