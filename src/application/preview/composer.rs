//! Composition of the three source fragments into one standalone document.
//!
//! Fragments are embedded verbatim. Nothing here parses, escapes or sanitizes
//! user input: the markup is display content and the script is executable
//! code, and both only ever run inside the sandboxed preview surface.

use crate::domain::fragments::FragmentSet;

/// Baseline reset applied before the user's style fragment.
pub const DEFAULT_BASELINE_STYLE: &str =
    "body { margin: 0; padding: 0; font-family: sans-serif; }";

/// Reports errors escaping the guarded block (syntax errors, async throws)
/// to the console instead of the surface's default error handling.
const UNCAUGHT_ERROR_REPORTER: &str = "window.addEventListener(\"error\", function (event) { console.error(event.error || event.message); event.preventDefault(); });";

/// The content-wrapping template the fragments are placed into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTemplate {
    baseline_style: String,
}

impl DocumentTemplate {
    pub fn new(baseline_style: impl Into<String>) -> Self {
        Self {
            baseline_style: baseline_style.into(),
        }
    }

    pub fn baseline_style(&self) -> &str {
        &self.baseline_style
    }
}

impl Default for DocumentTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_STYLE)
    }
}

/// Pure, infallible document builder.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    template: DocumentTemplate,
}

impl Composer {
    pub fn new(template: DocumentTemplate) -> Self {
        Self { template }
    }

    /// Compose a complete snapshot of the fragments.
    pub fn compose(&self, fragments: &FragmentSet) -> String {
        self.compose_parts(&fragments.markup, &fragments.style, &fragments.script)
    }

    pub fn compose_parts(&self, markup: &str, style: &str, script: &str) -> String {
        let baseline = self.template.baseline_style();
        let mut document = String::with_capacity(
            512 + baseline.len() + markup.len() + style.len() + script.len(),
        );

        document.push_str("<!DOCTYPE html>\n<html>\n  <head>\n");
        document.push_str("    <meta charset=\"utf-8\">\n");
        document.push_str("    <style>\n      ");
        document.push_str(baseline);
        document.push('\n');
        // User fragments start on their own line so a trailing line comment
        // in one of them cannot swallow the scaffolding that follows.
        push_fragment(&mut document, style);
        document.push_str("    </style>\n  </head>\n  <body>\n");
        push_fragment(&mut document, markup);
        document.push_str("    <script>\n      ");
        document.push_str(UNCAUGHT_ERROR_REPORTER);
        document.push_str("\n    </script>\n");
        document.push_str("    <script>\n      try {\n");
        push_fragment(&mut document, script);
        document.push_str("      } catch (err) {\n        console.error(err);\n      }\n");
        document.push_str("    </script>\n  </body>\n</html>\n");

        document
    }
}

fn push_fragment(document: &mut String, fragment: &str) {
    document.push_str(fragment);
    document.push('\n');
}

/// Compose with the default template.
pub fn compose(markup: &str, style: &str, script: &str) -> String {
    Composer::default().compose_parts(markup, style, script)
}
