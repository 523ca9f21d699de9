//! Core types for Glypho live

use serde::{Deserialize, Serialize};

/// Resource path of the initial content endpoint
pub const INIT_PATH: &str = "init";

/// Resource path of the push channel
pub const SSE_PATH: &str = "sse";

/// Payload the push channel sends when there is nothing to update
pub const SENTINEL: &str = "false";

/// Selector of the container element the server renders into
pub const DEFAULT_SELECTOR: &str = "article#markdown";

/// Default reconnection delay of the push channel, in milliseconds
pub const DEFAULT_RETRY_MS: u64 = 3000;

/// An HTML fragment of typeset Markdown/math content.
///
/// It always replaces the whole container; nothing is kept once the next
/// fragment arrives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderedDocument(String);

impl RenderedDocument {
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for RenderedDocument {
    fn from(html: String) -> Self {
        Self(html)
    }
}

impl From<&str> for RenderedDocument {
    fn from(html: &str) -> Self {
        Self(html.to_string())
    }
}

impl AsRef<str> for RenderedDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Inline math delimiter pair, e.g. `$...$`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiter {
    pub open: String,
    pub close: String,
}

impl Delimiter {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

/// Math typesetting options passed to the typesetter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypesetOptions {
    /// Inline math delimiters, `$...$` and `\(...\)` unless configured
    pub inline_math: Vec<Delimiter>,
}

impl Default for TypesetOptions {
    fn default() -> Self {
        Self {
            inline_math: vec![Delimiter::new("$", "$"), Delimiter::new("\\(", "\\)")],
        }
    }
}

impl TypesetOptions {
    /// MathJax configuration object (`window.MathJax = ...`) for these options
    pub fn mathjax_config(&self) -> serde_json::Value {
        let inline: Vec<[&str; 2]> = self
            .inline_math
            .iter()
            .map(|d| [d.open.as_str(), d.close.as_str()])
            .collect();

        serde_json::json!({
            "tex": { "inlineMath": inline },
        })
    }

    /// Ensure every delimiter is usable
    pub fn validate(&self) -> crate::Result<()> {
        if self.inline_math.is_empty() {
            return Err(crate::GlyphoError::InvalidInput(
                "at least one inline math delimiter is required".to_string(),
            ));
        }
        for d in &self.inline_math {
            if d.open.is_empty() || d.close.is_empty() {
                return Err(crate::GlyphoError::InvalidInput(format!(
                    "empty inline math delimiter: {:?}",
                    d
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delimiters() {
        let opts = TypesetOptions::default();
        assert_eq!(opts.inline_math.len(), 2);
        assert_eq!(opts.inline_math[0], Delimiter::new("$", "$"));
        assert_eq!(opts.inline_math[1], Delimiter::new("\\(", "\\)"));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_mathjax_config() {
        let config = TypesetOptions::default().mathjax_config();
        assert_eq!(
            config.to_string(),
            r#"{"tex":{"inlineMath":[["$","$"],["\\(","\\)"]]}}"#
        );
    }

    #[test]
    fn test_validate_rejects_empty() {
        let opts = TypesetOptions {
            inline_math: vec![Delimiter::new("$", "")],
        };
        assert!(opts.validate().is_err());

        let opts = TypesetOptions {
            inline_math: Vec::new(),
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_rendered_document() {
        let doc = RenderedDocument::from("<p>hi</p>");
        assert_eq!(doc.as_str(), "<p>hi</p>");
        assert_eq!(doc.len(), 9);
        assert!(!doc.is_empty());
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#""<p>hi</p>""#);
    }
}
