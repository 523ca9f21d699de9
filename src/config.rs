//! Configuration file for the native mirror
//!
//! Everything is optional; command-line flags override the file.
//!
//! ```toml
//! server = "http://localhost:3030"
//! output = "~/preview/index.html"
//! selector = "article#markdown"
//! retry_ms = 3000
//!
//! [highlight]
//! command = ["prism-cli", "--in-place"]
//!
//! [math]
//! inline_math = [{ open = "$", close = "$" }, { open = "\\(", close = "\\)" }]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GlyphoError, Result};
use crate::types::{TypesetOptions, DEFAULT_RETRY_MS, DEFAULT_SELECTOR};

/// Default Glypho server address
pub const DEFAULT_SERVER: &str = "http://localhost:3030";

/// Default mirror file
pub const DEFAULT_OUTPUT: &str = "glypho-preview.html";

/// Mirror configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub server: String,
    pub output: String,
    /// Element patches must target this selector to be applied. The mirror
    /// page itself always wraps content in `article#markdown`.
    pub selector: String,
    /// Reconnection delay until the server sends `retry`
    pub retry_ms: u64,
    pub title: String,
    pub highlight: HookConfig,
    pub typeset: HookConfig,
    pub math: TypesetOptions,
    pub assets: AssetConfig,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            output: DEFAULT_OUTPUT.to_string(),
            selector: DEFAULT_SELECTOR.to_string(),
            retry_ms: DEFAULT_RETRY_MS,
            title: "Glypho".to_string(),
            highlight: HookConfig::default(),
            typeset: HookConfig::default(),
            math: TypesetOptions::default(),
            assets: AssetConfig::default(),
        }
    }
}

/// External post-processing command; the mirror file path is appended
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    pub command: Option<Vec<String>>,
}

/// Script and stylesheet locations written into the mirror page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub prism_js: String,
    pub prism_css: String,
    pub mathjax_js: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            prism_js: "https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/prism.min.js"
                .to_string(),
            prism_css: "https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/themes/prism.min.css"
                .to_string(),
            mathjax_js: "https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js".to_string(),
        }
    }
}

impl LiveConfig {
    /// Load a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GlyphoError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: LiveConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.selector.trim().is_empty() {
            return Err(GlyphoError::Config("selector must not be empty".to_string()));
        }
        if self.output.trim().is_empty() {
            return Err(GlyphoError::Config("output must not be empty".to_string()));
        }
        for (name, hook) in [("highlight", &self.highlight), ("typeset", &self.typeset)] {
            if matches!(&hook.command, Some(argv) if argv.is_empty()) {
                return Err(GlyphoError::Config(format!(
                    "{}.command must name a program",
                    name
                )));
            }
        }
        self.math.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Delimiter;

    #[test]
    fn test_empty_file_is_default() {
        let config = LiveConfig::from_toml("").unwrap();
        assert_eq!(config, LiveConfig::default());
    }

    #[test]
    fn test_parse_full() {
        let config = LiveConfig::from_toml(
            r#"
            server = "http://127.0.0.1:4000/"
            output = "~/out.html"
            retry_ms = 500

            [highlight]
            command = ["prism-cli", "--in-place"]

            [math]
            inline_math = [{ open = "$", close = "$" }]
            "#,
        )
        .unwrap();

        assert_eq!(config.server, "http://127.0.0.1:4000/");
        assert_eq!(config.output, "~/out.html");
        assert_eq!(config.retry_ms, 500);
        assert_eq!(config.selector, DEFAULT_SELECTOR);
        assert_eq!(
            config.highlight.command,
            Some(vec!["prism-cli".to_string(), "--in-place".to_string()])
        );
        assert_eq!(config.typeset.command, None);
        assert_eq!(config.math.inline_math, vec![Delimiter::new("$", "$")]);
    }

    #[test]
    fn test_rejects_empty_command() {
        let err = LiveConfig::from_toml("[typeset]\ncommand = []").unwrap_err();
        assert!(matches!(err, GlyphoError::Config(_)));
    }

    #[test]
    fn test_rejects_bad_toml() {
        let err = LiveConfig::from_toml("retry_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, GlyphoError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = LiveConfig::from_file("/nonexistent/glypho.toml").unwrap_err();
        assert!(matches!(err, GlyphoError::Config(_)));
    }
}
