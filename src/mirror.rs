//! On-disk mirror of the live page
//!
//! [`HtmlFileContainer`] keeps a standalone HTML page in sync with the
//! container content. The page loads Prism and MathJax itself, so opening it
//! in a browser gives the same rendering as the served page.
//! [`CommandHook`] runs an optional external post-processing command on the
//! page after each replacement.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::AssetConfig;
use crate::error::{GlyphoError, Result};
use crate::types::TypesetOptions;
use crate::updater::{Container, Highlighter, Typesetter};

/// Static parts of the mirror page
#[derive(Debug, Clone)]
pub struct PageTemplate {
    pub title: String,
    pub assets: AssetConfig,
    pub math: TypesetOptions,
}

impl Default for PageTemplate {
    fn default() -> Self {
        Self {
            title: "Glypho".to_string(),
            assets: AssetConfig::default(),
            math: TypesetOptions::default(),
        }
    }
}

impl PageTemplate {
    /// Render the full page around `content`.
    ///
    /// The container is always `article#markdown`, the element the Glypho
    /// page uses. A configured selector only decides which element patches
    /// are applied, not where the content lands in the mirror.
    pub fn render(&self, content: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{title}</title>
    <link rel="stylesheet" href="{prism_css}">
    <script>window.MathJax = {mathjax};</script>
    <script src="{prism_js}"></script>
    <script id="MathJax-script" async src="{mathjax_js}"></script>
  </head>
  <body>
    <article id="markdown">{content}</article>
  </body>
</html>
"#,
            title = escape_html(&self.title),
            prism_css = escape_html(&self.assets.prism_css),
            prism_js = escape_html(&self.assets.prism_js),
            mathjax_js = escape_html(&self.assets.mathjax_js),
            mathjax = script_safe_json(&self.math.mathjax_config()),
            content = content,
        )
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON that cannot close the surrounding `<script>` element
fn script_safe_json(value: &serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}

/// Container backed by a standalone HTML file
#[derive(Debug)]
pub struct HtmlFileContainer {
    path: PathBuf,
    template: PageTemplate,
    content: String,
}

impl HtmlFileContainer {
    /// Create the mirror file with an empty container
    pub fn create(path: impl Into<PathBuf>, template: PageTemplate) -> Result<Self> {
        let container = Self {
            path: path.into(),
            template,
            content: String::new(),
        };
        container.write_page()?;
        Ok(container)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_page(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        // Readers never see a half-written page
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(self.template.render(&self.content).as_bytes())?;
        tmp.persist(&self.path).map_err(|e| GlyphoError::Io(e.error))?;

        tracing::trace!("Wrote {}", self.path.display());
        Ok(())
    }
}

impl Container for HtmlFileContainer {
    fn replace_content(&mut self, html: &str) -> Result<()> {
        self.content = html.to_string();
        self.write_page()
    }

    fn content(&self) -> String {
        self.content.clone()
    }
}

/// Post-processing step that runs an external command on the mirror file.
///
/// Without a command the step only logs; the page's own scripts still
/// highlight and typeset when it is opened.
#[derive(Debug, Clone)]
pub struct CommandHook {
    name: &'static str,
    command: Option<Vec<String>>,
    runs: u64,
}

impl CommandHook {
    pub fn new(name: &'static str, command: Option<Vec<String>>) -> Self {
        Self {
            name,
            command,
            runs: 0,
        }
    }

    /// Number of times the step was invoked
    pub fn runs(&self) -> u64 {
        self.runs
    }

    fn invoke(&mut self, target: &Path) -> Result<()> {
        self.runs += 1;

        let argv = match &self.command {
            Some(argv) => argv,
            None => {
                tracing::trace!("No {} command configured", self.name);
                return Ok(());
            }
        };
        let (program, args) = argv.split_first().ok_or_else(|| {
            GlyphoError::Config(format!("{} command must name a program", self.name))
        })?;

        tracing::debug!("Running {} command: {}", self.name, argv.join(" "));
        let output = Command::new(program)
            .args(args)
            .arg(target)
            .output()
            .map_err(|e| GlyphoError::Hook {
                command: argv.join(" "),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(GlyphoError::Hook {
                command: argv.join(" "),
                message: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(())
    }
}

impl Highlighter<HtmlFileContainer> for CommandHook {
    fn highlight_all_under(&mut self, container: &HtmlFileContainer) -> Result<()> {
        self.invoke(container.path())
    }
}

impl Typesetter<HtmlFileContainer> for CommandHook {
    fn typeset(&mut self, container: &HtmlFileContainer) -> Result<()> {
        self.invoke(container.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::{SseEvent, PATCH_ELEMENTS_EVENT};
    use crate::updater::PageUpdater;
    use tempfile::TempDir;

    #[test]
    fn test_template_contains_content_and_config() {
        let page = PageTemplate::default().render("<p>$x^2$</p>");
        assert!(page.contains(r#"<article id="markdown"><p>$x^2$</p></article>"#));
        assert!(page.contains(r#"window.MathJax = {"tex":{"inlineMath":[["$","$"],["\\(","\\)"]]}};"#));
        assert!(page.contains("prism.min.js"));
    }

    #[test]
    fn test_template_escapes_title() {
        let template = PageTemplate {
            title: "<notes> & \"drafts\"".to_string(),
            ..PageTemplate::default()
        };
        let page = template.render("");
        assert!(page.contains("<title>&lt;notes&gt; &amp; &quot;drafts&quot;</title>"));
    }

    #[test]
    fn test_script_safe_json() {
        let value = serde_json::json!({ "x": "</script>" });
        assert_eq!(script_safe_json(&value), r#"{"x":"<\/script>"}"#);
    }

    #[test]
    fn test_file_container_writes_page() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("preview.html");

        let mut container = HtmlFileContainer::create(&path, PageTemplate::default()).unwrap();
        let page = fs::read_to_string(&path).unwrap();
        assert!(page.contains(r#"<article id="markdown"></article>"#));

        container.replace_content("<h1>Hi</h1>").unwrap();
        let page = fs::read_to_string(&path).unwrap();
        assert!(page.contains(r#"<article id="markdown"><h1>Hi</h1></article>"#));
        assert_eq!(container.content(), "<h1>Hi</h1>");
    }

    #[test]
    fn test_updater_with_mirror() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preview.html");

        let container = HtmlFileContainer::create(&path, PageTemplate::default()).unwrap();
        let mut updater = PageUpdater::new(
            container,
            CommandHook::new("highlight", None),
            CommandHook::new("typeset", None),
        );

        updater.load_initial("<p>one</p>").unwrap();
        updater.handle_payload("false").unwrap();

        let page = fs::read_to_string(&path).unwrap();
        assert!(page.contains("<p>one</p>"));
        assert_eq!(updater.highlighter().runs(), 1);
        assert_eq!(updater.typesetter().runs(), 1);
    }

    #[test]
    fn test_custom_selector_keeps_mirror_wrapper() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preview.html");

        let container = HtmlFileContainer::create(&path, PageTemplate::default()).unwrap();
        let mut updater = PageUpdater::new(
            container,
            CommandHook::new("highlight", None),
            CommandHook::new("typeset", None),
        )
        .with_selector("main");

        let patch = SseEvent::named(
            PATCH_ELEMENTS_EVENT,
            "selector main\nmode inner\nelements <p>patched</p>",
        );
        updater.handle_message(&patch).unwrap();

        let page = fs::read_to_string(&path).unwrap();
        assert!(page.contains(r#"<article id="markdown"><p>patched</p></article>"#));
        assert!(!page.contains("<main>"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_hook_runs_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preview.html");
        let container = HtmlFileContainer::create(&path, PageTemplate::default()).unwrap();

        let mut ok = CommandHook::new("highlight", Some(vec!["test".to_string(), "-f".to_string()]));
        assert!(ok.highlight_all_under(&container).is_ok());

        let mut failing = CommandHook::new("typeset", Some(vec!["false".to_string()]));
        let err = failing.typeset(&container).unwrap_err();
        assert!(matches!(err, GlyphoError::Hook { .. }));
    }

    #[test]
    fn test_command_hook_missing_program() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preview.html");
        let container = HtmlFileContainer::create(&path, PageTemplate::default()).unwrap();

        let mut hook = CommandHook::new(
            "highlight",
            Some(vec!["glypho-no-such-program-xyz".to_string()]),
        );
        assert!(matches!(
            hook.highlight_all_under(&container),
            Err(GlyphoError::Hook { .. })
        ));
    }
}
