//! Glypho live mirror
//!
//! Follows a Glypho server's live preview and keeps a standalone HTML copy of
//! the page on disk.
//!
//! Run with: glypho-live --server http://localhost:3030 --output preview.html
//! Set GLYPHO=debug for verbose logs.

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use glypho::config::LiveConfig;
use glypho::mirror::{CommandHook, HtmlFileContainer, PageTemplate};
use glypho::realtime::LiveClient;
use glypho::updater::{self, PageUpdater};

#[derive(Parser, Debug)]
#[command(name = "glypho-live")]
#[command(about = "Mirror a Glypho live preview into a local HTML file")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "GLYPHO_CONFIG")]
    config: Option<String>,

    /// Address of the Glypho server
    #[arg(short, long, env = "GLYPHO_SERVER")]
    server: Option<String>,

    /// Mirror file to keep up to date
    #[arg(short, long, env = "GLYPHO_OUTPUT")]
    output: Option<String>,

    /// Selector of the container in element patches
    #[arg(long)]
    selector: Option<String>,

    /// Fetch the initial content and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<(LiveConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => {
                let path = shellexpand::tilde(path).to_string();
                LiveConfig::from_file(&path).with_context(|| format!("loading {}", path))?
            }
            None => LiveConfig::default(),
        };

        if let Some(server) = self.server {
            config.server = server;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(selector) = self.selector {
            config.selector = selector;
        }
        config.validate()?;

        Ok((config, self.once))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger();

    let (config, once) = Args::parse().into_config()?;
    let output = PathBuf::from(shellexpand::tilde(&config.output).to_string());

    let client = LiveClient::from_base(&config.server)?.with_retry_ms(config.retry_ms);

    let template = PageTemplate {
        title: config.title.clone(),
        assets: config.assets.clone(),
        math: config.math.clone(),
    };
    let container = HtmlFileContainer::create(&output, template)
        .with_context(|| format!("creating {}", output.display()))?;

    let mut page = PageUpdater::new(
        container,
        CommandHook::new("highlight", config.highlight.command.clone()),
        CommandHook::new("typeset", config.typeset.command.clone()),
    )
    .with_selector(config.selector.clone());

    tracing::info!(
        "Mirroring {} into {}",
        client.endpoints().init,
        output.display()
    );

    let stats = if once {
        updater::load_once(&mut page, &client).await?
    } else {
        tracing::info!("Press Ctrl+C to stop");
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Cannot listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        updater::run_until(&mut page, &client, shutdown).await?
    };

    tracing::info!(
        "Done: {} update(s) applied, {} sentinel(s) skipped",
        stats.updates_applied + stats.initial_loads,
        stats.sentinels_skipped
    );

    Ok(())
}

/// Log to stderr; `GLYPHO=debug` adds file, line and target
fn logger() {
    let log_level = env::var("GLYPHO").unwrap_or_else(|_| "info".into());
    let is_debug = log_level == "debug" || log_level == "trace";

    let filter = EnvFilter::try_new(format!("glypho={},glypho_live={}", log_level, log_level))
        .unwrap_or_else(|_| EnvFilter::new("glypho=info,glypho_live=info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_file(is_debug)
                .with_line_number(is_debug)
                .with_target(is_debug),
        )
        .with(filter)
        .init();
}
