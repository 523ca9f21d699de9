//! Drives a page updater from a live client
//!
//! The initial fetch and the push channel start together. Their results are
//! handled one at a time on the calling task, so the updater never sees two
//! events at once.

use std::future::Future;

use futures::StreamExt;

use super::{Container, Highlighter, PageUpdater, Typesetter, UpdaterStats};
use crate::error::Result;
use crate::realtime::LiveClient;

/// Run until the push channel closes
pub async fn run<C, H, T>(
    updater: &mut PageUpdater<C, H, T>,
    client: &LiveClient,
) -> Result<UpdaterStats>
where
    C: Container,
    H: Highlighter<C>,
    T: Typesetter<C>,
{
    run_until(updater, client, std::future::pending()).await
}

/// Run until the push channel closes or `shutdown` completes.
///
/// A failed initial fetch is logged and leaves the container as it was; the
/// push channel keeps running. When the push channel ends first, the initial
/// fetch is still awaited and applied. A terminal push channel failure is
/// returned after that.
pub async fn run_until<C, H, T, F>(
    updater: &mut PageUpdater<C, H, T>,
    client: &LiveClient,
    shutdown: F,
) -> Result<UpdaterStats>
where
    C: Container,
    H: Highlighter<C>,
    T: Typesetter<C>,
    F: Future<Output = ()>,
{
    let initial = client.fetch_initial();
    tokio::pin!(initial);
    tokio::pin!(shutdown);
    let mut initial_pending = true;

    let mut channel = client.subscribe();
    let mut channel_open = true;
    let mut channel_error = None;

    while initial_pending || channel_open {
        tokio::select! {
            result = &mut initial, if initial_pending => {
                initial_pending = false;
                apply_initial(updater, client, result);
            }
            item = channel.next(), if channel_open => match item {
                Some(Ok(event)) => {
                    if let Err(e) = updater.handle_message(&event) {
                        tracing::error!("Cannot apply update: {}", e);
                    }
                }
                Some(Err(e)) => {
                    channel_open = false;
                    channel_error = Some(e);
                }
                None => channel_open = false,
            },
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                return Ok(updater.stats());
            }
        }
    }

    match channel_error {
        Some(e) => Err(e),
        None => Ok(updater.stats()),
    }
}

fn apply_initial<C, H, T>(
    updater: &mut PageUpdater<C, H, T>,
    client: &LiveClient,
    result: Result<String>,
) where
    C: Container,
    H: Highlighter<C>,
    T: Typesetter<C>,
{
    match result {
        Ok(body) => {
            if let Err(e) = updater.load_initial(body) {
                tracing::error!("Cannot render initial content: {}", e);
            }
        }
        Err(e) => {
            tracing::error!(
                "Initial fetch from {} failed: {}",
                client.endpoints().init,
                e
            );
        }
    }
}

/// Fetch and render the initial content only
pub async fn load_once<C, H, T>(
    updater: &mut PageUpdater<C, H, T>,
    client: &LiveClient,
) -> Result<UpdaterStats>
where
    C: Container,
    H: Highlighter<C>,
    T: Typesetter<C>,
{
    let body = client.fetch_initial().await?;
    updater.load_initial(body)?;
    Ok(updater.stats())
}
