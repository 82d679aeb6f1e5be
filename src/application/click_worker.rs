//! Background consumer for the click channel.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::application::services::ClickService;
use crate::domain::click_message::ClickMessage;

/// Drains the click channel until every sender is dropped.
///
/// Messages are processed one at a time in arrival order; ordering per link
/// matters because the one-time self-destruct must see its own click first.
/// [`ClickService::process`] never returns an error, so a poisoned message
/// can not wedge the loop.
pub async fn run_click_worker(mut rx: mpsc::Receiver<ClickMessage>, service: Arc<ClickService>) {
    info!("click worker started");

    while let Some(msg) = rx.recv().await {
        service.process(msg).await;
    }

    info!("click worker stopped, channel closed");
}
