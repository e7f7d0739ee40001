//! Gallery command loop.
//!
//! Owns the [`GalleryViewModel`], runs page fetches as tasks and publishes
//! every state change. Fetches run concurrently with command handling so the
//! view-model's in-flight flag is what keeps loads single.

use crate::domain::gallery::{GalleryUiState, GalleryViewModel, PageRequest, PhotoItem, PhotoSource};
use crate::domain::models::GalleryCommand;
use crate::error::GalleryError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

type PageResult = (PageRequest, Result<Vec<PhotoItem>, GalleryError>);

pub async fn run_gallery_worker(
    source: Arc<dyn PhotoSource>,
    page_size: u32,
    mut commands: mpsc::UnboundedReceiver<GalleryCommand>,
    states: mpsc::UnboundedSender<GalleryUiState>,
) {
    let mut view_model = GalleryViewModel::new(page_size);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<PageResult>();

    loop {
        tokio::select! {
            cmd = commands.recv() => {
                let Some(cmd) = cmd else { break };
                let request = match cmd {
                    GalleryCommand::Refresh => {
                        let request = view_model.refresh();
                        if request.is_some() {
                            let _ = states.send(view_model.state().clone());
                        }
                        request
                    }
                    GalleryCommand::LoadNextPage => view_model.load_next_page(),
                };

                let Some(request) = request else {
                    debug!(?cmd, in_flight = view_model.is_loading(), "Gallery command ignored");
                    continue;
                };

                info!(page = request.page, append = request.append, "Loading photos");
                let source = source.clone();
                let done = done_tx.clone();
                let page_size = view_model.page_size();
                tokio::spawn(async move {
                    let result = source.fetch_page(request.page, page_size).await;
                    let _ = done.send((request, result));
                });
            }
            Some((request, result)) = done_rx.recv() => {
                if let Err(e) = &result {
                    warn!(page = request.page, "Loading photos failed: {}", e);
                }
                view_model.complete(request, result);
                let _ = states.send(view_model.state().clone());
            }
        }
    }

    info!("Gallery worker stopped");
}
