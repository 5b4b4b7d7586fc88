//! Reactive render binding: diagram source changes in, render outcomes out.
//!
//! [`render_stream`] turns the store's diagram channel into a `Stream` of
//! [`RenderedFrame`]s. The first item is the current value (the empty source
//! on a fresh store, which renders the placeholder); after that an item is
//! produced for each committed change.
//!
//! The underlying `watch` channel keeps only the latest value. If several
//! submissions commit while a render is running, the stream skips straight
//! to the newest source; intermediate sources are never drawn.
//!
//! Renders run one at a time and in order, so frames never arrive out of
//! sequence.

use crate::pipeline::render::{DiagramRenderer, RenderOutcome};
use crate::store::UiStore;
use futures::stream::StreamExt;
use serde::Serialize;
use std::pin::Pin;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::Stream;
use tracing::debug;

/// One render of one diagram source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedFrame {
    /// The source that was rendered.
    pub source: String,
    pub outcome: RenderOutcome,
}

/// A boxed stream of render frames.
pub type RenderStream = Pin<Box<dyn Stream<Item = RenderedFrame> + Send>>;

/// Subscribe to `store`'s diagram source and render every value it takes.
///
/// The stream ends when the store is dropped.
pub fn render_stream(store: &UiStore, renderer: DiagramRenderer) -> RenderStream {
    let sources = WatchStream::new(store.subscribe_diagram());
    let s = sources.then(move |source| {
        let renderer = renderer.clone();
        async move {
            debug!("Diagram source changed ({} bytes); rendering", source.len());
            let outcome = renderer.render(&source).await;
            RenderedFrame { source, outcome }
        }
    });
    Box::pin(s)
}
