// Chunked NDJSON streaming of dashboard snapshots
use crate::domain::dashboard::DashboardView;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

/// Create a chunked response with one JSON document per line
pub fn ndjson_stream<S>(stream: S) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = DashboardView> + Send + 'static,
{
    let byte_stream = stream.map(|view| serialize_line(&view));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

fn serialize_line(view: &DashboardView) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(view)?;
    let mut chunk = BytesMut::with_capacity(json.len() + 1);
    chunk.put_slice(&json);
    chunk.put_u8(b'\n');
    Ok(chunk.freeze())
}

/// The current snapshot followed by every later change. A subscriber that
/// falls behind skips to the newest snapshots instead of failing.
pub fn snapshots(
    current: DashboardView,
    rx: broadcast::Receiver<DashboardView>,
) -> impl Stream<Item = DashboardView> + Send + 'static {
    let mut changes = BroadcastStream::new(rx);
    async_stream::stream! {
        let mut last_revision = current.revision;
        yield current;

        while let Some(change) = changes.next().await {
            match change {
                Ok(view) if view.revision > last_revision => {
                    last_revision = view.revision;
                    yield view;
                }
                Ok(_) => {}
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::debug!("Snapshot subscriber lagged by {} updates", skipped);
                }
            }
        }
    }
}

/// Helper to create a streaming response from a change subscription
pub fn stream_from_receiver(
    current: DashboardView,
    rx: broadcast::Receiver<DashboardView>,
) -> impl IntoResponse {
    match ndjson_stream(snapshots(current, rx)) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
