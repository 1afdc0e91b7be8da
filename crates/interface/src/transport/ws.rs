use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, info, warn};
use vchat_core::{EventStream, StreamSignal};

use super::TransportError;

/// Open a websocket and return the stream that owns it. Text frames are
/// forwarded as-is; the socket task is aborted when the stream is closed
/// or dropped.
pub fn open_ws_stream(name: &str, url: String) -> EventStream {
    let (tx, mut stream) = EventStream::channel(name);
    let task_name = name.to_string();
    let task = tokio::spawn(async move {
        let reason = match pump_socket(&task_name, &url, &tx).await {
            Ok(()) => None,
            Err(e) => {
                warn!(stream = %task_name, url = %url, error = %e, "websocket failed");
                Some(e.to_string())
            }
        };
        let _ = tx.send(StreamSignal::Closed { reason }).await;
    });
    stream.attach_task(task);
    stream
}

async fn pump_socket(
    name: &str,
    url: &str,
    tx: &mpsc::Sender<StreamSignal>,
) -> Result<(), TransportError> {
    let (socket, _) = connect_async(url).await?;
    info!(stream = %name, url = %url, "websocket connected");
    if tx.send(StreamSignal::Opened).await.is_err() {
        return Ok(());
    }

    let (mut sink, mut source) = socket.split();
    while let Some(message) = source.next().await {
        match message? {
            WsMessage::Text(text) => {
                if tx.send(StreamSignal::Frame(text)).await.is_err() {
                    // Consumer gone.
                    break;
                }
            }
            WsMessage::Ping(data) => {
                let _ = sink.send(WsMessage::Pong(data)).await;
            }
            WsMessage::Close(frame) => {
                debug!(stream = %name, frame = ?frame, "close frame received");
                break;
            }
            other => {
                debug!(stream = %name, kind = ?other, "ignoring non-text frame");
            }
        }
    }
    Ok(())
}
