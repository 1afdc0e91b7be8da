//! Push-based text-frame connection with an explicit lifecycle.
//!
//! An [`EventStream`] is owned by whoever consumes it. The transport task
//! that feeds it is aborted when the stream is closed or dropped, so no
//! connection outlives its consumer.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub const STREAM_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl ConnectionState {
    pub fn on_open(self) -> Self {
        match self {
            ConnectionState::Connecting => ConnectionState::Open,
            other => other,
        }
    }

    /// `Closed` is reachable from every state and is terminal.
    pub fn on_close(self) -> Self {
        ConnectionState::Closed
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        }
    }
}

/// What a transport task reports to its stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    Opened,
    Frame(String),
    Closed { reason: Option<String> },
}

pub struct EventStream {
    name: String,
    state: ConnectionState,
    rx: mpsc::Receiver<StreamSignal>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl EventStream {
    /// Create a stream and the sender its transport writes into.
    pub fn channel(name: impl Into<String>) -> (mpsc::Sender<StreamSignal>, Self) {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let stream = Self {
            name: name.into(),
            state: ConnectionState::Connecting,
            rx,
            task: None,
        };
        (tx, stream)
    }

    /// Tie the transport task's lifetime to this stream.
    pub fn attach_task(&mut self, task: JoinHandle<()>) {
        if let Some(previous) = self.task.replace(task) {
            previous.abort();
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// Next queued frame without waiting. Lifecycle signals are applied on
    /// the way; returns `None` once the stream is closed.
    pub fn try_next(&mut self) -> Option<String> {
        while !self.is_closed() {
            match self.rx.try_recv() {
                Ok(signal) => {
                    if let Some(frame) = self.apply(signal) {
                        return Some(frame);
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => return None,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.mark_closed(Some("transport dropped"));
                }
            }
        }
        None
    }

    /// Wait for the next frame; `None` once the stream is closed.
    pub async fn next_frame(&mut self) -> Option<String> {
        while !self.is_closed() {
            match self.rx.recv().await {
                Some(signal) => {
                    if let Some(frame) = self.apply(signal) {
                        return Some(frame);
                    }
                }
                None => self.mark_closed(Some("transport dropped")),
            }
        }
        None
    }

    /// Explicit close: queued frames are discarded and the transport task
    /// is aborted.
    pub fn close(&mut self) {
        if !self.is_closed() {
            self.mark_closed(Some("closed by client"));
        }
        self.rx.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn apply(&mut self, signal: StreamSignal) -> Option<String> {
        match signal {
            StreamSignal::Opened => {
                self.state = self.state.on_open();
                info!(stream = %self.name, "stream open");
                None
            }
            StreamSignal::Frame(text) => {
                self.state = self.state.on_open();
                debug!(stream = %self.name, bytes = text.len(), "frame received");
                Some(text)
            }
            StreamSignal::Closed { reason } => {
                self.mark_closed(reason.as_deref());
                None
            }
        }
    }

    fn mark_closed(&mut self, reason: Option<&str>) {
        self.state = self.state.on_close();
        info!(
            stream = %self.name,
            reason = reason.unwrap_or("-"),
            "stream closed"
        );
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lifecycle_connecting_open_closed() {
        let (tx, mut stream) = EventStream::channel("chat");
        assert_eq!(stream.state(), ConnectionState::Connecting);

        tx.send(StreamSignal::Opened).await.unwrap();
        tx.send(StreamSignal::Frame("a".into())).await.unwrap();
        assert_eq!(stream.try_next().as_deref(), Some("a"));
        assert_eq!(stream.state(), ConnectionState::Open);

        tx.send(StreamSignal::Closed { reason: None }).await.unwrap();
        tx.send(StreamSignal::Frame("late".into())).await.unwrap();
        assert_eq!(stream.try_next(), None);
        assert_eq!(stream.state(), ConnectionState::Closed);
        assert_eq!(stream.try_next(), None);
    }

    #[tokio::test]
    async fn test_close_discards_queued_frames() {
        let (tx, mut stream) = EventStream::channel("chat");
        tx.send(StreamSignal::Frame("queued".into())).await.unwrap();
        stream.close();
        assert_eq!(stream.try_next(), None);
        assert!(stream.is_closed());
        assert!(tx.send(StreamSignal::Frame("x".into())).await.is_err());
    }

    #[tokio::test]
    async fn test_dropped_sender_closes_stream() {
        let (tx, mut stream) = EventStream::channel("chat");
        drop(tx);
        assert_eq!(stream.next_frame().await, None);
        assert_eq!(stream.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_close_aborts_transport_task() {
        let (_tx, mut stream) = EventStream::channel("camera");
        let task = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        });
        let probe = task.abort_handle();
        stream.attach_task(task);
        stream.close();
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(probe.is_finished());
    }

    #[test]
    fn test_closed_is_terminal() {
        let state = ConnectionState::Connecting.on_close();
        assert_eq!(state.on_open(), ConnectionState::Closed);
        assert_eq!(ConnectionState::Open.on_open(), ConnectionState::Open);
    }
}
