//! Stream Ingest - turns inbound frames into transcript events.

use tracing::warn;

use crate::{ChatEvent, EventStream, InboundPayload, IngestError, Transcript, final_code};

/// Receives the display URL of a final result (the last attached media of
/// an event carrying a `final_code` segment).
pub trait ResultViewer {
    fn show_result(&mut self, url: &str);
}

impl<F> ResultViewer for F
where
    F: FnMut(&str),
{
    fn show_result(&mut self, url: &str) {
        self(url)
    }
}

/// Viewer that ignores results.
pub struct NoResultViewer;

impl ResultViewer for NoResultViewer {
    fn show_result(&mut self, _url: &str) {}
}

/// Parse one frame, notify the viewer when it carries a final result and
/// append it. Returns whether a result was announced.
pub fn ingest_frame(
    raw: &str,
    transcript: &mut Transcript,
    viewer: &mut dyn ResultViewer,
) -> Result<bool, IngestError> {
    let event = InboundPayload::parse(raw)?.into_event();
    let announced = notify_final_result(&event, viewer);
    transcript.append(event);
    Ok(announced)
}

/// Fire the viewer for the last media item when `final_code` is present.
pub fn notify_final_result(event: &ChatEvent, viewer: &mut dyn ResultViewer) -> bool {
    if final_code(&event.content).is_none() {
        return false;
    }
    match event.media.last() {
        Some(media) => {
            viewer.show_result(&media.file_url);
            true
        }
        None => false,
    }
}

/// Owns the chat event stream and feeds it into a transcript.
#[derive(Debug)]
pub struct StreamIngest {
    stream: EventStream,
    accepted: usize,
    rejected: usize,
}

impl StreamIngest {
    pub fn new(stream: EventStream) -> Self {
        Self {
            stream,
            accepted: 0,
            rejected: 0,
        }
    }

    pub fn stream(&self) -> &EventStream {
        &self.stream
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Drain every frame available right now. Returns how many events were
    /// appended. Nothing is ingested once the stream is closed.
    pub fn pump(&mut self, transcript: &mut Transcript, viewer: &mut dyn ResultViewer) -> usize {
        let mut appended = 0;
        while let Some(frame) = self.stream.try_next() {
            if self.accept(&frame, transcript, viewer) {
                appended += 1;
            }
        }
        appended
    }

    /// Wait for the next frame and ingest it. `Err(StreamClosed)` once the
    /// stream has ended.
    pub async fn next(
        &mut self,
        transcript: &mut Transcript,
        viewer: &mut dyn ResultViewer,
    ) -> Result<bool, IngestError> {
        match self.stream.next_frame().await {
            Some(frame) => Ok(self.accept(&frame, transcript, viewer)),
            None => Err(IngestError::StreamClosed),
        }
    }

    pub fn close(&mut self) {
        self.stream.close();
    }

    fn accept(
        &mut self,
        frame: &str,
        transcript: &mut Transcript,
        viewer: &mut dyn ResultViewer,
    ) -> bool {
        match ingest_frame(frame, transcript, viewer) {
            Ok(_) => {
                self.accepted += 1;
                true
            }
            Err(e) => {
                self.rejected += 1;
                warn!(stream = %self.stream.name(), error = %e, "dropping inbound frame");
                false
            }
        }
    }
}
