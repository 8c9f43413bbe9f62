use crate::coalescer::RenderCoalescer;
use crate::frames::{self, extract_complete_text};
use crate::gate::CancellationGate;
use askflow_core::StreamError;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::fmt::Display;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

/// How an ingestion run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Full text on normal completion, or the text last painted when
    /// the user stopped the stream.
    pub text: String,
    pub stopped: bool,
    /// A terminal frame was seen before the transport closed.
    pub terminated: bool,
}

/// Per-request stream state: undecoded bytes and the text so far.
///
/// Bytes are split on `\n` before decoding, so multi-byte characters
/// that straddle chunk boundaries survive.
#[derive(Debug, Default)]
pub struct StreamIngestor {
    buffer: Vec<u8>,
    text: String,
    malformed: usize,
}

enum Flow {
    Continue,
    Terminal,
}

impl StreamIngestor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text accumulated so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Frames skipped because they did not parse.
    #[must_use]
    pub const fn malformed_frames(&self) -> usize {
        self.malformed
    }

    /// Drive a chunk stream to completion, painting through `coalescer`.
    pub async fn ingest<S, B, E>(
        mut self,
        stream: S,
        coalescer: &mut RenderCoalescer<'_>,
        gate: &CancellationGate,
    ) -> Result<IngestOutcome, StreamError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        let mut stream = std::pin::pin!(stream);
        let mut terminated = false;

        loop {
            if gate.is_stopped() {
                return Ok(Self::stopped(coalescer));
            }
            let deadline = coalescer.deadline();

            let item = tokio::select! {
                biased;
                () = gate.aborted() => return Ok(Self::stopped(coalescer)),
                () = wait_until(deadline) => {
                    coalescer.flush_due();
                    continue;
                }
                item = stream.next() => item,
            };

            match item {
                Some(Ok(chunk)) => {
                    if matches!(self.push(chunk.as_ref(), coalescer, gate), Flow::Terminal) {
                        terminated = true;
                        break;
                    }
                }
                Some(Err(e)) => {
                    if gate.is_stopped() {
                        return Ok(Self::stopped(coalescer));
                    }
                    warn!("stream read failed: {e}");
                    return Err(StreamError::Transport(e.to_string()));
                }
                None => {
                    if !self.buffer.is_empty() {
                        let tail = std::mem::take(&mut self.buffer);
                        terminated = matches!(self.consume_line(&tail), Flow::Terminal);
                        coalescer.schedule(&self.text);
                    }
                    break;
                }
            }
        }

        if gate.is_stopped() {
            return Ok(Self::stopped(coalescer));
        }
        coalescer.finish(&self.text);
        debug!(
            len = self.text.len(),
            malformed = self.malformed,
            terminated,
            "stream complete"
        );
        Ok(IngestOutcome {
            text: self.text,
            stopped: false,
            terminated,
        })
    }

    /// Render a non-streaming response body in one go.
    pub fn ingest_complete(
        value: &Value,
        coalescer: &mut RenderCoalescer<'_>,
        gate: &CancellationGate,
    ) -> IngestOutcome {
        if gate.is_stopped() {
            return Self::stopped(coalescer);
        }
        let text = extract_complete_text(value);
        coalescer.finish(&text);
        IngestOutcome {
            text,
            stopped: false,
            terminated: true,
        }
    }

    fn push(
        &mut self,
        chunk: &[u8],
        coalescer: &mut RenderCoalescer<'_>,
        gate: &CancellationGate,
    ) -> Flow {
        self.buffer.extend_from_slice(chunk);
        let before = self.text.len();
        let mut flow = Flow::Continue;

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            if gate.is_stopped() {
                break;
            }
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if matches!(self.consume_line(&line[..pos]), Flow::Terminal) {
                flow = Flow::Terminal;
                break;
            }
        }

        if self.text.len() != before {
            coalescer.schedule(&self.text);
        }
        flow
    }

    fn consume_line(&mut self, line: &[u8]) -> Flow {
        let line = String::from_utf8_lossy(line);
        match frames::parse_line(&line) {
            Ok(frame) => {
                if let Some(delta) = frame.delta {
                    self.text.push_str(&delta);
                }
                if frame.terminal {
                    Flow::Terminal
                } else {
                    Flow::Continue
                }
            }
            Err(e) => {
                self.malformed += 1;
                warn!("skipping frame: {e}");
                Flow::Continue
            }
        }
    }

    fn stopped(coalescer: &RenderCoalescer<'_>) -> IngestOutcome {
        debug!("stream stopped by user");
        IngestOutcome {
            text: coalescer.rendered_text().unwrap_or_default().to_string(),
            stopped: true,
            terminated: false,
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
