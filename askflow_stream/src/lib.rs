#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Incremental ingestion of streamed answers.
//!
//! [`StreamIngestor`] turns raw response chunks into accumulated text,
//! [`RenderCoalescer`] decides when that text is formatted and painted,
//! and [`CancellationGate`] lets the user stop both at any point.

pub mod coalescer;
pub mod frames;
pub mod gate;
mod ingest;

pub use coalescer::{ContentTarget, DEFAULT_RENDER_INTERVAL, RenderCoalescer};
pub use frames::{FrameParseError, extract_complete_text};
pub use gate::CancellationGate;
pub use ingest::{IngestOutcome, StreamIngestor};
