//! Renderers turning machine events into training-file text.

pub mod bracketed;
pub mod tabular;

pub use bracketed::{BracketedEmitter, decode_line};
pub use tabular::{TabularEmitter, TabularMode};

use crate::machine::EventSink;

/// An event sink that accumulates one document's training output.
///
/// Output is held in memory until [`Emitter::finish`] so a document that
/// fails halfway never leaves a partial file behind.
pub trait Emitter: EventSink {
    /// Whether the document has been closed by a section end.
    fn is_done(&self) -> bool;

    /// Consume the emitter and return the rendered document.
    fn finish(self) -> String;
}
