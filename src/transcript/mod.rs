pub mod store;

pub use store::{TranscriptSegment, TranscriptStore};
