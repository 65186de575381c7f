//! Text helpers shared by the orchestrator and backends

mod selection;
mod sentences;

pub use selection::select_response;
pub use sentences::{collapse_whitespace, ends_sentence, split_sentences};
