//! Public web sources the duck consults when it has no learned answer.

pub mod format;
pub mod search;

pub use search::{WebSearchConfig, WebSearchEngine};
