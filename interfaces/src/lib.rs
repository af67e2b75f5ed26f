pub mod defs;

pub use defs::{FeedItem, LiveSourceSpec, ScoredArticle};
