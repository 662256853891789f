mod catalogue;
mod error;
mod index;
mod keywords;
mod page;
mod ports;
mod store;

pub use catalogue::Catalogue;
pub use error::{CatalogueError, Result};
pub use index::{normalize_keyword, KeywordIndex};
pub use keywords::{JsonKeywordFile, KeywordRecord, KeywordSource, SearchIntent};
pub use page::Page;
pub use ports::{AnalyticsEvent, AnalyticsSink, EventKind, IndexSubmitter, RankChecker};
pub use store::{state_dir_for_site_root, JsonDirStore, MemoryStore, StateStore};
