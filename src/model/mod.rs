//! Data model shared by the reconciliation engine, the database and the
//! provider layer.

pub mod chapter;
pub mod list;
pub mod manga;
pub mod progress;
pub mod scraper;
pub mod title;

pub use chapter::Chapter;
pub use list::List;
pub use list::ListEntry;
pub use manga::MangaCacheEntry;
pub use manga::MangaData;
pub use manga::MangaMeta;
pub use progress::NotifiedSet;
pub use progress::Progress;
pub use progress::ProgressObservation;
pub use progress::TitleReading;
pub use scraper::ScraperData;
pub use scraper::ScraperError;
pub use scraper::ScraperResponse;
pub use title::TitleRecord;
