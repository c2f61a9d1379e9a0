pub mod paged;
pub mod source;
pub mod state;

pub use paged::PagedFetcher;
pub use source::{DiscoverSource, PageSource, RecordError, SearchSource, UsageRecorder};
pub use state::{FetchError, FetchState, FETCH_FAILED_MESSAGE};
