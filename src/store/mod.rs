pub mod kv;
pub mod progress;
pub mod schema;

pub use kv::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use progress::{ProgressStore, RecordedCompletion};
