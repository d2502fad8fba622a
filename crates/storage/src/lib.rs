pub mod error;
pub mod file;
pub mod history;
pub mod memory;
pub mod types;

pub use error::{StorageError, StorageResult};
pub use file::JsonFileStore;
pub use history::HistoryRepository;
pub use memory::MemoryStore;
pub use types::{CORRUPT_HISTORY_KEY, HISTORY_KEY, Message, Sender};

/// String key-value persistence surface, shaped after browser local storage.
///
/// Every call is synchronous so a write issued after a UI action is committed
/// before the next action runs.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

impl<T> KeyValueStore for std::sync::Arc<T>
where
    T: KeyValueStore + ?Sized,
{
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }
}
