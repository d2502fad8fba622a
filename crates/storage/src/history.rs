use snafu::ResultExt;

use super::KeyValueStore;
use super::error::{CorruptHistorySnafu, SerializeHistorySnafu, StorageResult};
use super::types::{CORRUPT_HISTORY_KEY, HISTORY_KEY, Message};

/// Reads and writes the conversation as a JSON array under [`HISTORY_KEY`].
///
/// The stored layout is `[{"text", "sender", "timestamp"}, ...]` in
/// chronological order with no version field.
#[derive(Debug, Clone)]
pub struct HistoryRepository<S> {
    store: S,
}

impl<S> HistoryRepository<S>
where
    S: KeyValueStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns `Ok(None)` when nothing (or an empty string) is stored and
    /// `CorruptHistory` when the stored value does not decode into a message
    /// list.
    pub fn load(&self) -> StorageResult<Option<Vec<Message>>> {
        let Some(raw) = self.stored_raw()? else {
            return Ok(None);
        };

        let messages = serde_json::from_str::<Vec<Message>>(&raw).context(CorruptHistorySnafu {
            stage: "history-load-decode",
            key: HISTORY_KEY,
        })?;
        Ok(Some(messages))
    }

    /// Writes the full list, skipping messages without visible text.
    /// Returns the number of messages written.
    pub fn save(&self, messages: &[Message]) -> StorageResult<usize> {
        let kept = messages
            .iter()
            .filter(|message| !message.is_blank())
            .collect::<Vec<_>>();

        let serialized = serde_json::to_string(&kept).context(SerializeHistorySnafu {
            stage: "history-save-encode",
        })?;
        self.store.set_item(HISTORY_KEY, &serialized)?;
        Ok(kept.len())
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.store.remove_item(HISTORY_KEY)
    }

    /// Moves the raw stored history to [`CORRUPT_HISTORY_KEY`] so a repair
    /// write cannot destroy it. Returns the number of bytes preserved, or
    /// `None` when nothing was stored.
    pub fn quarantine_corrupt(&self) -> StorageResult<Option<usize>> {
        let Some(raw) = self.stored_raw()? else {
            return Ok(None);
        };

        self.store.set_item(CORRUPT_HISTORY_KEY, &raw)?;
        self.store.remove_item(HISTORY_KEY)?;
        tracing::debug!(bytes = raw.len(), "corrupt history moved aside");
        Ok(Some(raw.len()))
    }

    fn stored_raw(&self) -> StorageResult<Option<String>> {
        Ok(self
            .store
            .get_item(HISTORY_KEY)?
            .filter(|raw| !raw.is_empty()))
    }

    /// Stored history, or an empty list when it is missing or unreadable.
    pub fn read_lenient(&self) -> Vec<Message> {
        match self.load() {
            Ok(messages) => messages.unwrap_or_default(),
            Err(error) => {
                tracing::debug!(error = %error, "stored history unreadable; returning empty list");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::memory::MemoryStore;
    use crate::types::Sender;

    #[test]
    fn saved_history_reloads_in_order() {
        let repository = HistoryRepository::new(MemoryStore::new());
        let history = vec![
            Message::user("Hi", "10:00"),
            Message::bot("Hello! How can I help?", "10:01"),
        ];

        assert_eq!(repository.save(&history).unwrap(), 2);
        assert_eq!(repository.load().unwrap(), Some(history));
    }

    #[test]
    fn stored_layout_matches_wire_format() {
        let store = MemoryStore::new();
        let repository = HistoryRepository::new(store.clone());
        repository.save(&[Message::user("Hi", "10:00")]).unwrap();

        let raw = store.get_item(HISTORY_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"[{"text":"Hi","sender":"user","timestamp":"10:00"}]"#);
    }

    #[test]
    fn blank_messages_are_not_written() {
        let repository = HistoryRepository::new(MemoryStore::new());
        let written = repository
            .save(&[
                Message::bot("", "09:00"),
                Message::user("paint for a bathroom?", "09:01"),
                Message::bot("  ", "09:02"),
            ])
            .unwrap();

        assert_eq!(written, 1);
        let loaded = repository.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].sender, Sender::User);
    }

    #[test]
    fn absent_history_loads_as_none() {
        let repository = HistoryRepository::new(MemoryStore::new());
        assert_eq!(repository.load().unwrap(), None);
        assert!(repository.read_lenient().is_empty());
    }

    #[test]
    fn corrupt_history_is_reported_and_can_be_quarantined() {
        let store = MemoryStore::new();
        store.set_item(HISTORY_KEY, "{not a list").unwrap();
        let repository = HistoryRepository::new(store.clone());

        let error = repository.load().unwrap_err();
        assert!(matches!(error, StorageError::CorruptHistory { .. }));
        assert!(repository.read_lenient().is_empty());

        assert_eq!(repository.quarantine_corrupt().unwrap(), Some(11));
        assert_eq!(
            store.get_item(CORRUPT_HISTORY_KEY).unwrap().as_deref(),
            Some("{not a list")
        );
        assert_eq!(store.get_item(HISTORY_KEY).unwrap(), None);
        assert_eq!(repository.load().unwrap(), None);
    }

    #[test]
    fn empty_stored_value_counts_as_absent() {
        let store = MemoryStore::new();
        store.set_item(HISTORY_KEY, "").unwrap();
        let repository = HistoryRepository::new(store.clone());

        assert_eq!(repository.load().unwrap(), None);
        assert_eq!(repository.quarantine_corrupt().unwrap(), None);
        assert_eq!(store.get_item(CORRUPT_HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn clear_removes_the_key() {
        let store = MemoryStore::new();
        let repository = HistoryRepository::new(store.clone());
        repository.save(&[Message::user("A", "10:00")]).unwrap();

        repository.clear().unwrap();
        assert_eq!(store.get_item(HISTORY_KEY).unwrap(), None);
    }
}
