use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::history::{MandalaRecord, NewRecord, SessionHistory};

/// All live session histories, keyed by the id stored in each session
/// cookie. The write lock serializes appends, which keeps each history's
/// newest-first ordering intact even under overlapping submits.
pub(crate) struct HistoryRegistry {
    idle_limit: Duration,
    entries: RwLock<HashMap<Uuid, Entry>>,
}

struct Entry {
    history: SessionHistory,
    last_touched: DateTime<Utc>,
}

impl HistoryRegistry {
    pub(crate) fn new(idle_limit: Duration) -> Self {
        Self {
            idle_limit,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Appends a record to the session's history, creating the history on
    /// first use. Histories idle past the session window are dropped here,
    /// so the registry never outgrows the set of live sessions.
    pub(crate) async fn append(&self, session_id: Uuid, record: NewRecord) -> Uuid {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| now - entry.last_touched <= self.idle_limit);
        let entry = entries.entry(session_id).or_insert_with(|| Entry {
            history: SessionHistory::new(),
            last_touched: now,
        });
        entry.last_touched = now;
        entry.history.append(record).id
    }

    /// Runs `f` against the session's history, or against an empty one if
    /// the session has not generated anything yet.
    pub(crate) async fn with_history<T>(
        &self,
        session_id: Uuid,
        f: impl FnOnce(&SessionHistory) -> T,
    ) -> T {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&session_id) {
            Some(entry) => {
                entry.last_touched = Utc::now();
                f(&entry.history)
            }
            None => f(&SessionHistory::new()),
        }
    }

    pub(crate) async fn find_record(
        &self,
        session_id: Uuid,
        record_id: Uuid,
    ) -> Option<MandalaRecord> {
        self.with_history(session_id, |history| history.find(record_id).cloned())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ImageRef;
    use url::Url;

    fn record(mood: &str) -> NewRecord {
        NewRecord {
            age: 30,
            mood: mood.to_string(),
            caption: "caption".to_string(),
            prompt: "prompt".to_string(),
            image: ImageRef::Url(Url::parse("https://img.example.org/m.png").expect("test url")),
        }
    }

    #[tokio::test]
    async fn sessions_do_not_share_history() {
        let registry = HistoryRegistry::new(Duration::minutes(60));
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        registry.append(first, record("calm")).await;

        let first_count = registry.with_history(first, |h| h.count()).await;
        let second_count = registry.with_history(second, |h| h.count()).await;
        assert_eq!(first_count, 1);
        assert_eq!(second_count, 0);
    }

    #[tokio::test]
    async fn appends_accumulate_newest_first() {
        let registry = HistoryRegistry::new(Duration::minutes(60));
        let session = Uuid::new_v4();

        registry.append(session, record("curious")).await;
        let latest_id = registry.append(session, record("tired")).await;

        let (count, first_mood) = registry
            .with_history(session, |h| (h.count(), h.records()[0].mood.clone()))
            .await;
        assert_eq!(count, 2);
        assert_eq!(first_mood, "tired");
        assert!(registry.find_record(session, latest_id).await.is_some());
    }

    #[tokio::test]
    async fn idle_histories_are_swept_on_append() {
        let registry = HistoryRegistry::new(Duration::minutes(60));
        let stale = Uuid::new_v4();
        registry.append(stale, record("calm")).await;

        {
            let mut entries = registry.entries.write().await;
            let entry = entries.get_mut(&stale).expect("stale entry");
            entry.last_touched = Utc::now() - Duration::hours(2);
        }

        registry.append(Uuid::new_v4(), record("fresh")).await;
        let stale_count = registry.with_history(stale, |h| h.count()).await;
        assert_eq!(stale_count, 0);
    }
}
