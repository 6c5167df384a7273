//! Session-scoped generation history.
//!
//! History is append-only and newest-first: the most recent record is
//! always at the front. Nothing here is durable; a history lives exactly
//! as long as its session.

use base64::Engine;
use base64::engine::general_purpose;
use chrono::{DateTime, Utc};
use url::Url;
use uuid::Uuid;

use crate::constants::{EXPORT_SEPARATOR, EXPORT_TIMESTAMP_FORMAT};

/// Where a generated image lives.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageRef {
    /// Hosted by the image service.
    Url(Url),
    /// Raw PNG bytes returned inline by the image service.
    Png(Vec<u8>),
}

impl ImageRef {
    /// String form used in exports and as an `img` source: the URL text,
    /// or a `data:image/png;base64,...` URI for inline bytes.
    pub fn reference(&self) -> String {
        match self {
            ImageRef::Url(url) => url.to_string(),
            ImageRef::Png(bytes) => format!(
                "data:image/png;base64,{}",
                general_purpose::STANDARD.encode(bytes)
            ),
        }
    }
}

/// One successful generation, immutable once created.
#[derive(Clone, Debug, PartialEq)]
pub struct MandalaRecord {
    /// Unique record id.
    pub id: Uuid,
    /// 1-based position in the session, in append order.
    pub index: usize,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Age as submitted.
    pub age: u8,
    /// Mood as submitted, casing preserved.
    pub mood: String,
    /// Composed caption.
    pub caption: String,
    /// The prompt the image was generated from.
    pub prompt: String,
    /// The generated image.
    pub image: ImageRef,
}

impl MandalaRecord {
    /// Filename offered for the per-record image download.
    pub fn download_filename(&self) -> String {
        format!("mandala_{}_{}.png", self.age, filename_fragment(&self.mood))
    }
}

fn filename_fragment(mood: &str) -> String {
    mood.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Fields of a record that exist before it is appended.
#[derive(Clone, Debug)]
pub struct NewRecord {
    /// Age as submitted.
    pub age: u8,
    /// Mood as submitted, casing preserved.
    pub mood: String,
    /// Composed caption.
    pub caption: String,
    /// The prompt the image was generated from.
    pub prompt: String,
    /// The generated image.
    pub image: ImageRef,
}

/// An ordered, append-only log of one session's generations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionHistory {
    records: Vec<MandalaRecord>,
    appended: usize,
}

impl SessionHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record stamped with the current time.
    pub fn append(&mut self, record: NewRecord) -> &MandalaRecord {
        self.append_at(record, Utc::now())
    }

    /// Appends a record with an explicit creation time.
    pub fn append_at(&mut self, record: NewRecord, created_at: DateTime<Utc>) -> &MandalaRecord {
        self.appended += 1;
        self.records.insert(
            0,
            MandalaRecord {
                id: Uuid::new_v4(),
                index: self.appended,
                created_at,
                age: record.age,
                mood: record.mood,
                caption: record.caption,
                prompt: record.prompt,
                image: record.image,
            },
        );
        &self.records[0]
    }

    /// Records newest-first. Re-listing is idempotent and side-effect free.
    pub fn records(&self) -> &[MandalaRecord] {
        &self.records
    }

    /// The most recently appended record.
    pub fn latest(&self) -> Option<&MandalaRecord> {
        self.records.first()
    }

    /// Number of successful generations this session.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Looks a record up by id.
    pub fn find(&self, id: Uuid) -> Option<&MandalaRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Serializes every record in `records()` order.
    ///
    /// The block layout and the `\n---\n` separator are a compatibility
    /// surface; do not reformat.
    pub fn export_text(&self) -> String {
        self.records
            .iter()
            .map(format_record)
            .collect::<Vec<_>>()
            .join(EXPORT_SEPARATOR)
    }
}

fn format_record(record: &MandalaRecord) -> String {
    format!(
        "{} - Age {} - Mood: {}\n{}\n{}\n",
        record.created_at.format(EXPORT_TIMESTAMP_FORMAT),
        record.age,
        record.mood,
        record.caption,
        record.image.reference()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(age: u8, mood: &str) -> NewRecord {
        NewRecord {
            age,
            mood: mood.to_string(),
            caption: format!("A {mood} mandala."),
            prompt: format!("mandala for {mood}"),
            image: ImageRef::Url(
                Url::parse(&format!("https://img.example.org/{age}.png")).expect("test url"),
            ),
        }
    }

    #[test]
    fn append_grows_count_by_one() {
        let mut history = SessionHistory::new();
        assert_eq!(history.count(), 0);
        for expected in 1..=4 {
            history.append(record(30, "calm"));
            assert_eq!(history.count(), expected);
        }
    }

    #[test]
    fn newest_record_is_always_first() {
        let mut history = SessionHistory::new();
        history.append(record(10, "curious"));
        history.append(record(70, "tired"));
        assert_eq!(history.count(), 2);
        assert_eq!(history.records()[0].mood, "tired");
        assert_eq!(history.records()[1].mood, "curious");
        assert_eq!(history.latest().map(|r| r.age), Some(70));
    }

    #[test]
    fn indexes_follow_append_order() {
        let mut history = SessionHistory::new();
        history.append(record(10, "curious"));
        history.append(record(70, "tired"));
        assert_eq!(history.records()[0].index, 2);
        assert_eq!(history.records()[1].index, 1);
    }

    #[test]
    fn listing_is_idempotent() {
        let mut history = SessionHistory::new();
        history.append(record(33, "peaceful"));
        let first: Vec<_> = history.records().to_vec();
        let second: Vec<_> = history.records().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn find_resolves_ids() {
        let mut history = SessionHistory::new();
        let id = history.append(record(21, "joyful")).id;
        history.append(record(22, "sad"));
        assert_eq!(history.find(id).map(|r| r.age), Some(21));
        assert!(history.find(Uuid::new_v4()).is_none());
    }

    #[test]
    fn export_matches_the_fixed_block_format() {
        let mut history = SessionHistory::new();
        let when = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        history.append_at(record(25, "peaceful"), when);
        assert_eq!(
            history.export_text(),
            "2026-03-14 09:26:53 - Age 25 - Mood: peaceful\nA peaceful mandala.\nhttps://img.example.org/25.png\n"
        );
    }

    #[test]
    fn export_orders_blocks_newest_first() {
        let mut history = SessionHistory::new();
        let first = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 3, 14, 9, 5, 0).unwrap();
        history.append_at(record(10, "curious"), first);
        history.append_at(record(70, "tired"), second);

        let export = history.export_text();
        let blocks: Vec<&str> = export.split(EXPORT_SEPARATOR).collect();
        assert_eq!(blocks.len(), history.count());
        assert!(blocks[0].contains("Mood: tired"));
        assert!(blocks[1].contains("Mood: curious"));
        assert_eq!(
            export,
            "2026-03-14 09:05:00 - Age 70 - Mood: tired\nA tired mandala.\nhttps://img.example.org/70.png\n\
             \n---\n\
             2026-03-14 09:00:00 - Age 10 - Mood: curious\nA curious mandala.\nhttps://img.example.org/10.png\n"
        );
    }

    #[test]
    fn export_of_empty_history_is_empty() {
        assert_eq!(SessionHistory::new().export_text(), "");
    }

    #[test]
    fn inline_png_exports_as_data_uri() {
        let mut history = SessionHistory::new();
        let mut new_record = record(40, "quiet");
        new_record.image = ImageRef::Png(vec![1, 2, 3]);
        history.append(new_record);
        assert!(
            history.records()[0]
                .image
                .reference()
                .starts_with("data:image/png;base64,")
        );
    }

    #[test]
    fn download_filename_is_filesystem_safe() {
        let mut history = SessionHistory::new();
        history.append(record(25, "Quietly Hopeful"));
        assert_eq!(
            history.records()[0].download_filename(),
            "mandala_25_quietly-hopeful.png"
        );
    }
}
