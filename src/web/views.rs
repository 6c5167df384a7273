use askama::Template;
use askama_web::WebTemplate;
use uuid::Uuid;

use crate::history::MandalaRecord;

const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A record flattened into the strings the templates need.
#[derive(Clone, Debug)]
pub(crate) struct RecordView {
    pub(crate) id: Uuid,
    pub(crate) index: usize,
    pub(crate) age: u8,
    pub(crate) mood: String,
    pub(crate) caption: String,
    pub(crate) image_src: String,
    pub(crate) download_name: String,
    pub(crate) created_label: String,
}

impl RecordView {
    pub(crate) fn from_record(record: &MandalaRecord) -> Self {
        Self {
            id: record.id,
            index: record.index,
            age: record.age,
            mood: record.mood.clone(),
            caption: record.caption.clone(),
            image_src: record.image.reference(),
            download_name: record.download_filename(),
            created_label: record
                .created_at
                .format(DISPLAY_TIMESTAMP_FORMAT)
                .to_string(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub(crate) struct HomeTemplate {
    pub(crate) latest: Option<RecordView>,
    pub(crate) records: Vec<RecordView>,
    pub(crate) has_records: bool,
    pub(crate) max_age: u8,
    pub(crate) has_flash: bool,
    pub(crate) flash_message: String,
    pub(crate) flash_class: String,
}
