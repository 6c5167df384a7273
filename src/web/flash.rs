use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::MandalaError;

const FLASH_KEY: &str = "flash";

pub(crate) const FLASH_ERROR: &str = "error";
pub(crate) const FLASH_SUCCESS: &str = "success";

/// A one-shot message shown on the next page render.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct FlashMessage {
    pub(crate) text: String,
    pub(crate) class: String,
}

pub(crate) async fn set_flash(
    session: &Session,
    text: impl Into<String>,
    class: &str,
) -> Result<(), MandalaError> {
    session
        .insert(
            FLASH_KEY,
            FlashMessage {
                text: text.into(),
                class: class.to_string(),
            },
        )
        .await?;
    Ok(())
}

pub(crate) async fn take_flash_message(
    session: &Session,
) -> Result<Option<FlashMessage>, MandalaError> {
    Ok(session.remove::<FlashMessage>(FLASH_KEY).await?)
}
