//! Shared constants/setters for things
//!

/// Default prompt sent to the image API. `{age}` and `{mood}` are
/// substituted at build time.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "Black and white line art mandala symbolizing {mood} emotion for a {age}-year-old person. Highly detailed, symmetrical, spiritual tone.";

/// Default model for the images endpoint.
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// Filename offered for the history download.
pub const EXPORT_FILENAME: &str = "mandala_chat_history.txt";

/// Separator between record blocks in the history export.
pub const EXPORT_SEPARATOR: &str = "\n---\n";

/// Timestamp layout used in history exports.
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Youngest age the generation form accepts.
pub const MIN_AGE: u8 = 1;

/// Default upper bound for the age field, overridable on the CLI.
pub const DEFAULT_MAX_AGE: u8 = 120;

/// Session key holding the per-session history id.
pub const HISTORY_SESSION_KEY: &str = "history_id";

/// Minutes of inactivity before a session and its history are dropped.
pub const SESSION_IDLE_MINUTES: i64 = 60;

/// OpenAI images endpoint.
pub const OPENAI_IMAGES_URL: &str = "https://api.openai.com/v1/images/generations";
