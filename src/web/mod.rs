//! Web server and request handlers.

use std::num::NonZeroU16;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Duration;
use serde::Deserialize;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::constants::{EXPORT_FILENAME, HISTORY_SESSION_KEY, MIN_AGE, SESSION_IDLE_MINUTES};
use crate::error::MandalaError;
use crate::generate::{GenerationRequest, ImageGenerator};
use crate::history::{ImageRef, NewRecord};

mod flash;
mod registry;
mod views;

use registry::HistoryRegistry;
use views::{HomeTemplate, RecordView};

#[derive(Clone)]
pub(crate) struct AppState {
    config: Arc<AppConfig>,
    generator: Arc<dyn ImageGenerator>,
    histories: Arc<HistoryRegistry>,
}

impl AppState {
    fn new(config: AppConfig, generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            config: Arc::new(config),
            generator,
            histories: Arc::new(HistoryRegistry::new(Duration::minutes(SESSION_IDLE_MINUTES))),
        }
    }
}

/// Form fields for the generate action. Age arrives as text so range
/// problems surface as inline messages rather than form rejections.
#[derive(Deserialize)]
pub(crate) struct GenerateForm {
    api_key: String,
    age: String,
    mood: String,
}

/// Returns this session's history id, minting one on first contact.
async fn history_id(session: &Session) -> Result<Uuid, MandalaError> {
    if let Some(id) = session.get::<Uuid>(HISTORY_SESSION_KEY).await? {
        return Ok(id);
    }
    let id = Uuid::new_v4();
    session.insert(HISTORY_SESSION_KEY, id).await?;
    Ok(id)
}

async fn home_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<HomeTemplate, MandalaError> {
    let session_id = history_id(&session).await?;
    let records = state
        .histories
        .with_history(session_id, |history| {
            history
                .records()
                .iter()
                .map(RecordView::from_record)
                .collect::<Vec<_>>()
        })
        .await;

    let (has_flash, flash_message, flash_class) = match flash::take_flash_message(&session).await? {
        Some(message) => (true, message.text, message.class),
        None => (false, String::new(), String::new()),
    };

    Ok(HomeTemplate {
        latest: records.first().cloned(),
        has_records: !records.is_empty(),
        records,
        max_age: state.config.max_age,
        has_flash,
        flash_message,
        flash_class,
    })
}

async fn run_generation(
    state: &AppState,
    session_id: Uuid,
    form: GenerateForm,
) -> Result<(), MandalaError> {
    let age: u8 = form.age.trim().parse().map_err(|_| {
        MandalaError::Validation(format!(
            "age must be a whole number between {MIN_AGE} and {}",
            state.config.max_age
        ))
    })?;
    let request = GenerationRequest::new(age, &form.mood, &form.api_key, state.config.max_age)?;

    let prompt = state.config.prompt.build(request.age, &request.mood);
    info!("Generating a mandala for age {}, mood {}", request.age, request.mood);
    let generated = state
        .generator
        .generate(&prompt, state.config.image_size, &request.api_key)
        .await?;

    let caption = state.config.composer().compose(request.age, &request.mood);
    state
        .histories
        .append(
            session_id,
            NewRecord {
                age: request.age,
                mood: request.mood,
                caption,
                prompt,
                image: generated.image,
            },
        )
        .await;
    Ok(())
}

async fn generate_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<GenerateForm>,
) -> Result<Redirect, MandalaError> {
    let session_id = history_id(&session).await?;
    match run_generation(&state, session_id, form).await {
        Ok(()) => {
            flash::set_flash(&session, "Your mandala is ready ✨", flash::FLASH_SUCCESS).await?;
        }
        Err(
            err @ (MandalaError::Validation(_)
            | MandalaError::Auth(_)
            | MandalaError::Quota(_)
            | MandalaError::Transport(_)),
        ) => {
            info!("Generation failed: {err}");
            flash::set_flash(&session, err.to_string(), flash::FLASH_ERROR).await?;
        }
        Err(err) => return Err(err),
    }
    Ok(Redirect::to("/"))
}

async fn export_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, MandalaError> {
    let session_id = history_id(&session).await?;
    let text = state
        .histories
        .with_history(session_id, |history| history.export_text())
        .await;
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{EXPORT_FILENAME}\""),
        )
        .body(Body::from(text))
        .map_err(MandalaError::from)
}

async fn record_image_handler(
    State(state): State<AppState>,
    session: Session,
    Path(record_id): Path<Uuid>,
) -> Result<Response, MandalaError> {
    let session_id = history_id(&session).await?;
    let Some(record) = state.histories.find_record(session_id, record_id).await else {
        return Err(MandalaError::NotFound(format!("/mandala/{record_id}")));
    };
    let filename = record.download_filename();
    match record.image {
        ImageRef::Png(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "image/png")
            .header(
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            )
            .body(Body::from(bytes))
            .map_err(MandalaError::from),
        ImageRef::Url(url) => Ok(Redirect::to(url.as_str()).into_response()),
    }
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::get(home_handler))
        .route("/generate", axum::routing::post(generate_handler))
        .route("/history/export", axum::routing::get(export_handler))
        .route("/mandala/{id}", axum::routing::get(record_image_handler))
        .route("/static/styles.css", axum::routing::get(styles_handler))
}

fn session_layer() -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            SESSION_IDLE_MINUTES,
        )))
}

/// Starts the web server with the given configuration and image backend.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    config: AppConfig,
    generator: Arc<dyn ImageGenerator>,
) -> Result<(), anyhow::Error> {
    let app = create_router()
        .with_state(AppState::new(config, generator))
        .layer(session_layer());

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {}", err);
    }
    Ok(())
}
