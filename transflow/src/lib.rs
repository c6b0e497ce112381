pub mod commands;
pub mod decoration;
mod error;
pub mod geometry;
pub mod input;
pub mod metrics;
pub mod network;
pub mod render;
pub mod scheduler;
pub mod segment;
pub mod session;
pub mod settings;
pub mod state;
pub mod translation;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use geometry::ScreenGeometry;
use input::file_source::FileTextSource;
use network::LlmTranslator;
use render::LogRenderer;
use session::SessionController;
use settings::AppSettings;
use state::SessionHandle;
use tracing::info;

pub use error::AppError;

pub fn init_logging() -> Result<(), AppError> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| AppError::LoggingInit(err.to_string()))
}

pub async fn run_file_session(path: PathBuf, settings: AppSettings) -> Result<(), AppError> {
    if !path.is_file() {
        return Err(AppError::Runtime(format!(
            "{} is not a readable file",
            path.display()
        )));
    }

    let translator = LlmTranslator::new(
        &settings.translator_endpoint,
        &settings.translator_model,
        &settings.target_language,
        settings.translation_timeout(),
    )?;
    let source = FileTextSource::new(&path);
    let renderer = LogRenderer::new(ScreenGeometry::default(), settings.underline_color.clone());

    info!(
        path = %path.display(),
        endpoint = settings.translator_endpoint.as_str(),
        model = settings.translator_model.as_str(),
        "starting file session"
    );

    let (handle, events) = SessionHandle::channel();
    let session = SessionController::new(source, renderer, Arc::new(translator), settings);
    let _console = commands::spawn_console(handle);
    session.run(events).await;
    Ok(())
}
