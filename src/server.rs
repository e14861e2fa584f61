//! `POST /upload`: store the `video` field, run the pipeline, stream the result back.

use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::{Config, RetentionPolicy};
use crate::error::{MediaflowError, Result};
use crate::paths::{job_dir_name, upload_file_name};
use crate::workflow::Workflow;

pub const UPLOAD_FIELD: &str = "video";

/// Body of every failed request; details go to the log only
const FAILURE_BODY: &str = "Error processing video";

#[derive(Clone)]
pub struct AppState {
    workflow: Arc<Workflow>,
    upload_dir: PathBuf,
    jobs: Arc<Semaphore>,
    retention: RetentionPolicy,
}

impl AppState {
    pub fn new(workflow: Workflow, config: &Config) -> Self {
        Self {
            workflow: Arc::new(workflow),
            upload_dir: config.server.upload_dir.clone(),
            jobs: Arc::new(Semaphore::new(config.pipeline.max_concurrent_jobs)),
            retention: config.pipeline.retention,
        }
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: &Config, workflow: Workflow) -> Result<()> {
    fs::create_dir_all(&config.server.upload_dir).await?;

    let state = AppState::new(workflow, config);
    let app = router(state, config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Upload endpoint listening on http://{}/upload", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn upload(State(state): State<AppState>, multipart: Multipart) -> Response {
    let stored = match store_upload(&state.upload_dir, multipart).await {
        Ok(path) => path,
        Err(e) => {
            error!("Rejected upload: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY).into_response();
        }
    };

    match run_pipeline(&state, &stored).await {
        Ok(final_path) => match download(&final_path).await {
            Ok(response) => response,
            Err(e) => {
                error!("Could not open {}: {}", final_path.display(), e);
                (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY).into_response()
            }
        },
        Err(e) => {
            error!("Processing {} failed: {}", stored.display(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY).into_response()
        }
    }
}

async fn run_pipeline(state: &AppState, stored: &Path) -> Result<PathBuf> {
    let _permit = state.jobs.acquire().await.map_err(|_| MediaflowError::QueueClosed)?;
    let output = state.workflow.process(stored).await?;

    if state.retention == RetentionPolicy::FinalOnly {
        fs::remove_file(stored).await?;
    }
    Ok(output.final_path)
}

/// Stream the `video` field to `{upload_dir}/{job}/{unix_millis}-{filename}`.
///
/// Every upload gets a fresh job directory, so the files its stages derive can
/// never meet those of another request.
async fn store_upload(upload_dir: &Path, mut multipart: Multipart) -> Result<PathBuf> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| MediaflowError::Upload(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        fs::create_dir_all(upload_dir).await.map_err(MediaflowError::UploadStorage)?;
        let (path, file) = create_upload_file(upload_dir, field.file_name()).await?;
        info!("Storing upload at {}", path.display());

        if let Err(e) = write_field(&mut field, file).await {
            discard_job(&path).await;
            return Err(e);
        }
        return Ok(path);
    }

    Err(MediaflowError::Upload(format!("No file in field '{}'", UPLOAD_FIELD)))
}

async fn write_field(field: &mut Field<'_>, mut file: File) -> Result<()> {
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| MediaflowError::Upload(format!("Interrupted upload: {}", e)))?
    {
        file.write_all(&chunk).await.map_err(MediaflowError::UploadStorage)?;
    }
    file.flush().await.map_err(MediaflowError::UploadStorage)?;
    Ok(())
}

/// Create the job directory and the empty upload file inside it.
async fn create_upload_file(upload_dir: &Path, original: Option<&str>) -> Result<(PathBuf, File)> {
    let now = chrono::Utc::now().timestamp_millis();
    let job_dir = upload_dir.join(job_dir_name(now));
    fs::create_dir(&job_dir).await.map_err(MediaflowError::UploadStorage)?;

    let path = job_dir.join(upload_file_name(now, original));
    match OpenOptions::new().write(true).create_new(true).open(&path).await {
        Ok(file) => Ok((path, file)),
        Err(e) => {
            discard_job(&path).await;
            Err(MediaflowError::UploadStorage(e))
        }
    }
}

/// Remove the job directory holding `stored` along with anything written to it.
async fn discard_job(stored: &Path) {
    let Some(job_dir) = stored.parent() else {
        return;
    };
    if let Err(e) = fs::remove_dir_all(job_dir).await {
        warn!("Could not remove {}: {}", job_dir.display(), e);
    }
}

async fn download(path: &Path) -> Result<Response> {
    let file = File::open(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().replace('"', "_"))
        .unwrap_or_else(|| "video".to_string());
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}
