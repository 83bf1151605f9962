use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    extract::{Path as AxumPath, Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tower::ServiceExt;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::composer::{ComposeError, Composer};

/// Suffixes old links to the site may still carry.
const LEGACY_SUFFIXES: [&str; 3] = [".shtml", ".html", ".htm"];

#[derive(Clone)]
struct AppState {
    composer: Arc<Composer>,
    static_dir: PathBuf,
    assets: ServeDir,
}

/// `/` and `/<page>` are composed pages; anything else is looked up in `static_dir`.
///
/// A top-level segment that names no page but does name a file in `static_dir`
/// is served as that file, matching what a static build produces.
pub fn app(composer: Arc<Composer>, static_dir: PathBuf) -> Router {
    let assets = ServeDir::new(&static_dir);
    let state = AppState {
        composer,
        static_dir,
        assets: assets.clone(),
    };

    Router::new()
        .route("/", get(index))
        .route("/:page", get(page))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, ComposeError> {
    render(&state, "index")
}

async fn page(
    State(state): State<AppState>,
    AxumPath(segment): AxumPath<String>,
    req: Request,
) -> Response {
    let result = render(&state, page_name(&segment));

    if matches!(result, Err(ComposeError::NotFound(_)))
        && is_static_file(&state.static_dir, &segment).await
    {
        return match state.assets.clone().oneshot(req).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        };
    }

    result.into_response()
}

async fn is_static_file(static_dir: &Path, segment: &str) -> bool {
    if segment.is_empty() || segment.starts_with('.') || segment.contains(['/', '\\']) {
        return false;
    }

    tokio::fs::metadata(static_dir.join(segment))
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

fn render(state: &AppState, name: &str) -> Result<Html<String>, ComposeError> {
    state.composer.compose(name).map(Html)
}

fn page_name(segment: &str) -> &str {
    LEGACY_SUFFIXES
        .iter()
        .find_map(|suffix| segment.strip_suffix(suffix))
        .unwrap_or(segment)
}

impl IntoResponse for ComposeError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            Self::NotFound(name) => {
                tracing::debug!(page = %name, "page not found");
                (StatusCode::NOT_FOUND, "page not found")
            }
            Self::FragmentMissing(_) | Self::DuplicateBlockId { .. } | Self::Render { .. } => {
                tracing::error!(error = ?self, "failed to compose page");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        (status, msg).into_response()
    }
}
