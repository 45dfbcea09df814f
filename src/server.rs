//! HTTP service.
//!
//! Wires the database, embedding provider, engine, and refresh worker into an
//! axum router. The ONNX encoder loads in the background so the process binds
//! its port immediately; `/readyz` reports 503 until the engine is usable and
//! suggestion requests during that window get a retryable 503.

use std::sync::{Arc, Mutex, RwLock};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::config::GarbConfig;
use crate::db;
use crate::embedding::worker::{spawn_worker, WorkerHandle, WorkerOptions};
use crate::embedding::{self, cache};
use crate::engine::{Engine, Recommendation};
use crate::error::EngineError;
use crate::wardrobe::store::{self, NewItem};

/// Engine lifecycle, observed by `/readyz` and the suggestion handler.
enum EngineState {
    Loading,
    Ready {
        engine: Arc<Engine>,
        worker: WorkerHandle,
    },
    Failed(String),
}

#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<rusqlite::Connection>>,
    engine: Arc<RwLock<EngineState>>,
    model: String,
}

/// Start the HTTP service and block until shutdown.
pub async fn serve(config: GarbConfig) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;

    if let Ok(Some(stored_model)) = db::migrations::get_embedding_model(&conn) {
        if stored_model != config.embedding.model {
            tracing::warn!(
                stored = %stored_model,
                configured = %config.embedding.model,
                "embedding model changed — run `garb re-embed` to refresh cached vectors"
            );
        }
    }

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        engine: Arc::new(RwLock::new(EngineState::Loading)),
        model: config.embedding.model.clone(),
    };

    spawn_engine_load(state.clone(), config.clone());

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/suggestions", post(suggestions))
        .route("/api/items", post(create_item).get(list_items))
        .route("/api/items/{id}", delete(remove_item))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "garb listening at http://{bind_addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            info!("shutting down");
        })
        .await?;

    Ok(())
}

/// Load the encoder and build the engine off the request path. ONNX session
/// creation takes seconds; readiness is reported rather than blocked on.
fn spawn_engine_load(state: AppState, config: GarbConfig) {
    tokio::spawn(async move {
        let embedding_config = config.embedding.clone();
        let tuning = config.scoring.clone();
        let rules = config.rules.clone();
        let result = tokio::task::spawn_blocking(move || {
            let provider: Arc<dyn embedding::EmbeddingProvider> =
                Arc::from(embedding::create_provider(&embedding_config)?);
            let engine = Engine::new(provider.clone(), rules, tuning)?;
            Ok::<_, anyhow::Error>((provider, engine))
        })
        .await;

        let mut slot = state.engine.write().expect("engine state lock poisoned");
        match result {
            Ok(Ok((provider, engine))) => {
                let worker = spawn_worker(
                    state.db.clone(),
                    provider,
                    config.embedding.model.clone(),
                    WorkerOptions {
                        queue_capacity: config.worker.queue_capacity,
                        batch_size: config.worker.batch_size,
                        batch_timeout: std::time::Duration::from_millis(
                            config.worker.batch_timeout_ms,
                        ),
                    },
                );
                *slot = EngineState::Ready {
                    engine: Arc::new(engine),
                    worker,
                };
                info!("engine ready, accepting suggestion requests");
            }
            Ok(Err(e)) => {
                error!(error = %e, "engine failed to load");
                *slot = EngineState::Failed(e.to_string());
            }
            Err(e) => {
                error!(error = %e, "engine load task panicked");
                *slot = EngineState::Failed(e.to_string());
            }
        }
    });
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<AppState>) -> Response {
    match &*state.engine.read().expect("engine state lock poisoned") {
        EngineState::Ready { .. } => (StatusCode::OK, "ready").into_response(),
        EngineState::Loading => {
            (StatusCode::SERVICE_UNAVAILABLE, "engine loading").into_response()
        }
        EngineState::Failed(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("engine failed: {e}"),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct SuggestionRequest {
    #[serde(default)]
    query: String,
    #[serde(default)]
    k: Option<usize>,
}

async fn suggestions(
    State(state): State<AppState>,
    Json(req): Json<SuggestionRequest>,
) -> Result<Json<Recommendation>, ApiError> {
    let engine = {
        match &*state.engine.read().expect("engine state lock poisoned") {
            EngineState::Ready { engine, .. } => engine.clone(),
            EngineState::Loading => {
                return Err(ApiError::from(EngineError::EncoderUnavailable(
                    "engine still loading".into(),
                )))
            }
            EngineState::Failed(e) => {
                return Err(ApiError::from(EngineError::EncoderUnavailable(e.clone())))
            }
        }
    };

    let db = state.db.clone();
    let model = state.model.clone();
    // The whole pipeline is CPU- and SQLite-bound; keep it off the async
    // executor.
    let recommendation = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let mut conn = db
            .lock()
            .map_err(|_| ApiError::internal("database lock poisoned"))?;
        let mut items = store::load_items(&conn, &model)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        cache::ensure_embeddings(&mut conn, engine.provider(), &model, &mut items)?;
        Ok(engine.recommend(&items, &req.query, req.k)?)
    })
    .await
    .map_err(|e| ApiError::internal(e.to_string()))??;

    Ok(Json(recommendation))
}

async fn create_item(
    State(state): State<AppState>,
    Json(item): Json<NewItem>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let id = {
        let conn = state
            .db
            .lock()
            .map_err(|_| ApiError::internal("database lock poisoned"))?;
        store::insert_item(&conn, &item).map_err(|e| ApiError::internal(e.to_string()))?
    };

    // Warm the cache in the background; a miss at request time is computed
    // inline anyway.
    if let EngineState::Ready { worker, .. } =
        &*state.engine.read().expect("engine state lock poisoned")
    {
        worker.enqueue(id);
    }

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn list_items(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let items = {
        let conn = state
            .db
            .lock()
            .map_err(|_| ApiError::internal("database lock poisoned"))?;
        store::load_items(&conn, &state.model).map_err(|e| ApiError::internal(e.to_string()))?
    };
    let items: Vec<_> = items
        .into_iter()
        .map(|mut item| {
            item.embedding = None;
            item
        })
        .collect();
    Ok(Json(json!({ "items": items })))
}

async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let removed = {
        let conn = state
            .db
            .lock()
            .map_err(|_| ApiError::internal("database lock poisoned"))?;
        store::delete_item(&conn, id).map_err(|e| ApiError::internal(e.to_string()))?
    };
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError {
            status: StatusCode::NOT_FOUND,
            message: format!("no item with id {id}"),
        })
    }
}

/// HTTP error envelope. Engine errors map onto status codes by kind.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let status = match &e {
            EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            EngineError::EncoderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, message = %self.message, "request failed");
        }
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}
