//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, OpenAiFlashcardsAdapter, PasswordIdentityAdapter},
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, logout_handler, register_handler},
        flashcards::{
            create_flashcards_handler, delete_flashcard_handler, get_flashcard_handler,
            list_flashcards_handler, update_flashcard_handler,
        },
        generations::{
            create_generation_handler, get_generation_handler, list_generations_handler,
        },
        require_auth,
        state::AppState,
        ApiDoc,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use flashcards_core::ports::DatabaseService;
use flashcards_core::{CurationEngine, GenerationEngine};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Source texts top out around 40 KB of UTF-8; leave room for JSON escaping.
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");
    let db: Arc<dyn DatabaseService> = db_adapter;

    // --- 3. Initialize Service Adapters ---
    let mut openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    if let Some(base_url) = &config.openai_base_url {
        openai_config = openai_config.with_api_base(base_url);
    }
    let openai_client = Client::with_config(openai_config);

    let completion = Arc::new(OpenAiFlashcardsAdapter::new(
        openai_client,
        config.generation_model.clone(),
        config.generation_timeout,
    ));
    let identity = Arc::new(PasswordIdentityAdapter::new(db.clone()));
    info!(model = %config.generation_model, "Completion provider configured.");

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        identity,
        generations: Arc::new(GenerationEngine::new(db.clone(), completion)),
        curation: Arc::new(CurationEngine::new(db)),
    });

    // --- 5. Configure CORS ---
    let cors_origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid CORS origin '{}': {}",
            config.cors_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/generations",
            post(create_generation_handler).get(list_generations_handler),
        )
        .route("/generations/{id}", get(get_generation_handler))
        .route(
            "/flashcards",
            get(list_flashcards_handler).post(create_flashcards_handler),
        )
        .route(
            "/flashcards/{id}",
            get(get_flashcard_handler)
                .put(update_flashcard_handler)
                .delete(delete_flashcard_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
