use axum::http::{Method, StatusCode};
use axum::{
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use ti4_companion::alert::BroadcastAlertSink;
use ti4_companion::catalog::{self, Faction, StrategyCard};
use ti4_companion::clock::{Clock, SystemClock};
use ti4_companion::config::ServerConfig;
use ti4_companion::enums::{Expansion, EXPANSIONS};
use ti4_companion::errors::NetworkError;
use ti4_companion::persistence::{JsonFileStore, MemoryStore, SessionStore};
use ti4_companion::websocket_service::WebSocketService;
use ti4_companion::{Command, CommandOutcome, CompanionError, GameState, SessionService, SessionView};

// Application state
struct AppState {
    session: Arc<SessionService>,
    websocket: WebSocketService,
}

type SharedState = Arc<AppState>;

#[derive(Serialize)]
struct SessionResponse {
    state: GameState,
    view: SessionView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogResponse {
    expansions: &'static [Expansion],
    factions: &'static [Faction],
    strategy_cards: &'static [StrategyCard],
    player_colors: &'static [&'static str],
}

// API Routes

async fn hello_world() -> &'static str {
    "Hello from the session companion!"
}

async fn get_session(State(state): State<SharedState>) -> Json<SessionResponse> {
    Json(SessionResponse {
        state: state.session.state().await,
        view: state.session.view().await,
    })
}

async fn apply_command(
    State(state): State<SharedState>,
    Json(command): Json<Command>,
) -> (StatusCode, Json<CommandOutcome>) {
    log::info!("Applying command {:?}", command);
    let outcome = state.session.apply(&command).await;
    let status = if outcome.is_applied() {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    (status, Json(outcome))
}

async fn get_catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        expansions: &EXPANSIONS,
        factions: catalog::FACTIONS,
        strategy_cards: &catalog::STRATEGY_CARDS,
        player_colors: &catalog::PLAYER_COLORS,
    })
}

// WebSocket handler for session updates
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    let websocket = state.websocket.clone();
    ws.on_upgrade(move |socket| async move { websocket.handle_connection(socket).await })
}

#[tokio::main]
async fn main() -> Result<(), CompanionError> {
    // Initialize logger
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = ServerConfig::parse();
    config.validate()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn SessionStore> = if config.no_persist {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::new(&config.state_file))
    };
    let alerts = BroadcastAlertSink::new(64);
    let session = Arc::new(SessionService::load(clock, store, Arc::new(alerts.clone())).await);

    // Drive the clocks
    let ticker = session.clone();
    let interval = config.tick_interval();
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(interval);
        ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticks.tick().await;
            ticker.tick().await;
        }
    });

    let state = Arc::new(AppState {
        websocket: WebSocketService::new(session.clone(), alerts),
        session,
    });

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    let app = Router::new()
        .route("/", get(hello_world))
        .route("/catalog", get(get_catalog))
        .route("/session", get(get_session))
        .route("/session/commands", post(apply_command))
        .route("/ws", get(ws_handler))
        .with_state(state)
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| NetworkError::Bind {
            addr: config.bind.to_string(),
            details: e.to_string(),
        })?;
    log::info!("Starting session companion on {}", config.bind);

    axum::serve(listener, app)
        .await
        .map_err(|e| CompanionError::from(e.to_string()))
}
