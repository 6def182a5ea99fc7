use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::MissedTickBehavior;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use treechop_server::config::{ServerConfig, DEFAULT_LOG_FILTER};
use treechop_server::constants::{PATCH_MS, TICK_MS};
use treechop_server::engine::{GameRoom, Room};
use treechop_server::server_protocol::{parse_client_message, ParsedClientMessage};
use treechop_server::server_utils::{is_supported_room, make_session_id};
use treechop_server::types::{JoinOptions, RoundEvent};

const OUTBOUND_QUEUE_LEN: usize = 64;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
    kick: watch::Sender<bool>,
    session_id: Option<String>,
}

impl ClientContext {
    fn new(tx: mpsc::Sender<OutboundMessage>) -> (Self, watch::Receiver<bool>) {
        let (kick, kicked) = watch::channel(false);
        (
            Self {
                tx,
                kick,
                session_id: None,
            },
            kicked,
        )
    }
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    room: GameRoom,
}

impl ServerState {
    fn new(room: GameRoom) -> Self {
        Self {
            clients: HashMap::new(),
            room,
        }
    }
}

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env();
    let log_filter = config
        .as_ref()
        .map(|config| config.log_filter.clone())
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    init_tracing(&log_filter);

    let config = match config {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "invalid server configuration");
            std::process::exit(2);
        }
    };

    let seed: u32 = rand::random();
    let room = GameRoom::on_create(seed);
    info!(
        seed,
        trees = room.world().tree_count(),
        round_ends_at = room.round_ends_at(),
        "room created"
    );

    let state = Arc::new(Mutex::new(ServerState::new(room)));
    start_tick_loop(state.clone());
    start_broadcast_loop(state.clone());

    let app = Router::new()
        .route("/health", get(healthz))
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = config.static_dir.clone() {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.display(), "serving static client files");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("static file root not found; only health and websocket routes are served");
        app.route("/", get(healthz))
    };

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            error!(%error, %bind_addr, "failed to bind server socket");
            std::process::exit(1);
        }
    };

    info!(port = config.port, "listening on ws://localhost:{}/ws", config.port);
    if let Err(error) = axum::serve(listener, app).await {
        error!(%error, "server runtime failed");
        std::process::exit(1);
    }
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_client_id();
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(OUTBOUND_QUEUE_LEN);
    let (context, mut reader_kicked) = ClientContext::new(tx);
    let mut writer_kicked = reader_kicked.clone();

    {
        let mut guard = state.lock().await;
        guard.clients.insert(client_id.clone(), context);
    }
    debug!(%client_id, "client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    // A kick bypasses the queue, which may be the full one that caused it.
    let writer = tokio::spawn(async move {
        loop {
            let outbound = tokio::select! {
                biased;
                _ = writer_kicked.changed() => OutboundMessage::Close {
                    code: 1000,
                    reason: "disconnected".to_string(),
                },
                received = rx.recv() => match received {
                    Some(outbound) => outbound,
                    None => break,
                },
            };
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    loop {
        let received = tokio::select! {
            _ = reader_kicked.changed() => break,
            received = ws_receiver.next() => received,
        };
        let Some(Ok(message)) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&state, &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => match std::str::from_utf8(&raw) {
                Ok(text) => handle_client_message(&state, &client_id, text).await,
                Err(_) => send_error_to_client(&state, &client_id, "invalid utf8 message").await,
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        disconnect_client_internal(&mut guard, &client_id);
    }
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        debug!(%client_id, "dropping malformed message");
        send_error_to_client(state, client_id, "invalid message").await;
        return;
    };

    match message {
        ParsedClientMessage::Hello { name, room_id } => {
            handle_hello(state, client_id, name, room_id).await;
        }
        ParsedClientMessage::Input(input) => {
            let mut guard = state.lock().await;
            let session_id = guard
                .clients
                .get(client_id)
                .and_then(|ctx| ctx.session_id.clone());
            let Some(session_id) = session_id else {
                drop(guard);
                send_error_to_client(state, client_id, "send hello first").await;
                return;
            };
            guard.room.on_input(&session_id, input);
        }
        ParsedClientMessage::Ping { t } => {
            let mut guard = state.lock().await;
            send_to_client(
                &mut guard,
                client_id,
                &json!({
                    "type": "pong",
                    "t": t,
                }),
            );
        }
    }
}

async fn handle_hello(
    state: &SharedState,
    client_id: &str,
    requested_name: String,
    requested_room_id: Option<String>,
) {
    if !is_supported_room(requested_room_id.as_deref()) {
        send_error_to_client(state, client_id, "unknown room").await;
        return;
    }

    let mut guard = state.lock().await;
    let already_joined = match guard.clients.get(client_id) {
        None => return,
        Some(ctx) => ctx.session_id.is_some(),
    };
    if already_joined {
        send_to_client(
            &mut guard,
            client_id,
            &json!({
                "type": "error",
                "message": "already joined",
            }),
        );
        return;
    }

    let mut session_id = make_session_id();
    while guard.room.has_player(&session_id) {
        session_id = make_session_id();
    }
    let player = guard.room.on_join(
        &session_id,
        JoinOptions {
            name: Some(requested_name),
        },
    );
    if let Some(ctx) = guard.clients.get_mut(client_id) {
        ctx.session_id = Some(session_id.clone());
    }
    info!(
        %client_id,
        %session_id,
        name = %player.name,
        x = player.x,
        y = player.y,
        players = guard.room.player_count(),
        "player joined"
    );

    let welcome = json!({
        "type": "welcome",
        "sessionId": session_id,
        "config": guard.room.config,
        "snapshot": guard.room.snapshot(),
    });
    send_to_client(&mut guard, client_id, &welcome);
}

fn disconnect_client_internal(state: &mut ServerState, client_id: &str) {
    let Some(context) = state.clients.remove(client_id) else {
        return;
    };
    let _ = context.kick.send(true);
    let Some(session_id) = context.session_id else {
        debug!(%client_id, "client disconnected before joining");
        return;
    };
    if state.room.on_leave(&session_id) {
        info!(
            %client_id,
            %session_id,
            players = state.room.player_count(),
            "player left"
        );
    }
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_room(&mut guard);
        }
    });
}

fn tick_room(state: &mut ServerState) {
    let Some(event) = state.room.on_tick(TICK_MS) else {
        return;
    };
    announce_round_reset(state, event);
}

fn announce_round_reset(state: &ServerState, event: RoundEvent) {
    info!(
        round = event.round,
        grown = event.grown,
        trees = state.room.world().tree_count(),
        round_ends_at = event.round_ends_at,
        "round reset"
    );
    broadcast(
        state,
        &json!({
            "type": "round_reset",
            "round": event.round,
            "grown": event.grown,
            "roundEndsAt": event.round_ends_at,
        }),
    );
}

// Serialise and send outside the lock.
fn start_broadcast_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(PATCH_MS));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let (snapshot, receivers) = {
                let guard = state.lock().await;
                let receivers: Vec<(String, mpsc::Sender<OutboundMessage>)> = guard
                    .clients
                    .iter()
                    .filter(|(_, ctx)| ctx.session_id.is_some())
                    .map(|(id, ctx)| (id.clone(), ctx.tx.clone()))
                    .collect();
                if receivers.is_empty() {
                    continue;
                }
                (guard.room.snapshot(), receivers)
            };

            let payload = match serde_json::to_string(&json!({
                "type": "state",
                "snapshot": snapshot,
            })) {
                Ok(payload) => payload,
                Err(error) => {
                    warn!(%error, "failed to serialize state snapshot");
                    continue;
                }
            };
            for (client_id, tx) in receivers {
                if tx.try_send(OutboundMessage::Text(payload.clone())).is_err() {
                    debug!(%client_id, "outbound queue full, state patch dropped");
                }
            }
        }
    });
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed {
        warn!(%client_id, "outbound queue full, disconnecting client");
        disconnect_client_internal(state, client_id);
    }
}

fn broadcast(state: &ServerState, message: &Value) {
    let payload = message.to_string();
    for (client_id, client) in &state.clients {
        if client.session_id.is_none() {
            continue;
        }
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
        {
            debug!(%client_id, "outbound queue full, broadcast dropped");
        }
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_to_client(
        &mut guard,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
    );
}

fn make_client_id() -> String {
    let seq = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    format!("client_{seq}")
}
