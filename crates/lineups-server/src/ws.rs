use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::ConnectInfo;
use axum::extract::FromRequest;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use lineups_core::code::{is_valid_session_code, normalize_session_code};
use lineups_core::net::messages::{
    ClientMessage, ContestListMsg, JoinResponseMsg, JoinSessionMsg, ServerMessage,
};
use lineups_core::net::protocol::{
    MAX_MESSAGE_SIZE, PROTOCOL_VERSION, decode_client_message, encode_server_message,
};
use lineups_core::session::{ConnectionId, Participant, Slot};

use crate::registry::SessionChange;
use crate::state::{AppState, ConnectionGuard};

/// Longest accepted participant name, in characters.
const MAX_NAME_CHARS: usize = 32;

type WsSink = SplitSink<WebSocket, Message>;

pub async fn ws_handler(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> Result<axum::response::Response, StatusCode> {
    let max_ws = state.config.limits.max_ws_connections;
    let current = state.ws_connection_count.load(Ordering::Relaxed);
    if current >= max_ws {
        tracing::warn!(current, max = max_ws, "WS connection limit reached");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);

    let ws = WebSocketUpgrade::from_request(request, &state)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, peer))
        .into_response())
}

async fn handle_socket(socket: WebSocket, state: AppState, peer: Option<SocketAddr>) {
    let _guard = ConnectionGuard::new(Arc::clone(&state.ws_connection_count));
    let connection = state.alloc_connection_id();
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // The first frame must be a JoinSession.
    let first_msg = match ws_receiver.next().await {
        Some(Ok(Message::Binary(data))) => data,
        _ => return,
    };
    let join = match decode_client_message(&first_msg) {
        Ok(ClientMessage::JoinSession(join)) => join,
        Ok(other) => {
            tracing::warn!(connection, ?other, "First frame was not a join");
            return;
        },
        Err(e) => {
            tracing::warn!(connection, error = %e, "Undecodable first frame");
            return;
        },
    };

    if join.protocol_version != 0 && join.protocol_version != PROTOCOL_VERSION {
        let error = format!(
            "Protocol version mismatch: client={}, server={}",
            join.protocol_version, PROTOCOL_VERSION
        );
        send_join_error(&mut ws_sender, &error).await;
        return;
    }

    let (code, slot, rx) = match attempt_join(&join, &state, connection).await {
        Ok(joined) => joined,
        Err(error) => {
            send_join_error(&mut ws_sender, &error).await;
            return;
        },
    };

    tracing::info!(connection, code = %code, ?slot, ?peer, "Participant connected");

    if let Err(e) = send_welcome(&mut ws_sender, &state, &code, slot).await {
        tracing::debug!(connection, error = %e, "Failed to send join response");
    } else {
        spawn_writer(ws_sender, rx);
        read_loop(&mut ws_receiver, &state, &code, slot, connection).await;
    }

    // Vacate the slot and notify whoever is left.
    let changes = state.registry.write().await.remove_identity(connection);
    for change in changes {
        match change {
            SessionChange::Updated(snapshot) => {
                tracing::debug!(connection, code = %snapshot.code, "Slot vacated");
            },
            SessionChange::Deleted(code) => {
                tracing::debug!(connection, code = %code, "Last participant left");
            },
        }
    }
    tracing::info!(connection, code = %code, "Participant disconnected");
}

/// Trim a requested name, falling back to the slot's default when blank.
fn validate_player_name(raw: &str, slot: Slot) -> Option<String> {
    let name = raw.trim();
    if name.chars().count() > MAX_NAME_CHARS || name.chars().any(char::is_control) {
        return None;
    }
    if name.is_empty() {
        return Some(slot.default_name().to_string());
    }
    Some(name.to_string())
}

/// Create or join a session. On success the returned receiver carries
/// every snapshot broadcast to this connection, starting with the join.
async fn attempt_join(
    join: &JoinSessionMsg,
    state: &AppState,
    connection: ConnectionId,
) -> Result<(String, Slot, mpsc::Receiver<Bytes>), String> {
    let creating = join.code.trim().is_empty();
    let slot = if creating { Slot::A } else { Slot::B };

    let name = validate_player_name(&join.player_name, slot)
        .ok_or_else(|| "Invalid player name".to_string())?;
    let participant = Participant { connection, name };

    let (tx, rx) = mpsc::channel::<Bytes>(state.config.limits.player_message_buffer);

    let code = if creating {
        let mut registry = state.registry.write().await;
        registry
            .create_session(participant, tx)
            .map_err(|e| {
                tracing::warn!(connection, error = %e, "Session creation failed");
                e.to_string()
            })?
            .code
    } else {
        let code = normalize_session_code(&join.code);
        if !is_valid_session_code(&code) {
            return Err("Invalid session code".to_string());
        }
        let mut registry = state.registry.write().await;
        registry
            .join_session(&code, participant, tx)
            .map_err(|e| e.to_string())?
            .code
    };

    Ok((code, slot, rx))
}

/// JoinResponse followed by the contest list, sent before the writer task
/// starts draining broadcasts.
async fn send_welcome(
    ws_sender: &mut WsSink,
    state: &AppState,
    code: &str,
    slot: Slot,
) -> Result<(), axum::Error> {
    let welcome = [
        ServerMessage::JoinResponse(JoinResponseMsg::accepted(code.to_string(), slot)),
        ServerMessage::ContestList(ContestListMsg {
            contests: state.catalog.summaries(),
        }),
    ];
    for msg in &welcome {
        match encode_server_message(msg) {
            Ok(data) => ws_sender.send(Message::Binary(data.into())).await?,
            Err(e) => tracing::warn!(error = %e, "Failed to encode welcome message"),
        }
    }
    Ok(())
}

async fn send_join_error(ws_sender: &mut WsSink, error: &str) {
    let msg = ServerMessage::JoinResponse(JoinResponseMsg::rejected(error));
    if let Ok(response) = encode_server_message(&msg)
        && let Err(e) = ws_sender.send(Message::Binary(response.into())).await
    {
        tracing::warn!(error = %e, "Failed to send join error response");
    }
    let _ = ws_sender.send(Message::Close(None)).await;
}

/// Forward queued broadcasts until the registry drops this connection's
/// sender, then close the socket.
fn spawn_writer(mut ws_sender: WsSink, mut rx: mpsc::Receiver<Bytes>) {
    tokio::spawn(async move {
        while let Some(data) = rx.recv().await {
            if ws_sender.send(Message::Binary(data)).await.is_err() {
                return;
            }
        }
        let _ = ws_sender.send(Message::Close(None)).await;
    });
}

/// Per-connection rate limiter (token bucket).
struct RateLimiter {
    tokens: f64,
    last_refill: tokio::time::Instant,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
}

impl RateLimiter {
    fn new(max_tokens: f64, refill_rate: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_refill: tokio::time::Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// Returns true if the message is allowed; false if rate-limited.
    fn allow(&mut self) -> bool {
        let now = tokio::time::Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

async fn read_loop(
    ws_receiver: &mut SplitStream<WebSocket>,
    state: &AppState,
    code: &str,
    slot: Slot,
    connection: ConnectionId,
) {
    let rate = state.config.limits.ws_rate_limit_per_sec;
    let mut rate_limiter = RateLimiter::new(rate, rate);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let data = match msg {
            Message::Binary(d) => d,
            Message::Close(_) => break,
            _ => continue,
        };

        if !rate_limiter.allow() {
            tracing::warn!(connection, code, "Rate limited");
            continue;
        }

        if data.is_empty() || data.len() > MAX_MESSAGE_SIZE {
            tracing::warn!(connection, code, len = data.len(), "Dropped frame");
            continue;
        }

        let msg = match decode_client_message(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(connection, code, error = %e, "Rejected client frame");
                continue;
            },
        };

        let mut registry = state.registry.write().await;
        match msg {
            ClientMessage::SelectContest(m) => {
                registry.select_contest(code, &m.contest_id);
            },
            ClientMessage::StartGame(_) => {
                registry.start(code);
            },
            ClientMessage::SubmitGuess(m) => {
                registry.submit_guess(code, slot, &m.guess);
            },
            ClientMessage::ResetGame(_) => {
                registry.reset(code);
            },
            ClientMessage::LeaveSession(_) => break,
            ClientMessage::JoinSession(_) => {
                tracing::debug!(connection, code, "Ignoring repeated join");
            },
        }
    }
}
