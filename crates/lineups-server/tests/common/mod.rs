use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use lineups_core::net::messages::{
    ClientMessage, ContestListMsg, JoinResponseMsg, JoinSessionMsg, ServerMessage,
    SubmitGuessMsg,
};
use lineups_core::net::protocol::{PROTOCOL_VERSION, decode_server_message, encode_client_message};
use lineups_core::session::SessionSnapshot;
use lineups_core::test_helpers::test_catalog;

use lineups_server::build_app;
use lineups_server::config::ServerConfig;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server backed by the small test catalog.
    pub async fn new() -> Self {
        Self::from_config(ServerConfig::default()).await
    }

    pub async fn from_config(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, _state) = build_app(config, test_catalog());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

pub async fn ws_send_client_msg(stream: &mut WsStream, msg: &ClientMessage) {
    let encoded = encode_client_message(msg).unwrap();
    stream.send(Message::Binary(encoded.into())).await.unwrap();
}

/// Send a JoinSession and return the JoinResponse (success or error).
pub async fn ws_join(stream: &mut WsStream, code: &str, name: &str) -> JoinResponseMsg {
    let msg = ClientMessage::JoinSession(JoinSessionMsg {
        code: code.to_string(),
        player_name: name.to_string(),
        protocol_version: PROTOCOL_VERSION,
    });
    ws_send_client_msg(stream, &msg).await;
    match ws_read_server_msg(stream).await {
        ServerMessage::JoinResponse(join) => join,
        other => panic!("Expected JoinResponse, got: {other:?}"),
    }
}

/// Join successfully, consuming the ContestList and the first SessionState.
pub async fn ws_join_ok(
    stream: &mut WsStream,
    code: &str,
    name: &str,
) -> (JoinResponseMsg, ContestListMsg, SessionSnapshot) {
    let join = ws_join(stream, code, name).await;
    assert!(join.success, "Expected successful join: {join:?}");
    let contests = match ws_read_server_msg(stream).await {
        ServerMessage::ContestList(list) => list,
        other => panic!("Expected ContestList, got: {other:?}"),
    };
    let snapshot = ws_read_snapshot(stream).await;
    (join, contests, snapshot)
}

/// Create a session as host. Returns (host stream, code).
pub async fn ws_create_session(server: &TestServer, name: &str) -> (WsStream, String) {
    let mut host = ws_connect(&server.ws_url()).await;
    let (join, _, snapshot) = ws_join_ok(&mut host, "", name).await;
    let code = join.code.unwrap();
    assert_eq!(snapshot.code, code);
    (host, code)
}

/// Create a session and seat a guest. Both streams have consumed every
/// message up to and including the guest's join broadcast.
pub async fn ws_full_session(server: &TestServer) -> (WsStream, WsStream, String) {
    let (mut host, code) = ws_create_session(server, "Alice").await;
    let mut guest = ws_connect(&server.ws_url()).await;
    ws_join_ok(&mut guest, &code, "Bob").await;
    let _ = ws_read_snapshot(&mut host).await;
    (host, guest, code)
}

pub async fn ws_submit_guess(stream: &mut WsStream, guess: &str) {
    let msg = ClientMessage::SubmitGuess(SubmitGuessMsg {
        guess: guess.to_string(),
    });
    ws_send_client_msg(stream, &msg).await;
}

/// Read raw binary data from a WebSocket stream (5s timeout).
pub async fn ws_read_raw(stream: &mut WsStream) -> Vec<u8> {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return data.to_vec(),
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

/// Try to read raw binary data, returning None on timeout or close.
pub async fn ws_try_read_raw(stream: &mut WsStream, timeout_ms: u64) -> Option<Vec<u8>> {
    let deadline = Duration::from_millis(timeout_ms);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return Some(data.to_vec()),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return None,
                _ => continue,
            }
        }
    })
    .await
    .ok()
    .flatten()
}

pub async fn ws_read_server_msg(stream: &mut WsStream) -> ServerMessage {
    let data = ws_read_raw(stream).await;
    decode_server_message(&data).unwrap()
}

pub async fn ws_read_snapshot(stream: &mut WsStream) -> SessionSnapshot {
    match ws_read_server_msg(stream).await {
        ServerMessage::SessionState(snapshot) => *snapshot,
        other => panic!("Expected SessionState, got: {other:?}"),
    }
}

/// Wait until the server has closed the stream (5s timeout).
pub async fn ws_expect_closed(stream: &mut WsStream) {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for the server to close the socket");
}
