#[allow(dead_code)]
mod common;

use lineups_core::code::is_valid_session_code;
use lineups_core::net::messages::{
    ClientMessage, JoinSessionMsg, LeaveSessionMsg, ResetGameMsg, SelectContestMsg, ServerMessage,
    StartGameMsg,
};
use lineups_core::session::{GuessError, Slot};
use lineups_server::config::{LimitsConfig, ServerConfig};

use common::{
    TestServer, ws_connect, ws_create_session, ws_expect_closed, ws_full_session, ws_join,
    ws_join_ok, ws_read_server_msg, ws_read_snapshot, ws_send_client_msg, ws_submit_guess,
    ws_try_read_raw,
};

#[tokio::test]
async fn create_session() {
    let server = TestServer::new().await;
    let mut stream = ws_connect(&server.ws_url()).await;

    let (join, contests, snapshot) = ws_join_ok(&mut stream, "", "Alice").await;

    assert_eq!(join.slot, Some(Slot::A));
    let code = join.code.unwrap();
    assert!(is_valid_session_code(&code), "bad code {code}");

    let ids: Vec<_> = contests.contests.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["spain", "germany"]);

    assert_eq!(snapshot.code, code);
    assert_eq!(snapshot.contest_id, "spain");
    assert_eq!(snapshot.slot_a.unwrap().name, "Alice");
    assert!(snapshot.slot_b.is_none());
    assert!(!snapshot.started);
}

#[tokio::test]
async fn join_existing_session_broadcasts_to_both() {
    let server = TestServer::new().await;
    let (mut host, code) = ws_create_session(&server, "Alice").await;

    let mut guest = ws_connect(&server.ws_url()).await;
    let (join, _, guest_view) = ws_join_ok(&mut guest, &code.to_lowercase(), "Bob").await;
    assert_eq!(join.slot, Some(Slot::B));
    assert_eq!(join.code.as_deref(), Some(code.as_str()));
    assert_eq!(guest_view.slot_b.as_ref().unwrap().name, "Bob");

    let host_view = ws_read_snapshot(&mut host).await;
    assert_eq!(host_view, guest_view);
}

#[tokio::test]
async fn blank_names_get_slot_defaults() {
    let server = TestServer::new().await;
    let (mut host, code) = ws_create_session(&server, "   ").await;
    let mut guest = ws_connect(&server.ws_url()).await;
    let (_, _, snapshot) = ws_join_ok(&mut guest, &code, "").await;
    assert_eq!(snapshot.slot_a.unwrap().name, "Player 1");
    assert_eq!(snapshot.slot_b.unwrap().name, "Player 2");
    let _ = ws_read_snapshot(&mut host).await;
}

#[tokio::test]
async fn join_nonexistent_session() {
    let server = TestServer::new().await;
    let mut stream = ws_connect(&server.ws_url()).await;
    let resp = ws_join(&mut stream, "ZZZZZ", "Bob").await;
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("Session not found"));
    assert!(resp.code.is_none());
}

#[tokio::test]
async fn join_malformed_code() {
    let server = TestServer::new().await;
    let mut stream = ws_connect(&server.ws_url()).await;
    let resp = ws_join(&mut stream, "AB1O", "Bob").await;
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("Invalid session code"));
}

#[tokio::test]
async fn join_full_session() {
    let server = TestServer::new().await;
    let (_host, _guest, code) = ws_full_session(&server).await;

    let mut third = ws_connect(&server.ws_url()).await;
    let resp = ws_join(&mut third, &code, "Carol").await;
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("Session is full"));
}

#[tokio::test]
async fn invalid_player_name_rejected() {
    let server = TestServer::new().await;
    let mut stream = ws_connect(&server.ws_url()).await;
    let resp = ws_join(&mut stream, "", &"x".repeat(40)).await;
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("Invalid player name"));

    let mut stream = ws_connect(&server.ws_url()).await;
    let resp = ws_join(&mut stream, "", "Bad\nName").await;
    assert_eq!(resp.error.as_deref(), Some("Invalid player name"));
}

#[tokio::test]
async fn protocol_version_mismatch_rejected() {
    let server = TestServer::new().await;
    let mut stream = ws_connect(&server.ws_url()).await;
    let msg = ClientMessage::JoinSession(JoinSessionMsg {
        code: String::new(),
        player_name: "Alice".to_string(),
        protocol_version: 99,
    });
    ws_send_client_msg(&mut stream, &msg).await;
    match ws_read_server_msg(&mut stream).await {
        ServerMessage::JoinResponse(resp) => {
            assert!(!resp.success);
            assert!(
                resp.error
                    .as_deref()
                    .is_some_and(|e| e.starts_with("Protocol version mismatch"))
            );
        },
        other => panic!("Expected JoinResponse, got: {other:?}"),
    }
}

#[tokio::test]
async fn first_frame_must_be_join() {
    let server = TestServer::new().await;
    let mut stream = ws_connect(&server.ws_url()).await;
    ws_send_client_msg(&mut stream, &ClientMessage::StartGame(StartGameMsg {})).await;
    ws_expect_closed(&mut stream).await;
}

#[tokio::test]
async fn start_requires_two_participants() {
    let server = TestServer::new().await;
    let (mut host, _code) = ws_create_session(&server, "Alice").await;
    ws_send_client_msg(&mut host, &ClientMessage::StartGame(StartGameMsg {})).await;
    assert!(ws_try_read_raw(&mut host, 200).await.is_none());
}

#[tokio::test]
async fn guess_flow_with_surname_and_duplicate() {
    let server = TestServer::new().await;
    let (mut host, mut guest, _code) = ws_full_session(&server).await;

    ws_send_client_msg(&mut host, &ClientMessage::StartGame(StartGameMsg {})).await;
    let started = ws_read_snapshot(&mut host).await;
    assert!(started.started);
    assert_eq!(started.turn, Slot::A);
    assert_eq!(ws_read_snapshot(&mut guest).await, started);

    // Surname-only guess resolves to the full starter name.
    ws_submit_guess(&mut host, "alonso").await;
    let snap = ws_read_snapshot(&mut host).await;
    assert_eq!(snap.correct_a, ["Xabi Alonso"]);
    assert_eq!(snap.turn, Slot::B);
    let _ = ws_read_snapshot(&mut guest).await;

    // "Xabi" is not a key for Xavi or for Xabi Alonso.
    ws_submit_guess(&mut guest, "Xabi").await;
    let snap = ws_read_snapshot(&mut guest).await;
    assert_eq!(snap.strikes_b, 1);
    assert_eq!(snap.last_error, Some(GuessError::NotOnRoster));
    assert_eq!(snap.turn, Slot::A);
    let _ = ws_read_snapshot(&mut host).await;

    ws_submit_guess(&mut host, "Xavi").await;
    let _ = ws_read_snapshot(&mut host).await;
    let _ = ws_read_snapshot(&mut guest).await;

    // Already said by the other side.
    ws_submit_guess(&mut guest, "XAVI").await;
    let snap = ws_read_snapshot(&mut guest).await;
    assert_eq!(snap.strikes_b, 2);
    assert_eq!(snap.last_error, Some(GuessError::Duplicate));
    assert_eq!(snap.correct_a, ["Xabi Alonso", "Xavi"]);
    assert!(snap.correct_b.is_empty());
    assert_eq!(ws_read_snapshot(&mut host).await, snap);
}

#[tokio::test]
async fn alias_spelling_counts_as_duplicate() {
    let server = TestServer::new().await;
    let (mut host, mut guest, _code) = ws_full_session(&server).await;

    let select = ClientMessage::SelectContest(SelectContestMsg {
        contest_id: "germany".to_string(),
    });
    ws_send_client_msg(&mut guest, &select).await;
    assert_eq!(ws_read_snapshot(&mut host).await.contest_id, "germany");
    let _ = ws_read_snapshot(&mut guest).await;

    ws_send_client_msg(&mut host, &ClientMessage::StartGame(StartGameMsg {})).await;
    let _ = ws_read_snapshot(&mut host).await;
    let _ = ws_read_snapshot(&mut guest).await;

    ws_submit_guess(&mut host, "Özil").await;
    assert_eq!(ws_read_snapshot(&mut host).await.correct_a, ["Ozil"]);
    let _ = ws_read_snapshot(&mut guest).await;

    ws_submit_guess(&mut guest, "Oezil").await;
    let snap = ws_read_snapshot(&mut guest).await;
    assert_eq!(snap.last_error, Some(GuessError::Duplicate));
    assert_eq!(snap.strikes_b, 1);
}

#[tokio::test]
async fn out_of_turn_guess_ignored() {
    let server = TestServer::new().await;
    let (mut host, mut guest, _code) = ws_full_session(&server).await;

    ws_send_client_msg(&mut host, &ClientMessage::StartGame(StartGameMsg {})).await;
    let _ = ws_read_snapshot(&mut host).await;
    let _ = ws_read_snapshot(&mut guest).await;

    ws_submit_guess(&mut guest, "Iniesta").await;
    assert!(ws_try_read_raw(&mut host, 200).await.is_none());

    ws_submit_guess(&mut host, "Iniesta").await;
    let snap = ws_read_snapshot(&mut guest).await;
    assert_eq!(snap.correct_a, ["Iniesta"]);
    assert!(snap.correct_b.is_empty());
}

#[tokio::test]
async fn select_contest_ignored_after_start_and_reset_reopens_lobby() {
    let server = TestServer::new().await;
    let (mut host, mut guest, _code) = ws_full_session(&server).await;

    ws_send_client_msg(&mut host, &ClientMessage::StartGame(StartGameMsg {})).await;
    let _ = ws_read_snapshot(&mut host).await;
    let _ = ws_read_snapshot(&mut guest).await;

    let select = ClientMessage::SelectContest(SelectContestMsg {
        contest_id: "germany".to_string(),
    });
    ws_send_client_msg(&mut host, &select).await;
    assert!(ws_try_read_raw(&mut host, 200).await.is_none());

    ws_send_client_msg(&mut guest, &ClientMessage::ResetGame(ResetGameMsg {})).await;
    let snap = ws_read_snapshot(&mut host).await;
    assert!(!snap.started);
    assert_eq!(snap.contest_id, "spain");
    let _ = ws_read_snapshot(&mut guest).await;

    ws_send_client_msg(&mut host, &select).await;
    assert_eq!(ws_read_snapshot(&mut guest).await.contest_id, "germany");
}

#[tokio::test]
async fn guest_disconnect_vacates_slot() {
    let server = TestServer::new().await;
    let (mut host, guest, code) = ws_full_session(&server).await;

    drop(guest);
    let snap = ws_read_snapshot(&mut host).await;
    assert_eq!(snap.code, code);
    assert!(snap.slot_b.is_none());
    assert_eq!(snap.slot_a.unwrap().name, "Alice");
}

#[tokio::test]
async fn leave_session_closes_connection() {
    let server = TestServer::new().await;
    let (mut host, mut guest, _code) = ws_full_session(&server).await;

    ws_send_client_msg(&mut guest, &ClientMessage::LeaveSession(LeaveSessionMsg {})).await;
    ws_expect_closed(&mut guest).await;
    assert!(ws_read_snapshot(&mut host).await.slot_b.is_none());
}

#[tokio::test]
async fn rate_limited_frames_are_dropped() {
    let config = ServerConfig {
        limits: LimitsConfig {
            ws_rate_limit_per_sec: 1.0,
            ..LimitsConfig::default()
        },
        ..ServerConfig::default()
    };
    let server = TestServer::from_config(config).await;
    let (mut host, _code) = ws_create_session(&server, "Alice").await;

    let select = |id: &str| {
        ClientMessage::SelectContest(SelectContestMsg {
            contest_id: id.to_string(),
        })
    };
    ws_send_client_msg(&mut host, &select("germany")).await;
    ws_send_client_msg(&mut host, &select("spain")).await;

    assert_eq!(ws_read_snapshot(&mut host).await.contest_id, "germany");
    assert!(ws_try_read_raw(&mut host, 200).await.is_none());
}

#[tokio::test]
async fn connection_limit_rejects_upgrade() {
    let config = ServerConfig {
        limits: LimitsConfig {
            max_ws_connections: 1,
            ..LimitsConfig::default()
        },
        ..ServerConfig::default()
    };
    let server = TestServer::from_config(config).await;
    let (_host, _code) = ws_create_session(&server, "Alice").await;

    let result = tokio_tungstenite::connect_async(server.ws_url()).await;
    assert!(result.is_err(), "Second connection should be refused");
}
