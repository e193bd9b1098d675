//! Integration tests against an in-process mock AMI server.
//!
//! The mock speaks just enough AMI: it sends the banner, answers `Login`
//! (secret `secret`), `Ping`, `Command` (as a follows block without ActionID),
//! `UserEvent` (success plus the matching event), `Fail` (error response),
//! ignores `Silent`, and closes the socket on `Logoff` or `Drop`. User
//! `dropper` is logged in and then disconnected straight away.

use asterisk_ami_tokio::{
    Action, AmiClient, AmiConnectOptions, AmiError, AmiMessage, Channel, ConnectionStatus,
    LoginCredentials, Notification,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

type Received = Arc<Mutex<Vec<HashMap<String, String>>>>;

struct MockAmi {
    port: u16,
    received: Received,
    connections: Arc<Mutex<usize>>,
}

impl MockAmi {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let port = listener
            .local_addr()
            .unwrap()
            .port();
        let received: Received = Arc::default();
        let connections = Arc::new(Mutex::new(0));

        let rec = received.clone();
        let count = connections.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener
                .accept()
                .await
            {
                *count
                    .lock()
                    .unwrap() += 1;
                tokio::spawn(serve(stream, rec.clone()));
            }
        });

        Self {
            port,
            received,
            connections,
        }
    }

    /// `Action:` names received so far, in order.
    fn actions(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|a| a["action"].clone())
            .collect()
    }

    fn received(&self) -> Vec<HashMap<String, String>> {
        self.received
            .lock()
            .unwrap()
            .clone()
    }

    fn connection_count(&self) -> usize {
        *self
            .connections
            .lock()
            .unwrap()
    }
}

fn parse_block(block: &str) -> HashMap<String, String> {
    block
        .split("\r\n")
        .filter_map(|line| line.split_once(": "))
        .map(|(k, v)| (k.to_lowercase(), v.to_string()))
        .collect()
}

async fn serve(mut stream: TcpStream, received: Received) {
    if stream
        .write_all(b"Asterisk Call Manager/5.0.2\r\n")
        .await
        .is_err()
    {
        return;
    }

    let mut pending = String::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match stream
            .read(&mut buf)
            .await
        {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        pending.push_str(&String::from_utf8_lossy(&buf[..n]));

        while let Some(end) = pending.find("\r\n\r\n") {
            let block: String = pending
                .drain(..end + 4)
                .collect();
            let action = parse_block(&block);
            received
                .lock()
                .unwrap()
                .push(action.clone());

            let id = action
                .get("actionid")
                .cloned()
                .unwrap_or_default();
            let name = action
                .get("action")
                .map(|a| a.to_lowercase())
                .unwrap_or_default();
            let reply = match name.as_str() {
                "login" if action.get("username").map(String::as_str) == Some("dropper") => {
                    let _ = stream
                        .write_all(
                            format!("Response: Success\r\nActionID: {id}\r\nMessage: Authentication accepted\r\n\r\n")
                                .as_bytes(),
                        )
                        .await;
                    return;
                }
                "login" if action.get("secret").map(String::as_str) == Some("secret") => format!(
                    "Response: Success\r\nActionID: {id}\r\nMessage: Authentication accepted\r\n\r\n"
                ),
                "login" => format!(
                    "Response: Error\r\nActionID: {id}\r\nMessage: Authentication failed\r\n\r\n"
                ),
                "ping" => format!(
                    "Response: Success\r\nActionID: {id}\r\nPing: Pong\r\nTimestamp: 1700000000.000000\r\n\r\n"
                ),
                "command" => "Response: Follows\r\nPrivilege: Command\r\nSystem uptime: 1 hour\r\n\r\nLast reload: 1 hour\r\n--END COMMAND--\r\n\r\n".to_string(),
                "userevent" => format!(
                    "Response: Success\r\nActionID: {id}\r\n\r\nEvent: UserEvent\r\nPrivilege: user,all\r\nUserEvent: {}\r\n\r\n",
                    action
                        .get("userevent")
                        .cloned()
                        .unwrap_or_default()
                ),
                "fail" => format!(
                    "Response: Error\r\nActionID: {id}\r\nMessage: Invalid/unknown command\r\n\r\n"
                ),
                "logoff" => {
                    let _ = stream
                        .write_all(
                            format!("Response: Goodbye\r\nActionID: {id}\r\nMessage: Thanks for all the fish.\r\n\r\n")
                                .as_bytes(),
                        )
                        .await;
                    return;
                }
                "drop" => return,
                _ => String::new(),
            };
            if !reply.is_empty()
                && stream
                    .write_all(reply.as_bytes())
                    .await
                    .is_err()
            {
                return;
            }
        }
    }
}

fn credentials() -> LoginCredentials {
    LoginCredentials::new("admin", "secret")
}

async fn connected(server: &MockAmi) -> AmiClient {
    let client = AmiClient::new();
    client
        .connect("127.0.0.1", server.port)
        .await
        .unwrap();
    client
        .login(&credentials())
        .await
        .unwrap();
    client
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    timeout(WAIT, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_connect_login_ping() {
    let server = MockAmi::start().await;
    let client = AmiClient::new();
    let mut connects = client.subscribe(Channel::Connect);

    client
        .connect("127.0.0.1", server.port)
        .await
        .unwrap();
    assert!(client.is_connected());
    assert_eq!(client.status(), ConnectionStatus::Connected);
    assert_eq!(connects.recv().await, Some(Notification::Connect));

    let login = client
        .login(&credentials())
        .await
        .unwrap();
    assert_eq!(login.message(), Some("Authentication accepted"));
    assert_eq!(client.status(), ConnectionStatus::Authenticated);
    assert_eq!(
        client
            .greeting()
            .as_deref(),
        Some("Asterisk Call Manager/5.0.2")
    );

    let pending = client.dispatch(Action::new("Ping"));
    let id = pending
        .id()
        .to_string();
    let pong = timeout(WAIT, pending)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pong.get("Ping"), Some("Pong"));
    assert_eq!(pong.action_id(), Some(id.as_str()));
    assert_eq!(client.pending_action_count(), 0);

    let login_wire = &server.received()[0];
    assert_eq!(login_wire["username"], "admin");
    assert_eq!(login_wire["events"], "on");
}

#[tokio::test]
async fn test_connect_twice_is_noop() {
    let server = MockAmi::start().await;
    let client = connected(&server).await;
    client
        .connect("127.0.0.1", server.port)
        .await
        .unwrap();
    assert_eq!(client.status(), ConnectionStatus::Authenticated);
    assert_eq!(server.connection_count(), 1);
}

#[tokio::test]
async fn test_held_actions_flushed_in_order_after_login() {
    let server = MockAmi::start().await;
    let client = AmiClient::new();

    let first = client.dispatch(Action::new("Ping").action_id("a"));
    let second = client.dispatch(Action::new("Ping").action_id("b"));
    let third = client.dispatch(Action::new("UserEvent").field("UserEvent", "Held"));
    assert_eq!(client.held_action_count(), 3);

    client
        .connect("127.0.0.1", server.port)
        .await
        .unwrap();
    // Connected but not logged in: still nothing but Login may go out.
    assert_eq!(client.held_action_count(), 3);

    client
        .login(&credentials())
        .await
        .unwrap();
    assert_eq!(client.held_action_count(), 0);

    assert_eq!(
        timeout(WAIT, first)
            .await
            .unwrap()
            .unwrap()
            .action_id(),
        Some("a")
    );
    assert!(timeout(WAIT, second)
        .await
        .unwrap()
        .is_ok());
    assert!(timeout(WAIT, third)
        .await
        .unwrap()
        .is_ok());

    assert_eq!(server.actions(), ["Login", "Ping", "Ping", "UserEvent"]);
    let ids: Vec<String> = server
        .received()
        .iter()
        .skip(1)
        .take(2)
        .map(|a| a["actionid"].clone())
        .collect();
    assert_eq!(ids, ["a", "b"]);
}

#[tokio::test]
async fn test_login_rejected_keeps_held_actions() {
    let server = MockAmi::start().await;
    let client = AmiClient::new();
    let held = client.dispatch(Action::new("Ping"));

    client
        .connect("127.0.0.1", server.port)
        .await
        .unwrap();
    let result = client
        .login(&LoginCredentials::new("admin", "wrong"))
        .await;
    match result {
        Err(AmiError::AuthFailed { reason }) => assert_eq!(reason, "Authentication failed"),
        other => panic!("expected AuthFailed, got {:?}", other),
    }
    assert_eq!(client.status(), ConnectionStatus::Connected);
    assert_eq!(client.held_action_count(), 1);
    assert_eq!(server.actions(), ["Login"]);

    client
        .login(&credentials())
        .await
        .unwrap();
    assert!(timeout(WAIT, held)
        .await
        .unwrap()
        .is_ok());
}

#[tokio::test]
async fn test_error_response_fails_action() {
    let server = MockAmi::start().await;
    let client = connected(&server).await;
    let mut responses = client.subscribe(Channel::Response);

    match timeout(WAIT, client.action(Action::new("Fail")))
        .await
        .unwrap()
    {
        Err(AmiError::ActionFailed { message, response }) => {
            assert_eq!(message, "Invalid/unknown command");
            assert!(response.is_error());
        }
        other => panic!("expected ActionFailed, got {:?}", other),
    }

    let published = responses
        .recv_message()
        .await
        .unwrap();
    assert!(published.is_error());
}

#[tokio::test]
async fn test_follows_response_goes_to_last_action() {
    let server = MockAmi::start().await;
    let client = connected(&server).await;

    let output = timeout(
        WAIT,
        client.action(Action::new("Command").field("Command", "core show uptime")),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(output.response(), Some("follows"));
    assert_eq!(
        output.content(),
        Some("Response: Follows\nPrivilege: Command\nSystem uptime: 1 hour\n\nLast reload: 1 hour")
    );
}

#[tokio::test]
async fn test_user_event_fan_out() {
    let server = MockAmi::start().await;
    let client = connected(&server).await;
    let mut all = client.events();
    let mut by_name = client.subscribe(Channel::event("UserEvent"));
    let mut by_type = client.subscribe(Channel::user_event("Ping"));
    let mut other_type = client.subscribe(Channel::user_event("Pong"));

    timeout(
        WAIT,
        client.action(Action::new("UserEvent").field("UserEvent", "Ping")),
    )
    .await
    .unwrap()
    .unwrap();

    let a = timeout(WAIT, all.recv_message())
        .await
        .unwrap()
        .unwrap();
    let b = timeout(WAIT, by_name.recv_message())
        .await
        .unwrap()
        .unwrap();
    let c = timeout(WAIT, by_type.recv_message())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a.user_event(), Some("Ping"));
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert!(other_type
        .try_recv()
        .is_none());
}

#[tokio::test]
async fn test_action_channel_subscription() {
    let server = MockAmi::start().await;
    let client = connected(&server).await;
    let mut by_id = client.subscribe(Channel::action("watched"));

    timeout(WAIT, client.action(Action::new("Ping").action_id("watched")))
        .await
        .unwrap()
        .unwrap();
    let seen = timeout(WAIT, by_id.recv_message())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen.get("ping"), Some("Pong"));
}

#[tokio::test]
async fn test_disconnect_fails_pending_actions() {
    let server = MockAmi::start().await;
    let client = connected(&server).await;
    let mut closes = client.subscribe(Channel::Close);

    let silent = client.dispatch(Action::new("Silent"));
    wait_until(|| server.actions().len() == 2).await;
    assert_eq!(client.pending_action_count(), 1);

    client
        .disconnect()
        .await
        .unwrap();
    assert!(!client.is_connected());
    assert_eq!(client.status(), ConnectionStatus::Disconnected);
    assert!(matches!(
        timeout(WAIT, silent)
            .await
            .unwrap(),
        Err(AmiError::ConnectionClosed)
    ));
    assert_eq!(closes.recv().await, Some(Notification::Close));

    // Safe to repeat.
    client
        .disconnect()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_server_close_fails_pending_and_gates_again() {
    let server = MockAmi::start().await;
    let client = connected(&server).await;
    let mut ends = client.subscribe(Channel::End);
    let mut closes = client.subscribe(Channel::Close);

    let silent = client.dispatch(Action::new("Silent"));
    let _ = client.dispatch(Action::new("Drop"));

    assert!(matches!(
        timeout(WAIT, silent)
            .await
            .unwrap(),
        Err(AmiError::ConnectionClosed)
    ));
    assert_eq!(
        timeout(WAIT, ends.recv())
            .await
            .unwrap(),
        Some(Notification::End)
    );
    assert_eq!(
        timeout(WAIT, closes.recv())
            .await
            .unwrap(),
        Some(Notification::Close)
    );
    assert!(!client.is_connected());

    // Unauthenticated again: new actions are held, not lost.
    let later = client.dispatch(Action::new("Ping"));
    assert_eq!(client.held_action_count(), 1);
    drop(later);
}

#[tokio::test]
async fn test_keep_connected_reconnects_and_logs_in() {
    let server = MockAmi::start().await;
    let client = AmiClient::with_options(AmiConnectOptions {
        connect_timeout: Duration::from_secs(1),
        reconnect_delay: Duration::from_millis(50),
    });

    client.keep_connected("127.0.0.1", server.port, credentials(), None);
    client.keep_connected("127.0.0.1", server.port, credentials(), None);
    wait_until(|| client.status() == ConnectionStatus::Authenticated).await;
    assert_eq!(server.connection_count(), 1);

    let _ = client.dispatch(Action::new("Logoff"));
    wait_until(|| server.connection_count() == 2).await;
    wait_until(|| client.status() == ConnectionStatus::Authenticated).await;

    let pong: AmiMessage = timeout(WAIT, client.action(Action::new("Ping")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pong.get("ping"), Some("Pong"));

    client
        .disconnect()
        .await
        .unwrap();
    assert!(!client.is_reconnect_armed());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.connection_count(), 2);
}

#[tokio::test]
async fn test_concurrent_connects_open_one_session() {
    let server = MockAmi::start().await;
    let client = AmiClient::new();

    let (first, second) = tokio::join!(
        client.connect("127.0.0.1", server.port),
        async {
            let result = client
                .connect("127.0.0.1", server.port)
                .await;
            (result, client.is_connected())
        }
    );
    first.unwrap();
    let (second, open_when_returned) = second;
    second.unwrap();
    assert!(open_when_returned);
    assert_eq!(server.connection_count(), 1);

    // The second caller can log in straight away.
    client
        .login(&credentials())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_connect_and_login() {
    let server = MockAmi::start().await;
    let client = AmiClient::new();
    let login = client
        .connect_and_login("127.0.0.1", server.port, Some(&credentials()))
        .await
        .unwrap();
    assert_eq!(
        login
            .as_ref()
            .and_then(AmiMessage::message),
        Some("Authentication accepted")
    );
    assert_eq!(client.status(), ConnectionStatus::Authenticated);

    let anonymous = AmiClient::new();
    assert!(anonymous
        .connect_and_login("127.0.0.1", server.port, None)
        .await
        .unwrap()
        .is_none());
    assert_eq!(anonymous.status(), ConnectionStatus::Connected);
    assert_eq!(server.actions(), ["Login"]);
}

#[tokio::test]
async fn test_connect_and_login_rejected() {
    let server = MockAmi::start().await;
    let client = AmiClient::new();
    let result = client
        .connect_and_login(
            "127.0.0.1",
            server.port,
            Some(&LoginCredentials::new("admin", "wrong")),
        )
        .await;
    assert!(matches!(result, Err(AmiError::AuthFailed { .. })));
    assert!(client.is_connected());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_keep_connected_survives_close_right_after_login() {
    let server = MockAmi::start().await;
    let client = AmiClient::with_options(AmiConnectOptions {
        connect_timeout: Duration::from_secs(1),
        reconnect_delay: Duration::from_millis(20),
    });

    client.keep_connected(
        "127.0.0.1",
        server.port,
        LoginCredentials::new("dropper", "secret"),
        None,
    );
    wait_until(|| server.connection_count() >= 5).await;
    assert!(client.is_reconnect_armed());

    client
        .disconnect()
        .await
        .unwrap();
}
