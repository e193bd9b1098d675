//! Connection management for AMI

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::{
    command::Action,
    constants::{DEFAULT_RECONNECT_DELAY_MS, DEFAULT_TIMEOUT_MS, SOCKET_BUF_SIZE},
    correlation::{unique_action_id, CorrelationTable, HeldAction, HeldQueue, PendingAction, ReplySender},
    error::{AmiError, AmiResult},
    headers::ResponseStatus,
    message::AmiMessage,
    protocol::AmiParser,
    registry::{Notification, Registry, Subscription},
    router::{classify, Channel, Route},
};

/// Session state of an AMI client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConnectionStatus {
    /// No transport.
    Disconnected,
    /// TCP connect in progress.
    Connecting,
    /// Transport open, not logged in. Only `Login` goes out; other actions are held.
    Connected,
    /// Logged in. Actions go straight to the wire.
    Authenticated,
}

impl ConnectionStatus {
    /// `true` once the transport is open.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            ConnectionStatus::Connected | ConnectionStatus::Authenticated
        )
    }
}

/// Options for AMI connection configuration.
///
/// Use [`Default::default()`] for standard settings.
#[derive(Debug, Clone)]
pub struct AmiConnectOptions {
    /// Upper bound on the TCP connect. Default: 2s.
    pub connect_timeout: Duration,
    /// Delay before a keep-alive reconnect when none is given. Default: 5s.
    pub reconnect_delay: Duration,
}

impl Default for AmiConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        }
    }
}

/// Manager account credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    /// Manager user name.
    pub username: String,
    /// Manager secret.
    pub secret: String,
    /// Ask the server to send events on this session.
    pub events: bool,
}

impl LoginCredentials {
    /// Credentials with events turned on.
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
            events: true,
        }
    }

    /// Set whether the session should receive events.
    pub fn with_events(mut self, events: bool) -> Self {
        self.events = events;
        self
    }

    fn to_action(&self) -> Action {
        Action::login(&self.username, &self.secret, self.events)
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .field("events", &self.events)
            .finish()
    }
}

/// Establish a TCP connection with a timeout.
async fn tcp_connect_with_timeout(
    host: &str,
    port: u16,
    connect_timeout: Duration,
) -> AmiResult<TcpStream> {
    match timeout(connect_timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(s)) => {
            debug!("[CONNECT] TCP connection established");
            Ok(s)
        }
        Ok(Err(e)) => {
            warn!("[CONNECT] TCP connect failed: {}", e);
            Err(AmiError::Io(e))
        }
        Err(_) => {
            let timeout_ms = connect_timeout.as_millis() as u64;
            warn!("[CONNECT] TCP connect timed out after {}ms", timeout_ms);
            Err(AmiError::Timeout { timeout_ms })
        }
    }
}

/// Live connection: the write queue and the two tasks serving it.
struct Transport {
    writer_tx: mpsc::UnboundedSender<String>,
    writer_task: JoinHandle<()>,
    reader_task: JoinHandle<()>,
}

/// Everything that belongs to one session. Guarded by one mutex that is
/// never held across an await.
struct SessionState {
    status: ConnectionStatus,
    /// Bumped on every connect and disconnect; tasks from an older
    /// generation must not touch the current transport.
    generation: u64,
    transport: Option<Transport>,
    correlation: CorrelationTable,
    held: HeldQueue,
    last_action_id: Option<String>,
    reconnect_task: Option<JoinHandle<()>>,
    greeting: Option<String>,
    /// Closes when the connect attempt in flight settles.
    connect_done: Option<watch::Receiver<()>>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            generation: 0,
            transport: None,
            correlation: CorrelationTable::default(),
            held: HeldQueue::default(),
            last_action_id: None,
            reconnect_task: None,
            greeting: None,
            connect_done: None,
        }
    }

    fn next_action_id(&self, requested: Option<String>) -> String {
        unique_action_id(requested, |id| {
            self.correlation
                .contains(id)
                || self
                    .held
                    .contains(id)
        })
    }

    /// Hold, write or fail one action.
    fn submit(&mut self, id: String, action: Action, reply: ReplySender) {
        if self.status != ConnectionStatus::Authenticated && !action.is_login() {
            debug!("[HOLD] Action {} held until login", id);
            self.held
                .push(HeldAction { id, action, reply });
            return;
        }

        let Some(transport) = self
            .transport
            .as_ref()
        else {
            warn!("No connection, cannot send action {}", id);
            let _ = reply.send(Err(AmiError::NotConnected));
            return;
        };

        let wire = match action.to_wire_format(&id) {
            Ok(wire) => wire,
            Err(e) => {
                let _ = reply.send(Err(e));
                return;
            }
        };

        debug!("[SEND] {} {:?}", id, action);
        if transport
            .writer_tx
            .send(wire)
            .is_err()
        {
            let _ = reply.send(Err(AmiError::ConnectionClosed));
            return;
        }

        if self
            .correlation
            .insert(id.clone(), reply)
            .is_some()
        {
            warn!("ActionID {} reused while still pending", id);
        }
        self.last_action_id = Some(id);
    }

    /// Resubmit every held action, oldest first.
    fn flush_held(&mut self) {
        for held in self
            .held
            .take_all()
        {
            let id = unique_action_id(Some(held.id), |id| {
                self.correlation
                    .contains(id)
            });
            self.submit(id, held.action, held.reply);
        }
    }
}

/// Shared between every [`AmiClient`] clone and the background tasks.
struct SharedState {
    session: Mutex<SessionState>,
    registry: Registry,
    options: AmiConnectOptions,
}

impl SharedState {
    fn publish(&self, channel: Channel, notification: Notification) {
        self.registry
            .publish(&channel, notification);
    }

    /// Deliver one parsed item: complete the pending action it answers and
    /// publish it on its channels, in classification order.
    fn route(&self, item: AmiMessage) {
        if item.status() == Some(ResponseStatus::Goodbye) {
            info!("[RECV] Server ended the session: {}", item.message().unwrap_or("Goodbye"));
        }
        let deliveries: Vec<(Route, Option<ReplySender>)> = {
            let mut session = self
                .session
                .lock();
            let routes = classify(
                &item,
                session
                    .last_action_id
                    .as_deref(),
            );
            routes
                .into_iter()
                .map(|route| {
                    let reply = match &route {
                        Route::Reply { id, .. } => session
                            .correlation
                            .take(id),
                        Route::Publish(_) => None,
                    };
                    (route, reply)
                })
                .collect()
        };

        for (route, reply) in deliveries {
            match route {
                Route::Reply { id, failed } => {
                    match reply {
                        Some(tx) => {
                            let result = if failed {
                                Err(AmiError::action_failed(item.clone()))
                            } else {
                                Ok(item.clone())
                            };
                            let _ = tx.send(result);
                        }
                        None => trace!("[RECV] No pending action for ActionID {}", id),
                    }
                    self.publish(Channel::Action(id), Notification::Message(item.clone()));
                }
                Route::Publish(channel) => {
                    self.publish(channel, Notification::Message(item.clone()));
                }
            }
        }
    }

    /// The transport of `generation` is gone: fail what it owed and announce it.
    fn transport_closed(&self, generation: u64) {
        let pending = {
            let mut session = self
                .session
                .lock();
            if session.generation != generation
                || session
                    .transport
                    .is_none()
            {
                return;
            }
            session.transport = None;
            session.status = ConnectionStatus::Disconnected;
            session
                .correlation
                .drain()
        };

        if !pending.is_empty() {
            debug!("Failing {} pending actions", pending.len());
        }
        for reply in pending {
            let _ = reply.send(Err(AmiError::ConnectionClosed));
        }
        self.publish(Channel::Close, Notification::Close);
    }
}

/// Background reader loop
async fn reader_loop(reader: OwnedReadHalf, shared: Arc<SharedState>, generation: u64) {
    let result = std::panic::AssertUnwindSafe(reader_loop_inner(reader, &shared, generation));
    if futures_util::FutureExt::catch_unwind(result)
        .await
        .is_err()
    {
        tracing::error!("reader task panicked");
        shared.publish(
            Channel::Error,
            Notification::Error("reader task panicked".to_string()),
        );
    }
    shared.transport_closed(generation);
}

async fn reader_loop_inner(mut reader: OwnedReadHalf, shared: &SharedState, generation: u64) {
    let mut parser = AmiParser::new();
    let mut read_buffer = vec![0u8; SOCKET_BUF_SIZE];
    let mut greeting_recorded = false;

    loop {
        let n = match reader
            .read(&mut read_buffer)
            .await
        {
            Ok(0) => {
                info!("Connection closed (EOF)");
                shared.publish(Channel::End, Notification::End);
                return;
            }
            Ok(n) => n,
            Err(e) => {
                warn!("Read error: {}", e);
                shared.publish(Channel::Error, Notification::Error(e.to_string()));
                return;
            }
        };

        trace!("[RECV] Read {} bytes from socket", n);
        let items = match parser.feed(&read_buffer[..n]) {
            Ok(items) => items,
            Err(e) => {
                warn!("Parser error: {}", e);
                shared.publish(Channel::Error, Notification::Error(e.to_string()));
                return;
            }
        };

        if !greeting_recorded {
            if let Some(greeting) = parser.greeting() {
                info!("[CONNECT] Server greeting: {}", greeting);
                let mut session = shared
                    .session
                    .lock();
                if session.generation == generation {
                    session.greeting = Some(greeting.to_string());
                }
                greeting_recorded = true;
            }
        }

        for item in items {
            shared.route(item);
        }
    }
}

/// Background writer loop: drains queued action blocks into the socket.
///
/// Ends with a graceful shutdown of the write half once the queue is closed.
async fn writer_loop(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<String>,
    shared: Weak<SharedState>,
) {
    while let Some(block) = rx
        .recv()
        .await
    {
        if let Err(e) = writer
            .write_all(block.as_bytes())
            .await
        {
            warn!("Write error: {}", e);
            if let Some(shared) = shared.upgrade() {
                shared.publish(Channel::Error, Notification::Error(e.to_string()));
            }
            return;
        }
    }
    debug!("Write queue closed, shutting down write half");
    let _ = writer
        .shutdown()
        .await;
}

/// Where and how a keep-alive reconnects.
struct ReconnectTarget {
    host: String,
    port: u16,
    credentials: LoginCredentials,
    delay: Duration,
}

async fn reconnect_loop(
    shared: Weak<SharedState>,
    target: ReconnectTarget,
    mut closes: Subscription,
    attempt_now: bool,
) {
    let mut attempt = attempt_now;
    loop {
        if !attempt {
            if closes
                .recv()
                .await
                .is_none()
            {
                return;
            }
            debug!(
                "[RECONNECT] Connection closed, retrying in {}ms",
                target
                    .delay
                    .as_millis()
            );
            tokio::time::sleep(target.delay).await;
        }

        let Some(shared) = shared.upgrade() else {
            return;
        };
        let client = AmiClient { shared };
        let result = client
            .reestablish(&target)
            .await;
        // Closes from attempts that have already been superseded. A close of
        // the new session after this point stays queued for the next recv.
        while closes
            .try_recv()
            .is_some()
        {}
        let connected = client.is_connected();
        drop(client);

        match result {
            Ok(()) if connected => {
                info!("[RECONNECT] Session re-established");
                attempt = false;
                continue;
            }
            Ok(()) => debug!("[RECONNECT] Session closed right after login"),
            Err(e) => warn!(
                "[RECONNECT] Attempt to {}:{} failed: {}",
                target.host, target.port, e
            ),
        }

        attempt = true;
        tokio::time::sleep(target.delay).await;
    }
}

/// Settles one connect attempt: wakes callers waiting on it and, if the
/// attempt was abandoned midway, puts the session back to `Disconnected`.
struct ConnectAttempt<'a> {
    shared: &'a SharedState,
    generation: u64,
    _done: watch::Sender<()>,
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        let mut session = self
            .shared
            .session
            .lock();
        if session.generation == self.generation {
            session.connect_done = None;
            if session.status == ConnectionStatus::Connecting {
                session.status = ConnectionStatus::Disconnected;
            }
        }
    }
}

/// AMI client handle (Clone + Send)
///
/// All clones share one session. Actions are queued to a writer task; a
/// reader task parses the inbound stream and completes the matching
/// [`PendingAction`]s and subscriptions.
#[derive(Clone)]
pub struct AmiClient {
    shared: Arc<SharedState>,
}

impl std::fmt::Debug for AmiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmiClient")
            .field("status", &self.status())
            .finish()
    }
}

impl Default for AmiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AmiClient {
    /// Create a disconnected client with default options.
    pub fn new() -> Self {
        Self::with_options(AmiConnectOptions::default())
    }

    /// Create a disconnected client with custom options.
    pub fn with_options(options: AmiConnectOptions) -> Self {
        Self {
            shared: Arc::new(SharedState {
                session: Mutex::new(SessionState::new()),
                registry: Registry::default(),
                options,
            }),
        }
    }

    /// Open the TCP session.
    ///
    /// Returns immediately if a connection is already open. If another call
    /// is opening one, waits for that attempt and shares its outcome: `Ok`
    /// once the transport is open, [`AmiError::NotConnected`] otherwise.
    /// A fresh connection starts unauthenticated.
    pub async fn connect(&self, host: &str, port: u16) -> AmiResult<()> {
        let (done_tx, done_rx) = watch::channel(());
        let claimed = {
            let mut session = self
                .shared
                .session
                .lock();
            let status = session.status;
            match status {
                status if status.is_open() => {
                    debug!("[CONNECT] Already {:?}, nothing to do", status);
                    return Ok(());
                }
                ConnectionStatus::Connecting => match session
                    .connect_done
                    .clone()
                {
                    Some(in_flight) => Err(in_flight),
                    None => return Err(AmiError::NotConnected),
                },
                _ => {
                    session.status = ConnectionStatus::Connecting;
                    session.generation += 1;
                    session.connect_done = Some(done_rx);
                    Ok(session.generation)
                }
            }
        };

        let generation = match claimed {
            Ok(generation) => generation,
            Err(mut in_flight) => {
                debug!("[CONNECT] Waiting for the connect attempt in flight");
                let _ = in_flight
                    .changed()
                    .await;
                return if self
                    .status()
                    .is_open()
                {
                    Ok(())
                } else {
                    Err(AmiError::NotConnected)
                };
            }
        };
        let _attempt = ConnectAttempt {
            shared: self
                .shared
                .as_ref(),
            generation,
            _done: done_tx,
        };

        info!("Connecting to Asterisk at {}:{}", host, port);
        let connected = tcp_connect_with_timeout(
            host,
            port,
            self.shared
                .options
                .connect_timeout,
        )
        .await;
        let stream = match connected {
            Ok(stream) => stream,
            Err(e) => {
                {
                    let mut session = self
                        .shared
                        .session
                        .lock();
                    if session.generation == generation {
                        session.status = ConnectionStatus::Disconnected;
                    }
                }
                self.shared
                    .publish(Channel::Error, Notification::Error(e.to_string()));
                return Err(e);
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!("[CONNECT] Could not set TCP_NODELAY: {}", e);
        }
        let (read_half, write_half) = stream.into_split();

        let mut session = self
            .shared
            .session
            .lock();
        if session.generation != generation {
            debug!("[CONNECT] Disconnected while connecting, dropping socket");
            return Err(AmiError::ConnectionClosed);
        }

        let (writer_tx, writer_rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(writer_loop(
            write_half,
            writer_rx,
            Arc::downgrade(&self.shared),
        ));
        let reader_task = tokio::spawn(reader_loop(read_half, self.shared.clone(), generation));
        session.transport = Some(Transport {
            writer_tx,
            writer_task,
            reader_task,
        });
        session.status = ConnectionStatus::Connected;
        session.greeting = None;

        // Published under the session lock so it precedes anything the reader routes.
        self.shared
            .publish(Channel::Connect, Notification::Connect);
        info!("Connected to Asterisk at {}:{}", host, port);
        Ok(())
    }

    /// [`connect`](Self::connect), then [`login`](Self::login) when
    /// credentials are given.
    ///
    /// Returns the login response, or `None` when no credentials were passed.
    pub async fn connect_and_login(
        &self,
        host: &str,
        port: u16,
        credentials: Option<&LoginCredentials>,
    ) -> AmiResult<Option<AmiMessage>> {
        self.connect(host, port)
            .await?;
        match credentials {
            Some(credentials) => self
                .login(credentials)
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    /// Log in, then release every held action in submission order.
    ///
    /// On rejection the session stays unauthenticated and held actions stay
    /// queued.
    pub async fn login(&self, credentials: &LoginCredentials) -> AmiResult<AmiMessage> {
        let generation = self
            .shared
            .session
            .lock()
            .generation;

        debug!("[AUTH] Logging in as {}", credentials.username);
        let response = match self
            .dispatch(credentials.to_action())
            .await
        {
            Ok(response) => response,
            Err(AmiError::ActionFailed { message, .. }) => {
                warn!("[AUTH] Login rejected: {}", message);
                return Err(AmiError::auth_failed(message));
            }
            Err(e) => return Err(e),
        };

        let mut session = self
            .shared
            .session
            .lock();
        if session.generation != generation
            || session
                .transport
                .is_none()
        {
            return Err(AmiError::ConnectionClosed);
        }
        session.status = ConnectionStatus::Authenticated;
        info!(
            "[AUTH] Authenticated as {}, releasing {} held actions",
            credentials.username,
            session
                .held
                .len()
        );
        session.flush_held();
        Ok(response)
    }

    /// Keep the session alive: reconnect and log in again whenever the
    /// connection closes, `delay` after the close (default from
    /// [`AmiConnectOptions::reconnect_delay`]).
    ///
    /// Idempotent: a second call while a keep-alive is armed does nothing.
    /// When no connection is open, an attempt is made right away. Failed
    /// attempts are retried every `delay` until one succeeds or
    /// [`disconnect`](Self::disconnect) is called.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn keep_connected(
        &self,
        host: impl Into<String>,
        port: u16,
        credentials: LoginCredentials,
        delay: Option<Duration>,
    ) {
        let mut session = self
            .shared
            .session
            .lock();
        if session
            .reconnect_task
            .is_some()
        {
            debug!("[RECONNECT] Keep-alive already armed");
            return;
        }

        let target = ReconnectTarget {
            host: host.into(),
            port,
            credentials,
            delay: delay.unwrap_or(
                self.shared
                    .options
                    .reconnect_delay,
            ),
        };
        let attempt_now = !session
            .status
            .is_open();
        let closes = self
            .shared
            .registry
            .subscribe(Channel::Close);

        debug!(
            "[RECONNECT] Armed for {}:{} (attempt now: {})",
            target.host, target.port, attempt_now
        );
        session.reconnect_task = Some(tokio::spawn(reconnect_loop(
            Arc::downgrade(&self.shared),
            target,
            closes,
            attempt_now,
        )));
    }

    async fn reestablish(&self, target: &ReconnectTarget) -> AmiResult<()> {
        self.connect(&target.host, target.port)
            .await?;
        self.login(&target.credentials)
            .await?;
        Ok(())
    }

    /// Send an action.
    ///
    /// The returned handle carries the assigned ActionID and resolves with the
    /// correlated response. Before login, non-login actions are held and
    /// written once login succeeds.
    ///
    /// The ActionID is the one requested with [`Action::action_id`], or the
    /// current millisecond timestamp; random digits are appended while it
    /// collides with an outstanding action.
    pub fn dispatch(&self, mut action: Action) -> PendingAction {
        let (tx, rx) = oneshot::channel();
        let mut session = self
            .shared
            .session
            .lock();
        let id = session.next_action_id(action.take_action_id());
        session.submit(id.clone(), action, tx);
        PendingAction::new(id, rx)
    }

    /// Send an action and wait for its response.
    ///
    /// ```rust,no_run
    /// # async fn example(client: &asterisk_ami_tokio::AmiClient) -> Result<(), asterisk_ami_tokio::AmiError> {
    /// use asterisk_ami_tokio::Action;
    /// let resp = client.action(Action::new("Ping")).await?;
    /// println!("{}", resp.get("ping").unwrap_or(""));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn action(&self, action: Action) -> AmiResult<AmiMessage> {
        self.dispatch(action)
            .await
    }

    /// Subscribe to a channel.
    pub fn subscribe(&self, channel: Channel) -> Subscription {
        self.shared
            .registry
            .subscribe(channel)
    }

    /// Subscribe to every event (`managerevent`).
    pub fn events(&self) -> Subscription {
        self.subscribe(Channel::ManagerEvent)
    }

    /// Close the session.
    ///
    /// Cancels the keep-alive, flushes queued writes and shuts the socket
    /// down. Every outstanding or held action resolves with
    /// [`AmiError::ConnectionClosed`]. Safe to call when not connected.
    pub async fn disconnect(&self) -> AmiResult<()> {
        let (transport, abandoned) = {
            let mut session = self
                .shared
                .session
                .lock();
            if let Some(task) = session
                .reconnect_task
                .take()
            {
                debug!("[RECONNECT] Keep-alive cancelled");
                task.abort();
            }
            session.status = ConnectionStatus::Disconnected;
            session.generation += 1;
            session.last_action_id = None;

            let mut abandoned = session
                .correlation
                .drain();
            abandoned.extend(
                session
                    .held
                    .take_all()
                    .into_iter()
                    .map(|held| held.reply),
            );
            (
                session
                    .transport
                    .take(),
                abandoned,
            )
        };

        for reply in abandoned {
            let _ = reply.send(Err(AmiError::ConnectionClosed));
        }

        if let Some(transport) = transport {
            info!("Client requested disconnect");
            transport
                .reader_task
                .abort();
            drop(transport.writer_tx);
            if let Err(e) = transport
                .writer_task
                .await
            {
                debug!("Writer task ended abnormally: {}", e);
            }
            self.shared
                .publish(Channel::Close, Notification::Close);
        }
        Ok(())
    }

    /// Whether the transport is open.
    pub fn is_connected(&self) -> bool {
        let session = self
            .shared
            .session
            .lock();
        session
            .status
            .is_open()
            && session
                .transport
                .as_ref()
                .is_some_and(|t| {
                    !t.writer_tx
                        .is_closed()
                })
    }

    /// Current session status snapshot.
    pub fn status(&self) -> ConnectionStatus {
        self.shared
            .session
            .lock()
            .status
    }

    /// Banner the server sent on the current connection.
    pub fn greeting(&self) -> Option<String> {
        self.shared
            .session
            .lock()
            .greeting
            .clone()
    }

    /// Actions waiting for login.
    pub fn held_action_count(&self) -> usize {
        self.shared
            .session
            .lock()
            .held
            .len()
    }

    /// Actions written and awaiting their response.
    pub fn pending_action_count(&self) -> usize {
        self.shared
            .session
            .lock()
            .correlation
            .len()
    }

    /// Whether a keep-alive is armed.
    pub fn is_reconnect_armed(&self) -> bool {
        self.shared
            .session
            .lock()
            .reconnect_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}
