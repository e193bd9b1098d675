//! Action correlation: ID assignment, pending replies and the held queue

use crate::{
    command::Action,
    error::{AmiError, AmiResult},
    message::AmiMessage,
};
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::oneshot;

pub(crate) type ReplySender = oneshot::Sender<AmiResult<AmiMessage>>;

/// Millisecond timestamp, the default correlation ID.
pub(crate) fn timestamp_id() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string()
}

/// Pick a correlation ID that `taken` does not already claim.
///
/// Starts from the requested ID (or a timestamp) and appends random decimal
/// digits until it is free.
pub(crate) fn unique_action_id(requested: Option<String>, taken: impl Fn(&str) -> bool) -> String {
    let mut id = requested.unwrap_or_else(timestamp_id);
    let mut rng = rand::thread_rng();
    while taken(&id) {
        let digit: u8 = rng.gen_range(0..9);
        id.push(char::from(b'0' + digit));
    }
    id
}

/// Outstanding actions awaiting their response, keyed by ActionID.
///
/// Each entry is one-shot: it is removed when its response is delivered.
#[derive(Debug, Default)]
pub(crate) struct CorrelationTable {
    pending: HashMap<String, ReplySender>,
}

impl CorrelationTable {
    /// Register a reply slot. A previous slot under the same ID is returned.
    pub fn insert(&mut self, id: String, reply: ReplySender) -> Option<ReplySender> {
        self.pending
            .insert(id, reply)
    }

    pub fn take(&mut self, id: &str) -> Option<ReplySender> {
        self.pending
            .remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pending
            .contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pending
            .len()
    }

    pub fn drain(&mut self) -> Vec<ReplySender> {
        self.pending
            .drain()
            .map(|(_, reply)| reply)
            .collect()
    }
}

/// An action deferred until login succeeds.
#[derive(Debug)]
pub(crate) struct HeldAction {
    pub id: String,
    pub action: Action,
    pub reply: ReplySender,
}

/// Actions deferred until authentication, in submission order.
#[derive(Debug, Default)]
pub(crate) struct HeldQueue {
    queue: VecDeque<HeldAction>,
}

impl HeldQueue {
    pub fn push(&mut self, held: HeldAction) {
        self.queue
            .push_back(held);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.queue
            .iter()
            .any(|h| h.id == id)
    }

    pub fn len(&self) -> usize {
        self.queue
            .len()
    }

    /// Empty the queue, oldest first.
    pub fn take_all(&mut self) -> Vec<HeldAction> {
        self.queue
            .drain(..)
            .collect()
    }
}

/// Handle to a dispatched action.
///
/// Resolves with the correlated response once it arrives. A `Response: Error`
/// reply resolves to [`AmiError::ActionFailed`]; loss of the connection before
/// a reply resolves to [`AmiError::ConnectionClosed`].
///
/// Dropping the handle does not cancel the action; the response is then
/// discarded when it arrives.
#[derive(Debug)]
#[must_use = "a PendingAction does nothing unless awaited; drop it to ignore the response"]
pub struct PendingAction {
    id: String,
    rx: oneshot::Receiver<AmiResult<AmiMessage>>,
}

impl PendingAction {
    pub(crate) fn new(id: String, rx: oneshot::Receiver<AmiResult<AmiMessage>>) -> Self {
        Self { id, rx }
    }

    /// The correlation ID assigned to the action.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Future for PendingAction {
    type Output = AmiResult<AmiMessage>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(AmiError::ConnectionClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}
