//! Publish/subscribe registry behind [`Channel`] subscriptions

use crate::{message::AmiMessage, router::Channel};
use futures_util::Stream;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::trace;

/// What a subscriber receives.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Notification {
    /// The transport connected.
    Connect,
    /// The transport closed.
    Close,
    /// The server ended the stream.
    End,
    /// A transport error, as text.
    Error(String),
    /// An inbound item.
    Message(AmiMessage),
}

impl Notification {
    /// The carried item, for [`Notification::Message`].
    pub fn into_message(self) -> Option<AmiMessage> {
        match self {
            Notification::Message(m) => Some(m),
            _ => None,
        }
    }
}

/// Channel name to subscriber set.
///
/// Delivery goes through unbounded queues, so publishing never blocks the
/// reader task and a subscriber always observes notifications in the order
/// they were published. Subscribers whose receiving end is gone are pruned on
/// the next publish to their channel.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    listeners: Mutex<HashMap<Channel, Vec<mpsc::UnboundedSender<Notification>>>>,
}

impl Registry {
    pub fn subscribe(&self, channel: Channel) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners
            .lock()
            .entry(channel.clone())
            .or_default()
            .push(tx);
        Subscription { channel, rx }
    }

    pub fn publish(&self, channel: &Channel, notification: Notification) {
        let mut listeners = self
            .listeners
            .lock();
        let Some(senders) = listeners.get_mut(channel) else {
            trace!("No listeners on {}", channel);
            return;
        };
        senders.retain(|tx| {
            tx.send(notification.clone())
                .is_ok()
        });
        if senders.is_empty() {
            listeners.remove(channel);
        }
    }

    #[cfg(test)]
    pub fn listener_count(&self, channel: &Channel) -> usize {
        self.listeners
            .lock()
            .get(channel)
            .map_or(0, |senders| {
                senders
                    .iter()
                    .filter(|tx| !tx.is_closed())
                    .count()
            })
    }
}

/// Receiving end of a channel subscription (!Clone).
///
/// Yields `None` once the client that issued it has been dropped.
pub struct Subscription {
    channel: Channel,
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .finish()
    }
}

impl Subscription {
    /// The channel this subscription listens on.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Receive the next notification.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx
            .recv()
            .await
    }

    /// Receive the next inbound item, skipping lifecycle notifications.
    pub async fn recv_message(&mut self) -> Option<AmiMessage> {
        while let Some(notification) = self.recv().await {
            if let Notification::Message(message) = notification {
                return Some(message);
            }
        }
        None
    }

    /// Take a queued notification without waiting.
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.rx
            .try_recv()
            .ok()
    }
}

impl Stream for Subscription {
    type Item = Notification;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx
            .poll_recv(cx)
    }
}
