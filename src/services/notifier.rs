// src/services/notifier.rs
//! Revalidation signals for credential observers.
//!
//! After every successful mutation the credential store publishes a
//! [`Revalidation`] key. Observers subscribe either to everything or to one
//! key and re-fetch when signalled. There is no global registry: each store
//! owns its [`Notifier`] and subscriptions are plain values. Dropping a
//! [`Subscription`] unsubscribes.

use crate::models::credential::LIST_KEY;
use log::debug;
use std::fmt;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Default number of buffered signals per subscriber.
pub const DEFAULT_CAPACITY: usize = 64;

/// Key identifying what an observer should re-fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Revalidation {
    /// A single credential record, by storage key
    Credential(String),
    /// The query enumerating all credentials through the key list
    CredentialList,
}

impl fmt::Display for Revalidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revalidation::Credential(key) => f.write_str(key),
            Revalidation::CredentialList => write!(f, "getCredentials:{LIST_KEY}"),
        }
    }
}

/// Publisher side of the revalidation channel.
///
/// Publishing never fails. With no subscribers the signal is dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Revalidation>,
}

impl Default for Notifier {
    fn default() -> Self {
        Notifier::new(DEFAULT_CAPACITY)
    }
}

impl Notifier {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Notifier { sender }
    }

    pub fn notify(&self, key: Revalidation) {
        debug!("revalidate {key}");
        let _ = self.sender.send(key);
    }

    /// Subscribes to every signal.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            filter: None,
        }
    }

    /// Subscribes to signals for one key only.
    pub fn subscribe_to(&self, key: Revalidation) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            filter: Some(key),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving side of one observer's interest.
///
/// A subscription that falls more than the channel capacity behind loses the
/// overflowed signals. A keyed subscription then reports its own key once,
/// since one of the lost signals may have concerned it; an unkeyed one just
/// carries on with the retained signals.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<Revalidation>,
    filter: Option<Revalidation>,
}

impl Subscription {
    /// Waits for the next matching signal. Returns `None` once every
    /// publisher is gone.
    pub async fn recv(&mut self) -> Option<Revalidation> {
        loop {
            match self.receiver.recv().await {
                Ok(key) if self.matches(&key) => return Some(key),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    if let Some(key) = self.on_lag(missed) {
                        return Some(key);
                    }
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next matching signal if one is already buffered.
    pub fn try_recv(&mut self) -> Option<Revalidation> {
        loop {
            match self.receiver.try_recv() {
                Ok(key) if self.matches(&key) => return Some(key),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(missed)) => {
                    if let Some(key) = self.on_lag(missed) {
                        return Some(key);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drains every buffered matching signal.
    pub fn drain(&mut self) -> Vec<Revalidation> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    fn matches(&self, key: &Revalidation) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter == key)
    }

    fn on_lag(&self, missed: u64) -> Option<Revalidation> {
        debug!("subscription lagged, {missed} signals dropped");
        self.filter.clone()
    }
}
