/**
 * Session Registry
 *
 * The map behind the hub: every connected user and, per user, every live
 * session together with the sending half of that session's outbound
 * queue. The registry is plain data; the hub task owns the only instance,
 * which is what serializes all access to it.
 *
 * # Invariants
 *
 * - A user key exists only while the user has at least one session.
 * - A `SessionHandle` holds the only sender of its outbound queue, so
 *   removing the handle closes the queue and stops the write pump.
 * - `forward` never waits. A session whose queue is full or closed is
 *   evicted on the spot.
 */

use std::collections::HashMap;

use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::shared::{Envelope, UserId};

/// Identifies one connection of one user
pub type SessionId = Uuid;

/// The registry's side of a client session
#[derive(Debug)]
pub struct SessionHandle {
    id: SessionId,
    user_id: UserId,
    outbound: mpsc::Sender<Envelope>,
}

impl SessionHandle {
    /// Create a handle plus the receiving end of its bounded outbound queue
    pub fn new(user_id: UserId, capacity: usize) -> (Self, mpsc::Receiver<Envelope>) {
        let (outbound, receiver) = mpsc::channel(capacity);
        let handle = Self {
            id: Uuid::new_v4(),
            user_id,
            outbound,
        };
        (handle, receiver)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Result of forwarding one envelope to one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardOutcome {
    /// Sessions the envelope was queued on
    pub delivered: usize,
    /// Sessions removed because their queue was full or closed
    pub evicted: usize,
}

/// All live sessions, grouped by user
#[derive(Debug, Default)]
pub struct Registry {
    clients: HashMap<UserId, HashMap<SessionId, SessionHandle>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session. Returns `true` if it is the user's first one.
    pub fn register(&mut self, handle: SessionHandle) -> bool {
        let sessions = self.clients.entry(handle.user_id).or_default();
        let first = sessions.is_empty();
        sessions.insert(handle.id, handle);
        first
    }

    /// Remove a session, dropping its handle. Unknown sessions are ignored.
    ///
    /// Returns `true` if a session was actually removed.
    pub fn unregister(&mut self, user_id: UserId, session_id: SessionId) -> bool {
        let Some(sessions) = self.clients.get_mut(&user_id) else {
            return false;
        };

        let removed = sessions.remove(&session_id).is_some();
        if sessions.is_empty() {
            self.clients.remove(&user_id);
        }
        removed
    }

    /// Queue `envelope` on every session of `recipient`
    pub fn forward(&mut self, recipient: UserId, envelope: &Envelope) -> ForwardOutcome {
        let mut outcome = ForwardOutcome::default();
        let Some(sessions) = self.clients.get_mut(&recipient) else {
            return outcome;
        };

        let mut stale = Vec::new();
        for (session_id, handle) in sessions.iter() {
            match handle.outbound.try_send(envelope.clone()) {
                Ok(()) => outcome.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        user_id = recipient,
                        session_id = %session_id,
                        "Outbound queue full, evicting session"
                    );
                    stale.push(*session_id);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(
                        user_id = recipient,
                        session_id = %session_id,
                        "Outbound queue closed, evicting session"
                    );
                    stale.push(*session_id);
                }
            }
        }

        for session_id in stale {
            sessions.remove(&session_id);
            outcome.evicted += 1;
        }
        if sessions.is_empty() {
            self.clients.remove(&recipient);
        }

        outcome
    }

    pub fn session_count(&self, user_id: UserId) -> usize {
        self.clients.get(&user_id).map_or(0, HashMap::len)
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.clients.contains_key(&user_id)
    }

    /// Users with at least one session, in ascending order
    pub fn online_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.clients.keys().copied().collect();
        users.sort_unstable();
        users
    }
}
