/**
 * Chat Hub
 *
 * A single tokio task owns the [`Registry`]; everything else holds a
 * cloneable [`Hub`] handle and sends it commands over one FIFO queue.
 * Because there is exactly one consumer, register, unregister and
 * forward never race on the map, and two commands issued by the same
 * task are applied in the order they were issued.
 *
 * # Commands
 *
 * - `register` / `unregister` - session lifecycle, fire-and-forget
 * - `forward_private_message` - queue an envelope on every session of
 *   one user, evicting sessions that cannot keep up
 * - `broadcast` - accepted and logged, delivers nothing yet
 * - `session_count` / `online_users` - answered through a oneshot, so
 *   they observe every command sent before them
 *
 * The task stops when the last `Hub` handle is dropped.
 */

use tokio::sync::{mpsc, oneshot};

use super::registry::{Registry, SessionHandle, SessionId};
use crate::shared::{Envelope, UserId};

#[derive(Debug)]
enum HubCommand {
    Register(SessionHandle),
    Unregister {
        user_id: UserId,
        session_id: SessionId,
    },
    Forward {
        recipient: UserId,
        envelope: Envelope,
    },
    Broadcast(Envelope),
    SessionCount {
        user_id: UserId,
        reply: oneshot::Sender<usize>,
    },
    OnlineUsers {
        reply: oneshot::Sender<Vec<UserId>>,
    },
}

/// Handle to the hub task
#[derive(Debug, Clone)]
pub struct Hub {
    commands: mpsc::UnboundedSender<HubCommand>,
}

impl Hub {
    /// Start the hub task on the current runtime
    pub fn spawn() -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run(Registry::new(), receiver));
        Self { commands }
    }

    pub fn register(&self, handle: SessionHandle) {
        self.send(HubCommand::Register(handle));
    }

    pub fn unregister(&self, user_id: UserId, session_id: SessionId) {
        self.send(HubCommand::Unregister {
            user_id,
            session_id,
        });
    }

    /// Deliver `envelope` to every session of `recipient`.
    ///
    /// Nothing is retried: if the recipient is offline the envelope is
    /// dropped, the message itself having already been stored.
    pub fn forward_private_message(&self, envelope: Envelope, recipient: UserId) {
        self.send(HubCommand::Forward {
            recipient,
            envelope,
        });
    }

    pub fn broadcast(&self, envelope: Envelope) {
        self.send(HubCommand::Broadcast(envelope));
    }

    /// Number of live sessions for `user_id`
    pub async fn session_count(&self, user_id: UserId) -> usize {
        let (reply, response) = oneshot::channel();
        self.send(HubCommand::SessionCount { user_id, reply });
        response.await.unwrap_or_default()
    }

    /// Users with at least one live session, ascending
    pub async fn online_users(&self) -> Vec<UserId> {
        let (reply, response) = oneshot::channel();
        self.send(HubCommand::OnlineUsers { reply });
        response.await.unwrap_or_default()
    }

    fn send(&self, command: HubCommand) {
        if self.commands.send(command).is_err() {
            tracing::error!("[Hub] Hub task is gone, command dropped");
        }
    }
}

async fn run(mut registry: Registry, mut commands: mpsc::UnboundedReceiver<HubCommand>) {
    tracing::debug!("[Hub] Started");

    while let Some(command) = commands.recv().await {
        match command {
            HubCommand::Register(handle) => {
                let (user_id, session_id) = (handle.user_id(), handle.id());
                if registry.register(handle) {
                    tracing::info!(user_id, "[Hub] User online");
                }
                tracing::debug!(user_id, session_id = %session_id, "[Hub] Session registered");
            }
            HubCommand::Unregister {
                user_id,
                session_id,
            } => {
                if registry.unregister(user_id, session_id) {
                    tracing::debug!(user_id, session_id = %session_id, "[Hub] Session unregistered");
                    if !registry.is_online(user_id) {
                        tracing::info!(user_id, "[Hub] User offline");
                    }
                }
            }
            HubCommand::Forward {
                recipient,
                envelope,
            } => {
                let outcome = registry.forward(recipient, &envelope);
                if outcome.delivered == 0 && outcome.evicted == 0 {
                    tracing::debug!(user_id = recipient, "[Hub] Recipient offline, message not pushed");
                }
                if outcome.evicted > 0 && !registry.is_online(recipient) {
                    tracing::info!(user_id = recipient, "[Hub] User offline");
                }
            }
            HubCommand::Broadcast(envelope) => {
                tracing::debug!(kind = ?envelope.kind, "[Hub] Broadcast ignored");
            }
            HubCommand::SessionCount { user_id, reply } => {
                let _ = reply.send(registry.session_count(user_id));
            }
            HubCommand::OnlineUsers { reply } => {
                let _ = reply.send(registry.online_users());
            }
        }
    }

    tracing::debug!("[Hub] Stopped");
}
