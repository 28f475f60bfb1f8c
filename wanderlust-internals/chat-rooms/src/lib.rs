//! Wanderlust Chat Rooms
//! Copyright (c) 2026 Mamy Ratsimbazafy
//! Licensed and distributed under either of
//!   * MIT license (license terms at the root of the package or at http://opensource.org/licenses/MIT).
//!   * Apache v2 license (license terms at the root of the package or at http://www.apache.org/licenses/LICENSE-2.0).
//! at your option. This file may not be copied, modified, or distributed except according to those terms.

//! wanderlust-internals/chat-rooms
//! A room registry that relays messages between members sharing a room identifier

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;

/// Custom error for the room registry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatRoomError {
    #[error("room name must not be empty")]
    EmptyRoomName,
    #[error("unknown member {0}")]
    UnknownMember(MemberId),
    #[error("member {member} is not in room {room}")]
    NotInRoom { member: MemberId, room: String },
}

/// Identifier handed out by [`ChatRooms::connect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "member-{}", self.0)
    }
}

#[derive(Debug)]
struct Registry<M> {
    members: HashMap<MemberId, UnboundedSender<M>>,
    rooms: HashMap<String, Vec<MemberId>>,
}

/// Shared registry of chat rooms.
///
/// Every connected member owns an unbounded outbound channel. Publishing to a
/// room clones the message into the channel of every other member of that room.
/// Rooms are created on first join and dropped when their last member leaves.
///
/// # Examples
///
/// ```ignore
/// let rooms = ChatRooms::<String>::new();
/// let (alice, _alice_rx) = rooms.connect().await;
/// let (bob, mut bob_rx) = rooms.connect().await;
/// rooms.join(alice, "support-42").await?;
/// rooms.join(bob, "support-42").await?;
/// rooms.publish(alice, "support-42", "hello".to_string()).await?;
/// assert_eq!(bob_rx.recv().await.as_deref(), Some("hello"));
/// ```
#[derive(Debug)]
pub struct ChatRooms<M> {
    registry: Arc<RwLock<Registry<M>>>,
    next_id: Arc<AtomicU64>,
}

impl<M> Clone for ChatRooms<M> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<M> Default for ChatRooms<M> {
    fn default() -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry {
                members: HashMap::new(),
                rooms: HashMap::new(),
            })),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl<M: Clone + Send + 'static> ChatRooms<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new member and return its id with the receiving half of its outbound channel
    pub async fn connect(&self) -> (MemberId, UnboundedReceiver<M>) {
        let id = MemberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.registry.write().await.members.insert(id, tx);
        tracing::debug!("{} connected", id);
        (id, rx)
    }

    /// Add `member` to `room`. Returns `false` if it was already there.
    pub async fn join(&self, member: MemberId, room: &str) -> Result<bool, ChatRoomError> {
        let room = normalize_room(room)?;
        let mut registry = self.registry.write().await;
        if !registry.members.contains_key(&member) {
            return Err(ChatRoomError::UnknownMember(member));
        }
        let occupants = registry.rooms.entry(room.to_string()).or_default();
        if occupants.contains(&member) {
            return Ok(false);
        }
        occupants.push(member);
        tracing::debug!("{} joined room {}", member, room);
        Ok(true)
    }

    /// Remove `member` from `room`
    pub async fn leave(&self, member: MemberId, room: &str) -> Result<(), ChatRoomError> {
        let room = normalize_room(room)?;
        let mut registry = self.registry.write().await;
        let not_in_room = || ChatRoomError::NotInRoom {
            member,
            room: room.to_string(),
        };
        let occupants = registry.rooms.get_mut(room).ok_or_else(not_in_room)?;
        let position = occupants
            .iter()
            .position(|m| *m == member)
            .ok_or_else(not_in_room)?;
        occupants.remove(position);
        if occupants.is_empty() {
            registry.rooms.remove(room);
        }
        tracing::debug!("{} left room {}", member, room);
        Ok(())
    }

    /// Deliver `message` to every other member of `room`.
    ///
    /// The sender must have joined the room. Returns the number of members the
    /// message was handed to; members whose receiver is gone are skipped.
    pub async fn publish(
        &self,
        from: MemberId,
        room: &str,
        message: M,
    ) -> Result<usize, ChatRoomError> {
        let room = normalize_room(room)?;
        let registry = self.registry.read().await;
        let occupants = registry
            .rooms
            .get(room)
            .filter(|occupants| occupants.contains(&from))
            .ok_or_else(|| ChatRoomError::NotInRoom {
                member: from,
                room: room.to_string(),
            })?;

        let mut delivered = 0;
        for member in occupants.iter().filter(|m| **m != from) {
            if let Some(tx) = registry.members.get(member) {
                if tx.send(message.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        Ok(delivered)
    }

    /// Drop `member` from every room and close its outbound channel.
    /// Returns how many rooms it was removed from.
    pub async fn disconnect(&self, member: MemberId) -> usize {
        let mut registry = self.registry.write().await;
        registry.members.remove(&member);
        let mut left = 0;
        registry.rooms.retain(|_, occupants| {
            let before = occupants.len();
            occupants.retain(|m| *m != member);
            left += before - occupants.len();
            !occupants.is_empty()
        });
        tracing::debug!("{} disconnected from {} room(s)", member, left);
        left
    }

    /// Number of members currently in `room`
    pub async fn occupancy(&self, room: &str) -> usize {
        let registry = self.registry.read().await;
        registry.rooms.get(room.trim()).map_or(0, Vec::len)
    }
}

fn normalize_room(room: &str) -> Result<&str, ChatRoomError> {
    let room = room.trim();
    if room.is_empty() {
        Err(ChatRoomError::EmptyRoomName)
    } else {
        Ok(room)
    }
}
