//! In-process chat rooms.
//!
//! Each room is a `tokio::sync::broadcast` channel keyed by its name. A room
//! exists while at least one socket is subscribed to it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use crate::modules::chat::model::OutgoingFrame;

const ROOM_CAPACITY: usize = 100;

#[derive(Clone, Debug, Default)]
pub struct ChatRooms {
    rooms: Arc<Mutex<HashMap<String, broadcast::Sender<OutgoingFrame>>>>,
}

impl ChatRooms {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<OutgoingFrame>>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Joins `room`, creating it on first use.
    pub fn join(
        &self,
        room: &str,
    ) -> (
        broadcast::Sender<OutgoingFrame>,
        broadcast::Receiver<OutgoingFrame>,
    ) {
        let mut rooms = self.lock();
        let sender = rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .clone();
        let receiver = sender.subscribe();
        (sender, receiver)
    }

    /// Drops `room` once nobody is subscribed. Call after the receiver is gone.
    pub fn leave(&self, room: &str) {
        let mut rooms = self.lock();
        if rooms
            .get(room)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            rooms.remove(room);
        }
    }

    pub fn contains(&self, room: &str) -> bool {
        self.lock().contains_key(room)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_models::UserId;

    #[tokio::test]
    async fn members_share_a_room() {
        let rooms = ChatRooms::default();
        let (tx, mut first) = rooms.join("chat_a_b");
        let (_, mut second) = rooms.join("chat_a_b");
        assert_eq!(rooms.len(), 1);

        let frame = OutgoingFrame {
            message: "hello".to_string(),
            sender_id: UserId::new(),
        };
        tx.send(frame.clone()).unwrap();

        assert_eq!(first.recv().await.unwrap(), frame);
        assert_eq!(second.recv().await.unwrap(), frame);
    }

    #[test]
    fn room_is_removed_after_last_member_leaves() {
        let rooms = ChatRooms::default();
        let (_, first) = rooms.join("chat_a_b");
        let (_, second) = rooms.join("chat_a_b");

        drop(first);
        rooms.leave("chat_a_b");
        assert!(rooms.contains("chat_a_b"));

        drop(second);
        rooms.leave("chat_a_b");
        assert!(rooms.is_empty());
    }
}
