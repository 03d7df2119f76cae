//! StorageManager: in-memory owner of every user and message.
//!
//! All state sits behind one `RwLock`. Mutations hold the write lock for
//! their whole duration, so a message moving from `unread` to `read` is
//! never observable half-way. Lookups and listings share the read lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::model::{Bucket, Message, MessageId, MessageListing, ReadState, User, UserId};
use crate::config::StoreConfig;
use crate::error::StoreError;

/// Per-user slot maps. Keys are store-wide sequence numbers, so iterating a
/// map yields ids in the order they entered that bucket.
#[derive(Debug, Default)]
struct Mailbox {
    sent: BTreeMap<u64, MessageId>,
    unread: BTreeMap<u64, MessageId>,
    read: BTreeMap<u64, MessageId>,
}

/// A live message plus where it sits in its sender's and receiver's mailboxes.
#[derive(Debug)]
struct Entry {
    message: Message,
    state: ReadState,
    sent_slot: u64,
    inbox_slot: u64,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, Mailbox>,
    messages: HashMap<MessageId, Entry>,
    next_slot: u64,
}

impl State {
    fn take_slot(&mut self) -> u64 {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    fn resolve<'a>(
        &'a self,
        slots: &'a BTreeMap<u64, MessageId>,
    ) -> impl Iterator<Item = &'a Message> + 'a {
        slots
            .values()
            .filter_map(|id| self.messages.get(id).map(|entry| &entry.message))
    }

    fn listed(&self, slots: &BTreeMap<u64, MessageId>) -> Vec<Message> {
        self.resolve(slots).cloned().collect()
    }

    fn bucket(&self, slots: &BTreeMap<u64, MessageId>) -> Bucket {
        let mut bucket = Bucket::default();
        for message in self.resolve(slots) {
            bucket.push(message.clone());
        }
        bucket
    }
}

/// Shared in-memory store. Wrap in `Arc` to hand to concurrent request handlers.
#[derive(Debug, Default)]
pub struct StorageManager {
    state: RwLock<State>,
}

impl StorageManager {
    /// Create an empty store with default capacities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store pre-sized from `config`.
    pub fn with_config(config: &StoreConfig) -> Self {
        Self {
            state: RwLock::new(State {
                users: HashMap::with_capacity(config.user_capacity),
                messages: HashMap::with_capacity(config.message_capacity),
                next_slot: 0,
            }),
        }
    }

    // State is only mutated after every check has passed, so a poisoned
    // lock still guards consistent data.
    fn lock_read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a new user with empty buckets.
    pub fn create_user(&self) -> User {
        let user_id = UserId::generate();
        self.lock_write().users.insert(user_id, Mailbox::default());
        debug!(user_id = %user_id, "User created");
        User::empty(user_id)
    }

    /// Snapshot of a user and all three of their buckets.
    pub fn get_user(&self, user_id: UserId) -> Result<User, StoreError> {
        let state = self.lock_read();
        let mailbox = state.users.get(&user_id).ok_or_else(|| StoreError::user(user_id))?;
        Ok(User {
            user_id,
            sent: state.bucket(&mailbox.sent),
            unread: state.bucket(&mailbox.unread),
            read: state.bucket(&mailbox.read),
        })
    }

    /// Create a message, filing it under the sender's `sent` and the
    /// receiver's `unread`. Fails if either user is unknown (sender checked first).
    pub fn create_message(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Message, StoreError> {
        let mut guard = self.lock_write();
        let state = &mut *guard;

        for user_id in [sender_id, receiver_id] {
            if !state.users.contains_key(&user_id) {
                return Err(StoreError::user(user_id));
            }
        }

        let message = Message {
            message_id: MessageId::generate(),
            sender_id,
            receiver_id,
            subject: subject.into(),
            body: body.into(),
        };
        let message_id = message.message_id;
        let slot = state.take_slot();

        if let Some(sender) = state.users.get_mut(&sender_id) {
            sender.sent.insert(slot, message_id);
        }
        if let Some(receiver) = state.users.get_mut(&receiver_id) {
            receiver.unread.insert(slot, message_id);
        }
        state.messages.insert(
            message_id,
            Entry {
                message: message.clone(),
                state: ReadState::Unread,
                sent_slot: slot,
                inbox_slot: slot,
            },
        );

        debug!(
            message_id = %message_id,
            sender_id = %sender_id,
            receiver_id = %receiver_id,
            "Message created"
        );
        Ok(message)
    }

    /// Return a message, moving it from the receiver's `unread` to `read`
    /// on first access. Reading an already-read message changes nothing.
    pub fn read_message(&self, message_id: MessageId) -> Result<Message, StoreError> {
        let mut guard = self.lock_write();
        let state = &mut *guard;

        let entry = state
            .messages
            .get_mut(&message_id)
            .ok_or_else(|| StoreError::message(message_id))?;

        if entry.state == ReadState::Unread {
            let slot = state.next_slot;
            state.next_slot += 1;

            if let Some(receiver) = state.users.get_mut(&entry.message.receiver_id) {
                receiver.unread.remove(&entry.inbox_slot);
                receiver.read.insert(slot, message_id);
            }
            entry.inbox_slot = slot;
            entry.state = ReadState::Read;

            debug!(message_id = %message_id, "Message marked read");
        }

        Ok(entry.message.clone())
    }

    /// Remove a message from its sender's `sent` and whichever receiver
    /// bucket currently holds it.
    pub fn delete_message(&self, message_id: MessageId) -> Result<(), StoreError> {
        let mut guard = self.lock_write();
        let state = &mut *guard;

        let entry = state
            .messages
            .remove(&message_id)
            .ok_or_else(|| StoreError::message(message_id))?;

        if let Some(sender) = state.users.get_mut(&entry.message.sender_id) {
            sender.sent.remove(&entry.sent_slot);
        }
        if let Some(receiver) = state.users.get_mut(&entry.message.receiver_id) {
            match entry.state {
                ReadState::Unread => receiver.unread.remove(&entry.inbox_slot),
                ReadState::Read => receiver.read.remove(&entry.inbox_slot),
            };
        }

        debug!(message_id = %message_id, "Message deleted");
        Ok(())
    }

    /// List a user's messages. With `unread_only`, `read` comes back empty.
    /// Never marks anything as read.
    pub fn list_messages(
        &self,
        user_id: UserId,
        unread_only: bool,
    ) -> Result<MessageListing, StoreError> {
        let state = self.lock_read();
        let mailbox = state.users.get(&user_id).ok_or_else(|| StoreError::user(user_id))?;

        Ok(MessageListing {
            sent: state.listed(&mailbox.sent),
            read: if unread_only {
                Vec::new()
            } else {
                state.listed(&mailbox.read)
            },
            unread: state.listed(&mailbox.unread),
        })
    }

    /// Current read state of a message, without marking it read.
    pub fn read_state(&self, message_id: MessageId) -> Result<ReadState, StoreError> {
        self.lock_read()
            .messages
            .get(&message_id)
            .map(|entry| entry.state)
            .ok_or_else(|| StoreError::message(message_id))
    }

    pub fn user_count(&self) -> usize {
        self.lock_read().users.len()
    }

    pub fn message_count(&self) -> usize {
        self.lock_read().messages.len()
    }
}
