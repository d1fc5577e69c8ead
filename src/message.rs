use std::ops::Deref;

use bytes::BytesMut;
use codec::message::{
    Message, MessageEncoder, TransactionId,
    attributes::Attribute,
    methods::{MessageClass, Method},
};

use crate::{Error, credentials::IntegrityKey};

/// A message being built by the agent.
///
/// The buffer never grows past `capacity`: an attribute that does not fit
/// is rolled back and reported as [`Error::BufferTooSmall`].
#[derive(Debug)]
pub struct OutgoingMessage {
    bytes: BytesMut,
    capacity: usize,
    method: Method,
    class: MessageClass,
    transaction_id: TransactionId,
    pub(crate) key: Option<IntegrityKey>,
}

impl OutgoingMessage {
    pub(crate) fn new(
        method: Method,
        class: MessageClass,
        transaction_id: TransactionId,
        capacity: usize,
    ) -> Self {
        let mut bytes = BytesMut::with_capacity(capacity);
        MessageEncoder::new(method, class, &transaction_id, &mut bytes);

        Self {
            bytes,
            capacity,
            method,
            class,
            transaction_id,
            key: None,
        }
    }

    /// Append an attribute.
    ///
    /// # Test
    ///
    /// ```
    /// use stun_agent::{Agent, Error, config::AgentOptions};
    /// use stun_agent::codec::message::{attributes::*, methods::Method};
    ///
    /// let mut agent = Agent::new(AgentOptions::default());
    /// let mut message = agent.init_indication(Method::Binding, 32).unwrap();
    ///
    /// message.append::<Priority>(1).unwrap();
    /// assert_eq!(message.len(), 28);
    ///
    /// assert!(matches!(message.append::<UserName>(b"alice"), Err(Error::BufferTooSmall)));
    /// assert_eq!(message.len(), 28);
    /// ```
    pub fn append<'c, T: Attribute<'c>>(&mut self, value: T::Item) -> Result<(), Error> {
        let len = self.bytes.len();
        let mut encoder = MessageEncoder::attach(&mut self.bytes)?;
        encoder.append::<T>(value);

        if encoder.len() > self.capacity {
            encoder.truncate(len);
            return Err(Error::BufferTooSmall);
        }

        Ok(())
    }

    pub(crate) fn encoder(&mut self) -> Result<MessageEncoder<'_>, Error> {
        Ok(MessageEncoder::attach(&mut self.bytes)?)
    }

    /// Drop everything written after `len` bytes.
    pub(crate) fn rollback(&mut self, len: usize) -> Result<(), Error> {
        self.encoder()?.truncate(len);
        Ok(())
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn class(&self) -> MessageClass {
        self.class
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    /// The key [`crate::Agent::finish_message`] signs with when it is not
    /// given one.
    pub fn key(&self) -> Option<&IntegrityKey> {
        self.key.as_ref()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> BytesMut {
        self.bytes
    }
}

/// A received message as classified by [`crate::Agent::validate`].
///
/// Dereferences to the decoded [`Message`]. When the message was
/// authenticated, or answered one of our signed requests, the key that
/// checked out comes along so the reply can be signed with it.
pub struct ReceivedMessage<'a> {
    message: Message<'a>,
    key: Option<IntegrityKey>,
}

impl<'a> ReceivedMessage<'a> {
    pub(crate) fn new(message: Message<'a>, key: Option<IntegrityKey>) -> Self {
        Self { message, key }
    }

    pub fn key(&self) -> Option<&IntegrityKey> {
        self.key.as_ref()
    }

    pub fn into_inner(self) -> Message<'a> {
        self.message
    }
}

impl<'a> Deref for ReceivedMessage<'a> {
    type Target = Message<'a>;

    fn deref(&self) -> &Self::Target {
        &self.message
    }
}
