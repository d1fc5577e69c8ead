//! ## STUN agent
//!
//! [RFC5389]: https://tools.ietf.org/html/rfc5389
//! [RFC3489]: https://tools.ietf.org/html/rfc3489
//!
//! The agent sits between a transport and the application. Received buffers
//! go through [`Agent::validate`], which decides whether they are well
//! formed, authorized STUN messages and, when they are not, exactly why.
//! Outgoing messages are started with one of the `init_*` functions, filled
//! by the caller, and sealed with [`Agent::finish_message`], which adds
//! MESSAGE-INTEGRITY and FINGERPRINT as configured and remembers the
//! requests so that their answers can be matched later.
//!
//! The agent does no I/O, keeps no timers and does no locking of its own:
//! one agent belongs to one session.
//!
//! ### Features
//!
//! * `serde`: `Deserialize` for [`AgentOptions`], [`Compatibility`] and
//!   [`Usage`], so the agent section of a configuration file can be loaded
//!   directly. Off by default; its tests run with `cargo test --features serde`.

pub mod config;
pub mod credentials;
pub mod message;
pub mod transaction;
mod validation;

pub use self::{
    config::{AgentOptions, Compatibility, Usage},
    credentials::{IntegrityKey, StaticValidater, Validater, ValidaterData},
    message::{OutgoingMessage, ReceivedMessage},
    transaction::{SavedTransaction, TransactionCache},
    validation::ValidationStatus,
};

pub use codec;

use codec::{
    Attributes,
    message::{
        HEADER_SIZE, Message, TransactionId,
        attributes::{ErrorCode, Realm, Software, UnknownAttributes, UserName, error::ErrorType},
        methods::{MessageClass, Method},
    },
};

use rand::Rng;

#[derive(Debug)]
pub enum Error {
    /// The message does not fit in the capacity it was given.
    BufferTooSmall,
    /// Responses can only be built for requests.
    NotARequest,
    /// Long-term credentials need USERNAME and REALM in the message to
    /// derive the key from.
    MissingCredentials,
    Codec(codec::Error),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<codec::Error> for Error {
    fn from(value: codec::Error) -> Self {
        Self::Codec(value)
    }
}

/// A STUN agent.
///
/// # Test
///
/// ```
/// use stun_agent::*;
/// use stun_agent::codec::{Attributes, message::{attributes::*, methods::Method}};
///
/// let mut agent = Agent::new(AgentOptions::new(
///     vec![0x0001, 0x0006, 0x0008],
///     Compatibility::Rfc5389,
///     Usage::SHORT_TERM_CREDENTIALS | Usage::USE_FINGERPRINT,
/// ));
///
/// let mut request = agent.init_request(Method::Binding, 1280).unwrap();
/// request.append::<UserName>(b"alice").unwrap();
/// agent.finish_message(&mut request, Some(b"secret".as_slice())).unwrap();
///
/// let validater = StaticValidater::new([ValidaterData::new("alice", "secret")]);
/// let mut attributes = Attributes::default();
/// let (status, _) = agent.validate(request.as_bytes(), &mut attributes, &validater);
///
/// assert_eq!(status, ValidationStatus::Success);
/// ```
#[derive(Debug)]
pub struct Agent {
    options: AgentOptions,
    transactions: TransactionCache,
}

impl Agent {
    pub fn new(options: AgentOptions) -> Self {
        Self {
            options,
            transactions: TransactionCache::default(),
        }
    }

    /// Replace the options and forget every outstanding request.
    ///
    /// Answers to requests sent before the reset are unmatched afterwards.
    pub fn reset(&mut self, options: AgentOptions) {
        log::trace!(
            "agent reset: outstanding transactions={}",
            self.transactions.len()
        );

        self.options = options;
        self.transactions.clear();
    }

    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    pub fn set_software(&mut self, software: Option<String>) {
        self.options.software = software;
    }

    pub fn transactions(&self) -> &TransactionCache {
        &self.transactions
    }

    /// Stop waiting for the answer to a request, e.g. once its
    /// retransmissions are exhausted.
    pub fn forget_transaction(&mut self, id: &TransactionId) -> bool {
        self.transactions.consume(id).is_some()
    }

    /// Start a request with a fresh transaction id.
    ///
    /// The request is outstanding from now on; if every slot is taken the
    /// oldest outstanding request is evicted.
    pub fn init_request(
        &mut self,
        method: Method,
        capacity: usize,
    ) -> Result<OutgoingMessage, Error> {
        if capacity < HEADER_SIZE {
            return Err(Error::BufferTooSmall);
        }

        // as it will read back from the wire.
        let method = Method::from(u16::from(method));
        let id = self.generate_transaction_id();
        self.transactions.insert(id, method);

        log::trace!("request started: method={:?}, id={:?}", method, id);

        Ok(OutgoingMessage::new(method, MessageClass::Request, id, capacity))
    }

    pub fn init_indication(
        &mut self,
        method: Method,
        capacity: usize,
    ) -> Result<OutgoingMessage, Error> {
        if capacity < HEADER_SIZE {
            return Err(Error::BufferTooSmall);
        }

        let id = self.generate_transaction_id();
        let method = Method::from(u16::from(method));
        Ok(OutgoingMessage::new(method, MessageClass::Indication, id, capacity))
    }

    /// Start the success response to `request`.
    ///
    /// The key `request` was authenticated with is carried over, so
    /// finishing without a key signs the response with it.
    pub fn init_response(
        &self,
        request: &ReceivedMessage<'_>,
        capacity: usize,
    ) -> Result<OutgoingMessage, Error> {
        self.init_answer(request, MessageClass::Response, capacity)
    }

    /// Start the error response to `request`, with its ERROR-CODE.
    pub fn init_error(
        &self,
        request: &ReceivedMessage<'_>,
        error: ErrorType,
        capacity: usize,
    ) -> Result<OutgoingMessage, Error> {
        let mut message = self.init_answer(request, MessageClass::Error, capacity)?;
        message.append::<ErrorCode>(ErrorCode::from(error))?;
        Ok(message)
    }

    /// Build the finished 420 answer to a request carrying unknown
    /// comprehension-required attributes.
    ///
    /// RFC3489 peers expect an even number of entries, so the last one is
    /// repeated when needed.
    pub fn build_unknown_attributes_error(
        &mut self,
        request: &ReceivedMessage<'_>,
        capacity: usize,
    ) -> Result<OutgoingMessage, Error> {
        let mut unknowns = self.unknown_attributes(request);
        if self.is_legacy() && unknowns.len() % 2 == 1 {
            if let Some(last) = unknowns.last().copied() {
                unknowns.push(last);
            }
        }

        let mut message = self.init_error(request, ErrorType::UnknownAttribute, capacity)?;
        message.append::<UnknownAttributes>(unknowns)?;
        self.finish_message(&mut message, None)?;
        Ok(message)
    }

    /// Seal a message and return its final length.
    ///
    /// Adds SOFTWARE when configured, MESSAGE-INTEGRITY when there is a key
    /// (the one given, else the one the message carries over), then
    /// FINGERPRINT when configured. With long-term credentials the given key
    /// is the password and the message must hold USERNAME and REALM for the
    /// key to be derived, otherwise [`Error::MissingCredentials`].
    ///
    /// Finishing a request records its key so that the answer can be
    /// checked. When the message does not fit it is left as it was before
    /// the call.
    pub fn finish_message(
        &mut self,
        message: &mut OutgoingMessage,
        key: Option<&[u8]>,
    ) -> Result<usize, Error> {
        let len = message.len();
        let key = match key {
            Some(password) => self.derive_key(message, password)?,
            None => message.key.clone(),
        };

        if let Err(e) = self.seal(message, key.as_ref()) {
            message.rollback(len)?;
            return Err(e);
        }

        // an evicted or forgotten request stays unmatched.
        if message.class() == MessageClass::Request {
            if let Some(saved) = self.transactions.get_mut(message.transaction_id()) {
                saved.key = key.clone();
            }
        }

        log::trace!(
            "message finished: method={:?}, class={:?}, id={:?}, len={}",
            message.method(),
            message.class(),
            message.transaction_id(),
            message.len()
        );

        message.key = key;
        Ok(message.len())
    }

    fn seal(&self, message: &mut OutgoingMessage, key: Option<&IntegrityKey>) -> Result<(), Error> {
        if self.options.usage.contains(Usage::ADD_SOFTWARE) {
            if let Some(software) = &self.options.software {
                message.append::<Software>(software.as_str())?;
            }
        }

        let padding = self.is_legacy();
        let fingerprint = !padding && self.options.usage.contains(Usage::USE_FINGERPRINT);
        let capacity = message.capacity();

        let mut encoder = message.encoder()?;
        if let Some(key) = key {
            encoder.append_integrity(key, padding);
        }

        if fingerprint {
            encoder.append_fingerprint();
        }

        if encoder.len() > capacity {
            return Err(Error::BufferTooSmall);
        }

        Ok(())
    }

    fn derive_key(
        &self,
        message: &OutgoingMessage,
        password: &[u8],
    ) -> Result<Option<IntegrityKey>, Error> {
        if password.is_empty() {
            return Ok(None);
        }

        if !self.options.usage.contains(Usage::LONG_TERM_CREDENTIALS) {
            return Ok(Some(IntegrityKey::short_term(password)));
        }

        let mut attributes = Attributes::default();
        let decoded = Message::decode(message.as_bytes(), &mut attributes)?;
        match (decoded.get::<UserName>(), decoded.get::<Realm>()) {
            (Some(username), Some(realm)) => {
                Ok(Some(IntegrityKey::long_term(username, realm, password)))
            }
            _ => Err(Error::MissingCredentials),
        }
    }

    fn init_answer(
        &self,
        request: &ReceivedMessage<'_>,
        class: MessageClass,
        capacity: usize,
    ) -> Result<OutgoingMessage, Error> {
        if request.class() != MessageClass::Request {
            return Err(Error::NotARequest);
        }

        if capacity < HEADER_SIZE {
            return Err(Error::BufferTooSmall);
        }

        let mut message =
            OutgoingMessage::new(request.method(), class, request.transaction_id(), capacity);
        message.key = request.key().cloned();
        Ok(message)
    }

    fn generate_transaction_id(&self) -> TransactionId {
        let mut rng = rand::rng();
        loop {
            let id = if self.is_legacy() {
                let mut bytes = [0u8; 16];
                rng.fill(&mut bytes);
                TransactionId::new(bytes)
            } else {
                let mut token = [0u8; 12];
                rng.fill(&mut token);
                TransactionId::with_cookie(token)
            };

            if !self.transactions.contains(&id) {
                return id;
            }
        }
    }

    fn is_legacy(&self) -> bool {
        self.options.compatibility == Compatibility::Rfc3489
    }
}
