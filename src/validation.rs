use codec::{
    Attributes, Error as CodecError,
    message::{
        Message,
        attributes::{AttributeType, ErrorCode, Realm, UserName},
        methods::MessageClass,
    },
};

use crate::{
    Agent,
    config::{Compatibility, Usage},
    credentials::{IntegrityKey, Validater},
    message::ReceivedMessage,
};

/// The verdict on a received buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationStatus {
    /// Authorized, well formed, and for answers, matched to one of our
    /// requests.
    Success,
    /// Not a STUN message at all. Drop it.
    NotStun,
    /// The header announces more bytes than were given. Wait for the rest.
    IncompleteStun,
    /// Missing the magic cookie or a good FINGERPRINT. Answer 400.
    BadRequest,
    /// Missing the attributes the credential mechanism requires. Answer 400.
    UnauthorizedBadRequest,
    /// Unknown user or wrong MESSAGE-INTEGRITY. Answer 401.
    Unauthorized,
    /// An answer to nothing we have outstanding. Drop it.
    UnmatchedResponse,
    /// A request with comprehension-required attributes we do not know.
    /// Answer with [`Agent::build_unknown_attributes_error`].
    UnknownRequestAttribute,
    /// Same as above on anything but a request. Drop it.
    UnknownAttribute,
}

impl Agent {
    /// Classify a received buffer.
    ///
    /// The decoded message comes back with every verdict except
    /// [`ValidationStatus::NotStun`] and [`ValidationStatus::IncompleteStun`],
    /// so that the caller can build the error response the verdict calls for.
    ///
    /// Answers to our own requests are matched against the outstanding
    /// transactions; a successful match consumes the transaction.
    pub fn validate<'a, V>(
        &mut self,
        bytes: &'a [u8],
        attributes: &'a mut Attributes,
        validater: &V,
    ) -> (ValidationStatus, Option<ReceivedMessage<'a>>)
    where
        V: Validater + ?Sized,
    {
        let message = match Message::decode(bytes, attributes) {
            Ok(it) => it,
            Err(CodecError::Incomplete) => {
                log::trace!("incomplete stun message: len={}", bytes.len());
                return (ValidationStatus::IncompleteStun, None);
            }
            Err(e) => {
                log::trace!("not a stun message: len={}, err={}", bytes.len(), e);
                return (ValidationStatus::NotStun, None);
            }
        };

        let (status, key) = self.classify(&message, validater);

        log::trace!(
            "validated stun message: method={:?}, class={:?}, id={:?}, status={:?}",
            message.method(),
            message.class(),
            message.transaction_id(),
            status
        );

        (status, Some(ReceivedMessage::new(message, key)))
    }

    /// The comprehension-required attribute types of `message` that are not
    /// known, in the order they first appear.
    pub fn unknown_attributes(&self, message: &Message<'_>) -> Vec<u16> {
        let mut unknowns = Vec::new();
        for kind in message.attribute_kinds() {
            if AttributeType::is_comprehension_required(kind)
                && !self.options.known_attributes.contains(&kind)
                && !unknowns.contains(&kind)
            {
                unknowns.push(kind);
            }
        }

        unknowns
    }

    fn classify<V>(
        &mut self,
        message: &Message<'_>,
        validater: &V,
    ) -> (ValidationStatus, Option<IntegrityKey>)
    where
        V: Validater + ?Sized,
    {
        let usage = self.options.usage;
        let class = message.class();

        if self.options.compatibility == Compatibility::Rfc5389 {
            if !message.has_cookie() {
                log::debug!("message without magic cookie");
                return (ValidationStatus::BadRequest, None);
            }

            if usage.contains(Usage::USE_FINGERPRINT) {
                if let Err(e) = message.verify_fingerprint() {
                    log::debug!("fingerprint check failed: err={}", e);
                    return (ValidationStatus::BadRequest, None);
                }
            }
        }

        if !self.unknown_attributes(message).is_empty() {
            log::debug!(
                "unknown comprehension-required attributes: class={:?}",
                class
            );

            return if class == MessageClass::Request {
                (ValidationStatus::UnknownRequestAttribute, None)
            } else {
                (ValidationStatus::UnknownAttribute, None)
            };
        }

        let ignore = usage.contains(Usage::IGNORE_CREDENTIALS)
            || (class == MessageClass::Indication && usage.contains(Usage::NO_INDICATION_AUTH))
            || is_unauthenticated_error(message);

        if class.is_answer() {
            self.match_answer(message, ignore, validater)
        } else {
            self.authenticate(message, ignore, validater)
        }
    }

    fn authenticate<V>(
        &self,
        message: &Message<'_>,
        ignore: bool,
        validater: &V,
    ) -> (ValidationStatus, Option<IntegrityKey>)
    where
        V: Validater + ?Sized,
    {
        let usage = self.options.usage;

        if !ignore && self.is_missing_credentials(message) {
            log::debug!(
                "missing credentials: method={:?}, class={:?}",
                message.method(),
                message.class()
            );

            return (ValidationStatus::UnauthorizedBadRequest, None);
        }

        if !message.has(AttributeType::MessageIntegrity)
            || (ignore && !usage.contains(Usage::FORCE_VALIDATER))
        {
            return (ValidationStatus::Success, None);
        }

        let username = message.get::<UserName>().unwrap_or_default();
        let Some(password) = validater.get_password(message, username) else {
            return (ValidationStatus::Unauthorized, None);
        };

        if ignore {
            return (ValidationStatus::Success, None);
        }

        let key = if usage.contains(Usage::LONG_TERM_CREDENTIALS) {
            match message.get::<Realm>() {
                Some(realm) => IntegrityKey::long_term(username, realm, &password),
                None => {
                    log::debug!("long-term credentials without realm");
                    return (ValidationStatus::Unauthorized, None);
                }
            }
        } else {
            IntegrityKey::ShortTerm(password)
        };

        if let Err(e) = message.verify_integrity(&key, self.is_legacy()) {
            log::debug!(
                "integrity check failed: username={:?}, err={}",
                String::from_utf8_lossy(username),
                e
            );

            return (ValidationStatus::Unauthorized, None);
        }

        (ValidationStatus::Success, Some(key))
    }

    fn match_answer<V>(
        &mut self,
        message: &Message<'_>,
        ignore: bool,
        validater: &V,
    ) -> (ValidationStatus, Option<IntegrityKey>)
    where
        V: Validater + ?Sized,
    {
        let id = message.transaction_id();
        let Some(saved) = self.transactions.find(&id, message.method()) else {
            log::debug!(
                "unmatched answer: method={:?}, id={:?}",
                message.method(),
                id
            );

            return (ValidationStatus::UnmatchedResponse, None);
        };

        if self.options.usage.contains(Usage::FORCE_VALIDATER)
            && message.has(AttributeType::MessageIntegrity)
        {
            let username = message.get::<UserName>().unwrap_or_default();
            if validater.get_password(message, username).is_none() {
                return (ValidationStatus::Unauthorized, None);
            }
        }

        if !ignore {
            if let Some(key) = &saved.key {
                if let Err(e) = message.verify_integrity(key, self.is_legacy()) {
                    log::debug!("answer does not match the request key: id={:?}, err={}", id, e);
                    return (ValidationStatus::UnmatchedResponse, None);
                }
            }
        }

        let key = self.transactions.consume(&id).and_then(|it| it.key);
        log::trace!("transaction completed: id={:?}", id);

        (ValidationStatus::Success, key)
    }

    fn is_missing_credentials(&self, message: &Message<'_>) -> bool {
        let usage = self.options.usage;
        let username = message.has(AttributeType::UserName);
        let integrity = message.has(AttributeType::MessageIntegrity);

        (usage.contains(Usage::SHORT_TERM_CREDENTIALS) && (!username || !integrity))
            || (usage.contains(Usage::LONG_TERM_CREDENTIALS)
                && message.class() == MessageClass::Request
                && (!username
                    || !integrity
                    || !message.has(AttributeType::Nonce)
                    || !message.has(AttributeType::Realm)))
            || (username && !integrity)
    }
}

/// 400 and 401 answers may come from a peer that could not authenticate us.
fn is_unauthenticated_error(message: &Message<'_>) -> bool {
    message.class() == MessageClass::Error
        && message
            .get::<ErrorCode>()
            .is_some_and(|it| matches!(it.number(), 400 | 401))
}
