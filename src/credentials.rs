use std::ops::Deref;

use bytes::Bytes;
use codec::{crypto::long_term_key, message::Message};

/// Key material a message was (or will be) authenticated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityKey {
    /// The plaintext password.
    ShortTerm(Bytes),
    /// `MD5(username:realm:password)`.
    LongTerm([u8; 16]),
}

impl IntegrityKey {
    /// # Test
    ///
    /// ```
    /// use stun_agent::credentials::IntegrityKey;
    ///
    /// let key = IntegrityKey::long_term(b"panda", b"raspberry", b"panda");
    ///
    /// assert_eq!(
    ///     &key[..],
    ///     &[
    ///         0x3e, 0x2f, 0x79, 0x1e, 0x1f, 0x14, 0xd1, 0x73, 0xfc, 0x91, 0xff,
    ///         0x2f, 0x59, 0xb5, 0x0f, 0xd1,
    ///     ]
    /// );
    /// ```
    pub fn long_term(username: &[u8], realm: &[u8], password: &[u8]) -> Self {
        Self::LongTerm(long_term_key(username, realm, password))
    }

    pub fn short_term(password: &[u8]) -> Self {
        Self::ShortTerm(Bytes::copy_from_slice(password))
    }
}

impl Deref for IntegrityKey {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match self {
            Self::ShortTerm(it) => it,
            Self::LongTerm(it) => it,
        }
    }
}

/// Resolves the credentials of a received message.
///
/// The agent calls this with the USERNAME of an authenticated message (empty
/// when the attribute is absent) and expects the password back, or `None`
/// for an unknown user. The agent turns the password into the key itself:
/// as is for short-term credentials, hashed with the REALM for long-term
/// ones.
///
/// Closures taking `(&Message, &[u8])` are validaters too.
pub trait Validater {
    fn get_password(&self, message: &Message<'_>, username: &[u8]) -> Option<Bytes>;
}

impl<F> Validater for F
where
    F: Fn(&Message<'_>, &[u8]) -> Option<Bytes>,
{
    fn get_password(&self, message: &Message<'_>, username: &[u8]) -> Option<Bytes> {
        self(message, username)
    }
}

/// A (username, password) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidaterData {
    pub username: Bytes,
    pub password: Bytes,
}

impl ValidaterData {
    pub fn new(username: impl AsRef<[u8]>, password: impl AsRef<[u8]>) -> Self {
        Self {
            username: Bytes::copy_from_slice(username.as_ref()),
            password: Bytes::copy_from_slice(password.as_ref()),
        }
    }
}

/// The default validater, a fixed table of users matched by exact username.
///
/// # Test
///
/// ```
/// use stun_agent::credentials::*;
///
/// let validater = StaticValidater::new([
///     ValidaterData::new("alice", "secret"),
///     ValidaterData::new("bob", "hunter2"),
/// ]);
///
/// assert_eq!(validater.find(b"bob").map(|it| &it[..]), Some(&b"hunter2"[..]));
/// assert!(validater.find(b"bo").is_none());
/// ```
#[derive(Debug, Default, Clone)]
pub struct StaticValidater(Vec<ValidaterData>);

impl StaticValidater {
    pub fn new(users: impl IntoIterator<Item = ValidaterData>) -> Self {
        Self(users.into_iter().collect())
    }

    pub fn insert(&mut self, user: ValidaterData) {
        self.0.push(user);
    }

    pub fn find(&self, username: &[u8]) -> Option<&Bytes> {
        self.0
            .iter()
            .find(|it| it.username == username)
            .map(|it| &it.password)
    }
}

impl Validater for StaticValidater {
    fn get_password(&self, _: &Message<'_>, username: &[u8]) -> Option<Bytes> {
        let password = self.find(username).cloned();
        if password.is_none() {
            log::debug!("unknown user: username={:?}", String::from_utf8_lossy(username));
        }

        password
    }
}

impl FromIterator<ValidaterData> for StaticValidater {
    fn from_iter<T: IntoIterator<Item = ValidaterData>>(iter: T) -> Self {
        Self::new(iter)
    }
}
