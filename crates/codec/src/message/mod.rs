pub mod attributes;
pub mod methods;

use crate::{
    Attributes, Error,
    crypto::{digest_eq, fingerprint, hmac_sha1},
    message::{
        attributes::{Attribute, AttributeType},
        methods::{MessageClass, Method, message_type, split_message_type},
    },
};

use bytes::{BufMut, BytesMut};

pub const MAGIC_NUMBER: u32 = 0x2112A442;

/// The size of the fixed STUN header.
pub const HEADER_SIZE: usize = 20;

/// The transaction id as seen by an agent.
///
/// This is the 128 bits following the message type and length. Under RFC5389
/// the first 32 bits are the magic cookie and the remaining 96 bits are the
/// random id; an RFC3489 peer uses all 128 bits as the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId([u8; 16]);

impl TransactionId {
    pub fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Build an RFC5389 id from its 96 random bits.
    ///
    /// # Test
    ///
    /// ```
    /// use stun_agent_codec::message::TransactionId;
    ///
    /// let id = TransactionId::with_cookie([7; 12]);
    ///
    /// assert!(id.has_cookie());
    /// assert_eq!(id.token(), &[7; 12]);
    /// ```
    pub fn with_cookie(token: [u8; 12]) -> Self {
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(&MAGIC_NUMBER.to_be_bytes());
        bytes[4..].copy_from_slice(&token);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// The trailing 96 bits, which are what XOR-encoded attributes mix in.
    pub fn token(&self) -> &[u8] {
        &self.0[4..]
    }

    pub fn has_cookie(&self) -> bool {
        self.0[..4] == MAGIC_NUMBER.to_be_bytes()
    }
}

pub struct MessageEncoder<'a> {
    token: [u8; 12],
    bytes: &'a mut BytesMut,
}

impl<'a> MessageEncoder<'a> {
    /// Start a new message, discarding whatever the buffer held.
    ///
    /// # Test
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use stun_agent_codec::message::methods::*;
    /// use stun_agent_codec::message::*;
    ///
    /// let buffer = [
    ///     0x00u8, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49,
    ///     0x42, 0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b,
    /// ];
    ///
    /// let id = TransactionId::new(buffer[4..].try_into().unwrap());
    /// let mut buf = BytesMut::new();
    /// MessageEncoder::new(Method::Binding, MessageClass::Request, &id, &mut buf);
    ///
    /// assert_eq!(&buf[..], &buffer[..]);
    /// ```
    pub fn new(
        method: Method,
        class: MessageClass,
        transaction_id: &TransactionId,
        bytes: &'a mut BytesMut,
    ) -> Self {
        bytes.clear();
        bytes.put_u16(message_type(method, class));
        bytes.put_u16(0);
        bytes.put(&transaction_id.as_bytes()[..]);

        let mut token = [0u8; 12];
        token.copy_from_slice(transaction_id.token());
        Self { bytes, token }
    }

    /// Continue writing a message whose header is already in the buffer.
    pub fn attach(bytes: &'a mut BytesMut) -> Result<Self, Error> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::InvalidInput);
        }

        let token = bytes[8..20].try_into()?;
        Ok(Self { bytes, token })
    }

    /// append attribute.
    ///
    /// append attribute to message attribute list, the header length is
    /// updated to cover it.
    ///
    /// # Test
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use stun_agent_codec::message::attributes::*;
    /// use stun_agent_codec::message::methods::*;
    /// use stun_agent_codec::message::*;
    ///
    /// let buffer = [
    ///     0x00u8, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49,
    ///     0x42, 0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b,
    /// ];
    ///
    /// let new_buf = [
    ///     0x00u8, 0x01, 0x00, 0x0c, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49,
    ///     0x42, 0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b, 0x00, 0x06, 0x00,
    ///     0x05, 0x70, 0x61, 0x6e, 0x64, 0x61, 0x00, 0x00, 0x00,
    /// ];
    ///
    /// let mut buf = BytesMut::from(&buffer[..]);
    /// let mut message = MessageEncoder::attach(&mut buf).unwrap();
    /// message.append::<UserName>(b"panda");
    ///
    /// assert_eq!(&new_buf[..], &buf[..]);
    /// ```
    pub fn append<'c, T: Attribute<'c>>(&mut self, value: T::Item) {
        self.bytes.put_u16(T::TYPE as u16);

        // record the current position, and reserve two bytes for the size,
        // it is only known after the value has been written.
        let os = self.bytes.len();
        self.bytes.put_u16(0);
        T::serialize(value, &mut *self.bytes, &self.token);

        // compute write index,
        // back to source index write size.
        let size = self.bytes.len() - os - 2;
        self.bytes[os..os + 2].copy_from_slice(&(size as u16).to_be_bytes());

        // if you need to padding,
        // padding in the zero bytes.
        let psize = alignment_32(size);
        if psize > 0 {
            self.bytes.put(&[0u8; 4][0..psize]);
        }

        self.set_len(self.bytes.len() - HEADER_SIZE);
    }

    /// append MessageIntegrity attribute.
    ///
    /// The header length is first set to include the attribute, then the
    /// HMAC is computed over everything written so far.
    ///
    /// # Test
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use stun_agent_codec::Attributes;
    /// use stun_agent_codec::message::*;
    ///
    /// let buffer = [
    ///     0x00u8, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49,
    ///     0x42, 0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b,
    /// ];
    ///
    /// let mut buf = BytesMut::from(&buffer[..]);
    /// MessageEncoder::attach(&mut buf).unwrap().append_integrity(b"secret", false);
    ///
    /// let mut attributes = Attributes::default();
    /// let message = Message::decode(&buf, &mut attributes).unwrap();
    ///
    /// assert_eq!(buf.len(), 44);
    /// assert!(message.verify_integrity(b"secret", false).is_ok());
    /// assert!(message.verify_integrity(b"public", false).is_err());
    /// ```
    pub fn append_integrity(&mut self, key: &[u8], padding: bool) {
        let len = self.bytes.len();
        self.set_len(len - HEADER_SIZE + 24);

        let hmac = hmac_sha1(key, &[&self.bytes[..]], padding);
        self.bytes.put_u16(AttributeType::MessageIntegrity as u16);
        self.bytes.put_u16(20);
        self.bytes.put(hmac.as_slice());
    }

    /// append Fingerprint attribute, which has to be the last one.
    pub fn append_fingerprint(&mut self) {
        let len = self.bytes.len();
        self.set_len(len - HEADER_SIZE + 8);

        let crc = fingerprint(&self.bytes[..]);
        self.bytes.put_u16(AttributeType::Fingerprint as u16);
        self.bytes.put_u16(4);
        self.bytes.put_u32(crc);
    }

    /// Drop everything written after `len` bytes and fix the header length.
    pub fn truncate(&mut self, len: usize) {
        let len = len.max(HEADER_SIZE);
        self.bytes.truncate(len);
        self.set_len(len - HEADER_SIZE);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    // set stun message header size.
    fn set_len(&mut self, len: usize) {
        self.bytes[2..4].copy_from_slice((len as u16).to_be_bytes().as_slice());
    }
}

pub struct Message<'a> {
    method: Method,
    class: MessageClass,
    /// message source bytes, exactly one message.
    bytes: &'a [u8],
    /// offset of the first MESSAGE-INTEGRITY attribute header.
    integrity: Option<usize>,
    /// offset of the first FINGERPRINT attribute header.
    fingerprint: Option<usize>,
    // message attribute list.
    attributes: &'a Attributes,
}

impl<'a> Message<'a> {
    /// message method.
    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    /// message class.
    #[inline]
    pub fn class(&self) -> MessageClass {
        self.class
    }

    /// the trailing 96 bits of the transaction id.
    #[inline]
    pub fn token(&self) -> &'a [u8] {
        &self.bytes[8..20]
    }

    /// message transaction id, see [`TransactionId`].
    pub fn transaction_id(&self) -> TransactionId {
        let mut id = [0u8; 16];
        id.copy_from_slice(&self.bytes[4..20]);
        TransactionId(id)
    }

    /// Whether the magic cookie sits where RFC5389 puts it.
    pub fn has_cookie(&self) -> bool {
        self.bytes[4..8] == MAGIC_NUMBER.to_be_bytes()
    }

    /// The raw bytes of the whole message.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether an attribute of the given type is present.
    pub fn has(&self, kind: AttributeType) -> bool {
        self.attributes.get(kind as u16).is_some()
    }

    /// The raw attribute type codes, in the order they were found.
    pub fn attribute_kinds(&self) -> impl Iterator<Item = u16> + 'a {
        self.attributes.kinds()
    }

    /// get attribute.
    ///
    /// get attribute from message attribute list.
    ///
    /// # Test
    ///
    /// ```
    /// use stun_agent_codec::message::attributes::*;
    /// use stun_agent_codec::message::*;
    /// use stun_agent_codec::*;
    ///
    /// let buffer = [
    ///     0x00u8, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49,
    ///     0x42, 0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b,
    /// ];
    ///
    /// let mut attributes = Attributes::default();
    /// let message = Message::decode(&buffer[..], &mut attributes).unwrap();
    ///
    /// assert!(message.get::<UserName>().is_none());
    /// ```
    pub fn get<T: Attribute<'a>>(&self) -> Option<T::Item> {
        let range = self.attributes.get(T::TYPE as u16)?;
        T::deserialize(&self.bytes[range], self.token()).ok()
    }

    /// Gets all the values of an attribute from a list.
    ///
    /// Normally a stun message can have multiple attributes with the same name,
    /// and this function will all the values of the current attribute.
    pub fn get_all<T: Attribute<'a>>(&self) -> impl Iterator<Item = T::Item> + '_ {
        self.attributes
            .get_all(T::TYPE as u16)
            .filter_map(|it| T::deserialize(&self.bytes[it.clone()], self.token()).ok())
    }

    /// check MessageIntegrity attribute.
    ///
    /// The HMAC covers the message up to the attribute, with the header
    /// length rewritten to end right after it, so attributes that follow
    /// (FINGERPRINT) do not disturb the check.
    ///
    /// # Test
    ///
    /// ```
    /// use stun_agent_codec::crypto::long_term_key;
    /// use stun_agent_codec::message::*;
    /// use stun_agent_codec::*;
    ///
    /// let buffer = [
    ///     0x00u8, 0x03, 0x00, 0x50, 0x21, 0x12, 0xa4, 0x42, 0x64, 0x4f, 0x5a,
    ///     0x78, 0x6a, 0x56, 0x33, 0x62, 0x4b, 0x52, 0x33, 0x31, 0x00, 0x19, 0x00,
    ///     0x04, 0x11, 0x00, 0x00, 0x00, 0x00, 0x06, 0x00, 0x05, 0x70, 0x61, 0x6e,
    ///     0x64, 0x61, 0x00, 0x00, 0x00, 0x00, 0x14, 0x00, 0x09, 0x72, 0x61, 0x73,
    ///     0x70, 0x62, 0x65, 0x72, 0x72, 0x79, 0x00, 0x00, 0x00, 0x00, 0x15, 0x00,
    ///     0x10, 0x31, 0x63, 0x31, 0x33, 0x64, 0x32, 0x62, 0x32, 0x34, 0x35, 0x62,
    ///     0x33, 0x61, 0x37, 0x33, 0x34, 0x00, 0x08, 0x00, 0x14, 0xd6, 0x78, 0x26,
    ///     0x99, 0x0e, 0x15, 0x56, 0x15, 0xe5, 0xf4, 0x24, 0x74, 0xe2, 0x3c, 0x26,
    ///     0xc5, 0xb1, 0x03, 0xb2, 0x6d,
    /// ];
    ///
    /// let mut attributes = Attributes::default();
    /// let message = Message::decode(&buffer[..], &mut attributes).unwrap();
    /// let key = long_term_key(b"panda", b"raspberry", b"panda");
    ///
    /// assert!(message.verify_integrity(&key, false).is_ok());
    /// ```
    pub fn verify_integrity(&self, key: &[u8], padding: bool) -> Result<(), Error> {
        let offset = self.integrity.ok_or(Error::NotFoundIntegrity)?;
        let hash = self
            .bytes
            .get(offset + 4..offset + 24)
            .ok_or(Error::InvalidInput)?;

        let size_buf = ((offset + 24 - HEADER_SIZE) as u16).to_be_bytes();
        let body = [&self.bytes[0..2], &size_buf, &self.bytes[4..offset]];

        if !digest_eq(hash, &hmac_sha1(key, &body, padding)) {
            return Err(Error::IntegrityFailed);
        }

        Ok(())
    }

    /// check Fingerprint attribute.
    ///
    /// The attribute has to be the last one of the message.
    pub fn verify_fingerprint(&self) -> Result<(), Error> {
        let offset = self.fingerprint.ok_or(Error::NotFoundFingerprint)?;
        if offset + 8 != self.bytes.len() {
            return Err(Error::FingerprintFailed);
        }

        let value = u32::from_be_bytes(self.bytes[offset + 4..offset + 8].try_into()?);
        if value != fingerprint(&self.bytes[..offset]) {
            return Err(Error::FingerprintFailed);
        }

        Ok(())
    }

    /// # Test
    ///
    /// ```
    /// use stun_agent_codec::message::attributes::*;
    /// use stun_agent_codec::message::methods::*;
    /// use stun_agent_codec::message::*;
    /// use stun_agent_codec::*;
    ///
    /// let buffer: [u8; 20] = [
    ///     0x00, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49, 0x42,
    ///     0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b,
    /// ];
    ///
    /// let mut attributes = Attributes::default();
    /// let message = Message::decode(&buffer[..], &mut attributes).unwrap();
    ///
    /// assert_eq!(message.method(), Method::Binding);
    /// assert_eq!(message.class(), MessageClass::Request);
    /// assert!(message.has_cookie());
    /// assert!(message.get::<UserName>().is_none());
    /// ```
    pub fn decode(bytes: &'a [u8], attributes: &'a mut Attributes) -> Result<Self, Error> {
        let size = Self::validate_size(bytes)?;
        let bytes = &bytes[..size];

        let (method, class) = split_message_type(u16::from_be_bytes(bytes[..2].try_into()?));

        attributes.clear();

        let mut integrity = None;
        let mut fingerprint = None;
        let mut offset = HEADER_SIZE;

        while offset + 4 <= size {
            let key = u16::from_be_bytes([bytes[offset], bytes[offset + 1]]);
            let len = u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]) as usize;

            if key == AttributeType::MessageIntegrity as u16 && integrity.is_none() {
                integrity = Some(offset);
            }

            if key == AttributeType::Fingerprint as u16 && fingerprint.is_none() {
                fingerprint = Some(offset);
            }

            attributes.append(key, offset + 4..offset + 4 + len);
            offset += 4 + len + alignment_32(len);
        }

        Ok(Self {
            attributes,
            integrity,
            fingerprint,
            method,
            class,
            bytes,
        })
    }

    /// Check that the buffer holds exactly one complete STUN message.
    ///
    /// Returns the message size, [`Error::Incomplete`] when the header
    /// announces more bytes than are available, and [`Error::InvalidInput`]
    /// for anything that cannot be a STUN message.
    ///
    /// # Test
    ///
    /// ```
    /// use stun_agent_codec::{Error, message::*};
    ///
    /// let buffer: [u8; 24] = [
    ///     0x00, 0x01, 0x00, 0x04, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49, 0x42,
    ///     0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b, 0x80, 0x22, 0x00, 0x00,
    /// ];
    ///
    /// assert_eq!(Message::validate_size(&buffer[..]).unwrap(), 24);
    /// assert!(matches!(Message::validate_size(&buffer[..22]), Err(Error::Incomplete)));
    /// assert!(matches!(Message::validate_size(&buffer[..10]), Err(Error::InvalidInput)));
    /// ```
    pub fn validate_size(bytes: &[u8]) -> Result<usize, Error> {
        let size = Self::message_size(bytes)?;
        if size % 4 != 0 {
            return Err(Error::InvalidInput);
        }

        if bytes.len() < size {
            return Err(Error::Incomplete);
        }

        // Trailing data after the message means this is not a STUN datagram.
        if bytes.len() > size {
            return Err(Error::InvalidInput);
        }

        let mut offset = HEADER_SIZE;
        while offset < size {
            if size - offset < 4 {
                return Err(Error::InvalidInput);
            }

            let len = u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]) as usize;
            let padded = len + alignment_32(len);
            if size - offset - 4 < padded {
                return Err(Error::InvalidInput);
            }

            offset += 4 + padded;
        }

        Ok(size)
    }

    /// The total size announced by the header.
    ///
    /// # Test
    ///
    /// ```
    /// use stun_agent_codec::message::*;
    ///
    /// let buffer: [u8; 20] = [
    ///     0x00, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49, 0x42,
    ///     0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b,
    /// ];
    ///
    /// let size = Message::message_size(&buffer[..]).unwrap();
    ///
    /// assert_eq!(size, 20);
    /// ```
    pub fn message_size(bytes: &[u8]) -> Result<usize, Error> {
        if bytes.len() < HEADER_SIZE || bytes[0] >> 6 != 0 {
            return Err(Error::InvalidInput);
        }

        Ok(u16::from_be_bytes(bytes[2..4].try_into()?) as usize + HEADER_SIZE)
    }
}

/// compute padding size.
///
/// RFC5389 stipulates that the attribute content is a multiple of 4.
///
/// # Test
///
/// ```
/// use stun_agent_codec::message::alignment_32;
///
/// assert_eq!(alignment_32(4), 0);
/// assert_eq!(alignment_32(0), 0);
/// assert_eq!(alignment_32(5), 3);
/// ```
#[inline(always)]
pub fn alignment_32(size: usize) -> usize {
    let range = size % 4;
    if size == 0 || range == 0 {
        return 0;
    }

    4 - range
}
