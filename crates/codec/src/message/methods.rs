/// STUN Methods Registry
///
/// [RFC5389]: https://datatracker.ietf.org/doc/html/rfc5389
/// [RFC8489]: https://datatracker.ietf.org/doc/html/rfc8489
/// [RFC8126]: https://datatracker.ietf.org/doc/html/rfc8126
/// [Section 5]: https://datatracker.ietf.org/doc/html/rfc8489#section-5
///
/// A STUN method is a hex number in the range 0x000-0x0FF.  The encoding
/// of a STUN method into a STUN message is described in [Section 5].
///
/// STUN methods in the range 0x000-0x07F are assigned by IETF Review
/// [RFC8126].  STUN methods in the range 0x080-0x0FF are assigned by
/// Expert Review [RFC8126].
///
/// 0x000: Reserved
/// 0x001: Binding
/// 0x002: Reserved; was SharedSecret prior to [RFC5389]
/// 0x003: Allocate
/// 0x004: Refresh
/// 0x006: Send
/// 0x007: Data
/// 0x008: CreatePermission
/// 0x009: ChannelBind
///
/// The agent does not interpret methods, so any other 12-bit value is kept
/// as [`Method::Other`] instead of being rejected.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Method {
    Binding,
    SharedSecret,
    Allocate,
    Refresh,
    Send,
    Data,
    CreatePermission,
    ChannelBind,
    Other(u16),
}

impl From<u16> for Method {
    /// # Test
    ///
    /// ```
    /// use stun_agent_codec::message::methods::*;
    ///
    /// assert_eq!(Method::from(0x001), Method::Binding);
    /// assert_eq!(Method::from(0x009), Method::ChannelBind);
    /// assert_eq!(Method::from(0x0c1), Method::Other(0x0c1));
    /// ```
    fn from(value: u16) -> Self {
        match value & 0x0FFF {
            0x001 => Self::Binding,
            0x002 => Self::SharedSecret,
            0x003 => Self::Allocate,
            0x004 => Self::Refresh,
            0x006 => Self::Send,
            0x007 => Self::Data,
            0x008 => Self::CreatePermission,
            0x009 => Self::ChannelBind,
            other => Self::Other(other),
        }
    }
}

impl From<Method> for u16 {
    fn from(value: Method) -> Self {
        match value {
            Method::Binding => 0x001,
            Method::SharedSecret => 0x002,
            Method::Allocate => 0x003,
            Method::Refresh => 0x004,
            Method::Send => 0x006,
            Method::Data => 0x007,
            Method::CreatePermission => 0x008,
            Method::ChannelBind => 0x009,
            Method::Other(it) => it & 0x0FFF,
        }
    }
}

/// The class of a message: request, success response, failure response, or
/// indication.
#[repr(u8)]
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum MessageClass {
    Request = 0b00,
    Indication = 0b01,
    Response = 0b10,
    Error = 0b11,
}

impl MessageClass {
    /// Responses and error responses are answers to a request of ours.
    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Response | Self::Error)
    }
}

/// Compose the 14-bit message type field.
///
/// ```text
///  0                 1
///  2  3  4 5 6 7 8 9 0 1 2 3 4 5
/// +--+--+-+-+-+-+-+-+-+-+-+-+-+-+
/// |M |M |M|M|M|C|M|M|M|C|M|M|M|M|
/// |11|10|9|8|7|1|6|5|4|0|3|2|1|0|
/// +--+--+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// # Test
///
/// ```
/// use stun_agent_codec::message::methods::*;
///
/// assert_eq!(message_type(Method::Binding, MessageClass::Request), 0x0001);
/// assert_eq!(message_type(Method::Binding, MessageClass::Indication), 0x0011);
/// assert_eq!(message_type(Method::Binding, MessageClass::Response), 0x0101);
/// assert_eq!(message_type(Method::Binding, MessageClass::Error), 0x0111);
/// assert_eq!(message_type(Method::Send, MessageClass::Indication), 0x0016);
/// ```
pub fn message_type(method: Method, class: MessageClass) -> u16 {
    let method: u16 = method.into();
    let class = class as u16;

    (method & 0x000F)
        | ((method & 0x0070) << 1)
        | ((method & 0x0F80) << 2)
        | ((class & 0b01) << 4)
        | ((class & 0b10) << 7)
}

/// Split the 14-bit message type field into method and class.
///
/// # Test
///
/// ```
/// use stun_agent_codec::message::methods::*;
///
/// assert_eq!(split_message_type(0x0113), (Method::Allocate, MessageClass::Error));
/// assert_eq!(split_message_type(0x0017), (Method::Data, MessageClass::Indication));
/// ```
pub fn split_message_type(kind: u16) -> (Method, MessageClass) {
    let method = (kind & 0x000F) | ((kind & 0x00E0) >> 1) | ((kind & 0x3E00) >> 2);
    let class = match ((kind >> 7) & 0b10) | ((kind >> 4) & 0b01) {
        0b00 => MessageClass::Request,
        0b01 => MessageClass::Indication,
        0b10 => MessageClass::Response,
        _ => MessageClass::Error,
    };

    (Method::from(method), class)
}
