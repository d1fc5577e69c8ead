use num_enum::TryFromPrimitive;

/// The following error codes, along with their recommended reason
/// phrases, are defined:
///
/// 300  Try Alternate: The client should contact an alternate server for
///      this request.
///
/// 400  Bad Request: The request was malformed.  The client SHOULD NOT
///      retry the request without modification from the previous
///      attempt.  The server may not be able to generate a valid
///      MESSAGE-INTEGRITY for this error, so the client MUST NOT expect
///      a valid MESSAGE-INTEGRITY attribute on this response.
///
/// 401  Unauthenticated: The request did not contain the correct
///      credentials to proceed.  The client should retry the request
///      with proper credentials.
///
/// 420  Unknown Attribute: The server received a STUN packet containing
///      a comprehension-required attribute that it did not understand.
///      The server MUST put this unknown attribute in the UNKNOWN-
///      ATTRIBUTE attribute of its error response.
///
/// 438  Stale Nonce: The NONCE used by the client was no longer valid.
///      The client should retry, using the NONCE provided in the
///      response.
///
/// 487  Role Conflict: The client asserted an ICE role (controlling or
///      controlled) that is in conflict with the role of the server.
///
/// 500  Server Error: The server has suffered a temporary error.  The
///      client should try again.
const fn errno(code: u16) -> u16 {
    ((code / 100) << 8) | (code % 100)
}

#[repr(u16)]
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash, TryFromPrimitive)]
pub enum ErrorType {
    TryAlternate = errno(300),
    BadRequest = errno(400),
    Unauthorized = errno(401),
    Forbidden = errno(403),
    UnknownAttribute = errno(420),
    AllocationMismatch = errno(437),
    StaleNonce = errno(438),
    AddressFamilyNotSupported = errno(440),
    WrongCredentials = errno(441),
    UnsupportedTransportAddress = errno(442),
    PeerAddressFamilyMismatch = errno(443),
    AllocationQuotaReached = errno(486),
    RoleConflict = errno(487),
    ServerError = errno(500),
    InsufficientCapacity = errno(508),
}

impl ErrorType {
    /// The numeric code as written in text, e.g. `420`.
    ///
    /// # Test
    ///
    /// ```
    /// use stun_agent_codec::message::attributes::error::ErrorType;
    ///
    /// assert_eq!(ErrorType::UnknownAttribute.code(), 420);
    /// assert_eq!(ErrorType::RoleConflict.code(), 487);
    /// ```
    pub fn code(self) -> u16 {
        let value = self as u16;
        (value >> 8) * 100 + (value & 0xFF)
    }
}

impl From<ErrorType> for &'static str {
    /// # Test
    ///
    /// ```
    /// use stun_agent_codec::message::attributes::error::ErrorType;
    ///
    /// let err: &'static str = ErrorType::TryAlternate.into();
    /// assert_eq!(err, "Try Alternate");
    /// ```
    #[rustfmt::skip]
    fn from(val: ErrorType) -> Self {
        match val {
            ErrorType::TryAlternate => "Try Alternate",
            ErrorType::BadRequest => "Bad Request",
            ErrorType::Unauthorized => "Unauthorized",
            ErrorType::Forbidden => "Forbidden",
            ErrorType::UnknownAttribute => "Unknown Attribute",
            ErrorType::AllocationMismatch => "Allocation Mismatch",
            ErrorType::StaleNonce => "Stale Nonce",
            ErrorType::AddressFamilyNotSupported => "Address Family not Supported",
            ErrorType::WrongCredentials => "Wrong Credentials",
            ErrorType::UnsupportedTransportAddress => "Unsupported Transport Address",
            ErrorType::PeerAddressFamilyMismatch => "Peer Address Family Mismatch",
            ErrorType::AllocationQuotaReached => "Allocation Quota Reached",
            ErrorType::RoleConflict => "Role Conflict",
            ErrorType::ServerError => "Server Error",
            ErrorType::InsufficientCapacity => "Insufficient Capacity",
        }
    }
}
