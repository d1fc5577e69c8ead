use std::ops::{BitOr, BitOrAssign};

use codec::message::attributes::AttributeType;

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Which revision of the protocol the agent speaks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize), serde(rename_all = "lowercase"))]
pub enum Compatibility {
    /// Classic STUN: no magic cookie, 128-bit transaction ids, no
    /// fingerprint, and the HMAC input zero-padded to 64 bytes.
    Rfc3489,
    #[default]
    Rfc5389,
}

/// A set of independent behaviour bits.
///
/// # Test
///
/// ```
/// use stun_agent::config::Usage;
///
/// let usage = Usage::SHORT_TERM_CREDENTIALS | Usage::USE_FINGERPRINT;
///
/// assert!(usage.contains(Usage::USE_FINGERPRINT));
/// assert!(!usage.contains(Usage::LONG_TERM_CREDENTIALS));
/// assert!(Usage::default().is_empty());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize), serde(transparent))]
pub struct Usage(u32);

impl Usage {
    /// Requests must carry USERNAME and MESSAGE-INTEGRITY, the key is the
    /// password itself.
    pub const SHORT_TERM_CREDENTIALS: Self = Self(1 << 0);
    /// Requests must carry USERNAME, MESSAGE-INTEGRITY, NONCE and REALM, the
    /// key is `MD5(username:realm:password)`.
    pub const LONG_TERM_CREDENTIALS: Self = Self(1 << 1);
    /// Check FINGERPRINT on received messages and add it to finished ones.
    pub const USE_FINGERPRINT: Self = Self(1 << 2);
    /// Add SOFTWARE to finished messages.
    pub const ADD_SOFTWARE: Self = Self(1 << 3);
    /// Skip every credential check.
    pub const IGNORE_CREDENTIALS: Self = Self(1 << 4);
    /// Indications are not authenticated.
    pub const NO_INDICATION_AUTH: Self = Self(1 << 5);
    /// Call the validater even when credentials would otherwise be skipped.
    pub const FORCE_VALIDATER: Self = Self(1 << 6);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Usage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Usage {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Agent configuration.
///
/// Everything the agent needs to know up front. Changing the options of a
/// running agent goes through [`crate::Agent::reset`], which also forgets
/// every outstanding request.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Deserialize), serde(default, rename_all = "kebab-case"))]
pub struct AgentOptions {
    ///
    /// Protocol revision
    ///
    /// decides whether the magic cookie and fingerprint are required, how
    /// transaction ids are generated and how the integrity hmac is computed.
    ///
    pub compatibility: Compatibility,
    ///
    /// Usage flags
    ///
    pub usage: Usage,
    ///
    /// Known attributes
    ///
    /// comprehension-required attribute types (below 0x8000) that the
    /// caller understands. A message carrying any other one is flagged.
    ///
    pub known_attributes: Vec<u16>,
    ///
    /// SOFTWARE value
    ///
    /// written when [`Usage::ADD_SOFTWARE`] is set.
    ///
    pub software: Option<String>,
}

impl AgentOptions {
    pub fn new(known_attributes: Vec<u16>, compatibility: Compatibility, usage: Usage) -> Self {
        Self {
            compatibility,
            usage,
            known_attributes,
            ..Default::default()
        }
    }

    /// The comprehension-required attributes the codec has a type for.
    pub fn default_known_attributes() -> Vec<u16> {
        [
            AttributeType::MappedAddress,
            AttributeType::UserName,
            AttributeType::MessageIntegrity,
            AttributeType::ErrorCode,
            AttributeType::UnknownAttributes,
            AttributeType::Realm,
            AttributeType::Nonce,
            AttributeType::XorMappedAddress,
            AttributeType::Priority,
            AttributeType::UseCandidate,
        ]
        .into_iter()
        .map(|it| it as u16)
        .collect()
    }

    pub fn default_software() -> String {
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
    }
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            compatibility: Compatibility::default(),
            usage: Usage::empty(),
            known_attributes: Self::default_known_attributes(),
            software: Some(Self::default_software()),
        }
    }
}
