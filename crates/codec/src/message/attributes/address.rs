use std::net::{IpAddr, SocketAddr};

use bytes::{Buf, BufMut};
use num_enum::TryFromPrimitive;

use crate::{Error, message::MAGIC_NUMBER};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum IpFamily {
    V4 = 0x01,
    V6 = 0x02,
}

/// Shared encoding of MAPPED-ADDRESS and XOR-MAPPED-ADDRESS.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |0 0 0 0 0 0 0 0|    Family     |           Port                |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// |                 Address (32 bits or 128 bits)                 |
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy)]
pub struct XAddress;

impl XAddress {
    /// # Test
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use stun_agent_codec::message::attributes::address::XAddress;
    ///
    /// let token = [
    ///     0x6c, 0x46, 0x62, 0x54, 0x6d, 0x41, 0x75, 0x7a, 0x76, 0x4a, 0x73, 0x56,
    /// ];
    ///
    /// let addr = "192.168.1.2:51678".parse().unwrap();
    /// let mut bytes = BytesMut::new();
    /// XAddress::serialize(&addr, &token, &mut bytes, true);
    ///
    /// let decoded = XAddress::deserialize(&bytes, &token, true).unwrap();
    /// assert_eq!(decoded, addr);
    /// assert_eq!(bytes[1], 0x01);
    /// ```
    pub fn serialize<B: BufMut>(addr: &SocketAddr, token: &[u8], bytes: &mut B, is_xor: bool) {
        bytes.put_u8(0);

        let addr = if is_xor { xor(addr, token) } else { *addr };

        bytes.put_u8(if addr.is_ipv4() {
            IpFamily::V4
        } else {
            IpFamily::V6
        } as u8);

        bytes.put_u16(addr.port());

        match addr.ip() {
            IpAddr::V4(ip) => bytes.put(&ip.octets()[..]),
            IpAddr::V6(ip) => bytes.put(&ip.octets()[..]),
        }
    }

    pub fn deserialize(mut bytes: &[u8], token: &[u8], is_xor: bool) -> Result<SocketAddr, Error> {
        if bytes.len() < 4 {
            return Err(Error::InvalidInput);
        }

        // skip the first 8 bits
        bytes.advance(1);

        let family = IpFamily::try_from(bytes.get_u8()).map_err(|_| Error::InvalidInput)?;
        let port = bytes.get_u16();

        let addr = SocketAddr::new(
            match family {
                IpFamily::V4 => IpAddr::V4(<[u8; 4]>::try_from(bytes)?.into()),
                IpFamily::V6 => IpAddr::V6(<[u8; 16]>::try_from(bytes)?.into()),
            },
            port,
        );

        Ok(if is_xor { xor(&addr, token) } else { addr })
    }
}

/// XOR an address with the magic cookie and, for IPv6, the 96-bit
/// transaction id.
pub fn xor(addr: &SocketAddr, token: &[u8]) -> SocketAddr {
    let cookie = MAGIC_NUMBER.to_be_bytes();

    SocketAddr::new(
        match addr.ip() {
            IpAddr::V4(it) => {
                let mut octets = it.octets();
                for (b, c) in octets.iter_mut().zip(cookie) {
                    *b ^= c;
                }

                IpAddr::V4(octets.into())
            }
            IpAddr::V6(it) => {
                let mut octets = it.octets();
                for (b, c) in octets.iter_mut().zip(cookie.iter().chain(token)) {
                    *b ^= c;
                }

                IpAddr::V6(octets.into())
            }
        },
        addr.port() ^ (MAGIC_NUMBER >> 16) as u16,
    )
}
