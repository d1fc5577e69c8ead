use aws_lc_rs::{constant_time, hmac};
use md5::{Digest, Md5};

/// HMAC SHA1 digest.
///
/// # Test
///
/// ```
/// use stun_agent_codec::crypto::hmac_sha1;
///
/// let buffer = [
///     0x00u8, 0x03, 0x00, 0x50, 0x21, 0x12, 0xa4, 0x42, 0x64, 0x4f, 0x5a,
///     0x78, 0x6a, 0x56, 0x33, 0x62, 0x4b, 0x52, 0x33, 0x31, 0x00, 0x19, 0x00,
///     0x04, 0x11, 0x00, 0x00, 0x00, 0x00, 0x06, 0x00, 0x05, 0x70, 0x61, 0x6e,
///     0x64, 0x61, 0x00, 0x00, 0x00, 0x00, 0x14, 0x00, 0x09, 0x72, 0x61, 0x73,
///     0x70, 0x62, 0x65, 0x72, 0x72, 0x79, 0x00, 0x00, 0x00, 0x00, 0x15, 0x00,
///     0x10, 0x31, 0x63, 0x31, 0x33, 0x64, 0x32, 0x62, 0x32, 0x34, 0x35, 0x62,
///     0x33, 0x61, 0x37, 0x33, 0x34,
/// ];
///
/// let key = [
///     0x3eu8, 0x2f, 0x79, 0x1e, 0x1f, 0x14, 0xd1, 0x73, 0xfc, 0x91, 0xff,
///     0x2f, 0x59, 0xb5, 0x0f, 0xd1,
/// ];
///
/// let sign = [
///     0xd6u8, 0x78, 0x26, 0x99, 0x0e, 0x15, 0x56, 0x15, 0xe5, 0xf4, 0x24,
///     0x74, 0xe2, 0x3c, 0x26, 0xc5, 0xb1, 0x03, 0xb2, 0x6d,
/// ];
///
/// assert_eq!(hmac_sha1(&key, &[&buffer], false), sign);
/// ```
pub fn hmac_sha1(key: &[u8], source: &[&[u8]], padding: bool) -> [u8; 20] {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key);
    let mut ctx = hmac::Context::with_key(&key);

    let mut size = 0;
    for buf in source {
        ctx.update(buf);
        size += buf.len();
    }

    // RFC3489 computes the HMAC over the message padded with zeroes up to a
    // multiple of 64 bytes.
    if padding && size % 64 != 0 {
        ctx.update(&[0u8; 64][..64 - size % 64]);
    }

    let mut result = [0u8; 20];
    result.copy_from_slice(ctx.sign().as_ref());
    result
}

/// Compare two digests without leaking where they differ.
///
/// # Test
///
/// ```
/// use stun_agent_codec::crypto::digest_eq;
///
/// assert!(digest_eq(b"abc", b"abc"));
/// assert!(!digest_eq(b"abc", b"abd"));
/// assert!(!digest_eq(b"abc", b"ab"));
/// ```
pub fn digest_eq(a: &[u8], b: &[u8]) -> bool {
    constant_time::verify_slices_are_equal(a, b).is_ok()
}

/// CRC32 Fingerprint.
///
/// # Test
///
/// ```
/// use stun_agent_codec::crypto::fingerprint;
///
/// assert_eq!(fingerprint(b"1"), 3498621689);
/// ```
pub fn fingerprint(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes) ^ 0x5354_554e
}

/// create long term credential.
///
/// > key = MD5(username ":" realm ":" password)
///
/// # Test
///
/// ```
/// use stun_agent_codec::crypto::long_term_key;
///
/// let buffer = [
///     0x3eu8, 0x2f, 0x79, 0x1e, 0x1f, 0x14, 0xd1, 0x73, 0xfc, 0x91, 0xff,
///     0x2f, 0x59, 0xb5, 0x0f, 0xd1,
/// ];
///
/// let key = long_term_key(b"panda", b"raspberry", b"panda");
///
/// assert_eq!(key, buffer);
/// ```
pub fn long_term_key(username: &[u8], realm: &[u8], password: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(username);
    hasher.update(b":");
    hasher.update(realm);
    hasher.update(b":");
    hasher.update(password);
    hasher.finalize().into()
}
