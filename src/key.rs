//! Owned table keys and the borrowed input they are built from.
//!
//! A `Key` is immutable once built: it holds a private copy of the key
//! bytes and their FNV-1a hash, computed exactly once. The hash only picks
//! where a probe starts; equality is always a full byte comparison.

use crate::error::TableError;
use core::ffi::CStr;
use core::fmt;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// 64-bit FNV-1a over `bytes`.
#[inline]
pub fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyLen {
    Exact(usize),
    /// Length unknown to the caller: stop at the first NUL byte.
    Scan,
}

/// Borrowed key bytes plus a description of how long the key is.
///
/// Every table operation accepts `impl Into<KeyRef>`, so plain `&str` and
/// `&[u8]` keys work directly. Use [`KeyRef::with_len`] for a prefix of a
/// buffer and [`KeyRef::scan`] for NUL-terminated data of unknown length.
#[derive(Debug, Clone, Copy)]
pub struct KeyRef<'a> {
    bytes: &'a [u8],
    len: KeyLen,
}

impl<'a> KeyRef<'a> {
    /// The whole of `bytes` is the key.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            len: KeyLen::Exact(bytes.len()),
        }
    }

    /// The first `len` bytes of `bytes` are the key.
    pub fn with_len(bytes: &'a [u8], len: usize) -> Self {
        Self {
            bytes,
            len: KeyLen::Exact(len),
        }
    }

    /// The key runs up to the first NUL byte, or to the end of `bytes`.
    ///
    /// The scan never looks further than one byte past the table's
    /// maximum key length; a longer key is rejected.
    pub fn scan(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            len: KeyLen::Scan,
        }
    }

    /// Resolve the key bytes, enforcing `max_len`.
    pub(crate) fn resolve(&self, max_len: usize) -> Result<&'a [u8], TableError> {
        let len = match self.len {
            KeyLen::Exact(len) => {
                if len > max_len {
                    return Err(TableError::KeyTooLong { len, max: max_len });
                }
                if len > self.bytes.len() {
                    return Err(TableError::KeyLengthOutOfBounds {
                        len,
                        available: self.bytes.len(),
                    });
                }
                len
            }
            KeyLen::Scan => {
                let window = self.bytes.len().min(max_len.saturating_add(1));
                let window = &self.bytes[..window];
                let len = window.iter().position(|&b| b == 0).unwrap_or(window.len());
                if len > max_len {
                    return Err(TableError::KeyTooLong { len, max: max_len });
                }
                len
            }
        };
        Ok(&self.bytes[..len])
    }
}

impl<'a> From<&'a [u8]> for KeyRef<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        KeyRef::new(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for KeyRef<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        KeyRef::new(bytes)
    }
}

impl<'a> From<&'a str> for KeyRef<'a> {
    fn from(s: &'a str) -> Self {
        KeyRef::new(s.as_bytes())
    }
}

impl<'a> From<&'a String> for KeyRef<'a> {
    fn from(s: &'a String) -> Self {
        KeyRef::new(s.as_bytes())
    }
}

impl<'a> From<&'a Vec<u8>> for KeyRef<'a> {
    fn from(v: &'a Vec<u8>) -> Self {
        KeyRef::new(v)
    }
}

impl<'a> From<&'a CStr> for KeyRef<'a> {
    fn from(s: &'a CStr) -> Self {
        KeyRef::new(s.to_bytes())
    }
}

/// An owned key: private byte copy and cached hash.
pub(crate) struct Key {
    bytes: Box<[u8]>,
    hash: u64,
}

impl Key {
    /// Copy and hash the bytes described by `key`.
    pub(crate) fn from_ref(key: KeyRef<'_>, max_len: usize) -> Result<Self, TableError> {
        let bytes = key.resolve(max_len)?;
        Ok(Self {
            bytes: copy_bytes(bytes)?,
            hash: fnv1a(bytes),
        })
    }

    /// Deep copy with a fresh buffer; the cached hash is carried over.
    pub(crate) fn duplicate(&self) -> Result<Self, TableError> {
        Ok(Self {
            bytes: copy_bytes(&self.bytes)?,
            hash: self.hash,
        })
    }

    #[inline]
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub(crate) fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Key {}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("bytes", &String::from_utf8_lossy(&self.bytes))
            .field("len", &self.len())
            .field("hash", &format_args!("{:#018x}", self.hash))
            .finish()
    }
}

fn copy_bytes(bytes: &[u8]) -> Result<Box<[u8]>, TableError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes.len())
        .map_err(|_| TableError::AllocationFailed {
            capacity: bytes.len(),
        })?;
    buf.extend_from_slice(bytes);
    Ok(buf.into_boxed_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: the hash matches the published FNV-1a 64-bit test vectors.
    #[test]
    fn fnv1a_reference_vectors() {
        assert_eq!(fnv1a(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a(b"a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a(b"foobar"), 0x85944171f73967e8);
    }

    /// Invariant: a built key caches the hash of exactly its own bytes.
    #[test]
    fn key_caches_hash_of_content() {
        let k = Key::from_ref(KeyRef::from("alpha"), 64).unwrap();
        assert_eq!(k.bytes(), b"alpha");
        assert_eq!(k.len(), 5);
        assert_eq!(k.hash(), fnv1a(b"alpha"));
    }

    /// Invariant: `with_len` keys use only the requested prefix.
    #[test]
    fn explicit_length_takes_prefix() {
        let k = Key::from_ref(KeyRef::with_len(b"alphabet", 5), 64).unwrap();
        assert_eq!(k.bytes(), b"alpha");
        assert_eq!(k.hash(), fnv1a(b"alpha"));

        match Key::from_ref(KeyRef::with_len(b"abc", 4), 64) {
            Err(TableError::KeyLengthOutOfBounds { len: 4, available: 3 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    /// Invariant: a scanned key stops at the first NUL, or at the end of the slice.
    #[test]
    fn scan_stops_at_nul() {
        let k = Key::from_ref(KeyRef::scan(b"key\0trailing"), 64).unwrap();
        assert_eq!(k.bytes(), b"key");
        let k = Key::from_ref(KeyRef::scan(b"no-terminator"), 64).unwrap();
        assert_eq!(k.bytes(), b"no-terminator");
        let k = Key::from_ref(KeyRef::scan(b"\0"), 64).unwrap();
        assert_eq!(k.len(), 0);
    }

    /// Invariant: keys longer than the maximum are rejected for both length modes;
    /// exactly the maximum is accepted.
    #[test]
    fn oversized_keys_rejected() {
        assert!(Key::from_ref(KeyRef::from("abcd"), 4).is_ok());
        assert_eq!(
            Key::from_ref(KeyRef::from("abcde"), 4).unwrap_err(),
            TableError::KeyTooLong { len: 5, max: 4 }
        );
        // The scan caps at max + 1 bytes, so the reported length is max + 1.
        assert_eq!(
            Key::from_ref(KeyRef::scan(b"abcdefgh\0"), 4).unwrap_err(),
            TableError::KeyTooLong { len: 5, max: 4 }
        );
        assert!(Key::from_ref(KeyRef::scan(b"abcd\0efgh"), 4).is_ok());
    }

    /// Invariant: equality is full content equality; a prefix never matches.
    #[test]
    fn equality_is_content_not_prefix() {
        let ab = Key::from_ref(KeyRef::from("ab"), 64).unwrap();
        let abc = Key::from_ref(KeyRef::from("abc"), 64).unwrap();
        let ab2 = Key::from_ref(KeyRef::scan(b"ab\0c"), 64).unwrap();
        assert_ne!(ab, abc);
        assert_eq!(ab, ab2);
    }

    /// Invariant: a duplicate owns a distinct buffer with identical content and hash.
    #[test]
    fn duplicate_is_deep() {
        let k = Key::from_ref(KeyRef::from("dup"), 64).unwrap();
        let d = k.duplicate().unwrap();
        assert_eq!(k, d);
        assert_eq!(k.hash(), d.hash());
        assert_ne!(k.bytes().as_ptr(), d.bytes().as_ptr());
    }

    /// Invariant: all borrowed input forms resolve to the same bytes.
    #[test]
    fn input_conversions_agree() {
        let owned = String::from("k");
        let vec = b"k".to_vec();
        let cstr = CStr::from_bytes_with_nul(b"k\0").unwrap();
        let forms: [KeyRef<'_>; 6] = [
            "k".into(),
            (&owned).into(),
            (&b"k"[..]).into(),
            b"k".into(),
            (&vec).into(),
            cstr.into(),
        ];
        for f in forms {
            assert_eq!(f.resolve(8).unwrap(), b"k");
        }
    }
}
