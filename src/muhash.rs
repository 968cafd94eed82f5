//! Order-independent multiset hashing.
//!
//! A [`MuHash`] maps a multiset of byte strings to a single 32-byte digest
//! that does not depend on insertion order, supports removing elements
//! without revisiting the rest of the set, and lets two sets be merged by
//! combining their accumulators. Each element is hashed into a residue of
//! the 3072-bit field and multiplied into a numerator (additions) or a
//! denominator (removals); the set digest hashes the quotient of the two.
//! Security reduces to the discrete logarithm problem in that field.

use std::fmt;

use blake2::digest::consts::U32;
use blake2::digest::Mac;
use blake2::Blake2bMac;
use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use thiserror::Error;

use crate::num3072::{Num3072, ELEMENT_BYTE_SIZE};

/// Byte length of a finalized multiset digest.
pub const HASH_SIZE: usize = 32;

/// Byte length of a serialized multiset.
pub const SERIALIZED_MUHASH_SIZE: usize = ELEMENT_BYTE_SIZE;

/// The digest of an empty multiset.
pub const EMPTY_MUHASH_HASH: Hash = Hash([
    0x54, 0x4e, 0xb3, 0x14, 0x2c, 0x00, 0x0f, 0x0a, 0xd2, 0xc7, 0x6a, 0xc4, 0x1f, 0x42, 0x22,
    0xab, 0xba, 0xba, 0xbe, 0xd8, 0x30, 0xee, 0xaf, 0xee, 0x4b, 0x6d, 0xc5, 0x6b, 0x52, 0xd5,
    0xca, 0xc0,
]);

const ELEMENT_DOMAIN_KEY: &[u8] = b"MuHashElement";
const FINALIZE_DOMAIN_KEY: &[u8] = b"MuHashFinalize";

/// Errors surfaced when parsing a serialized multiset.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MuHashError {
    /// The serialized representative is not below the field modulus.
    #[error("serialized value overflows the muhash field")]
    Overflow,
}

/// A finalized multiset digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// The storage form of a multiset: its canonical numerator, little-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerializedMuHash([u8; SERIALIZED_MUHASH_SIZE]);

impl SerializedMuHash {
    /// The raw serialized bytes.
    pub fn as_bytes(&self) -> &[u8; SERIALIZED_MUHASH_SIZE] {
        &self.0
    }
}

impl From<[u8; SERIALIZED_MUHASH_SIZE]> for SerializedMuHash {
    fn from(bytes: [u8; SERIALIZED_MUHASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl Default for SerializedMuHash {
    fn default() -> Self {
        Self([0u8; SERIALIZED_MUHASH_SIZE])
    }
}

impl fmt::Display for SerializedMuHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Keyed blake2b-256 over `data`, with a domain key separating element
/// derivation from finalization.
fn keyed_hash(key: &[u8], data: &[u8]) -> Hash {
    let mut mac = Blake2bMac::<U32>::new_from_slice(key)
        .expect("domain keys are within the 64-byte blake2b key limit");
    mac.update(data);
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Hash(out)
}

/// Hashes arbitrary-length data onto a field element: the keyed blake2b
/// digest of the data keys a ChaCha20 stream (zero nonce) whose first 384
/// bytes are the element, little-endian.
///
/// The element is taken as-is. The odds of drawing a representative at or
/// above the modulus are below 2^-3051, and the multiset quotient comes out
/// the same either way.
fn element_from_data(data: &[u8]) -> Num3072 {
    let hashed = keyed_hash(ELEMENT_DOMAIN_KEY, data);
    let mut cipher = ChaCha20::new(&hashed.0.into(), &[0u8; 12].into());
    let mut bytes = [0u8; ELEMENT_BYTE_SIZE];
    cipher.apply_keystream(&mut bytes);
    Num3072::from_le_bytes(&bytes)
}

/// A rolling multiset accumulator.
///
/// Elements can be added and removed in any order, including removals of
/// elements never added (a negative multiplicity); two accumulators over the
/// same net multiset always finalize to the same digest. Removals are
/// collected in a denominator and paid for with a single modular inversion
/// at serialization or finalization time.
///
/// Equal multisets can hold different numerator/denominator splits, so the
/// type deliberately has no equality; compare digests from
/// [`finalize`](Self::finalize) or images from [`serialize`](Self::serialize)
/// instead.
#[derive(Clone, Debug)]
pub struct MuHash {
    numerator: Num3072,
    denominator: Num3072,
}

impl MuHash {
    /// Creates an empty multiset.
    pub fn new() -> Self {
        Self {
            numerator: Num3072::ONE,
            denominator: Num3072::ONE,
        }
    }

    /// Hashes `data` and adds it to the multiset.
    pub fn add(&mut self, data: &[u8]) {
        self.add_element(&element_from_data(data));
    }

    fn add_element(&mut self, element: &Num3072) {
        self.numerator.multiply(element);
    }

    /// Hashes `data` and removes it from the multiset.
    pub fn remove(&mut self, data: &[u8]) {
        self.remove_element(&element_from_data(data));
    }

    fn remove_element(&mut self, element: &Num3072) {
        self.denominator.multiply(element);
    }

    /// Merges `other` into `self`. Equivalent to adding and removing every
    /// element of `other` individually.
    pub fn combine(&mut self, other: &MuHash) {
        self.numerator.multiply(&other.numerator);
        self.denominator.multiply(&other.denominator);
    }

    /// Empties the multiset.
    pub fn reset(&mut self) {
        self.numerator.set_to_one();
        self.denominator.set_to_one();
    }

    /// Folds the denominator into the numerator, leaving the canonical
    /// quotient and a denominator of one.
    fn normalize(&mut self) {
        self.numerator.divide(&self.denominator);
        self.denominator.set_to_one();
    }

    /// Returns the storage image of the multiset. This is the one right way
    /// to persist an accumulator that may see further updates; a finalized
    /// digest cannot be resumed.
    pub fn serialize(&mut self) -> SerializedMuHash {
        self.normalize();
        SerializedMuHash(self.numerator.to_le_bytes())
    }

    /// Rebuilds a multiset from its storage image.
    pub fn deserialize(serialized: &SerializedMuHash) -> Result<Self, MuHashError> {
        let numerator = Num3072::from_le_bytes(&serialized.0);
        if numerator.is_overflowing() {
            return Err(MuHashError::Overflow);
        }
        Ok(Self {
            numerator,
            denominator: Num3072::ONE,
        })
    }

    /// Returns the 32-byte digest of the multiset.
    pub fn finalize(&mut self) -> Hash {
        let serialized = self.serialize();
        keyed_hash(FINALIZE_DOMAIN_KEY, &serialized.0)
    }
}

impl Default for MuHash {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MuHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut copy = self.clone();
        write!(f, "{}", copy.serialize())
    }
}
