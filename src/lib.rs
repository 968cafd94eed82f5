#![deny(missing_docs)]

//! Incremental, order-independent hashing for multisets of byte strings,
//! built on multiplication in the 3072-bit pseudo-Mersenne prime field
//! p = 2^3072 − 1103717. Adding an element multiplies its field
//! representative into an accumulator and removing one divides it back out,
//! so the digest of a set never depends on the order in which it was
//! assembled or on how often it was rebuilt along the way.
//!
//! # muhash
//!
//! **MuHash3072** keeps a running hash of a changing set, such as the UTXO
//! set of a chain, where elements arrive and leave constantly and
//! re-hashing the whole set on every update is out of the question.
//!
//! ## Features
//!
//! * **Rolling updates**: [`MuHash::add`] and [`MuHash::remove`] cost one
//!   field multiplication each, independent of set size. Removals need not
//!   be preceded by a matching add; multiplicities may go negative.
//! * **Set algebra**: [`MuHash::combine`] merges two accumulators as if
//!   every update of one had been replayed onto the other.
//! * **Storage form**: [`MuHash::serialize`] emits a canonical 384-byte
//!   image and [`MuHash::deserialize`] restores it, rejecting
//!   out-of-field values.
//! * **Pure integer arithmetic**: the [`num3072`] module implements the
//!   field with fixed-width limb arrays in two configurations, 64-bit limbs
//!   over a native 128-bit multiply and a 32-bit fallback, with no
//!   heap allocation.
//!
//! ## Usage
//!
//! ```rust
//! use muhash::MuHash;
//!
//! let mut set = MuHash::new();
//! set.add(b"alpha");
//! set.add(b"beta");
//! set.remove(b"alpha");
//!
//! let mut beta_only = MuHash::new();
//! beta_only.add(b"beta");
//! assert_eq!(set.finalize(), beta_only.finalize());
//! ```
//!
//! An accumulator survives restarts through its storage image:
//!
//! ```rust
//! use muhash::MuHash;
//!
//! let mut set = MuHash::new();
//! set.add(b"utxo:0");
//! let image = set.serialize();
//! let mut restored = MuHash::deserialize(&image).expect("image is canonical");
//! assert_eq!(restored.serialize(), image);
//! ```

mod muhash;
pub mod num3072;

pub use muhash::{
    Hash, MuHash, MuHashError, SerializedMuHash, EMPTY_MUHASH_HASH, HASH_SIZE,
    SERIALIZED_MUHASH_SIZE,
};
pub use num3072::{Num3072, ELEMENT_BYTE_SIZE};
