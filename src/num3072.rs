//! 3072-bit modular arithmetic over the pseudo-Mersenne prime
//! p = 2^3072 − 1103717.
//!
//! Elements are fixed arrays of little-endian limbs. Because the modulus is
//! 2^3072 − c for a small c, the identity 2^3072 ≡ c (mod p) lets the
//! schoolbook product fold its upper half back into the lower half with one
//! small-constant multiplication per output limb instead of a full-width
//! division. Multiplication therefore leaves a *bounded* representative:
//! congruent to the true product and below 2^3072, but possibly still at or
//! above p. [`full_reduce`](w64::Num3072::full_reduce) collapses a bounded
//! representative into the canonical range [0, p).
//!
//! Two limb configurations are provided: 64-bit limbs riding on a native
//! 128-bit widening multiply ([`w64`]), and 32-bit limbs widening into 64 bits
//! ([`w32`]) for targets without one. Both produce bit-identical results; the
//! crate-level [`Num3072`] alias picks by target pointer width.
//!
//! The carry invariants the algorithms rely on are checked with assertions
//! that stay active in release builds; a failed check means the limb
//! configuration is internally inconsistent, and continuing would silently
//! produce a wrong product. Bounds that hold by construction of the limb
//! widths are additionally checked in debug builds only.

/// Byte length of a serialized field element (3072 bits).
pub const ELEMENT_BYTE_SIZE: usize = 384;

macro_rules! num3072_limbs {
    ($(#[$attr:meta])* $name:ident, $limb:ty, $wide:ty, $limbs:expr) => {
        $(#[$attr])*
        pub mod $name {
            /// Limbs per field element.
            pub const LIMBS: usize = $limbs;
            /// Bits per limb.
            pub const LIMB_BITS: u32 = <$limb>::BITS;
            /// The constant c in p = 2^3072 − c.
            pub const PRIME_DIFF: $limb = 1_103_717;

            const LIMB_BYTES: usize = std::mem::size_of::<$limb>();

            const _: () = assert!(LIMBS * LIMB_BYTES == super::ELEMENT_BYTE_SIZE);
            // The carry bounds in multiply/square need c to stay far below
            // the limb width; 21 bits leaves slack in both configurations.
            const _: () = assert!(PRIME_DIFF < (1 << 21));

            /// Splits the exact double-width product `a * b` into
            /// `(low, high)` limbs.
            #[inline]
            pub(crate) fn wide_multiply(a: $limb, b: $limb) -> ($limb, $limb) {
                let t = (a as $wide) * (b as $wide);
                (t as $limb, (t >> LIMB_BITS) as $limb)
            }

            /// `[low, high, carry] += [addend_low, addend_high]`, rippling
            /// each overflow one slot up.
            #[inline]
            fn accumulate3(
                low: &mut $limb,
                high: &mut $limb,
                carry: &mut $limb,
                addend_low: $limb,
                addend_high: $limb,
            ) {
                let (sum, overflow) = low.overflowing_add(addend_low);
                *low = sum;
                // addend_high is a product's high half, so it is at most
                // MAX − 1 and absorbing the low overflow cannot wrap.
                let (sum, overflow) = high.overflowing_add(addend_high + overflow as $limb);
                *high = sum;
                *carry = carry.wrapping_add(overflow as $limb);
            }

            /// `[low, high, carry] += a * b`.
            #[inline]
            pub(crate) fn multiply_add3(
                low: &mut $limb,
                high: &mut $limb,
                carry: &mut $limb,
                a: $limb,
                b: $limb,
            ) {
                let (product_low, product_high) = wide_multiply(a, b);
                accumulate3(low, high, carry, product_low, product_high);
            }

            /// `[low, high, carry] += 2 * a * b`, as two passes over the same
            /// product halves.
            #[inline]
            pub(crate) fn multiply_add3_doubled(
                low: &mut $limb,
                high: &mut $limb,
                carry: &mut $limb,
                a: $limb,
                b: $limb,
            ) {
                let (product_low, product_high) = wide_multiply(a, b);
                accumulate3(low, high, carry, product_low, product_high);
                accumulate3(low, high, carry, product_low, product_high);
            }

            /// `[c0, c1, c2] += n * [d0, d1, d2]`.
            ///
            /// `c2` is overwritten rather than accumulated; call sites keep
            /// the invariant that it is zero on entry. `d2 * n` must fit in a
            /// single limb for the result to be exact.
            #[inline]
            pub(crate) fn multiply_small_add3(
                c0: &mut $limb,
                c1: &mut $limb,
                c2: &mut $limb,
                d0: $limb,
                d1: $limb,
                d2: $limb,
                n: $limb,
            ) {
                let mut t = (d0 as $wide) * (n as $wide) + (*c0 as $wide);
                *c0 = t as $limb;
                t >>= LIMB_BITS;
                t += (d1 as $wide) * (n as $wide) + (*c1 as $wide);
                *c1 = t as $limb;
                t >>= LIMB_BITS;
                *c2 = (t as $limb).wrapping_add(d2.wrapping_mul(n));
            }

            /// `[low, high] *= n`, keeping only two limbs of the result.
            #[inline]
            pub(crate) fn multiply_small2(low: &mut $limb, high: &mut $limb, n: $limb) {
                let t = (*low as $wide) * (n as $wide);
                *low = t as $limb;
                *high = ((t >> LIMB_BITS) as $limb).wrapping_add(high.wrapping_mul(n));
            }

            /// Pops the low limb of `[low, high, carry]` as the next output
            /// digit and shifts the accumulator down one limb.
            #[inline]
            pub(crate) fn extract_shift3(
                low: &mut $limb,
                high: &mut $limb,
                carry: &mut $limb,
            ) -> $limb {
                let digit = *low;
                *low = *high;
                *high = *carry;
                *carry = 0;
                digit
            }

            /// `[low, high] += addend`, then pops the new low limb as the next
            /// output digit and shifts down one limb. An overflow of `high`
            /// itself (necessarily a carry of exactly 1) is recorded
            /// separately and becomes the new `high`.
            #[inline]
            pub(crate) fn add_extract_shift2(
                low: &mut $limb,
                high: &mut $limb,
                addend: $limb,
            ) -> $limb {
                let (digit, overflow) = low.overflowing_add(addend);
                let (new_low, double_overflow) = high.overflowing_add(overflow as $limb);
                *low = new_low;
                *high = double_overflow as $limb;
                digit
            }

            /// A 3072-bit unsigned residue modulo p = 2^3072 − 1103717,
            /// stored as little-endian limbs.
            ///
            /// Equality and `to_le_bytes` compare/expose the stored
            /// representative bit-for-bit; normalize with
            /// [`full_reduce`](Self::full_reduce) first when the canonical
            /// residue is what matters.
            #[derive(Clone, Copy, Debug, PartialEq, Eq)]
            pub struct Num3072 {
                limbs: [$limb; LIMBS],
            }

            impl Num3072 {
                /// The multiplicative identity.
                pub const ONE: Self = {
                    let mut limbs = [0 as $limb; LIMBS];
                    limbs[0] = 1;
                    Self { limbs }
                };

                /// Resets `self` to the multiplicative identity.
                pub fn set_to_one(&mut self) {
                    *self = Self::ONE;
                }

                /// Reads an element from its 384-byte little-endian image.
                pub fn from_le_bytes(bytes: &[u8; super::ELEMENT_BYTE_SIZE]) -> Self {
                    let mut limbs = [0 as $limb; LIMBS];
                    for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(LIMB_BYTES)) {
                        *limb = <$limb>::from_le_bytes(
                            chunk.try_into().expect("chunk length equals limb width"),
                        );
                    }
                    Self { limbs }
                }

                /// Writes the stored representative as its 384-byte
                /// little-endian image.
                pub fn to_le_bytes(&self) -> [u8; super::ELEMENT_BYTE_SIZE] {
                    let mut bytes = [0u8; super::ELEMENT_BYTE_SIZE];
                    for (chunk, limb) in bytes.chunks_exact_mut(LIMB_BYTES).zip(self.limbs.iter()) {
                        chunk.copy_from_slice(&limb.to_le_bytes());
                    }
                    bytes
                }

                /// Whether the stored representative is at or above the
                /// modulus.
                ///
                /// x ≥ 2^3072 − c holds exactly when every limb above the
                /// first is all-ones and the first exceeds MAX − c; c is too
                /// small to reach into the second limb.
                pub fn is_overflowing(&self) -> bool {
                    if self.limbs[0] <= <$limb>::MAX - PRIME_DIFF {
                        return false;
                    }
                    self.limbs[1..].iter().all(|&limb| limb == <$limb>::MAX)
                }

                /// Normalizes the representative into the canonical range
                /// [0, p). A no-op on already-canonical values.
                pub fn full_reduce(&mut self) {
                    if self.is_overflowing() {
                        self.reduce();
                    }
                }

                /// One wrap-and-fold pass: computes (x + c) mod 2^3072,
                /// which subtracts p when x ≥ p, or folds a dropped 2^3072
                /// carry bit back in when one is pending.
                fn reduce(&mut self) {
                    let mut low = PRIME_DIFF;
                    let mut high: $limb = 0;
                    for limb in self.limbs.iter_mut() {
                        *limb = add_extract_shift2(&mut low, &mut high, *limb);
                    }
                    // Whatever spills past the top limb is the single bit the
                    // pass is allowed to drop.
                    debug_assert!(low <= 1);
                    debug_assert_eq!(high, 0);
                }

                /// Multiplies `self` by `rhs` in place, modulo p.
                ///
                /// Leaves a bounded representative: congruent to the product
                /// and below 2^3072, but not necessarily below p. It is safe
                /// to chain further multiplications; call
                /// [`full_reduce`](Self::full_reduce) before comparing or
                /// serializing.
                pub fn multiply(&mut self, rhs: &Self) {
                    let (mut c0, mut c1, mut c2) = (0 as $limb, 0 as $limb, 0 as $limb);
                    let mut product = [0 as $limb; LIMBS];

                    // Output limbs 0..N-1: cross terms at weight 2^(3072+j)
                    // are collected in the scratch accumulator and folded
                    // down through c before the direct terms at weight 2^j
                    // join in.
                    for j in 0..LIMBS - 1 {
                        let (mut d0, mut d1) =
                            wide_multiply(self.limbs[1 + j], rhs.limbs[LIMBS - 1]);
                        let mut d2: $limb = 0;
                        for i in 2 + j..LIMBS {
                            multiply_add3(&mut d0, &mut d1, &mut d2, self.limbs[i], rhs.limbs[LIMBS + j - i]);
                        }

                        debug_assert_eq!(c2, 0);
                        multiply_small_add3(&mut c0, &mut c1, &mut c2, d0, d1, d2, PRIME_DIFF);
                        for i in 0..=j {
                            multiply_add3(&mut c0, &mut c1, &mut c2, self.limbs[i], rhs.limbs[j - i]);
                        }

                        product[j] = extract_shift3(&mut c0, &mut c1, &mut c2);
                    }

                    // Top limb: a pure diagonal pass, nothing left to fold.
                    assert_eq!(c2, 0);
                    for i in 0..LIMBS {
                        multiply_add3(&mut c0, &mut c1, &mut c2, self.limbs[i], rhs.limbs[LIMBS - 1 - i]);
                    }
                    product[LIMBS - 1] = extract_shift3(&mut c0, &mut c1, &mut c2);

                    // Second reduction: the leftover two-limb carry times c
                    // folds back under the top limb.
                    multiply_small2(&mut c0, &mut c1, PRIME_DIFF);
                    for (limb, digit) in self.limbs.iter_mut().zip(product.iter()) {
                        *limb = add_extract_shift2(&mut c0, &mut c1, *digit);
                    }

                    assert_eq!(c1, 0);
                    assert!(c0 <= 1);

                    // The result may sit in the band [p, 2^3072), and the
                    // fold above may have dropped one 2^3072 bit; each case
                    // costs one more pass. The range test runs first so the
                    // carry pass cannot itself overflow.
                    if self.is_overflowing() {
                        self.reduce();
                    }
                    if c0 == 1 {
                        self.reduce();
                    }
                }

                /// Squares `self` in place, modulo p. Same bound contract as
                /// [`multiply`](Self::multiply).
                ///
                /// Symmetry halves the work: each off-diagonal pair is
                /// accumulated once and doubled, and only even-weight columns
                /// carry a central square term.
                pub fn square(&mut self) {
                    let (mut c0, mut c1, mut c2) = (0 as $limb, 0 as $limb, 0 as $limb);
                    let mut product = [0 as $limb; LIMBS];

                    for j in 0..LIMBS - 1 {
                        let (mut d0, mut d1, mut d2) = (0 as $limb, 0 as $limb, 0 as $limb);
                        for i in 0..(LIMBS - 1 - j) / 2 {
                            multiply_add3_doubled(&mut d0, &mut d1, &mut d2, self.limbs[i + j + 1], self.limbs[LIMBS - 1 - i]);
                        }
                        if (j + 1) & 1 == 1 {
                            multiply_add3(&mut d0, &mut d1, &mut d2, self.limbs[(LIMBS - 1 - j) / 2 + j + 1], self.limbs[LIMBS - 1 - (LIMBS - 1 - j) / 2]);
                        }

                        debug_assert_eq!(c2, 0);
                        multiply_small_add3(&mut c0, &mut c1, &mut c2, d0, d1, d2, PRIME_DIFF);
                        for i in 0..(j + 1) / 2 {
                            multiply_add3_doubled(&mut c0, &mut c1, &mut c2, self.limbs[i], self.limbs[j - i]);
                        }
                        if (j + 1) & 1 == 1 {
                            multiply_add3(&mut c0, &mut c1, &mut c2, self.limbs[(j + 1) / 2], self.limbs[j - (j + 1) / 2]);
                        }

                        product[j] = extract_shift3(&mut c0, &mut c1, &mut c2);
                    }

                    assert_eq!(c2, 0);
                    for i in 0..LIMBS / 2 {
                        multiply_add3_doubled(&mut c0, &mut c1, &mut c2, self.limbs[i], self.limbs[LIMBS - 1 - i]);
                    }
                    product[LIMBS - 1] = extract_shift3(&mut c0, &mut c1, &mut c2);

                    multiply_small2(&mut c0, &mut c1, PRIME_DIFF);
                    for (limb, digit) in self.limbs.iter_mut().zip(product.iter()) {
                        *limb = add_extract_shift2(&mut c0, &mut c1, *digit);
                    }

                    assert_eq!(c1, 0);
                    assert!(c0 <= 1);

                    if self.is_overflowing() {
                        self.reduce();
                    }
                    if c0 == 1 {
                        self.reduce();
                    }
                }

                /// `self^(2^squarings) * factor`, in place.
                fn square_n_multiply(&mut self, squarings: u32, factor: &Self) {
                    for _ in 0..squarings {
                        self.square();
                    }
                    self.multiply(factor);
                }

                /// Returns the multiplicative inverse `self`^(p−2) mod p
                /// (Fermat), built from squarings and multiplications alone.
                ///
                /// Exponentiation uses a sliding window over repunit powers
                /// t[i] = x^(2^(2^i) − 1); the fixed schedule below consumes
                /// the exponent p − 2 = 2^3072 − 1103719 exactly. The inverse
                /// of zero comes out as zero.
                pub fn get_inverse(&self) -> Self {
                    let mut base = *self;
                    base.full_reduce();

                    let mut powers = [base; 12];
                    for i in 0..11 {
                        let mut next = powers[i];
                        for _ in 0..1u32 << i {
                            next.square();
                        }
                        next.multiply(&powers[i]);
                        powers[i + 1] = next;
                    }

                    let mut result = powers[11];
                    result.square_n_multiply(512, &powers[9]);
                    result.square_n_multiply(256, &powers[8]);
                    result.square_n_multiply(128, &powers[7]);
                    result.square_n_multiply(64, &powers[6]);
                    result.square_n_multiply(32, &powers[5]);
                    result.square_n_multiply(8, &powers[3]);
                    result.square_n_multiply(2, &powers[1]);
                    result.square_n_multiply(1, &powers[0]);
                    result.square_n_multiply(5, &powers[2]);
                    result.square_n_multiply(3, &powers[0]);
                    result.square_n_multiply(2, &powers[0]);
                    result.square_n_multiply(4, &powers[0]);
                    result.square_n_multiply(4, &powers[1]);
                    result.square_n_multiply(3, &powers[0]);
                    result
                }

                /// Divides `self` by `divisor` in place, modulo p.
                ///
                /// Unlike [`multiply`](Self::multiply) the result is always
                /// canonical.
                pub fn divide(&mut self, divisor: &Self) {
                    self.full_reduce();
                    let inverse = divisor.get_inverse();
                    self.multiply(&inverse);
                    self.full_reduce();
                }
            }
        }
    };
}

num3072_limbs!(
    /// 64-bit limb configuration: 48 limbs, widening through `u128`.
    w64,
    u64,
    u128,
    48
);

num3072_limbs!(
    /// 32-bit limb configuration: 96 limbs, widening through `u64`. For
    /// targets without a native 128-bit multiply.
    w32,
    u32,
    u64,
    96
);

/// The field element configuration matching the target's native wide
/// multiply.
#[cfg(target_pointer_width = "64")]
pub use self::w64::Num3072;

/// The field element configuration matching the target's native wide
/// multiply.
#[cfg(not(target_pointer_width = "64"))]
pub use self::w32::Num3072;
