//! Integer-only IEEE-754 arithmetic.
//!
//! Every operation here works on raw encodings widened to `u128` and never
//! touches the host FPU, so results are bit-identical on every platform.
//! One engine serves binary32, binary64 and binary128; a [`Format`] names
//! the exponent and fraction widths.
//!
//! Rounding is always round-to-nearest, ties-to-even. Operations that
//! produce an invalid result return the default NaN (positive, quiet);
//! when an operand is already a NaN it is propagated with the quiet bit set.
//!
//! ## Internal representation
//!
//! A finite value is carried as an integer significand and the exponent of
//! its least significant bit: `value = sig * 2^scale`. Every operation
//! computes an exact (or sticky-jammed) `(sig, scale)` pair and hands it to
//! [`round_pack`], which is the only place rounding happens.

use core::cmp::Ordering;

/// Exponent and fraction widths of an IEEE-754 binary interchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    exp_bits: u32,
    frac_bits: u32,
}

/// binary32 (`f32`).
pub const F32: Format = Format {
    exp_bits: 8,
    frac_bits: 23,
};

/// binary64 (`f64`).
pub const F64: Format = Format {
    exp_bits: 11,
    frac_bits: 52,
};

/// binary128 (quad precision, C `long double` on wasm32).
pub const F128: Format = Format {
    exp_bits: 15,
    frac_bits: 112,
};

impl Format {
    #[inline(always)]
    const fn bias(self) -> i32 {
        (1 << (self.exp_bits - 1)) - 1
    }

    #[inline(always)]
    const fn exp_max(self) -> u128 {
        (1 << self.exp_bits) - 1
    }

    #[inline(always)]
    const fn sign_bit(self) -> u128 {
        1 << (self.exp_bits + self.frac_bits)
    }

    #[inline(always)]
    const fn frac_mask(self) -> u128 {
        (1 << self.frac_bits) - 1
    }

    #[inline(always)]
    const fn quiet_bit(self) -> u128 {
        1 << (self.frac_bits - 1)
    }

    /// The positive quiet NaN with an empty payload.
    pub const fn default_nan(self) -> u128 {
        (self.exp_max() << self.frac_bits) | self.quiet_bit()
    }

    /// Infinity with the given sign.
    pub const fn infinity(self, negative: bool) -> u128 {
        self.signed(negative, self.exp_max() << self.frac_bits)
    }

    /// Zero with the given sign.
    pub const fn zero(self, negative: bool) -> u128 {
        self.signed(negative, 0)
    }

    /// 1.0 with the given sign.
    pub const fn one(self, negative: bool) -> u128 {
        self.signed(negative, (self.bias() as u128) << self.frac_bits)
    }

    #[inline(always)]
    const fn signed(self, negative: bool, magnitude: u128) -> u128 {
        if negative {
            magnitude | self.sign_bit()
        } else {
            magnitude
        }
    }

    #[inline(always)]
    const fn exponent(self, bits: u128) -> u128 {
        (bits >> self.frac_bits) & self.exp_max()
    }

    #[inline(always)]
    const fn is_negative(self, bits: u128) -> bool {
        bits & self.sign_bit() != 0
    }

    /// True for any NaN encoding, quiet or signaling.
    pub const fn is_nan(self, bits: u128) -> bool {
        self.exponent(bits) == self.exp_max() && bits & self.frac_mask() != 0
    }

    #[inline(always)]
    const fn quiet(self, bits: u128) -> u128 {
        bits | self.quiet_bit()
    }

    /// Smallest unbiased exponent of a subnormal's least significant bit.
    #[inline(always)]
    const fn min_scale(self) -> i32 {
        1 - self.bias() - self.frac_bits as i32
    }
}

// ── Unpacking ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Class {
    Nan,
    Inf,
    Zero,
    /// `value = sig * 2^scale`, `sig != 0`.
    Finite { sig: u128, scale: i32 },
}

#[inline]
fn unpack(fmt: Format, bits: u128) -> (bool, Class) {
    let negative = fmt.is_negative(bits);
    let exp = fmt.exponent(bits);
    let frac = bits & fmt.frac_mask();
    let class = if exp == fmt.exp_max() {
        if frac != 0 {
            Class::Nan
        } else {
            Class::Inf
        }
    } else if exp == 0 {
        if frac == 0 {
            Class::Zero
        } else {
            Class::Finite {
                sig: frac,
                scale: fmt.min_scale(),
            }
        }
    } else {
        Class::Finite {
            sig: frac | (1 << fmt.frac_bits),
            scale: exp as i32 - fmt.bias() - fmt.frac_bits as i32,
        }
    };
    (negative, class)
}

/// Shift left until the significand carries `frac_bits + 1` bits.
#[inline]
fn normalize(fmt: Format, sig: u128, scale: i32) -> (u128, i32) {
    let width = 128 - sig.leading_zeros();
    let target = fmt.frac_bits + 1;
    if width >= target {
        (sig, scale)
    } else {
        let shift = target - width;
        (sig << shift, scale - shift as i32)
    }
}

#[inline]
fn propagate_nan(fmt: Format, a: u128, b: u128) -> u128 {
    if fmt.is_nan(a) {
        fmt.quiet(a)
    } else {
        fmt.quiet(b)
    }
}

/// Shift right, OR-ing every bit shifted out into the least significant bit.
#[inline]
fn shift_right_jam(x: u128, shift: u32) -> u128 {
    if shift == 0 {
        x
    } else if shift >= 128 {
        (x != 0) as u128
    } else {
        (x >> shift) | ((x & ((1 << shift) - 1)) != 0) as u128
    }
}

// ── Rounding ─────────────────────────────────────────────────────────────────

/// Round `(sig + sticky) * 2^scale` to nearest-even in `fmt` and encode it.
///
/// `sticky` marks a nonzero remainder strictly below the least significant
/// bit of `sig`. Overflow produces infinity; tiny results become subnormal
/// or zero.
pub(crate) fn round_pack(fmt: Format, negative: bool, scale: i32, sig: u128, sticky: bool) -> u128 {
    let (mut sig, mut scale) = (sig, scale);
    if sticky {
        // Park the remainder below every bit that can take part in rounding.
        let width = 128 - sig.leading_zeros();
        if width >= 128 {
            sig = shift_right_jam(sig, 1);
            scale += 1;
        } else {
            let shift = 127 - width;
            sig <<= shift;
            scale -= shift as i32;
        }
        sig |= 1;
    }
    if sig == 0 {
        return fmt.zero(negative);
    }

    let width = (128 - sig.leading_zeros()) as i32;
    let precision = fmt.frac_bits as i32 + 1;
    let shift = (width - precision).max(fmt.min_scale() - scale);

    let mantissa = if shift <= 0 {
        sig << (-shift) as u32
    } else if shift > 128 {
        0
    } else {
        let shift = shift as u32;
        let (kept, rem) = if shift == 128 {
            (0, sig)
        } else {
            (sig >> shift, sig & ((1 << shift) - 1))
        };
        let half = 1u128 << (shift - 1);
        if rem > half || (rem == half && kept & 1 == 1) {
            kept + 1
        } else {
            kept
        }
    };
    let scale = scale + shift;

    if mantissa == 0 {
        return fmt.zero(negative);
    }
    if mantissa < (1 << fmt.frac_bits) {
        // Subnormal: the scale sits at the minimum, exponent field is zero.
        return fmt.signed(negative, mantissa);
    }

    let (mantissa, mut biased) = (mantissa, scale + fmt.frac_bits as i32 + fmt.bias());
    let mantissa = if mantissa >> (fmt.frac_bits + 1) != 0 {
        biased += 1;
        mantissa >> 1
    } else {
        mantissa
    };
    if biased as u128 >= fmt.exp_max() {
        return fmt.infinity(negative);
    }
    fmt.signed(
        negative,
        ((biased as u128) << fmt.frac_bits) | (mantissa & fmt.frac_mask()),
    )
}

// ── Arithmetic ───────────────────────────────────────────────────────────────

/// IEEE addition.
pub fn add(fmt: Format, a: u128, b: u128) -> u128 {
    let (sa, ca) = unpack(fmt, a);
    let (sb, cb) = unpack(fmt, b);
    match (ca, cb) {
        (Class::Nan, _) | (_, Class::Nan) => propagate_nan(fmt, a, b),
        (Class::Inf, Class::Inf) if sa != sb => fmt.default_nan(),
        (Class::Inf, _) => a,
        (_, Class::Inf) => b,
        (Class::Zero, Class::Zero) => fmt.zero(sa && sb),
        (Class::Zero, _) => b,
        (_, Class::Zero) => a,
        (Class::Finite { sig: ma, scale: ea }, Class::Finite { sig: mb, scale: eb }) => {
            // Three guard bits, then align the smaller exponent with sticky jam.
            let ((s_big, m_big, e_big), (s_small, m_small, e_small)) = if ea >= eb {
                ((sa, ma, ea), (sb, mb, eb))
            } else {
                ((sb, mb, eb), (sa, ma, ea))
            };
            let m_big = m_big << 3;
            let m_small = shift_right_jam(m_small << 3, (e_big - e_small) as u32);
            let scale = e_big - 3;

            if s_big == s_small {
                return round_pack(fmt, s_big, scale, m_big + m_small, false);
            }
            match m_big.cmp(&m_small) {
                Ordering::Equal => fmt.zero(false),
                Ordering::Greater => round_pack(fmt, s_big, scale, m_big - m_small, false),
                Ordering::Less => round_pack(fmt, s_small, scale, m_small - m_big, false),
            }
        }
    }
}

/// IEEE subtraction.
pub fn sub(fmt: Format, a: u128, b: u128) -> u128 {
    if fmt.is_nan(a) || fmt.is_nan(b) {
        return propagate_nan(fmt, a, b);
    }
    add(fmt, a, b ^ fmt.sign_bit())
}

/// Full 128×128 → 256-bit product as `(high, low)`.
#[inline]
pub(crate) fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    const LOW: u128 = u64::MAX as u128;
    let (a1, a0) = (a >> 64, a & LOW);
    let (b1, b0) = (b >> 64, b & LOW);
    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;
    let mid = (p00 >> 64) + (p01 & LOW) + (p10 & LOW);
    let low = (p00 & LOW) | (mid << 64);
    let high = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);
    (high, low)
}

/// IEEE multiplication.
pub fn mul(fmt: Format, a: u128, b: u128) -> u128 {
    let (sa, ca) = unpack(fmt, a);
    let (sb, cb) = unpack(fmt, b);
    let negative = sa != sb;
    match (ca, cb) {
        (Class::Nan, _) | (_, Class::Nan) => propagate_nan(fmt, a, b),
        (Class::Inf, Class::Zero) | (Class::Zero, Class::Inf) => fmt.default_nan(),
        (Class::Inf, _) | (_, Class::Inf) => fmt.infinity(negative),
        (Class::Zero, _) | (_, Class::Zero) => fmt.zero(negative),
        (Class::Finite { sig: ma, scale: ea }, Class::Finite { sig: mb, scale: eb }) => {
            let (high, low) = mul_wide(ma, mb);
            let scale = ea + eb;
            if high == 0 {
                return round_pack(fmt, negative, scale, low, false);
            }
            let shift = 128 - high.leading_zeros() + 1;
            let sig = (high << (128 - shift)) | (low >> shift);
            let sticky = low & ((1 << shift) - 1) != 0;
            round_pack(fmt, negative, scale + shift as i32, sig, sticky)
        }
    }
}

/// IEEE division.
pub fn div(fmt: Format, a: u128, b: u128) -> u128 {
    let (sa, ca) = unpack(fmt, a);
    let (sb, cb) = unpack(fmt, b);
    let negative = sa != sb;
    match (ca, cb) {
        (Class::Nan, _) | (_, Class::Nan) => propagate_nan(fmt, a, b),
        (Class::Inf, Class::Inf) | (Class::Zero, Class::Zero) => fmt.default_nan(),
        (Class::Inf, _) | (_, Class::Zero) => fmt.infinity(negative),
        (_, Class::Inf) | (Class::Zero, _) => fmt.zero(negative),
        (Class::Finite { sig: ma, scale: ea }, Class::Finite { sig: mb, scale: eb }) => {
            let (ma, ea) = normalize(fmt, ma, ea);
            let (mb, eb) = normalize(fmt, mb, eb);
            // Restoring division: `steps` quotient bits beyond the integer bit.
            let steps = fmt.frac_bits + 3;
            let mut rem = ma;
            let mut quot: u128 = 0;
            for _ in 0..=steps {
                quot <<= 1;
                if rem >= mb {
                    rem -= mb;
                    quot |= 1;
                }
                rem <<= 1;
            }
            round_pack(fmt, negative, ea - eb - steps as i32, quot, rem != 0)
        }
    }
}

/// Integer square root of `n` and whether a remainder was left over.
fn isqrt(n: u128) -> (u128, bool) {
    let mut rem = n;
    let mut root: u128 = 0;
    let mut bit: u128 = 1 << 126;
    while bit > rem {
        bit >>= 2;
    }
    while bit != 0 {
        if rem >= root + bit {
            rem -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    (root, rem != 0)
}

/// IEEE square root. Supports formats up to binary64.
pub(crate) fn sqrt(fmt: Format, a: u128) -> u128 {
    debug_assert!(fmt.frac_bits <= F64.frac_bits);
    let (negative, class) = unpack(fmt, a);
    match class {
        Class::Nan => fmt.quiet(a),
        Class::Zero => a,
        _ if negative => fmt.default_nan(),
        Class::Inf => a,
        Class::Finite { sig, scale } => {
            let (mut sig, mut scale) = (sig, scale);
            if scale & 1 != 0 {
                sig <<= 1;
                scale -= 1;
            }
            // Widen the radicand by an even amount so the root keeps 60+ bits.
            let width = 128 - sig.leading_zeros();
            let widen = (126 - width) & !1;
            let (root, inexact) = isqrt(sig << widen);
            round_pack(fmt, false, (scale - widen as i32) / 2, root, inexact)
        }
    }
}

// ── Sign manipulation ────────────────────────────────────────────────────────

/// Flip the sign bit.
pub fn neg(fmt: Format, a: u128) -> u128 {
    a ^ fmt.sign_bit()
}

/// Clear the sign bit.
pub fn abs(fmt: Format, a: u128) -> u128 {
    a & !fmt.sign_bit()
}

/// Magnitude of `a` with the sign of `b`.
pub fn copysign(fmt: Format, a: u128, b: u128) -> u128 {
    abs(fmt, a) | (b & fmt.sign_bit())
}

// ── Comparison ───────────────────────────────────────────────────────────────

/// Order key for non-NaN encodings; both zeros map to 0.
#[inline]
fn order_key(fmt: Format, bits: u128) -> i128 {
    let magnitude = abs(fmt, bits) as i128;
    if fmt.is_negative(bits) {
        -magnitude
    } else {
        magnitude
    }
}

/// IEEE comparison: `None` when either operand is a NaN.
pub fn compare(fmt: Format, a: u128, b: u128) -> Option<Ordering> {
    if fmt.is_nan(a) || fmt.is_nan(b) {
        return None;
    }
    Some(order_key(fmt, a).cmp(&order_key(fmt, b)))
}

pub fn eq(fmt: Format, a: u128, b: u128) -> bool {
    compare(fmt, a, b) == Some(Ordering::Equal)
}

pub fn lt(fmt: Format, a: u128, b: u128) -> bool {
    compare(fmt, a, b) == Some(Ordering::Less)
}

pub fn le(fmt: Format, a: u128, b: u128) -> bool {
    matches!(compare(fmt, a, b), Some(Ordering::Less | Ordering::Equal))
}

/// Wasm `min`: a NaN operand is returned as-is; `-0` orders below `+0`.
pub fn min(fmt: Format, a: u128, b: u128) -> u128 {
    if fmt.is_nan(a) {
        return a;
    }
    if fmt.is_nan(b) {
        return b;
    }
    match (fmt.is_negative(a), fmt.is_negative(b)) {
        (true, false) => a,
        (false, true) => b,
        _ if lt(fmt, a, b) => a,
        _ => b,
    }
}

/// Wasm `max`: a NaN operand is returned as-is; `+0` orders above `-0`.
pub fn max(fmt: Format, a: u128, b: u128) -> u128 {
    if fmt.is_nan(a) {
        return a;
    }
    if fmt.is_nan(b) {
        return b;
    }
    match (fmt.is_negative(a), fmt.is_negative(b)) {
        (true, false) => b,
        (false, true) => a,
        _ if lt(fmt, a, b) => b,
        _ => a,
    }
}

// ── Rounding to integral ─────────────────────────────────────────────────────

/// Direction used by [`round_to_integral`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundMode {
    /// Toward zero.
    Trunc,
    /// Toward negative infinity.
    Floor,
    /// Toward positive infinity.
    Ceil,
    /// To nearest, ties to even.
    Nearest,
}

/// Round to an integral value in the same format.
pub fn round_to_integral(fmt: Format, a: u128, mode: RoundMode) -> u128 {
    let (negative, class) = unpack(fmt, a);
    if !matches!(class, Class::Finite { .. }) {
        // NaN, infinity and zero are already integral.
        return a;
    }

    let exp = fmt.exponent(a) as i32;
    let bias = fmt.bias();
    if exp >= bias + fmt.frac_bits as i32 {
        return a;
    }
    if exp < bias {
        // |a| < 1
        let up = match mode {
            RoundMode::Trunc => false,
            RoundMode::Floor => negative,
            RoundMode::Ceil => !negative,
            RoundMode::Nearest => exp == bias - 1 && a & fmt.frac_mask() != 0,
        };
        return if up { fmt.one(negative) } else { fmt.zero(negative) };
    }

    let frac_bits = (bias + fmt.frac_bits as i32 - exp) as u32;
    let mask = (1u128 << frac_bits) - 1;
    let fraction = a & mask;
    if fraction == 0 {
        return a;
    }
    let truncated = a & !mask;
    let half = 1u128 << (frac_bits - 1);
    let up = match mode {
        RoundMode::Trunc => false,
        RoundMode::Floor => negative,
        RoundMode::Ceil => !negative,
        RoundMode::Nearest => fraction > half || (fraction == half && (a >> frac_bits) & 1 == 1),
    };
    if up {
        // A carry out of the fraction bumps the exponent, which is exactly right.
        truncated + (1 << frac_bits)
    } else {
        truncated
    }
}

// ── Conversions ──────────────────────────────────────────────────────────────

/// Convert between formats, rounding when narrowing.
pub fn convert(from: Format, to: Format, a: u128) -> u128 {
    let (negative, class) = unpack(from, a);
    match class {
        Class::Nan => {
            let payload = a & from.frac_mask();
            let payload = if to.frac_bits >= from.frac_bits {
                payload << (to.frac_bits - from.frac_bits)
            } else {
                payload >> (from.frac_bits - to.frac_bits)
            };
            to.signed(negative, (to.exp_max() << to.frac_bits) | payload | to.quiet_bit())
        }
        Class::Inf => to.infinity(negative),
        Class::Zero => to.zero(negative),
        Class::Finite { sig, scale } => round_pack(to, negative, scale, sig, false),
    }
}

/// Convert a sign and magnitude to the nearest representable value.
pub fn from_int(fmt: Format, negative: bool, magnitude: u128) -> u128 {
    round_pack(fmt, negative, 0, magnitude, false)
}

/// Convert an `i128` to the nearest representable value.
pub fn from_i128(fmt: Format, v: i128) -> u128 {
    from_int(fmt, v < 0, v.unsigned_abs())
}

/// Truncate toward zero to `(negative, magnitude)`.
///
/// Returns `None` for NaN, infinity, or a magnitude of 2^128 or more.
pub fn trunc_to_int(fmt: Format, a: u128) -> Option<(bool, u128)> {
    let (negative, class) = unpack(fmt, a);
    match class {
        Class::Nan | Class::Inf => None,
        Class::Zero => Some((negative, 0)),
        Class::Finite { sig, scale } if scale >= 0 => {
            let width = 128 - sig.leading_zeros();
            if width + scale as u32 > 128 {
                None
            } else {
                Some((negative, sig << scale as u32))
            }
        }
        Class::Finite { sig, scale } => {
            let shift = scale.unsigned_abs();
            Some((negative, if shift >= 128 { 0 } else { sig >> shift }))
        }
    }
}

/// Truncate to a signed integer of `bits` width, `None` when out of range.
pub fn trunc_to_signed(fmt: Format, a: u128, bits: u32) -> Option<i128> {
    let (negative, magnitude) = trunc_to_int(fmt, a)?;
    let limit = 1u128 << (bits - 1);
    if negative {
        (magnitude <= limit).then(|| (magnitude as i128).wrapping_neg())
    } else {
        (magnitude < limit).then_some(magnitude as i128)
    }
}

/// Truncate to an unsigned integer of `bits` width, `None` when out of range.
pub fn trunc_to_unsigned(fmt: Format, a: u128, bits: u32) -> Option<u128> {
    let (negative, magnitude) = trunc_to_int(fmt, a)?;
    if negative {
        return (magnitude == 0).then_some(0);
    }
    if bits < 128 && magnitude >> bits != 0 {
        return None;
    }
    Some(magnitude)
}
