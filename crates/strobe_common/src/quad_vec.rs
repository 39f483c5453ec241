//! Packed, arbitrary-width vectors of four-state values.

use crate::quad::Quad;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// An ordered, fixed-width vector of [`Quad`] values.
///
/// Index 0 is the least significant bit. Each value occupies two bits of
/// packed storage, 32 values per `u64` word. Equality comparison (the
/// simulator's change-detection relation) compares widths and every
/// per-value state including `X`/`Z`.
///
/// A freshly constructed vector is all-`X`: an unresolved wire, not a zero
/// wire. Use [`QuadVec::zeros`] for a driven all-low vector.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuadVec {
    width: u32,
    data: Vec<u64>,
}

/// Quad values packed into each storage word.
const PER_WORD: u32 = 32;

impl QuadVec {
    /// Creates a vector of the given width with every value `X`.
    pub fn new(width: u32) -> Self {
        Self::filled(width, Quad::X)
    }

    /// Creates a vector with every value set to `q`.
    pub fn filled(width: u32, q: Quad) -> Self {
        let pattern = {
            let two_bit = q as u64;
            let mut p = 0u64;
            for slot in 0..PER_WORD {
                p |= two_bit << (slot * 2);
            }
            p
        };
        let words = width.div_ceil(PER_WORD) as usize;
        let mut v = Self {
            width,
            data: vec![pattern; words],
        };
        v.clear_tail();
        v
    }

    /// Creates an all-`Zero` vector.
    pub fn zeros(width: u32) -> Self {
        Self::filled(width, Quad::Zero)
    }

    /// Creates an all-`One` vector.
    pub fn ones(width: u32) -> Self {
        Self::filled(width, Quad::One)
    }

    /// Creates a 1-bit vector from a boolean.
    pub fn from_bool(b: bool) -> Self {
        let mut v = Self::zeros(1);
        v.set(0, Quad::from_bool(b));
        v
    }

    /// Creates a vector of the given width holding `value`.
    ///
    /// Bits of `value` beyond `width` are discarded; widths above 64 are
    /// zero-filled in the upper positions.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let mut v = Self::zeros(width);
        for i in 0..width.min(64) {
            if (value >> i) & 1 == 1 {
                v.set(i, Quad::One);
            }
        }
        v
    }

    /// Parses a binary string such as `"10XZ"`, most significant bit first.
    ///
    /// Returns `None` on characters outside `0`, `1`, `x`/`X`, `z`/`Z`.
    pub fn from_binary_str(s: &str) -> Option<Self> {
        let width = u32::try_from(s.chars().count()).ok()?;
        let mut v = Self::zeros(width);
        for (i, c) in s.chars().rev().enumerate() {
            v.set(i as u32, Quad::from_char(c)?);
        }
        Some(v)
    }

    /// Parses a hex string, four bits per digit, most significant digit
    /// first. Returns `None` on non-hex characters.
    pub fn from_hex_str(s: &str) -> Option<Self> {
        let width = u32::try_from(s.chars().count()).ok()?.checked_mul(4)?;
        let mut v = Self::zeros(width);
        for (digit, c) in s.chars().rev().enumerate() {
            let nibble = c.to_digit(16)? as u64;
            for bit in 0..4 {
                if (nibble >> bit) & 1 == 1 {
                    v.set(digit as u32 * 4 + bit, Quad::One);
                }
            }
        }
        Some(v)
    }

    /// Returns the number of values in the vector.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the value at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= width`.
    pub fn get(&self, index: u32) -> Quad {
        assert!(
            index < self.width,
            "index {index} out of range for width {}",
            self.width
        );
        let word = (index / PER_WORD) as usize;
        let shift = (index % PER_WORD) * 2;
        match (self.data[word] >> shift) & 0b11 {
            0 => Quad::Zero,
            1 => Quad::One,
            2 => Quad::X,
            _ => Quad::Z,
        }
    }

    /// Sets the value at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= width`.
    pub fn set(&mut self, index: u32, q: Quad) {
        assert!(
            index < self.width,
            "index {index} out of range for width {}",
            self.width
        );
        let word = (index / PER_WORD) as usize;
        let shift = (index % PER_WORD) * 2;
        self.data[word] = (self.data[word] & !(0b11 << shift)) | ((q as u64) << shift);
    }

    /// Converts to `u64` if every value is driven and the width fits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.width > 64 {
            return None;
        }
        let mut out = 0u64;
        for i in 0..self.width {
            match self.get(i) {
                Quad::Zero => {}
                Quad::One => out |= 1 << i,
                Quad::X | Quad::Z => return None,
            }
        }
        Some(out)
    }

    /// Returns `true` if any value is `X` or `Z`.
    pub fn has_unknown(&self) -> bool {
        self.iter().any(|q| !q.is_definite())
    }

    /// Returns `true` if every value is `Zero`.
    pub fn is_all_zero(&self) -> bool {
        self.iter().all(|q| q == Quad::Zero)
    }

    /// Returns `true` if every value is `One`.
    pub fn is_all_one(&self) -> bool {
        self.iter().all(|q| q == Quad::One)
    }

    /// Iterates values from index 0 upward.
    pub fn iter(&self) -> impl Iterator<Item = Quad> + '_ {
        (0..self.width).map(|i| self.get(i))
    }

    /// Returns values `[lo, hi)` as a new vector of width `hi - lo`.
    ///
    /// # Panics
    ///
    /// Panics unless `lo < hi <= width`.
    pub fn extract(&self, lo: u32, hi: u32) -> Self {
        assert!(lo < hi && hi <= self.width, "extract [{lo}, {hi}) out of range");
        let mut out = Self::zeros(hi - lo);
        for i in lo..hi {
            out.set(i - lo, self.get(i));
        }
        out
    }

    /// Zero-extends to `width`, preserving existing values in the low
    /// positions.
    ///
    /// # Panics
    ///
    /// Panics if `width` is narrower than the current width.
    pub fn zero_extend(&self, width: u32) -> Self {
        assert!(width >= self.width, "zero_extend cannot narrow");
        let mut out = Self::zeros(width);
        for i in 0..self.width {
            out.set(i, self.get(i));
        }
        out
    }

    /// Wrapping addition at the operand width. Any `X`/`Z` operand value
    /// yields an all-`X` result.
    ///
    /// # Panics
    ///
    /// Panics on width mismatch.
    pub fn add_wrapping(&self, rhs: &Self) -> Self {
        self.check_width(rhs, "add");
        if self.has_unknown() || rhs.has_unknown() {
            return Self::new(self.width);
        }
        let mut out = Self::zeros(self.width);
        let mut carry = false;
        for i in 0..self.width {
            let a = self.get(i) == Quad::One;
            let b = rhs.get(i) == Quad::One;
            if a ^ b ^ carry {
                out.set(i, Quad::One);
            }
            carry = (a && b) || (carry && (a || b));
        }
        out
    }

    /// Wrapping subtraction at the operand width. Any `X`/`Z` operand value
    /// yields an all-`X` result.
    ///
    /// # Panics
    ///
    /// Panics on width mismatch.
    pub fn sub_wrapping(&self, rhs: &Self) -> Self {
        self.check_width(rhs, "sub");
        if self.has_unknown() || rhs.has_unknown() {
            return Self::new(self.width);
        }
        let mut out = Self::zeros(self.width);
        let mut borrow = false;
        for i in 0..self.width {
            let a = self.get(i) == Quad::One;
            let b = rhs.get(i) == Quad::One;
            if a ^ b ^ borrow {
                out.set(i, Quad::One);
            }
            borrow = (!a && (b || borrow)) || (a && b && borrow);
        }
        out
    }

    /// Wrapping multiplication at the operand width (shift-and-add). Any
    /// `X`/`Z` operand value yields an all-`X` result.
    ///
    /// # Panics
    ///
    /// Panics on width mismatch.
    pub fn mul_wrapping(&self, rhs: &Self) -> Self {
        self.check_width(rhs, "mul");
        if self.has_unknown() || rhs.has_unknown() {
            return Self::new(self.width);
        }
        let mut acc = Self::zeros(self.width);
        for i in 0..self.width {
            if rhs.get(i) == Quad::One {
                acc = acc.add_wrapping(&self.shift_up(i));
            }
        }
        acc
    }

    /// Logical left shift. The shift amount is taken from `amount` as an
    /// unsigned integer; an indefinite amount yields all-`X`. Shifted-in
    /// positions are `Zero`; shifted values keep their `X`/`Z` states.
    pub fn shl(&self, amount: &Self) -> Self {
        match amount.to_u64() {
            Some(k) => self.shift_up(clamp_shift(k, self.width)),
            None => Self::new(self.width),
        }
    }

    /// Logical right shift; see [`QuadVec::shl`] for amount handling.
    pub fn lshr(&self, amount: &Self) -> Self {
        match amount.to_u64() {
            Some(k) => self.shift_down(clamp_shift(k, self.width), Quad::Zero),
            None => Self::new(self.width),
        }
    }

    /// Arithmetic right shift: shifted-in positions copy the most
    /// significant value (even when that value is `X`/`Z`).
    pub fn ashr(&self, amount: &Self) -> Self {
        let fill = self.get(self.width - 1);
        match amount.to_u64() {
            Some(k) => self.shift_down(clamp_shift(k, self.width), fill),
            None => Self::new(self.width),
        }
    }

    /// Unsigned less-than, producing a 1-bit vector. Any `X`/`Z` operand
    /// value yields a 1-bit `X`.
    ///
    /// # Panics
    ///
    /// Panics on width mismatch.
    pub fn ult(&self, rhs: &Self) -> Self {
        self.check_width(rhs, "ult");
        if self.has_unknown() || rhs.has_unknown() {
            return Self::new(1);
        }
        for i in (0..self.width).rev() {
            match (self.get(i), rhs.get(i)) {
                (Quad::Zero, Quad::One) => return Self::from_bool(true),
                (Quad::One, Quad::Zero) => return Self::from_bool(false),
                _ => {}
            }
        }
        Self::from_bool(false)
    }

    /// Renders a Verilog-flavored sized literal: hex when every value is
    /// driven (`8'hff`), binary otherwise (`4'b10xz`). Single-bit vectors
    /// render bare (`0`, `1`, `x`, `z`).
    pub fn to_sized_string(&self) -> String {
        if self.width == 1 {
            return self.get(0).to_string().to_lowercase();
        }
        match self.to_u64() {
            Some(v) => format!("{}'h{v:x}", self.width),
            None => {
                let bits: String = (0..self.width)
                    .rev()
                    .map(|i| match self.get(i) {
                        Quad::Zero => '0',
                        Quad::One => '1',
                        Quad::X => 'x',
                        Quad::Z => 'z',
                    })
                    .collect();
                format!("{}'b{bits}", self.width)
            }
        }
    }

    fn shift_up(&self, k: u32) -> Self {
        let mut out = Self::zeros(self.width);
        for i in k..self.width {
            out.set(i, self.get(i - k));
        }
        out
    }

    fn shift_down(&self, k: u32, fill: Quad) -> Self {
        let mut out = Self::filled(self.width, fill);
        for i in 0..self.width - k {
            out.set(i, self.get(i + k));
        }
        out
    }

    fn check_width(&self, rhs: &Self, op: &str) {
        assert_eq!(
            self.width, rhs.width,
            "width mismatch in {op}: {} vs {}",
            self.width, rhs.width
        );
    }

    /// Zeroes storage beyond the last valid slot so derived equality and
    /// hashing see a canonical representation.
    fn clear_tail(&mut self) {
        let used = self.width % PER_WORD;
        if used != 0 {
            if let Some(last) = self.data.last_mut() {
                *last &= (1u64 << (used * 2)) - 1;
            }
        }
    }
}

/// Clamps a shift amount to the vector width (a full shift-out).
fn clamp_shift(k: u64, width: u32) -> u32 {
    k.min(u64::from(width)) as u32
}

impl fmt::Display for QuadVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width).rev() {
            write!(f, "{}", self.get(i))?;
        }
        Ok(())
    }
}

impl fmt::Debug for QuadVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuadVec({self})")
    }
}

impl BitAnd for &QuadVec {
    type Output = QuadVec;

    fn bitand(self, rhs: Self) -> QuadVec {
        self.check_width(rhs, "and");
        let mut out = QuadVec::zeros(self.width);
        for i in 0..self.width {
            out.set(i, self.get(i) & rhs.get(i));
        }
        out
    }
}

impl BitOr for &QuadVec {
    type Output = QuadVec;

    fn bitor(self, rhs: Self) -> QuadVec {
        self.check_width(rhs, "or");
        let mut out = QuadVec::zeros(self.width);
        for i in 0..self.width {
            out.set(i, self.get(i) | rhs.get(i));
        }
        out
    }
}

impl BitXor for &QuadVec {
    type Output = QuadVec;

    fn bitxor(self, rhs: Self) -> QuadVec {
        self.check_width(rhs, "xor");
        let mut out = QuadVec::zeros(self.width);
        for i in 0..self.width {
            out.set(i, self.get(i) ^ rhs.get(i));
        }
        out
    }
}

impl Not for &QuadVec {
    type Output = QuadVec;

    fn not(self) -> QuadVec {
        let mut out = QuadVec::zeros(self.width);
        for i in 0..self.width {
            out.set(i, !self.get(i));
        }
        out
    }
}
