//! Dice engine: die rolls, dice-notation formulas and uniform picks.
//!
//! Every roll draws from a caller-supplied [`RandomSource`] so that engines can
//! run on a seeded generator in play and on a scripted sequence in tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use regex::Regex;
use std::sync::OnceLock;

use crate::numbers::floor_to_index;

/// Source of uniformly distributed floats in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// ChaCha-backed source, reproducible when seeded explicitly.
#[derive(Debug, Clone)]
pub struct SeededSource {
    rng: ChaCha20Rng,
}

impl SeededSource {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Seed from operating-system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }
}

impl RandomSource for SeededSource {
    fn next_f64(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}

/// Replays a fixed sequence of draws, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    /// Build a scripted source. Values are clamped into `[0, 1)`; an empty
    /// script always yields `0.0`.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values
                .into_iter()
                .map(|v| v.clamp(0.0, 0.999_999_999))
                .collect(),
            cursor: 0,
        }
    }

    /// Draw value that makes a `sides`-sided die land on `face`.
    #[must_use]
    pub fn face(face: u32, sides: u32) -> f64 {
        if sides == 0 {
            return 0.0;
        }
        (f64::from(face.clamp(1, sides)) - 0.5) / f64::from(sides)
    }

    /// Number of draws consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

/// Roll a single die with `sides` faces, yielding `1..=sides`.
pub fn roll_die<R: RandomSource + ?Sized>(rng: &mut R, sides: u32) -> u32 {
    if sides == 0 {
        return 0;
    }
    let sides_usize = usize::try_from(sides).unwrap_or(usize::MAX);
    let idx = floor_to_index(rng.next_f64() * f64::from(sides), sides_usize);
    u32::try_from(idx).unwrap_or(0) + 1
}

/// Roll `count` dice and sum them.
pub fn roll_dice<R: RandomSource + ?Sized>(rng: &mut R, count: u32, sides: u32) -> u32 {
    (0..count).fold(0_u32, |total, _| total.saturating_add(roll_die(rng, sides)))
}

/// Parsed `NdM[+K]` dice notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceFormula {
    pub count: u32,
    pub sides: u32,
    pub modifier: i64,
}

fn formula_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\s*(\d+)\s*[dD]\s*(\d+)\s*(?:([+-])\s*(\d+))?\s*$").ok())
        .as_ref()
}

fn plain_dice_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(?i)\d+d\d+$").ok())
        .as_ref()
}

impl DiceFormula {
    /// Parse dice notation such as `2d6`, `1d3+1` or `3d8 - 2`.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let caps = formula_pattern()?.captures(input)?;
        let count = caps.get(1)?.as_str().parse().ok()?;
        let sides = caps.get(2)?.as_str().parse().ok()?;
        let modifier = match (caps.get(3), caps.get(4)) {
            (Some(sign), Some(value)) => {
                let value: i64 = value.as_str().parse().ok()?;
                if sign.as_str() == "-" { -value } else { value }
            }
            _ => 0,
        };
        Some(Self {
            count,
            sides,
            modifier,
        })
    }

    /// Roll the formula; the raw total may be below 1 for negative modifiers.
    pub fn roll<R: RandomSource + ?Sized>(&self, rng: &mut R) -> i64 {
        i64::from(roll_dice(rng, self.count, self.sides)).saturating_add(self.modifier)
    }
}

/// Whether `input` is bare `NdM` notation without a modifier.
#[must_use]
pub fn is_plain_dice(input: &str) -> bool {
    plain_dice_pattern().is_some_and(|re| re.is_match(input.trim()))
}

/// Parse the leading integer of `input` the way a lenient form field would:
/// optional whitespace and sign, then digits; anything after is ignored.
#[must_use]
pub fn parse_leading_int(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse::<i64>().ok().map(|value| sign * value)
}

/// Roll a dice formula, flooring the total at 1.
///
/// Input that is not dice notation falls back to its leading integer, and to
/// 1 when there is none, so table text like `"special"` still yields damage.
pub fn roll_formula<R: RandomSource + ?Sized>(rng: &mut R, formula: &str) -> u32 {
    let total = DiceFormula::parse(formula)
        .map(|parsed| parsed.roll(rng))
        .or_else(|| parse_leading_int(formula))
        .unwrap_or(1);
    u32::try_from(total.max(1)).unwrap_or(u32::MAX)
}

/// Pick one element uniformly at random.
pub fn pick<'t, T, R: RandomSource + ?Sized>(rng: &mut R, items: &'t [T]) -> Option<&'t T> {
    if items.is_empty() {
        return None;
    }
    let idx = floor_to_index(
        rng.next_f64() * crate::numbers::usize_to_f64(items.len()),
        items.len(),
    );
    items.get(idx)
}

/// Percentile draw in `[0, 100)`.
pub fn percentile<R: RandomSource + ?Sized>(rng: &mut R) -> f64 {
    rng.next_f64() * 100.0
}

/// True with the given probability in `[0, 1]`.
pub fn chance<R: RandomSource + ?Sized>(rng: &mut R, probability: f64) -> bool {
    rng.next_f64() < probability
}
