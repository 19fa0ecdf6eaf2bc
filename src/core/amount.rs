//! Fixed-point token amounts.
//!
//! Amounts carry 18 fractional digits and are stored as an unsigned count of
//! base units, the way EVM tokens count wei. They are parsed from the text a
//! visitor typed, never from a float, so `0.1 + 0.2` is exactly `0.3` here.

use alloy_primitives::utils::{format_units, parse_units, ParseUnits, Unit};
use alloy_primitives::U256;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fractional digits carried by every [`Amount`].
pub const DECIMALS: u8 = 18;

const SCALE: U256 = Unit::ETHER.wei_const();

/// Whole digits that still fit in a `U256` once scaled by `10^18`.
const MAX_WHOLE_DIGITS: usize = 59;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("invalid character '{0}' in amount")]
    InvalidChar(char),
    #[error("more than one decimal point")]
    MultipleDots,
    #[error("more than {DECIMALS} fraction digits")]
    TooPrecise,
    #[error("amount too large")]
    Overflow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256::ZERO);
    pub const MAX: Amount = Amount(U256::MAX);

    pub fn from_base_units(units: u128) -> Self {
        Self(U256::from(units))
    }

    pub const fn base_units(&self) -> U256 {
        self.0
    }

    /// Whole tokens, e.g. `from_whole(50_000)` for the total supply.
    pub fn from_whole(whole: u64) -> Self {
        Self(U256::from(whole) * SCALE)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// `self * mul / div`, floored at the base unit.
    pub fn checked_mul_div(self, mul: u64, div: u64) -> Option<Amount> {
        self.0
            .checked_mul(U256::from(mul))?
            .checked_div(U256::from(div))
            .map(Amount)
    }

    /// Like [`FromStr`], but fraction digits past the 18th are dropped
    /// instead of refused. Used while the visitor is still typing.
    pub fn parse_truncating(raw: &str) -> Result<Amount, AmountError> {
        let (whole, frac) = split_decimal(raw)?;
        from_parts(whole, frac)
    }

    /// Presentation form: `en-US` grouping, at most `max_fraction_digits`
    /// fraction digits, half-up rounding, trailing zeros dropped.
    ///
    /// Display only. Never parse the result back into a ledger value.
    pub fn format_display(&self, max_fraction_digits: u8) -> String {
        let digits = max_fraction_digits.min(DECIMALS);
        let unit = U256::from(10u64.pow(u32::from(DECIMALS - digits)));
        let mut rounded = self.0 - self.0 % unit;
        if unit > U256::from(1u64) && self.0 % unit >= unit / U256::from(2u64) {
            rounded = rounded.saturating_add(unit);
        }

        let fixed = Amount(rounded).fixed_point();
        let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
        let frac = frac[..usize::from(digits).min(frac.len())].trim_end_matches('0');
        if frac.is_empty() {
            return group_thousands(whole);
        }
        format!("{}.{}", group_thousands(whole), frac)
    }

    /// All 18 fraction digits, e.g. `"1.250000000000000000"`.
    fn fixed_point(&self) -> String {
        format_units(self.0, DECIMALS).unwrap_or_else(|_| self.0.to_string())
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Splits `"12.5"` into `("12", "5")`, refusing anything but digits and one dot.
fn split_decimal(raw: &str) -> Result<(&str, &str), AmountError> {
    let raw = raw.trim();
    let (whole, frac) = match raw.split_once('.') {
        Some((_, rest)) if rest.contains('.') => return Err(AmountError::MultipleDots),
        Some((whole, frac)) => (whole, frac),
        None => (raw, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Empty);
    }
    if let Some(bad) = whole.chars().chain(frac.chars()).find(|c| !c.is_ascii_digit()) {
        return Err(AmountError::InvalidChar(bad));
    }
    Ok((whole, frac))
}

fn from_parts(whole: &str, frac: &str) -> Result<Amount, AmountError> {
    let whole = whole.trim_start_matches('0');
    if whole.len() > MAX_WHOLE_DIGITS {
        return Err(AmountError::Overflow);
    }
    let whole = if whole.is_empty() { "0" } else { whole };
    let frac = &frac[..frac.len().min(usize::from(DECIMALS))];

    match parse_units(&format!("{}.{}", whole, frac), DECIMALS) {
        Ok(ParseUnits::U256(units)) => Ok(Amount(units)),
        Ok(ParseUnits::I256(_)) => Err(AmountError::InvalidChar('-')),
        Err(_) => Err(AmountError::Overflow),
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (whole, frac) = split_decimal(raw)?;
        if frac.len() > usize::from(DECIMALS) {
            return Err(AmountError::TooPrecise);
        }
        from_parts(whole, frac)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fixed = self.fixed_point();
        match fixed.split_once('.') {
            Some((whole, frac)) if frac.trim_end_matches('0').is_empty() => f.write_str(whole),
            Some(_) => f.write_str(fixed.trim_end_matches('0')),
            None => f.write_str(&fixed),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative decimal amount as a string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount::from_whole(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                u64::try_from(v)
                    .map(Amount::from_whole)
                    .map_err(|_| E::custom("amount must not be negative"))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
                if !v.is_finite() || v < 0.0 {
                    return Err(E::custom("amount must be a finite non-negative number"));
                }
                v.to_string().parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Live-input cleanup: keep digits and dots, fold extra dots into the first.
///
/// `"1.2.3"` becomes `"1.23"`, `"$ 12,5"` becomes `"125"`.
pub fn sanitize_input(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    match cleaned.split_once('.') {
        Some((whole, rest)) if rest.contains('.') => format!("{}.{}", whole, rest.replace('.', "")),
        _ => cleaned,
    }
}
