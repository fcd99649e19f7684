use std::{
    fmt,
    ops::{Add, Neg},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Signed money amount represented as **integer cents**.
///
/// Use this type for **all** monetary values in the engine (balances and
/// transaction amounts) to avoid floating-point drift. Balances are the exact
/// integer sum of the amounts applied to them, so no rounding ever happens
/// inside the ledger; rounding only happens once, when a value enters the
/// engine through [`Money::from_major`].
///
/// The value is signed:
/// - positive = credit / increase
/// - negative = debit / decrease
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
/// assert_eq!("10,5".parse::<Money>().unwrap().cents(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest magnitude storable in a `decimal(10,2)` column: 99,999,999.99.
    pub const MAX: Money = Money(9_999_999_999);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Converts a major-unit value (e.g. `12.5` for 12.50) into cents.
    ///
    /// Rounds half away from zero to the nearest cent, so `0.125` becomes
    /// `0.13` and `-0.125` becomes `-0.13`.
    ///
    /// ```rust
    /// use engine::Money;
    ///
    /// assert_eq!(Money::from_major(19.99).unwrap().cents(), 1999);
    /// assert_eq!(Money::from_major(0.125).unwrap().cents(), 13);
    /// assert!(Money::from_major(f64::NAN).is_err());
    /// ```
    pub fn from_major(value: f64) -> ResultEngine<Money> {
        if !value.is_finite() {
            return Err(EngineError::InvalidAmount(
                "amount must be a finite number".to_string(),
            ));
        }
        let cents = (value * 100.0).round();
        if cents.abs() > Money::MAX.0 as f64 {
            return Err(EngineError::InvalidAmount("amount too large".to_string()));
        }
        Ok(Money(cents as i64))
    }

    /// Returns the value in major units (e.g. `12.34`).
    #[must_use]
    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount fits a `decimal(10,2)` column.
    #[must_use]
    pub const fn is_storable(self) -> bool {
        self.0 >= -Money::MAX.0 && self.0 <= Money::MAX.0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a major-unit decimal string (`"12.5"`, `"12,50"`, `"-3"`).
    ///
    /// At most two fractional digits are accepted; the value must fit the
    /// storable range.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {s:?}"));

        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (units, fraction) = digits.split_once(['.', ',']).unwrap_or((digits, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if units.is_empty() || !all_digits(units) || !all_digits(fraction) {
            return Err(invalid());
        }
        if fraction.len() > 2 {
            return Err(EngineError::InvalidAmount(format!(
                "at most two decimals allowed: {s:?}"
            )));
        }

        let cents = format!("{fraction:0<2}").parse::<i64>().map_err(|_| invalid())?;
        let magnitude = units
            .parse::<i64>()
            .ok()
            .and_then(|units| units.checked_mul(100))
            .and_then(|units| units.checked_add(cents))
            .map(Money)
            .filter(|money| money.is_storable())
            .ok_or_else(|| EngineError::InvalidAmount(format!("amount too large: {s:?}")))?;

        Ok(if negative { -magnitude } else { magnitude })
    }
}
