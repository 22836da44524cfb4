use std::{
    fmt,
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{
    de::{self, Visitor},
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use thiserror::Error;

use crate::op;

pub const BRL_CURRENCY_CODE: &str = "BRL";

const CENTAVOS_PER_REAL: i64 = 100;

//--------------------------------------      Centavos       ---------------------------------------------------------
/// A fixed-point amount of Brazilian reais, stored as a whole number of centavos.
///
/// On the wire, amounts are plain decimal numbers of reais (`50`, `50.5`, `"50.00"`), which is what both the browser
/// client and the payment processor speak. Internally, all arithmetic is integer arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Centavos(i64);

op!(binary Centavos, Add, add);
op!(binary Centavos, Sub, sub);
op!(inplace Centavos, AddAssign, add_assign);
op!(inplace Centavos, SubAssign, sub_assign);
op!(unary Centavos, Neg, neg);

impl Sum for Centavos {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented in centavos: {0}")]
pub struct CentavosConversionError(String);

impl From<i64> for Centavos {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Centavos {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_reais(reais: i64) -> Self {
        Self(reais * CENTAVOS_PER_REAL)
    }

    /// Converts a floating point amount of reais, rounding to the nearest centavo.
    pub fn try_from_reais_f64(reais: f64) -> Result<Self, CentavosConversionError> {
        if !reais.is_finite() {
            return Err(CentavosConversionError(format!("{reais} is not a finite number")));
        }
        let scaled = (reais * CENTAVOS_PER_REAL as f64).round();
        if scaled > i64::MAX as f64 || scaled < i64::MIN as f64 {
            return Err(CentavosConversionError(format!("{reais} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(scaled as i64))
    }

    /// The amount in reais as a float. Only use this at the boundary with APIs that insist on floats.
    pub fn to_reais_f64(&self) -> f64 {
        self.0 as f64 / CENTAVOS_PER_REAL as f64
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Formats the amount as a bare decimal, e.g. `50.00`
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / CENTAVOS_PER_REAL as u64;
        let frac = abs % CENTAVOS_PER_REAL as u64;
        format!("{sign}{whole}.{frac:02}")
    }
}

impl Display for Centavos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-R$ {}", self.to_decimal_string().trim_start_matches('-'))
        } else {
            write!(f, "R$ {}", self.to_decimal_string())
        }
    }
}

impl FromStr for Centavos {
    type Err = CentavosConversionError;

    /// Parses a decimal amount of reais with at most two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        let valid = |p: &str| p.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !valid(whole) || !valid(frac) {
            return Err(CentavosConversionError(format!("'{s}' is not a decimal amount")));
        }
        if frac.len() > 2 {
            return Err(CentavosConversionError(format!("'{s}' has more than two decimal places")));
        }
        let whole = whole.parse::<i64>().map_err(|e| CentavosConversionError(format!("'{s}': {e}")))?;
        let frac = match frac.len() {
            0 => Ok(0),
            1 => frac.parse::<i64>().map(|v| v * 10),
            _ => frac.parse::<i64>(),
        }
        .map_err(|e| CentavosConversionError(format!("'{s}': {e}")))?;
        let value = whole
            .checked_mul(CENTAVOS_PER_REAL)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(|| CentavosConversionError(format!("'{s}' is out of range")))?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Serialize for Centavos {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_reais_f64())
    }
}

struct CentavosVisitor;

impl<'de> Visitor<'de> for CentavosVisitor {
    type Value = Centavos;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an amount in reais, as a number or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        v.checked_mul(CENTAVOS_PER_REAL).map(Centavos).ok_or_else(|| E::custom(format!("{v} is out of range")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Centavos::try_from_reais_f64(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse::<Centavos>().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Centavos {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CentavosVisitor)
    }
}
