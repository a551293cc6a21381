use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign},
    str::FromStr,
};

use bigdecimal::{num_bigint::BigInt, BigDecimal, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::ValueRef as _;
use thiserror::Error;

/// Unsigned integer of arbitrary precision used for every on-chain quantity
/// (token amounts, shares, ltv basis points, chain ids).
///
/// Stored as `NUMERIC(78, 0)`, serialized as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Amount(BigInt);

impl Amount {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn get(&self) -> &BigInt {
        &self.0
    }

    pub fn from_bigint(value: BigInt) -> Option<Self> {
        if value < BigInt::zero() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn to_decimal(&self) -> BigDecimal {
        BigDecimal::new(self.0.clone(), 0)
    }

    pub fn from_decimal(value: &BigDecimal) -> Result<Self, ParseAmountError> {
        if !value.is_integer() {
            return Err(ParseAmountError::Fractional(value.to_string()));
        }

        let (int, _) = value.with_scale(0).into_bigint_and_exponent();
        Self::from_bigint(int)
            .ok_or_else(|| ParseAmountError::Negative(value.to_string()))
    }
}

impl Default for Amount {
    #[inline]
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(BigInt::from(value))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(BigInt::from(value))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl<'a> AddAssign<&'a Amount> for Amount {
    fn add_assign(&mut self, rhs: &'a Amount) {
        self.0 += &rhs.0;
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |mut acc, value| {
            acc += value;
            acc
        })
    }
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();

        if value.is_empty() {
            return Err(ParseAmountError::Empty);
        }

        if value.starts_with('-') {
            return Err(ParseAmountError::Negative(value.to_owned()));
        }

        if !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseAmountError::Invalid(value.to_owned()));
        }

        BigInt::from_str(value)
            .map(Self)
            .map_err(|_| ParseAmountError::Invalid(value.to_owned()))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AmountVisitor;

        impl de::Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a non-negative integer or decimal string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                Amount::from_str(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount::from(v))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
                Ok(Amount::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                u64::try_from(v)
                    .map(Amount::from)
                    .map_err(|_| E::custom(ParseAmountError::Negative(v.to_string())))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

impl<DB> sqlx::Type<DB> for Amount
where
    DB: sqlx::Database,
    BigDecimal: sqlx::Type<DB>,
{
    #[inline]
    fn type_info() -> DB::TypeInfo {
        <BigDecimal as sqlx::Type<DB>>::type_info()
    }

    #[inline]
    fn compatible(ty: &DB::TypeInfo) -> bool {
        <BigDecimal as sqlx::Type<DB>>::compatible(ty)
    }
}

impl<'q, DB> sqlx::Encode<'q, DB> for Amount
where
    DB: sqlx::Database,
    BigDecimal: sqlx::Encode<'q, DB>,
{
    fn encode_by_ref(
        &self,
        buf: &mut DB::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <BigDecimal as sqlx::Encode<'q, DB>>::encode_by_ref(
            &self.to_decimal(),
            buf,
        )
    }
}

/// NULL decodes to zero so legacy rows never break a sum.
impl<'r, DB> sqlx::Decode<'r, DB> for Amount
where
    DB: sqlx::Database,
    BigDecimal: sqlx::Decode<'r, DB>,
{
    fn decode(
        value: DB::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        if value.is_null() {
            return Ok(Amount::zero());
        }

        let decimal = <BigDecimal as sqlx::Decode<'r, DB>>::decode(value)?;
        Ok(Amount::from_decimal(&decimal)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAmountError {
    #[error("empty amount")]
    Empty,

    #[error("amount is negative: {0}")]
    Negative(String),

    #[error("amount is not an integer: {0}")]
    Fractional(String),

    #[error("invalid amount: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_values_beyond_u64() {
        let value = Amount::from_str("340282366920938463463374607431768211457")
            .unwrap();
        assert_eq!(value.to_string(), "340282366920938463463374607431768211457");
    }

    #[test]
    fn rejects_non_integers() {
        assert_eq!(Amount::from_str(""), Err(ParseAmountError::Empty));
        assert!(matches!(
            Amount::from_str("-5"),
            Err(ParseAmountError::Negative(_))
        ));
        assert!(matches!(
            Amount::from_str("1.5"),
            Err(ParseAmountError::Invalid(_))
        ));
        assert!(matches!(
            Amount::from_str("0x10"),
            Err(ParseAmountError::Invalid(_))
        ));
    }

    #[test]
    fn sum_is_exact() {
        let values = [
            Amount::from(u64::MAX),
            Amount::from(u64::MAX),
            Amount::from(2_u64),
        ];
        let total: Amount = values.iter().sum();
        assert_eq!(total.to_string(), "36893488147419103232");
    }

    #[test]
    fn decimal_conversion_keeps_precision() {
        let value = Amount::from_str("123456789012345678901234567890").unwrap();
        let decimal = value.to_decimal();
        assert_eq!(Amount::from_decimal(&decimal).unwrap(), value);

        let fractional = BigDecimal::from_str("1.25").unwrap();
        assert!(Amount::from_decimal(&fractional).is_err());
    }

    #[test]
    fn serializes_as_decimal_string() {
        let value = Amount::from(1000_u64);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#""1000""#);

        let parsed: Amount = serde_json::from_str(r#""1000""#).unwrap();
        assert_eq!(parsed, value);

        let parsed: Amount = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, Amount::from(42_u64));
    }
}
