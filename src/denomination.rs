use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const BASES: [u8; 3] = [1, 2, 5];

/// Largest power that keeps `5 * 10^power` inside u64 range.
pub const MAX_POWER: u32 = 18;

/// A coin face value from the canonical 1/2/5 series: `base * 10^power`.
///
/// The wire code used by issuance submissions is `"base,power"`, e.g. a
/// 500-unit coin is `"5,2"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Denomination {
    base: u8,
    power: u32,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DenominationError {
    #[error("base must be 1, 2 or 5, got {0}")]
    InvalidBase(u8),
    #[error("power {0} is out of range")]
    PowerTooLarge(u32),
    #[error("{0} is not a 1/2/5 series amount")]
    NotCanonical(u64),
    #[error("invalid denomination code {0:?}")]
    InvalidCode(String),
}

impl Denomination {
    pub fn new(base: u8, power: u32) -> Result<Self, DenominationError> {
        if !BASES.contains(&base) {
            return Err(DenominationError::InvalidBase(base));
        }
        if power > MAX_POWER {
            return Err(DenominationError::PowerTooLarge(power));
        }
        Ok(Self { base, power })
    }

    /// Inverse of [`Denomination::amount`]: strips trailing zeros and
    /// checks the leading digit is 1, 2 or 5.
    pub fn from_amount(amount: u64) -> Result<Self, DenominationError> {
        if amount == 0 {
            return Err(DenominationError::NotCanonical(amount));
        }
        let mut rest = amount;
        let mut power = 0u32;
        while rest % 10 == 0 {
            rest /= 10;
            power += 1;
        }
        match rest {
            1 | 2 | 5 => Ok(Self {
                base: rest as u8,
                power,
            }),
            _ => Err(DenominationError::NotCanonical(amount)),
        }
    }

    pub fn base(&self) -> u8 {
        self.base
    }

    pub fn power(&self) -> u32 {
        self.power
    }

    pub fn amount(&self) -> u64 {
        self.base as u64 * 10u64.pow(self.power)
    }

    /// All denominations not exceeding `max`, ascending. Empty when
    /// `max` is zero.
    pub fn series_up_to(max: u64) -> Vec<Self> {
        let mut series = Vec::new();
        for power in 0..=MAX_POWER {
            for base in BASES {
                let denomination = Self { base, power };
                if denomination.amount() > max {
                    return series;
                }
                series.push(denomination);
            }
        }
        series
    }
}

impl Ord for Denomination {
    fn cmp(&self, other: &Self) -> Ordering {
        self.amount().cmp(&other.amount())
    }
}

impl PartialOrd for Denomination {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.base, self.power)
    }
}

impl FromStr for Denomination {
    type Err = DenominationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, power) = s
            .split_once(',')
            .ok_or_else(|| DenominationError::InvalidCode(s.to_string()))?;
        let base = base
            .parse()
            .map_err(|_| DenominationError::InvalidCode(s.to_string()))?;
        let power = power
            .parse()
            .map_err(|_| DenominationError::InvalidCode(s.to_string()))?;
        Self::new(base, power)
    }
}

impl Serialize for Denomination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Denomination {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(de::Error::custom)
    }
}
