use crate::denomination::{Denomination, DenominationError};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("fingerprint {0:?} is not a 40-digit hex string")]
    BadFingerprint(String),
    #[error("coin id {0:?} must have 6 dash-separated fields")]
    BadCoinId(String),
    #[error("invalid number in coin id field {0:?}")]
    BadNumber(String),
    #[error("unknown coin origin {0:?}")]
    BadOrigin(String),
    #[error(transparent)]
    Denomination(#[from] DenominationError),
}

/// An OpenPGP key fingerprint, the wallet identifier on the ledger.
/// Stored uppercased so ids compare and hash consistently.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Fingerprint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 40 || hex::decode(s).is_err() {
            return Err(ParseError::BadFingerprint(s.to_string()));
        }
        Ok(Self(s.to_uppercase()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// How a coin came into existence on the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoinOrigin {
    /// Minted against an amendment's universal dividend.
    Amendment,
    /// Reissued by a transfer transaction.
    Transaction,
    /// Produced by fusing smaller coins.
    Fusion,
}

impl CoinOrigin {
    fn as_str(&self) -> &'static str {
        match self {
            CoinOrigin::Amendment => "A",
            CoinOrigin::Transaction => "T",
            CoinOrigin::Fusion => "F",
        }
    }
}

impl FromStr for CoinOrigin {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(CoinOrigin::Amendment),
            "T" => Ok(CoinOrigin::Transaction),
            "F" => Ok(CoinOrigin::Fusion),
            other => Err(ParseError::BadOrigin(other.to_string())),
        }
    }
}

/// A ledger-issued coin. The composite id string
/// `ISSUER-NUMBER-BASE-POWER-ORIGIN-ORIGINNUMBER` is parsed once at
/// ingestion; nothing downstream re-splits it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Coin {
    pub issuer: Fingerprint,
    pub number: u64,
    pub denomination: Denomination,
    pub origin: CoinOrigin,
    pub origin_number: u64,
}

impl Coin {
    pub fn amount(&self) -> u64 {
        self.denomination.amount()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}-{}",
            self.issuer,
            self.number,
            self.denomination.base(),
            self.denomination.power(),
            self.origin.as_str(),
            self.origin_number
        )
    }
}

impl FromStr for Coin {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split('-').collect();
        let [issuer, number, base, power, origin, origin_number]: [&str; 6] = fields
            .try_into()
            .map_err(|_| ParseError::BadCoinId(s.to_string()))?;
        let parse_number = |field: &str| {
            u64::from_str(field).map_err(|_| ParseError::BadNumber(field.to_string()))
        };
        let base = base
            .parse::<u8>()
            .map_err(|_| ParseError::BadNumber(base.to_string()))?;
        let power = power
            .parse::<u32>()
            .map_err(|_| ParseError::BadNumber(power.to_string()))?;
        Ok(Self {
            issuer: issuer.parse()?,
            number: parse_number(number)?,
            denomination: Denomination::new(base, power)?,
            origin: origin.parse()?,
            origin_number: parse_number(origin_number)?,
        })
    }
}

impl Serialize for Coin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        id.parse().map_err(de::Error::custom)
    }
}

/// A ledger epoch record. Only the fields the wallet reads; the ledger
/// sends more (voters, members root) which are ignored here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Amendment {
    pub number: u64,
    #[serde(default)]
    pub dividend: Option<u64>,
    #[serde(default, rename = "generated")]
    pub generated_on: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub number: u64,
    pub sender: Fingerprint,
    pub recipient: Fingerprint,
    pub coins: Vec<Coin>,
    #[serde(default)]
    pub comment: String,
}

impl Transaction {
    pub fn amount(&self) -> u64 {
        self.coins.iter().map(Coin::amount).sum()
    }
}
