use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A block as returned by `condenser_api.get_block`.
///
/// The RPC response carries no block number of its own, so the client fills
/// `height` in from the requested value after the fetch. Blocks are read-only
/// after construction and are dropped once the detector has seen them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignedBlock {
    #[serde(default)]
    pub height: u64,
    #[serde(with = "chain_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl SignedBlock {
    /// Block production time as unix seconds, the form events carry.
    pub fn unix_time(&self) -> i64 {
        self.timestamp.timestamp()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Transaction {
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// Fields of a `transfer` or `transfer_to_savings` operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferOperation {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub memo: String,
}

/// Fields of a `transfer_to_vesting` operation. An empty `to` means the
/// sender is vesting to their own account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferToVestingOperation {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub amount: String,
}

/// One chain operation, wire form `["op_name", {fields}]`.
///
/// Balance-affecting kinds are enumerated as typed variants; everything else
/// lands in `Other` and is inert. Unknown operation kinds must deserialize
/// successfully rather than fail, since the chain adds kinds over time.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Transfer(TransferOperation),
    TransferToSavings(TransferOperation),
    TransferToVesting(TransferToVestingOperation),
    Other { kind: String, body: Value },
}

impl Operation {
    pub fn kind(&self) -> &str {
        match self {
            Operation::Transfer(_) => "transfer",
            Operation::TransferToSavings(_) => "transfer_to_savings",
            Operation::TransferToVesting(_) => "transfer_to_vesting",
            Operation::Other { kind, .. } => kind,
        }
    }

    /// The accounts whose balances this operation can move, or `None` for
    /// inert kinds. The match is exhaustive on purpose: a new typed variant
    /// will not compile until its participants are spelled out here.
    pub fn participants(&self) -> Option<(&str, &str)> {
        match self {
            Operation::Transfer(op) | Operation::TransferToSavings(op) => {
                Some((op.from.as_str(), op.to.as_str()))
            }
            Operation::TransferToVesting(op) => {
                if op.to.is_empty() {
                    Some((op.from.as_str(), op.from.as_str()))
                } else {
                    Some((op.from.as_str(), op.to.as_str()))
                }
            }
            Operation::Other { .. } => None,
        }
    }

    pub fn is_balance_affecting(&self) -> bool {
        self.participants().is_some()
    }
}

impl Serialize for Operation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(self.kind())?;
        match self {
            Operation::Transfer(op) | Operation::TransferToSavings(op) => {
                seq.serialize_element(op)?
            }
            Operation::TransferToVesting(op) => seq.serialize_element(op)?,
            Operation::Other { body, .. } => seq.serialize_element(body)?,
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (kind, body): (String, Value) = Deserialize::deserialize(deserializer)?;
        let op = match kind.as_str() {
            "transfer" => {
                Operation::Transfer(serde_json::from_value(body).map_err(de::Error::custom)?)
            }
            "transfer_to_savings" => Operation::TransferToSavings(
                serde_json::from_value(body).map_err(de::Error::custom)?,
            ),
            "transfer_to_vesting" => Operation::TransferToVesting(
                serde_json::from_value(body).map_err(de::Error::custom)?,
            ),
            _ => Operation::Other { kind, body },
        };
        Ok(op)
    }
}

/// Block timestamps come as bare ISO-8601 without a zone suffix
/// ("2016-03-24T16:05:00"); the chain always means UTC.
mod chain_timestamp {
    use super::*;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let naive = NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(de::Error::custom)?;
        Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
    }
}
