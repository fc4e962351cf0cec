//! Decoding of raw storage values into typed records.
//!
//! Everything here is pure so it can be tested without a node. Absent
//! entries never reach these functions; a present value that does not have
//! the expected shape is reported as [`ChainError::InvalidData`].

use std::net::IpAddr;
use subtensor_core::{Balance, Modality, Uid, int_to_ip};
use subxt::dynamic::{At, Value};
use subxt::ext::scale_value::ValueDef;
use subxt::utils::AccountId32;

use crate::error::ChainError;

/// A registered peer as stored in `SubtensorModule::Neurons`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    pub uid: Uid,
    pub ip: u128,
    pub port: u16,
    pub ip_type: u8,
    pub modality: u8,
    pub hotkey: AccountId32,
    pub coldkey: AccountId32,
}

impl PeerRecord {
    pub fn ip_addr(&self) -> Option<IpAddr> {
        int_to_ip(self.ip, self.ip_type)
    }

    pub fn modality(&self) -> Option<Modality> {
        Modality::from_u8(self.modality)
    }

    /// Whether the record advertises `ip:port`.
    pub fn serves(&self, ip: u128, port: u16) -> bool {
        self.ip == ip && self.port == port
    }
}

/// Weights one peer assigns to others, as parallel sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightVector {
    pub source: Uid,
    pub dests: Vec<Uid>,
    pub values: Vec<u32>,
}

impl WeightVector {
    /// Pair up destinations and values. Lengths must agree.
    pub fn new(source: Uid, dests: Vec<Uid>, values: Vec<u32>) -> Result<Self, ChainError> {
        if dests.len() != values.len() {
            return Err(ChainError::InvalidData(format!(
                "weights of uid {} have {} destinations but {} values",
                source,
                dests.len(),
                values.len()
            )));
        }
        Ok(Self {
            source,
            dests,
            values,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Uid, u32)> + '_ {
        self.dests.iter().copied().zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.dests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dests.is_empty()
    }
}

/// Free balance out of a `System::Account` value.
pub fn decode_balance(value: &Value) -> Result<Balance, ChainError> {
    // AccountInfo = { nonce, consumers, providers, sufficients, data: AccountData }
    // AccountData = { free, reserved, frozen, flags }
    let free = value
        .at("data")
        .and_then(|d| d.at("free"))
        .and_then(|v| v.as_u128())
        .ok_or_else(|| ChainError::InvalidData("account info has no data.free".into()))?;
    Ok(Balance::try_from(free)?)
}

/// A stake amount in rao.
pub fn decode_stake(value: &Value) -> Result<Balance, ChainError> {
    Ok(Balance::from_rao(decode_u64(value, "stake")?))
}

pub fn decode_u64(value: &Value, what: &str) -> Result<u64, ChainError> {
    let n = value
        .as_u128()
        .ok_or_else(|| ChainError::InvalidData(format!("{} is not an integer", what)))?;
    u64::try_from(n).map_err(|_| ChainError::InvalidData(format!("{} out of range: {}", what, n)))
}

pub fn decode_uid_list(value: &Value) -> Result<Vec<Uid>, ChainError> {
    sequence(value, "weight uids")?
        .map(|v| decode_u64(v, "weight uid"))
        .collect()
}

pub fn decode_weight_vals(value: &Value) -> Result<Vec<u32>, ChainError> {
    sequence(value, "weight values")?
        .map(|v| {
            let n = decode_u64(v, "weight value")?;
            u32::try_from(n)
                .map_err(|_| ChainError::InvalidData(format!("weight value out of range: {}", n)))
        })
        .collect()
}

/// A `NeuronMetadataOf` value.
pub fn decode_peer(value: &Value) -> Result<PeerRecord, ChainError> {
    let ip = peer_field(value, "ip")?
        .as_u128()
        .ok_or_else(|| ChainError::InvalidData("ip is not an integer".into()))?;

    Ok(PeerRecord {
        uid: decode_u64(peer_field(value, "uid")?, "uid")?,
        ip,
        port: narrow(value, "port")?,
        ip_type: narrow(value, "ip_type")?,
        modality: narrow(value, "modality")?,
        hotkey: peer_account(value, "hotkey")?,
        coldkey: peer_account(value, "coldkey")?,
    })
}

fn peer_field<'a>(value: &'a Value, name: &str) -> Result<&'a Value, ChainError> {
    value
        .at(name)
        .ok_or_else(|| ChainError::InvalidData(format!("peer record has no field '{}'", name)))
}

fn narrow<T: TryFrom<u64>>(value: &Value, name: &str) -> Result<T, ChainError> {
    let n = decode_u64(peer_field(value, name)?, name)?;
    T::try_from(n).map_err(|_| ChainError::InvalidData(format!("{} out of range: {}", name, n)))
}

fn peer_account(value: &Value, name: &str) -> Result<AccountId32, ChainError> {
    extract_account_id(peer_field(value, name)?)
        .ok_or_else(|| ChainError::InvalidData(format!("{} is not an account id", name)))
}

/// Extract an AccountId from a dynamic Value.
///
/// Accepts the bare 32-byte sequence or the `AccountId32` newtype wrapping it.
pub fn extract_account_id(value: &Value) -> Option<AccountId32> {
    let ValueDef::Composite(composite) = &value.value else {
        return None;
    };
    let fields: Vec<&Value> = composite.values().collect();
    if let [inner] = fields.as_slice() {
        return extract_account_id(inner);
    }

    let bytes: Vec<u8> = fields
        .iter()
        .map(|v| v.as_u128().and_then(|b| u8::try_from(b).ok()))
        .collect::<Option<_>>()?;
    let arr: [u8; 32] = bytes.try_into().ok()?;
    Some(AccountId32::from(arr))
}

/// Uid of a uid-keyed map entry.
///
/// Keys are hashed with a concat hasher, so the plain key is the suffix.
pub fn decode_uid_key(key_bytes: &[u8]) -> Result<Uid, ChainError> {
    let start = key_bytes
        .len()
        .checked_sub(8)
        .ok_or_else(|| ChainError::InvalidData("storage key too short for uid".into()))?;
    let uid: [u8; 8] = key_bytes[start..]
        .try_into()
        .map_err(|_| ChainError::InvalidData("Invalid uid key".into()))?;
    Ok(u64::from_le_bytes(uid))
}

/// Account of an account-keyed map entry (last 32 bytes).
pub fn decode_account_key(key_bytes: &[u8]) -> Result<AccountId32, ChainError> {
    let start = key_bytes
        .len()
        .checked_sub(32)
        .ok_or_else(|| ChainError::InvalidData("storage key too short for account".into()))?;
    let account: [u8; 32] = key_bytes[start..]
        .try_into()
        .map_err(|_| ChainError::InvalidData("Invalid account key".into()))?;
    Ok(AccountId32::from(account))
}

fn sequence<'a>(
    value: &'a Value,
    what: &str,
) -> Result<impl Iterator<Item = &'a Value> + use<'a>, ChainError> {
    match &value.value {
        ValueDef::Composite(composite) => Ok(composite.values()),
        _ => Err(ChainError::InvalidData(format!("{} is not a sequence", what))),
    }
}
