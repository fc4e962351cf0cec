//! Storage items read by the client.

use subtensor_core::Uid;
use subxt::dynamic::Value;
use subxt::utils::AccountId32;

const SUBTENSOR: &str = "SubtensorModule";

/// A single keyed storage entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageItem {
    /// `System::Account`, the account info holding the free balance.
    Account(AccountId32),
    /// `SubtensorModule::Stake` of a peer.
    Stake(Uid),
    /// `SubtensorModule::Neurons`, the peer record.
    Neuron(Uid),
    /// `SubtensorModule::WeightUids` of a peer.
    WeightUids(Uid),
    /// `SubtensorModule::WeightVals` of a peer.
    WeightVals(Uid),
    /// `SubtensorModule::Active`, hotkey to uid.
    Active(AccountId32),
    /// `SubtensorModule::LastEmit` block of a peer.
    LastEmit(Uid),
}

impl StorageItem {
    pub fn module(&self) -> &'static str {
        match self {
            StorageItem::Account(_) => "System",
            _ => SUBTENSOR,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageItem::Account(_) => "Account",
            StorageItem::Stake(_) => StorageMap::Stake.name(),
            StorageItem::Neuron(_) => StorageMap::Neurons.name(),
            StorageItem::WeightUids(_) => StorageMap::WeightUids.name(),
            StorageItem::WeightVals(_) => StorageMap::WeightVals.name(),
            StorageItem::Active(_) => StorageMap::Active.name(),
            StorageItem::LastEmit(_) => StorageMap::LastEmit.name(),
        }
    }

    /// Storage key values, in the order the map declares them.
    pub fn keys(&self) -> Vec<Value> {
        match self {
            StorageItem::Account(account) | StorageItem::Active(account) => {
                vec![Value::from_bytes(account)]
            }
            StorageItem::Stake(uid)
            | StorageItem::Neuron(uid)
            | StorageItem::WeightUids(uid)
            | StorageItem::WeightVals(uid)
            | StorageItem::LastEmit(uid) => vec![Value::u128(u128::from(*uid))],
        }
    }
}

/// A `SubtensorModule` map that can be read whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageMap {
    Active,
    Stake,
    Neurons,
    WeightUids,
    WeightVals,
    LastEmit,
}

impl StorageMap {
    pub fn module(&self) -> &'static str {
        SUBTENSOR
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageMap::Active => "Active",
            StorageMap::Stake => "Stake",
            StorageMap::Neurons => "Neurons",
            StorageMap::WeightUids => "WeightUids",
            StorageMap::WeightVals => "WeightVals",
            StorageMap::LastEmit => "LastEmit",
        }
    }
}
