//! Peer-related chain queries.
//!
//! Per-uid lookups return `None` when the uid has no entry. Whole-map reads
//! accept an optional block hash to read a past state.

use std::net::IpAddr;
use subtensor_core::{Balance, BlockHash, Uid, ip_to_int};
use subxt::utils::AccountId32;

use crate::ChainClient;
use crate::connection::{Connector, StorageEntry, StorageValue};
use crate::error::ChainError;
use crate::queries::mapper::{
    PeerRecord, WeightVector, decode_account_key, decode_peer, decode_stake, decode_u64,
    decode_uid_key, decode_uid_list, decode_weight_vals,
};
use crate::queries::storage::{StorageItem, StorageMap};
use crate::wallet::Wallet;

impl<K: Connector> ChainClient<K> {
    /// Get the uid registered for a hotkey.
    pub async fn get_uid_for_hotkey(
        &mut self,
        hotkey: &AccountId32,
    ) -> Result<Option<Uid>, ChainError> {
        self.query(&StorageItem::Active(hotkey.clone()), None)
            .await?
            .map(|v| decode_u64(&v, "uid"))
            .transpose()
    }

    /// Get the peer record of a uid.
    pub async fn get_neuron_for_uid(&mut self, uid: Uid) -> Result<Option<PeerRecord>, ChainError> {
        self.query(&StorageItem::Neuron(uid), None)
            .await?
            .map(|v| decode_peer(&v))
            .transpose()
    }

    /// Get the stake held by a uid.
    pub async fn get_stake_for_uid(&mut self, uid: Uid) -> Result<Option<Balance>, ChainError> {
        self.query(&StorageItem::Stake(uid), None)
            .await?
            .map(|v| decode_stake(&v))
            .transpose()
    }

    pub async fn weight_uids_for_uid(&mut self, uid: Uid) -> Result<Option<Vec<Uid>>, ChainError> {
        self.query(&StorageItem::WeightUids(uid), None)
            .await?
            .map(|v| decode_uid_list(&v))
            .transpose()
    }

    pub async fn weight_vals_for_uid(&mut self, uid: Uid) -> Result<Option<Vec<u32>>, ChainError> {
        self.query(&StorageItem::WeightVals(uid), None)
            .await?
            .map(|v| decode_weight_vals(&v))
            .transpose()
    }

    /// Get the weights a uid assigns, pairing its weight uids and values.
    ///
    /// `None` when the uid has neither. A uid with only one of the two is
    /// inconsistent state and reported as invalid data.
    pub async fn get_weights_for_uid(
        &mut self,
        uid: Uid,
    ) -> Result<Option<WeightVector>, ChainError> {
        let dests = self.weight_uids_for_uid(uid).await?;
        let values = self.weight_vals_for_uid(uid).await?;
        match (dests, values) {
            (None, None) => Ok(None),
            (dests, values) => WeightVector::new(
                uid,
                dests.unwrap_or_default(),
                values.unwrap_or_default(),
            )
            .map(Some),
        }
    }

    /// Get the block at which a uid last emitted.
    pub async fn get_last_emit_for_uid(&mut self, uid: Uid) -> Result<Option<u64>, ChainError> {
        self.query(&StorageItem::LastEmit(uid), None)
            .await?
            .map(|v| decode_u64(&v, "last emit"))
            .transpose()
    }

    /// All `(hotkey, uid)` pairs of active peers.
    pub async fn get_active(
        &mut self,
        at: Option<BlockHash>,
    ) -> Result<Vec<(AccountId32, Uid)>, ChainError> {
        let entries = self.query_map(StorageMap::Active, at).await?;
        decode_entries(entries, decode_account_key, |v| decode_u64(v, "uid"))
    }

    /// All `(uid, stake)` pairs.
    pub async fn get_stake_map(
        &mut self,
        at: Option<BlockHash>,
    ) -> Result<Vec<(Uid, Balance)>, ChainError> {
        let entries = self.query_map(StorageMap::Stake, at).await?;
        decode_entries(entries, decode_uid_key, decode_stake)
    }

    /// All `(uid, last emit block)` pairs.
    pub async fn get_last_emit_map(
        &mut self,
        at: Option<BlockHash>,
    ) -> Result<Vec<(Uid, u64)>, ChainError> {
        let entries = self.query_map(StorageMap::LastEmit, at).await?;
        decode_entries(entries, decode_uid_key, |v| decode_u64(v, "last emit"))
    }

    pub async fn get_weight_uids_map(
        &mut self,
        at: Option<BlockHash>,
    ) -> Result<Vec<(Uid, Vec<Uid>)>, ChainError> {
        let entries = self.query_map(StorageMap::WeightUids, at).await?;
        decode_entries(entries, decode_uid_key, decode_uid_list)
    }

    pub async fn get_weight_vals_map(
        &mut self,
        at: Option<BlockHash>,
    ) -> Result<Vec<(Uid, Vec<u32>)>, ChainError> {
        let entries = self.query_map(StorageMap::WeightVals, at).await?;
        decode_entries(entries, decode_uid_key, decode_weight_vals)
    }

    /// All registered peers.
    pub async fn neurons(
        &mut self,
        at: Option<BlockHash>,
    ) -> Result<Vec<(Uid, PeerRecord)>, ChainError> {
        let entries = self.query_map(StorageMap::Neurons, at).await?;
        let peers = decode_entries(entries, decode_uid_key, decode_peer)?;
        tracing::debug!("Fetched {} peers", peers.len());
        Ok(peers)
    }

    /// Whether the wallet's hotkey is registered and advertises `ip:port`.
    pub async fn is_subscribed(
        &mut self,
        wallet: &Wallet,
        ip: IpAddr,
        port: u16,
    ) -> Result<bool, ChainError> {
        let Some(uid) = self.get_uid_for_hotkey(&wallet.hotkey_account()).await? else {
            return Ok(false);
        };
        let Some(peer) = self.get_neuron_for_uid(uid).await? else {
            return Ok(false);
        };
        let (ip, _) = ip_to_int(ip);
        Ok(peer.serves(ip, port))
    }
}

fn decode_entries<Key, T>(
    entries: Vec<StorageEntry>,
    key: impl Fn(&[u8]) -> Result<Key, ChainError>,
    value: impl Fn(&StorageValue) -> Result<T, ChainError>,
) -> Result<Vec<(Key, T)>, ChainError> {
    entries
        .iter()
        .map(|(key_bytes, v)| Ok((key(key_bytes)?, value(v)?)))
        .collect()
}
