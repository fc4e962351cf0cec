//! Write operations: peer registration, staking, transfers and weights.
//!
//! Every call is validated before the connection is touched. The signing
//! key is chosen by the call's shape, so a hotkey never signs a custodial
//! call.

use std::net::IpAddr;
use subtensor_core::{Balance, Modality, Uid, WaitPolicy, ip_to_int};
use subxt::utils::AccountId32;

use crate::ChainClient;
use crate::connection::Connector;
use crate::error::ChainError;
use crate::extrinsic::CallData;
use crate::submission::SubmissionOutcome;
use crate::wallet::Wallet;

/// Result of a registration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The hotkey already serves the requested endpoint; nothing was sent.
    AlreadySubscribed { uid: Uid },
    Submitted(SubmissionOutcome),
}

impl<K: Connector> ChainClient<K> {
    /// Register the wallet's hotkey as a peer serving `ip:port`.
    pub async fn subscribe(
        &mut self,
        wallet: &Wallet,
        ip: IpAddr,
        port: u16,
        modality: Modality,
        policy: WaitPolicy,
    ) -> Result<Registration, ChainError> {
        let call = CallData::subscribe(ip, port, modality, &wallet.coldkey_account())?;

        let hotkey = wallet.hotkey_account();
        if let Some(uid) = self.get_uid_for_hotkey(&hotkey).await?
            && let Some(peer) = self.get_neuron_for_uid(uid).await?
            && peer.serves(ip_to_int(ip).0, port)
        {
            tracing::info!(
                "Already subscribed as uid {} at {}:{} (hotkey {})",
                uid,
                ip,
                port,
                hotkey
            );
            return Ok(Registration::AlreadySubscribed { uid });
        }

        match self.sign_and_submit(call, wallet, policy).await {
            Ok(outcome) => {
                tracing::info!(
                    "Subscribed {}:{} ({:?}) with hotkey {}, coldkey {}",
                    ip,
                    port,
                    modality,
                    hotkey,
                    wallet.coldkey_account()
                );
                Ok(Registration::Submitted(outcome))
            }
            Err(e) => {
                tracing::error!("Failed to subscribe: {}", e);
                Err(e)
            }
        }
    }

    /// Stake `amount` from the coldkey into the peer with `uid`.
    pub async fn add_stake(
        &mut self,
        wallet: &Wallet,
        amount: Balance,
        uid: Uid,
        policy: WaitPolicy,
    ) -> Result<SubmissionOutcome, ChainError> {
        let call = CallData::add_stake(uid, amount)?;
        tracing::info!("Staking {} into uid {}", amount, uid);
        self.sign_and_submit(call, wallet, policy).await
    }

    /// Withdraw `amount` of stake from the peer with `uid` back to the coldkey.
    pub async fn unstake(
        &mut self,
        wallet: &Wallet,
        amount: Balance,
        uid: Uid,
        policy: WaitPolicy,
    ) -> Result<SubmissionOutcome, ChainError> {
        let call = CallData::remove_stake(uid, amount)?;
        tracing::info!("Unstaking {} from uid {}", amount, uid);
        self.sign_and_submit(call, wallet, policy).await
    }

    /// Transfer `amount` from the coldkey to `dest`.
    pub async fn transfer(
        &mut self,
        wallet: &Wallet,
        dest: &AccountId32,
        amount: Balance,
        policy: WaitPolicy,
    ) -> Result<SubmissionOutcome, ChainError> {
        let call = CallData::transfer(dest, amount)?;
        tracing::info!("Transferring {} to {}", amount, dest);
        self.sign_and_submit(call, wallet, policy).await
    }

    /// Set the weights the wallet's peer assigns to `dests`.
    pub async fn set_weights(
        &mut self,
        wallet: &Wallet,
        dests: &[Uid],
        values: &[u32],
        policy: WaitPolicy,
    ) -> Result<SubmissionOutcome, ChainError> {
        let call = CallData::set_weights(dests, values)?;
        tracing::info!("Setting {} weights", dests.len());
        self.sign_and_submit(call, wallet, policy).await
    }
}
