//! Hotkey/coldkey pairing.

use std::str::FromStr;
use subxt::utils::AccountId32;
use subxt_signer::SecretUri;
use subxt_signer::sr25519::Keypair;

use crate::error::ChainError;
use crate::extrinsic::KeyRole;

/// The two signing identities of a participant.
#[derive(Clone)]
pub struct Wallet {
    hotkey: Keypair,
    coldkey: Keypair,
}

impl Wallet {
    pub fn new(hotkey: Keypair, coldkey: Keypair) -> Self {
        Self { hotkey, coldkey }
    }

    /// Derive both keys from secret URIs such as `//Alice` or a phrase with
    /// derivation junctions.
    pub fn from_uris(hotkey: &str, coldkey: &str) -> Result<Self, ChainError> {
        Ok(Self {
            hotkey: keypair_from_uri(hotkey)?,
            coldkey: keypair_from_uri(coldkey)?,
        })
    }

    pub fn hotkey(&self) -> &Keypair {
        &self.hotkey
    }

    pub fn coldkey(&self) -> &Keypair {
        &self.coldkey
    }

    pub fn hotkey_account(&self) -> AccountId32 {
        AccountId32::from(self.hotkey.public_key().0)
    }

    pub fn coldkey_account(&self) -> AccountId32 {
        AccountId32::from(self.coldkey.public_key().0)
    }

    /// The key that signs calls of the given role.
    pub fn key(&self, role: KeyRole) -> &Keypair {
        match role {
            KeyRole::Hotkey => &self.hotkey,
            KeyRole::Coldkey => &self.coldkey,
        }
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("hotkey", &self.hotkey_account().to_string())
            .field("coldkey", &self.coldkey_account().to_string())
            .finish()
    }
}

fn keypair_from_uri(uri: &str) -> Result<Keypair, ChainError> {
    let uri = SecretUri::from_str(uri)
        .map_err(|e| ChainError::InvalidArgument(format!("invalid secret uri: {}", e)))?;
    Keypair::from_uri(&uri).map_err(|e| ChainError::InvalidArgument(format!("invalid key: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use subxt_signer::sr25519::dev;

    #[test]
    fn test_key_by_role() {
        let wallet = Wallet::new(dev::alice(), dev::bob());
        assert_eq!(
            wallet.key(KeyRole::Hotkey).public_key().0,
            dev::alice().public_key().0
        );
        assert_eq!(
            wallet.key(KeyRole::Coldkey).public_key().0,
            dev::bob().public_key().0
        );
        assert_ne!(wallet.hotkey_account(), wallet.coldkey_account());
    }

    #[test]
    fn test_from_dev_uris() {
        let wallet = Wallet::from_uris("//Alice", "//Bob").unwrap();
        assert_eq!(
            wallet.hotkey_account(),
            AccountId32::from(dev::alice().public_key().0)
        );
        assert_eq!(
            wallet.coldkey_account(),
            AccountId32::from(dev::bob().public_key().0)
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let wallet = Wallet::new(dev::alice(), dev::bob());
        let debug = format!("{:?}", wallet);
        // Alice's well-known SS58 address
        assert!(debug.contains("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"));
    }
}
