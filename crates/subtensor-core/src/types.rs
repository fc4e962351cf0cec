//! Core domain types for the subtensor client.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Dense identifier the ledger assigns to each registered peer.
pub type Uid = u64;

/// Block hash as raw bytes.
pub type BlockHash = [u8; 32];

/// Expected block production interval of the subtensor chain, in seconds.
pub const BLOCK_TIME_SECS: u64 = 6;

/// Supported networks - exhaustive match required (no default case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Primary test network.
    Akira,
    /// Primary main network.
    Kusanagi,
    /// Staging network.
    Boltzmann,
    /// A node running on this machine.
    Local,
}

impl Network {
    /// Canonical lowercase name used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Network::Akira => "akira",
            Network::Kusanagi => "kusanagi",
            Network::Boltzmann => "boltzmann",
            Network::Local => "local",
        }
    }

    /// Role of the network, independent of its codename.
    pub fn role(&self) -> &'static str {
        match self {
            Network::Akira => "primary-test",
            Network::Kusanagi => "primary-main",
            Network::Boltzmann => "staging",
            Network::Local => "local",
        }
    }

    /// Returns all known networks.
    pub fn all() -> &'static [Network] {
        &[
            Network::Akira,
            Network::Kusanagi,
            Network::Boltzmann,
            Network::Local,
        ]
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a network name is not in the catalog of known networks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown network: {0}")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Network::all()
            .iter()
            .copied()
            .find(|n| n.name() == lowered || n.role() == lowered)
            .ok_or_else(|| UnknownNetwork(s.to_string()))
    }
}

/// Connection status for the chain client.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    /// Every candidate endpoint failed; carries a diagnostic message.
    Failed(String),
}

/// How long a submission waits before reporting back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaitPolicy {
    /// Return once the node has accepted the transaction into its pool.
    #[default]
    FireAndForget,
    /// Wait until the transaction is in a produced block.
    Inclusion,
    /// Wait until the containing block is finalized.
    Finalization,
}

impl WaitPolicy {
    /// Build a policy from the pair of flags callers traditionally pass.
    /// Finalization wins when both are set.
    pub fn from_flags(wait_for_inclusion: bool, wait_for_finalization: bool) -> Self {
        match (wait_for_inclusion, wait_for_finalization) {
            (_, true) => WaitPolicy::Finalization,
            (true, false) => WaitPolicy::Inclusion,
            (false, false) => WaitPolicy::FireAndForget,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WaitPolicy::FireAndForget => "fire-and-forget",
            WaitPolicy::Inclusion => "wait-for-inclusion",
            WaitPolicy::Finalization => "wait-for-finalization",
        }
    }
}

/// Peer modality as registered on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    Text,
    Image,
    Tensor,
}

impl Modality {
    pub fn as_u8(&self) -> u8 {
        match self {
            Modality::Text => 0,
            Modality::Image => 1,
            Modality::Tensor => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Modality::Text),
            1 => Some(Modality::Image),
            2 => Some(Modality::Tensor),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_names() {
        assert_eq!(Network::Akira.name(), "akira");
        assert_eq!(Network::Kusanagi.name(), "kusanagi");
        assert_eq!(Network::Boltzmann.name(), "boltzmann");
        assert_eq!(Network::Local.name(), "local");
    }

    #[test]
    fn test_network_parse_codename_and_role() {
        assert_eq!("kusanagi".parse::<Network>().unwrap(), Network::Kusanagi);
        assert_eq!("primary-main".parse::<Network>().unwrap(), Network::Kusanagi);
        assert_eq!("Akira".parse::<Network>().unwrap(), Network::Akira);
        assert_eq!("primary-test".parse::<Network>().unwrap(), Network::Akira);
        assert_eq!("staging".parse::<Network>().unwrap(), Network::Boltzmann);
        assert_eq!(" local ".parse::<Network>().unwrap(), Network::Local);
    }

    #[test]
    fn test_network_parse_unknown() {
        let err = "finney".parse::<Network>().unwrap_err();
        assert_eq!(err, UnknownNetwork("finney".to_string()));
        assert_eq!(err.to_string(), "Unknown network: finney");
    }

    #[test]
    fn test_network_all() {
        let all = Network::all();
        assert_eq!(all.len(), 4);
        assert!(all.contains(&Network::Akira));
        assert!(all.contains(&Network::Local));
    }

    #[test]
    fn test_network_serde_lowercase() {
        let json = serde_json::to_string(&Network::Boltzmann).unwrap();
        assert_eq!(json, "\"boltzmann\"");
        let back: Network = serde_json::from_str("\"kusanagi\"").unwrap();
        assert_eq!(back, Network::Kusanagi);
    }

    #[test]
    fn test_wait_policy_from_flags() {
        assert_eq!(WaitPolicy::from_flags(false, false), WaitPolicy::FireAndForget);
        assert_eq!(WaitPolicy::from_flags(true, false), WaitPolicy::Inclusion);
        assert_eq!(WaitPolicy::from_flags(false, true), WaitPolicy::Finalization);
        assert_eq!(WaitPolicy::from_flags(true, true), WaitPolicy::Finalization);
    }

    #[test]
    fn test_modality_roundtrip() {
        for m in [Modality::Text, Modality::Image, Modality::Tensor] {
            assert_eq!(Modality::from_u8(m.as_u8()), Some(m));
        }
        assert_eq!(Modality::from_u8(7), None);
    }

    #[test]
    fn test_connection_status_equality() {
        assert_eq!(ConnectionStatus::Connected, ConnectionStatus::Connected);
        assert_ne!(ConnectionStatus::Connected, ConnectionStatus::Disconnected);
        assert_eq!(
            ConnectionStatus::Failed("test".into()),
            ConnectionStatus::Failed("test".into())
        );
    }
}
