//! Network catalog: the entrypoint nodes of every known network.
//!
//! Entries are stored as bare `host:port`. The websocket scheme is applied
//! when a connection is opened, see [`to_ws_url`].

use std::collections::HashMap;
use subtensor_core::Network;

use crate::error::ChainError;

/// Get the built-in entrypoint nodes for a network.
pub fn get_entrypoints(network: Network) -> &'static [&'static str] {
    match network {
        Network::Akira => &[
            "fermi.akira.bittensor.com:9944",
            "copernicus.akira.bittensor.com:9944",
            "buys.akira.bittensor.com:9944",
            "nobel.akira.bittensor.com:9944",
            "mendeleev.akira.bittensor.com:9944",
            "rontgen.akira.bittensor.com:9944",
            "feynman.akira.bittensor.com:9944",
            "bunsen.akira.bittensor.com:9944",
            "berkeley.akira.bittensor.com:9944",
            "huygens.akira.bittensor.com:9944",
        ],
        Network::Kusanagi => &[
            "fermi.kusanagi.bittensor.com:9944",
            "copernicus.kusanagi.bittensor.com:9944",
            "buys.kusanagi.bittensor.com:9944",
            "nobel.kusanagi.bittensor.com:9944",
            "mendeleev.kusanagi.bittensor.com:9944",
            "rontgen.kusanagi.bittensor.com:9944",
            "feynman.kusanagi.bittensor.com:9944",
            "bunsen.kusanagi.bittensor.com:9944",
            "berkeley.kusanagi.bittensor.com:9944",
            "huygens.kusanagi.bittensor.com:9944",
        ],
        Network::Boltzmann => &["feynman.boltzmann.bittensor.com:9944"],
        Network::Local => &["127.0.0.1:9944"],
    }
}

/// Immutable table of candidate addresses per network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkCatalog {
    entries: HashMap<Network, Vec<String>>,
}

impl Default for NetworkCatalog {
    fn default() -> Self {
        let entries = Network::all()
            .iter()
            .map(|&network| {
                let addrs = get_entrypoints(network)
                    .iter()
                    .map(|a| a.to_string())
                    .collect();
                (network, addrs)
            })
            .collect();
        Self { entries }
    }
}

impl NetworkCatalog {
    /// Build a catalog from explicit entries. Networks with no addresses are
    /// rejected so that every listed network has at least one candidate.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, ChainError>
    where
        I: IntoIterator<Item = (Network, Vec<S>)>,
        S: Into<String>,
    {
        let mut map = HashMap::new();
        for (network, addrs) in entries {
            let addrs: Vec<String> = addrs.into_iter().map(Into::into).collect();
            if addrs.is_empty() {
                return Err(ChainError::InvalidArgument(format!(
                    "network {} has no entrypoints",
                    network
                )));
            }
            map.insert(network, addrs);
        }
        Ok(Self { entries: map })
    }

    /// Candidate addresses of a network, in catalog order.
    pub fn endpoints(&self, network: Network) -> Result<&[String], ChainError> {
        self.entries
            .get(&network)
            .map(Vec::as_slice)
            .ok_or_else(|| ChainError::UnknownNetwork(network.to_string()))
    }

    pub fn networks(&self) -> impl Iterator<Item = Network> + '_ {
        self.entries.keys().copied()
    }
}

/// Apply the websocket scheme to a bare `host:port` address. Addresses that
/// already carry a `ws://` or `wss://` scheme are returned unchanged.
pub fn to_ws_url(address: &str) -> String {
    if address.starts_with("ws://") || address.starts_with("wss://") {
        address.to_string()
    } else {
        format!("ws://{}", address)
    }
}
