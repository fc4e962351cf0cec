//! Random endpoint selection with a per-attempt blacklist.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use subtensor_core::Network;

use crate::catalog::NetworkCatalog;
use crate::error::ChainError;

/// Result of asking the selector for a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Endpoint(String),
    /// Every candidate of the network is blacklisted.
    Exhausted,
}

/// Picks candidate addresses uniformly at random from the catalog.
///
/// The random source is explicit so callers (and tests) control the sequence.
pub struct EndpointSelector<'a, R: Rng + ?Sized> {
    catalog: &'a NetworkCatalog,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> EndpointSelector<'a, R> {
    pub fn new(catalog: &'a NetworkCatalog, rng: &'a mut R) -> Self {
        Self { catalog, rng }
    }

    /// Choose a candidate for `network` that is not in `blacklist`.
    pub fn resolve(
        &mut self,
        network: Network,
        blacklist: &HashSet<String>,
    ) -> Result<Resolution, ChainError> {
        let available: Vec<&String> = self
            .catalog
            .endpoints(network)?
            .iter()
            .filter(|addr| !blacklist.contains(addr.as_str()))
            .collect();

        tracing::debug!(
            "{} candidates left for {} ({} blacklisted)",
            available.len(),
            network,
            blacklist.len()
        );

        Ok(available
            .choose(&mut *self.rng)
            .map(|addr| Resolution::Endpoint((*addr).clone()))
            .unwrap_or(Resolution::Exhausted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_resolves_from_catalog() {
        let catalog = NetworkCatalog::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut selector = EndpointSelector::new(&catalog, &mut rng);
        let Resolution::Endpoint(addr) = selector.resolve(Network::Akira, &HashSet::new()).unwrap()
        else {
            panic!("expected an endpoint");
        };
        assert!(catalog.endpoints(Network::Akira).unwrap().contains(&addr));
    }

    #[test]
    fn test_full_blacklist_is_exhausted() {
        let catalog = NetworkCatalog::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut selector = EndpointSelector::new(&catalog, &mut rng);
        for &network in Network::all() {
            let blacklist: HashSet<String> =
                catalog.endpoints(network).unwrap().iter().cloned().collect();
            assert_eq!(
                selector.resolve(network, &blacklist).unwrap(),
                Resolution::Exhausted
            );
        }
    }

    #[test]
    fn test_nine_of_ten_blacklisted_returns_the_last() {
        let catalog = NetworkCatalog::default();
        let all = catalog.endpoints(Network::Kusanagi).unwrap();
        for survivor in 0..all.len() {
            let blacklist: HashSet<String> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != survivor)
                .map(|(_, a)| a.clone())
                .collect();
            for seed in 0..20 {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut selector = EndpointSelector::new(&catalog, &mut rng);
                assert_eq!(
                    selector.resolve(Network::Kusanagi, &blacklist).unwrap(),
                    Resolution::Endpoint(all[survivor].clone())
                );
            }
        }
    }

    #[test]
    fn test_unknown_network_is_an_error_not_exhaustion() {
        let catalog = NetworkCatalog::from_entries([(Network::Local, vec!["127.0.0.1:9944"])]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut selector = EndpointSelector::new(&catalog, &mut rng);
        assert!(matches!(
            selector.resolve(Network::Boltzmann, &HashSet::new()),
            Err(ChainError::UnknownNetwork(_))
        ));
    }

    #[test]
    fn test_same_seed_same_choice() {
        let catalog = NetworkCatalog::default();
        let pick = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            EndpointSelector::new(&catalog, &mut rng)
                .resolve(Network::Kusanagi, &HashSet::new())
                .unwrap()
        };
        assert_eq!(pick(42), pick(42));
    }

    proptest! {
        #[test]
        fn prop_never_returns_blacklisted(
            seed in any::<u64>(),
            network_idx in 0usize..4,
            mask in any::<u16>(),
        ) {
            let catalog = NetworkCatalog::default();
            let network = Network::all()[network_idx];
            let candidates = catalog.endpoints(network).unwrap();
            let blacklist: HashSet<String> = candidates
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, a)| a.clone())
                .collect();

            let mut rng = StdRng::seed_from_u64(seed);
            let mut selector = EndpointSelector::new(&catalog, &mut rng);
            match selector.resolve(network, &blacklist).unwrap() {
                Resolution::Endpoint(addr) => {
                    prop_assert!(!blacklist.contains(&addr));
                    prop_assert!(candidates.contains(&addr));
                }
                Resolution::Exhausted => prop_assert_eq!(blacklist.len(), candidates.len()),
            }
        }
    }
}
