//! Chain client façade.
//!
//! A [`ChainClient`] owns at most one live [`Connection`]. Opening a
//! connection to a network target fails over between catalog candidates;
//! an explicit endpoint gets a single attempt. Once connected, a transport
//! error on any read or write drops the connection and is returned to the
//! caller. Nothing is retried automatically, in particular no write.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use subtensor_core::{
    BLOCK_TIME_SECS, BlockHash, ClientConfig, ConnectTarget, ConnectionStatus, Network,
    WaitPolicy,
};
use subxt_signer::sr25519::Keypair;
use tokio::sync::mpsc;

use crate::catalog::{NetworkCatalog, to_ws_url};
use crate::connection::{Connection, Connector, StorageEntry, StorageValue};
use crate::error::ChainError;
use crate::extrinsic::{CallData, Extrinsic, ExtrinsicBuilder};
use crate::queries::storage::{StorageItem, StorageMap};
use crate::rpc::RpcConnector;
use crate::selector::{EndpointSelector, Resolution};
use crate::submission::{SubmissionOutcome, await_outcome};
use crate::wallet::Wallet;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(3 * BLOCK_TIME_SECS);

/// Client for a subtensor chain, generic over how connections are opened.
pub struct ChainClient<K: Connector = RpcConnector> {
    target: ConnectTarget,
    catalog: Arc<NetworkCatalog>,
    connector: K,
    rng: StdRng,
    connection: Option<K::Connection>,
    status: ConnectionStatus,
    status_tx: Option<mpsc::Sender<ConnectionStatus>>,
    connect_timeout: Duration,
    query_timeout: Duration,
    submission_timeout: Duration,
}

impl ChainClient<RpcConnector> {
    /// A disconnected client using WebSocket RPC.
    pub fn new(target: ConnectTarget) -> Self {
        Self::with_connector(target, RpcConnector)
    }

    /// Create and open a client from configuration.
    pub async fn create_by_config(config: &ClientConfig) -> Result<Self, ChainError> {
        let mut client = Self::from_config(config, RpcConnector)?;
        client.open().await?;
        Ok(client)
    }

    /// Create and open a client for a catalog network.
    pub async fn create_by_network(network: Network) -> Result<Self, ChainError> {
        Self::create_by_config(&ClientConfig::for_network(network)).await
    }

    /// Create and open a client for a single `host:port` endpoint.
    pub async fn create_by_endpoint(endpoint: &str) -> Result<Self, ChainError> {
        Self::create_by_config(&ClientConfig::for_endpoint(endpoint)).await
    }
}

impl<K: Connector> ChainClient<K> {
    pub fn with_connector(target: ConnectTarget, connector: K) -> Self {
        Self {
            target,
            catalog: Arc::new(NetworkCatalog::default()),
            connector,
            rng: StdRng::from_entropy(),
            connection: None,
            status: ConnectionStatus::Disconnected,
            status_tx: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            query_timeout: DEFAULT_SUBMISSION_TIMEOUT,
            submission_timeout: DEFAULT_SUBMISSION_TIMEOUT,
        }
    }

    /// A disconnected client for the target and timeouts of `config`.
    pub fn from_config(config: &ClientConfig, connector: K) -> Result<Self, ChainError> {
        let timeout = config.submission_timeout();
        Ok(Self::with_connector(config.target()?, connector)
            .with_connect_timeout(config.connect_timeout())
            .with_query_timeout(timeout)
            .with_submission_timeout(timeout))
    }

    pub fn with_catalog(mut self, catalog: Arc<NetworkCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Seed endpoint selection for a reproducible failover order.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Publish status changes on `tx`. Updates are dropped when the channel is full.
    pub fn with_status_channel(mut self, tx: mpsc::Sender<ConnectionStatus>) -> Self {
        self.status_tx = Some(tx);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_submission_timeout(mut self, timeout: Duration) -> Self {
        self.submission_timeout = timeout;
        self
    }

    pub fn target(&self) -> &ConnectTarget {
        &self.target
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// URL of the live connection.
    pub fn endpoint(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.endpoint())
    }

    pub fn submission_timeout(&self) -> Duration {
        self.submission_timeout
    }

    /// The live connection.
    pub fn connection(&self) -> Result<&K::Connection, ChainError> {
        self.connection.as_ref().ok_or(ChainError::NotConnected)
    }

    /// Establish a connection to the target, replacing any live one.
    pub async fn open(&mut self) -> Result<(), ChainError> {
        self.connection = None;
        self.set_status(ConnectionStatus::Connecting);

        let result = match self.target.clone() {
            ConnectTarget::Endpoint(address) => self.attempt(&address).await,
            ConnectTarget::Network(network) => self.failover(network).await,
        };

        match result {
            Ok(connection) => {
                tracing::info!("Connected to {} via {}", self.target, connection.endpoint());
                self.connection = Some(connection);
                self.set_status(ConnectionStatus::Connected);
                Ok(())
            }
            Err(e) => {
                self.set_status(ConnectionStatus::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Drop the live connection, if any, and open a fresh one.
    pub async fn reconnect(&mut self) -> Result<(), ChainError> {
        self.disconnect();
        self.open().await
    }

    pub fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            tracing::info!("Disconnected from {}", self.target);
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    /// One bounded connection attempt to a bare or prefixed address.
    async fn attempt(&self, address: &str) -> Result<K::Connection, ChainError> {
        let url = to_ws_url(address);
        match tokio::time::timeout(self.connect_timeout, self.connector.open(&url)).await {
            Ok(result) => result,
            Err(_) => Err(ChainError::Connection {
                endpoint: url,
                reason: format!("timed out after {}s", self.connect_timeout.as_secs()),
            }),
        }
    }

    /// Try catalog candidates of `network` until one connects or none remain.
    async fn failover(&mut self, network: Network) -> Result<K::Connection, ChainError> {
        let mut blacklist = HashSet::new();
        let mut attempted = Vec::new();

        loop {
            let resolution =
                EndpointSelector::new(&self.catalog, &mut self.rng).resolve(network, &blacklist)?;

            let address = match resolution {
                Resolution::Endpoint(address) => address,
                Resolution::Exhausted => {
                    tracing::error!(
                        "No more endpoints available for {} after {} attempts",
                        network,
                        attempted.len()
                    );
                    return Err(ChainError::ResolutionExhausted { network, attempted });
                }
            };

            tracing::info!("Trying {} via {}", network, address);
            match self.attempt(&address).await {
                Ok(connection) => return Ok(connection),
                Err(e) => {
                    tracing::warn!("Failed to connect to {}: {}", address, e);
                    blacklist.insert(address.clone());
                    attempted.push(address);
                }
            }
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if let Some(tx) = &self.status_tx {
            let _ = tx.try_send(status.clone());
        }
        self.status = status;
    }

    /// Drop the connection if `result` carries a transport error.
    fn observe<T>(&mut self, result: Result<T, ChainError>) -> Result<T, ChainError> {
        if let Err(e) = &result
            && e.is_transport()
            && self.connection.take().is_some()
        {
            tracing::warn!("Dropping connection to {}: {}", self.target, e);
            self.set_status(ConnectionStatus::Disconnected);
        }
        result
    }

    /// Read one storage entry, optionally at a past block.
    pub async fn query(
        &mut self,
        item: &StorageItem,
        at: Option<BlockHash>,
    ) -> Result<Option<StorageValue>, ChainError> {
        tracing::debug!("Query {}::{} {:?}", item.module(), item.name(), item);
        let result = bounded(self.query_timeout, self.connection()?.fetch(item, at)).await;
        self.observe(result)
    }

    /// Read every entry of a storage map, optionally at a past block.
    pub async fn query_map(
        &mut self,
        map: StorageMap,
        at: Option<BlockHash>,
    ) -> Result<Vec<StorageEntry>, ChainError> {
        tracing::debug!("Query map {}::{}", map.module(), map.name());
        let result = bounded(self.query_timeout, self.connection()?.iter(map, at)).await;
        self.observe(result)
    }

    pub(crate) async fn fetch_block_number(
        &mut self,
        at: Option<BlockHash>,
    ) -> Result<u64, ChainError> {
        let result = bounded(self.query_timeout, self.connection()?.block_number(at)).await;
        self.observe(result)
    }

    pub(crate) async fn fetch_block_hash(
        &mut self,
        number: u64,
    ) -> Result<Option<BlockHash>, ChainError> {
        let result = bounded(self.query_timeout, self.connection()?.block_hash(number)).await;
        self.observe(result)
    }

    /// Sign `call` with `signer` using a freshly read nonce.
    pub async fn build_extrinsic(
        &mut self,
        call: CallData,
        signer: &Keypair,
    ) -> Result<Extrinsic, ChainError> {
        let builder = ExtrinsicBuilder::new(self.connection()?);
        let result = bounded(self.query_timeout, builder.build(call, signer)).await;
        self.observe(result)
    }

    /// Submit a built extrinsic and wait as far as `policy` asks.
    ///
    /// The whole exchange is bounded by the submission timeout. A timed out
    /// transaction may still be included later.
    pub async fn submit(
        &mut self,
        extrinsic: &Extrinsic,
        policy: WaitPolicy,
    ) -> Result<SubmissionOutcome, ChainError> {
        let timeout = self.submission_timeout;
        let connection = self.connection()?;

        tracing::info!(
            "Submitting {}::{} signed by {} ({}), hash: {}",
            extrinsic.call.module(),
            extrinsic.call.function(),
            extrinsic.signer,
            policy.label(),
            extrinsic.hash_hex()
        );

        let exchange = async {
            let mut watch = connection.submit(&extrinsic.encoded).await?;
            await_outcome(watch.as_mut(), policy, extrinsic.hash).await
        };
        let result = match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ChainError::SubmissionTimeout { timeout }),
        };

        match &result {
            Ok(outcome) => tracing::info!(
                "Extrinsic {} {:?}",
                extrinsic.hash_hex(),
                outcome
            ),
            Err(e) => tracing::warn!("Extrinsic {} failed: {}", extrinsic.hash_hex(), e),
        }
        self.observe(result)
    }

    /// Build `call` with the wallet key its shape requires, then submit it.
    pub async fn sign_and_submit(
        &mut self,
        call: CallData,
        wallet: &Wallet,
        policy: WaitPolicy,
    ) -> Result<SubmissionOutcome, ChainError> {
        let signer = wallet.key(call.signer_role());
        let extrinsic = self.build_extrinsic(call, signer).await?;
        self.submit(&extrinsic, policy).await
    }
}

/// Bound a read; an unresponsive node counts as a transport failure.
async fn bounded<T>(
    timeout: Duration,
    request: impl Future<Output = Result<T, ChainError>>,
) -> Result<T, ChainError> {
    tokio::time::timeout(timeout, request)
        .await
        .unwrap_or_else(|_| {
            Err(ChainError::Transport(format!(
                "no response within {}s",
                timeout.as_secs()
            )))
        })
}
