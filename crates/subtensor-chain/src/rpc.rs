//! WebSocket RPC connection using subxt.

use async_trait::async_trait;
use subtensor_core::BlockHash;
use subxt::backend::rpc::RpcClient;
use subxt::config::DefaultExtrinsicParamsBuilder;
use subxt::ext::scale_value::Composite;
use subxt::tx::{SubmittableTransaction, TxProgress};
use subxt::utils::{AccountId32, H256};
use subxt::{OnlineClient, PolkadotConfig};
use subxt_signer::sr25519::Keypair;

use crate::connection::{Connection, Connector, StorageEntry, StorageValue, TxWatch};
use crate::error::ChainError;
use crate::extrinsic::CallData;
use crate::queries::storage::{StorageItem, StorageMap};
use crate::submission::TxStatus;

/// A live subxt client bound to one node.
pub struct RpcConnection {
    endpoint: String,
    rpc_client: RpcClient,
    client: OnlineClient<PolkadotConfig>,
}

impl RpcConnection {
    pub async fn connect(url: &str) -> Result<Self, ChainError> {
        let connection_error = |e: &dyn std::fmt::Display| ChainError::Connection {
            endpoint: url.to_string(),
            reason: e.to_string(),
        };

        let rpc_client = RpcClient::from_url(url)
            .await
            .map_err(|e| connection_error(&e))?;
        let client = OnlineClient::<PolkadotConfig>::from_rpc_client(rpc_client.clone())
            .await
            .map_err(|e| connection_error(&e))?;

        if let Ok(name) = rpc_client
            .request::<String>("system_chain", subxt::ext::subxt_rpcs::rpc_params![])
            .await
        {
            tracing::info!("Chain reported name: {}", name);
        }

        let runtime = client.runtime_version();
        tracing::debug!(
            "Runtime at {}: spec_version={}, tx_version={}",
            url,
            runtime.spec_version,
            runtime.transaction_version
        );

        Ok(Self {
            endpoint: url.to_string(),
            rpc_client,
            client,
        })
    }

    /// Get the underlying subxt client.
    pub fn client(&self) -> &OnlineClient<PolkadotConfig> {
        &self.client
    }

    async fn storage_at(
        &self,
        at: Option<BlockHash>,
    ) -> Result<subxt::storage::Storage<PolkadotConfig, OnlineClient<PolkadotConfig>>, ChainError>
    {
        Ok(match at {
            Some(hash) => self.client.storage().at(H256::from(hash)),
            None => self.client.storage().at_latest().await?,
        })
    }
}

#[async_trait]
impl Connection for RpcConnection {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(
        &self,
        item: &StorageItem,
        at: Option<BlockHash>,
    ) -> Result<Option<StorageValue>, ChainError> {
        let storage_query = subxt::dynamic::storage(item.module(), item.name(), item.keys());

        let result = self.storage_at(at).await?.fetch(&storage_query).await?;
        let Some(value) = result else {
            return Ok(None);
        };
        Ok(Some(value.to_value()?.remove_context()))
    }

    async fn iter(
        &self,
        map: StorageMap,
        at: Option<BlockHash>,
    ) -> Result<Vec<StorageEntry>, ChainError> {
        let storage_query = subxt::dynamic::storage(map.module(), map.name(), ());

        let mut entries = Vec::new();
        let mut iter = self.storage_at(at).await?.iter(storage_query).await?;
        while let Some(result) = iter.next().await {
            let kv = result?;
            let value = kv.value.to_value()?.remove_context();
            entries.push((kv.key_bytes, value));
        }

        tracing::debug!(
            "Iterated {} entries of {}::{}",
            entries.len(),
            map.module(),
            map.name()
        );
        Ok(entries)
    }

    async fn block_number(&self, at: Option<BlockHash>) -> Result<u64, ChainError> {
        let block = match at {
            Some(hash) => self.client.blocks().at(H256::from(hash)).await?,
            None => self.client.blocks().at_latest().await?,
        };
        Ok(u64::from(block.number()))
    }

    async fn block_hash(&self, number: u64) -> Result<Option<BlockHash>, ChainError> {
        let hash = self
            .rpc_client
            .request::<Option<H256>>("chain_getBlockHash", subxt::ext::subxt_rpcs::rpc_params![number])
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        Ok(hash.map(|h| h.0))
    }

    async fn account_nonce(&self, account: &AccountId32) -> Result<u64, ChainError> {
        Ok(self.client.tx().account_nonce(account).await?)
    }

    fn sign(&self, call: &CallData, signer: &Keypair, nonce: u64) -> Result<Vec<u8>, ChainError> {
        let fields = call
            .fields()
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()));
        let payload = subxt::dynamic::tx(call.module(), call.function(), Composite::named(fields));

        let params = DefaultExtrinsicParamsBuilder::<PolkadotConfig>::new()
            .nonce(nonce)
            .build();
        let tx = self
            .client
            .tx()
            .create_partial_offline(&payload, params)?
            .sign(signer);
        Ok(tx.encoded().to_vec())
    }

    async fn submit(&self, encoded: &[u8]) -> Result<Box<dyn TxWatch>, ChainError> {
        let tx = SubmittableTransaction::from_bytes(self.client.clone(), encoded.to_vec());
        let progress = tx
            .submit_and_watch()
            .await
            .map_err(ChainError::from_submission)?;
        tracing::debug!(
            "Extrinsic 0x{} accepted by {}",
            hex::encode(progress.extrinsic_hash()),
            self.endpoint
        );
        Ok(Box::new(RpcTxWatch { progress }))
    }
}

struct RpcTxWatch {
    progress: TxProgress<PolkadotConfig, OnlineClient<PolkadotConfig>>,
}

#[async_trait]
impl TxWatch for RpcTxWatch {
    async fn next_status(&mut self) -> Option<Result<TxStatus, ChainError>> {
        use subxt::tx::TxStatus as NodeStatus;

        let status = match self.progress.next().await? {
            Ok(status) => status,
            Err(e) => return Some(Err(e.into())),
        };

        let mapped = match status {
            NodeStatus::InBestBlock(in_block) => {
                let block_hash = in_block.block_hash().0;
                match in_block.wait_for_success().await {
                    Ok(_) => TxStatus::InBlock { block_hash },
                    Err(subxt::Error::Runtime(e)) => TxStatus::Failed(e.to_string()),
                    Err(e) => return Some(Err(e.into())),
                }
            }
            NodeStatus::InFinalizedBlock(in_block) => {
                let block_hash = in_block.block_hash().0;
                match in_block.wait_for_success().await {
                    Ok(_) => TxStatus::Finalized { block_hash },
                    Err(subxt::Error::Runtime(e)) => TxStatus::Failed(e.to_string()),
                    Err(e) => return Some(Err(e.into())),
                }
            }
            NodeStatus::Error { message } => {
                return Some(Err(ChainError::Transport(format!(
                    "node failed while watching extrinsic: {}",
                    message
                ))));
            }
            NodeStatus::Invalid { message } => TxStatus::Invalid(message),
            NodeStatus::Dropped { message } => TxStatus::Dropped(message),
            _ => TxStatus::InPool,
        };
        Some(Ok(mapped))
    }
}

/// Opens [`RpcConnection`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpcConnector;

#[async_trait]
impl Connector for RpcConnector {
    type Connection = RpcConnection;

    async fn open(&self, url: &str) -> Result<RpcConnection, ChainError> {
        RpcConnection::connect(url).await
    }
}
