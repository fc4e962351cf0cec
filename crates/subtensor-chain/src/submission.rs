//! Transaction progress and wait-policy resolution.

use subtensor_core::{BlockHash, WaitPolicy};

use crate::connection::TxWatch;
use crate::error::ChainError;

/// Progress reported by the node for a submitted extrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Transaction is in the pool, waiting to be included.
    InPool,
    /// Transaction was included in a block and dispatched successfully.
    InBlock { block_hash: BlockHash },
    /// The block containing the transaction was finalized.
    Finalized { block_hash: BlockHash },
    /// Transaction was dropped from the pool.
    Dropped(String),
    /// Transaction was invalid.
    Invalid(String),
    /// Transaction was included but its dispatch failed.
    Failed(String),
}

/// How far a submission got before the call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Accepted into the node's pool; inclusion was not awaited.
    Accepted { extrinsic_hash: [u8; 32] },
    InBlock {
        extrinsic_hash: [u8; 32],
        block_hash: BlockHash,
    },
    Finalized {
        extrinsic_hash: [u8; 32],
        block_hash: BlockHash,
    },
}

impl SubmissionOutcome {
    pub fn extrinsic_hash(&self) -> [u8; 32] {
        match *self {
            SubmissionOutcome::Accepted { extrinsic_hash }
            | SubmissionOutcome::InBlock { extrinsic_hash, .. }
            | SubmissionOutcome::Finalized { extrinsic_hash, .. } => extrinsic_hash,
        }
    }

    pub fn block_hash(&self) -> Option<BlockHash> {
        match *self {
            SubmissionOutcome::Accepted { .. } => None,
            SubmissionOutcome::InBlock { block_hash, .. }
            | SubmissionOutcome::Finalized { block_hash, .. } => Some(block_hash),
        }
    }

    /// Whether the transaction is known to be in a block.
    pub fn is_included(&self) -> bool {
        self.block_hash().is_some()
    }
}

/// Poll `watch` until the state required by `policy` is reached.
///
/// Unbounded on its own; callers wrap it in a timeout.
pub async fn await_outcome(
    watch: &mut dyn TxWatch,
    policy: WaitPolicy,
    extrinsic_hash: [u8; 32],
) -> Result<SubmissionOutcome, ChainError> {
    if policy == WaitPolicy::FireAndForget {
        return Ok(SubmissionOutcome::Accepted { extrinsic_hash });
    }

    while let Some(status) = watch.next_status().await {
        match status? {
            TxStatus::InPool => {
                tracing::debug!("Extrinsic 0x{} in pool", hex::encode(extrinsic_hash));
            }
            TxStatus::InBlock { block_hash } => {
                if policy == WaitPolicy::Inclusion {
                    return Ok(SubmissionOutcome::InBlock {
                        extrinsic_hash,
                        block_hash,
                    });
                }
                tracing::debug!(
                    "Extrinsic 0x{} in block 0x{}, awaiting finality",
                    hex::encode(extrinsic_hash),
                    hex::encode(block_hash)
                );
            }
            TxStatus::Finalized { block_hash } => {
                return Ok(SubmissionOutcome::Finalized {
                    extrinsic_hash,
                    block_hash,
                });
            }
            TxStatus::Dropped(reason) => {
                return Err(ChainError::SubmissionRejected(format!("dropped: {}", reason)));
            }
            TxStatus::Invalid(reason) => {
                return Err(ChainError::SubmissionRejected(format!("invalid: {}", reason)));
            }
            TxStatus::Failed(reason) => return Err(ChainError::SubmissionRejected(reason)),
        }
    }

    Err(ChainError::Transport(
        "transaction status stream closed".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;

    const HASH: [u8; 32] = [7u8; 32];
    const BLOCK: [u8; 32] = [1u8; 32];

    struct Scripted(VecDeque<TxStatus>);

    #[async_trait]
    impl TxWatch for Scripted {
        async fn next_status(&mut self) -> Option<Result<TxStatus, ChainError>> {
            self.0.pop_front().map(Ok)
        }
    }

    struct Silent;

    #[async_trait]
    impl TxWatch for Silent {
        async fn next_status(&mut self) -> Option<Result<TxStatus, ChainError>> {
            futures::future::pending().await
        }
    }

    fn scripted(statuses: impl IntoIterator<Item = TxStatus>) -> Scripted {
        Scripted(statuses.into_iter().collect())
    }

    #[tokio::test]
    async fn test_fire_and_forget_does_not_poll() {
        let mut watch = Silent;
        let outcome = await_outcome(&mut watch, WaitPolicy::FireAndForget, HASH)
            .await
            .unwrap();
        assert_eq!(outcome, SubmissionOutcome::Accepted { extrinsic_hash: HASH });
        assert!(!outcome.is_included());
    }

    #[tokio::test]
    async fn test_inclusion_returns_in_block() {
        let mut watch = scripted([TxStatus::InPool, TxStatus::InBlock { block_hash: BLOCK }]);
        let outcome = await_outcome(&mut watch, WaitPolicy::Inclusion, HASH)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SubmissionOutcome::InBlock {
                extrinsic_hash: HASH,
                block_hash: BLOCK
            }
        );
    }

    #[tokio::test]
    async fn test_finalized_satisfies_inclusion() {
        let mut watch = scripted([TxStatus::Finalized { block_hash: BLOCK }]);
        let outcome = await_outcome(&mut watch, WaitPolicy::Inclusion, HASH)
            .await
            .unwrap();
        assert!(matches!(outcome, SubmissionOutcome::Finalized { .. }));
    }

    #[tokio::test]
    async fn test_finalization_waits_past_in_block() {
        let mut watch = scripted([
            TxStatus::InBlock { block_hash: BLOCK },
            TxStatus::Finalized { block_hash: BLOCK },
        ]);
        let outcome = await_outcome(&mut watch, WaitPolicy::Finalization, HASH)
            .await
            .unwrap();
        assert_eq!(outcome.block_hash(), Some(BLOCK));
        assert!(matches!(outcome, SubmissionOutcome::Finalized { .. }));
    }

    #[tokio::test]
    async fn test_rejections() {
        for status in [
            TxStatus::Dropped("pool full".into()),
            TxStatus::Invalid("bad nonce".into()),
            TxStatus::Failed("InsufficientBalance".into()),
        ] {
            let mut watch = scripted([TxStatus::InPool, status]);
            let err = await_outcome(&mut watch, WaitPolicy::Inclusion, HASH)
                .await
                .unwrap_err();
            assert!(matches!(err, ChainError::SubmissionRejected(_)));
        }
    }

    #[tokio::test]
    async fn test_closed_stream_is_transport_error() {
        let mut watch = scripted([TxStatus::InPool]);
        let err = await_outcome(&mut watch, WaitPolicy::Finalization, HASH)
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_silent_node_never_resolves() {
        let mut watch = Silent;
        let waited = tokio::time::timeout(
            Duration::from_millis(20),
            await_outcome(&mut watch, WaitPolicy::Inclusion, HASH),
        )
        .await;
        assert!(waited.is_err());
    }
}
