//! Error types for chain operations.

use std::time::Duration;
use subtensor_core::{BalanceError, ConfigError, Network, UnknownNetwork};
use subxt::error::RpcError;
use subxt::ext::subxt_rpcs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("No more endpoints available for network {network}, attempted: {attempted:?}")]
    ResolutionExhausted {
        network: Network,
        attempted: Vec<String>,
    },

    #[error("Failed to connect to {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("Not connected to a chain endpoint")]
    NotConnected,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No response within timeout ({}s)", .timeout.as_secs())]
    SubmissionTimeout { timeout: Duration },

    #[error("Extrinsic rejected: {0}")]
    SubmissionRejected(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No such call: {module}::{function}")]
    NoSuchCall { module: String, function: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Subxt error: {0}")]
    Subxt(#[from] subxt::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] subxt::error::DecodeError),
}

impl ChainError {
    /// Whether the error means the live connection can no longer be trusted.
    pub fn is_transport(&self) -> bool {
        match self {
            ChainError::Transport(_) => true,
            ChainError::Subxt(e) => matches!(
                e,
                subxt::Error::Io(_)
                    | subxt::Error::Rpc(RpcError::SubscriptionDropped)
                    | subxt::Error::Rpc(RpcError::ClientError(
                        subxt_rpcs::Error::Client(_)
                            | subxt_rpcs::Error::DisconnectedWillReconnect(_)
                    ))
            ),
            _ => false,
        }
    }

    /// Classify an error raised while handing an extrinsic to a node.
    ///
    /// A JSON-RPC error response is the node refusing the extrinsic (stale
    /// nonce, unpayable fee, bad signature), not a broken socket.
    pub fn from_submission(e: subxt::Error) -> Self {
        match e {
            subxt::Error::Rpc(RpcError::ClientError(subxt_rpcs::Error::User(user))) => {
                ChainError::SubmissionRejected(user.message)
            }
            other => other.into(),
        }
    }
}

impl From<UnknownNetwork> for ChainError {
    fn from(e: UnknownNetwork) -> Self {
        ChainError::UnknownNetwork(e.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(ChainError::Transport("socket closed".into()).is_transport());
        assert!(!ChainError::NotConnected.is_transport());
        assert!(!ChainError::SubmissionRejected("bad nonce".into()).is_transport());
        assert!(
            !ChainError::SubmissionTimeout {
                timeout: Duration::from_secs(18)
            }
            .is_transport()
        );
    }

    fn node_error(code: i32, message: &str) -> subxt::Error {
        subxt::Error::Rpc(RpcError::ClientError(subxt_rpcs::Error::User(
            subxt_rpcs::UserError {
                code,
                message: message.into(),
                data: None,
            },
        )))
    }

    #[test]
    fn test_node_refusal_is_rejection() {
        let err =
            ChainError::from_submission(node_error(1010, "Invalid Transaction: Transaction is outdated"));
        assert!(!err.is_transport());
        assert!(
            matches!(err, ChainError::SubmissionRejected(ref reason) if reason == "Invalid Transaction: Transaction is outdated")
        );

        // Even unconverted, an error response does not condemn the socket.
        assert!(!ChainError::from(node_error(1014, "Priority is too low")).is_transport());
    }

    #[test]
    fn test_socket_failures_are_transport() {
        let dropped = subxt::Error::Rpc(RpcError::SubscriptionDropped);
        assert!(ChainError::from_submission(dropped).is_transport());

        let lost = subxt::Error::Rpc(RpcError::ClientError(
            subxt_rpcs::Error::DisconnectedWillReconnect("reset by peer".into()),
        ));
        assert!(ChainError::from(lost).is_transport());

        let io = subxt::Error::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(ChainError::from(io).is_transport());
    }

    #[test]
    fn test_exhausted_message_lists_attempts() {
        let err = ChainError::ResolutionExhausted {
            network: Network::Akira,
            attempted: vec!["a:1".into(), "b:2".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("akira"));
        assert!(msg.contains("a:1"));
        assert!(msg.contains("b:2"));
    }

    #[test]
    fn test_timeout_distinct_from_rejection() {
        let timeout = ChainError::SubmissionTimeout {
            timeout: Duration::from_secs(18),
        };
        assert_eq!(timeout.to_string(), "No response within timeout (18s)");
        let rejected = ChainError::SubmissionRejected("Priority is too low".into());
        assert_eq!(rejected.to_string(), "Extrinsic rejected: Priority is too low");
    }

    #[test]
    fn test_unknown_network_conversion() {
        let err: ChainError = UnknownNetwork("finney".into()).into();
        assert!(matches!(err, ChainError::UnknownNetwork(ref n) if n == "finney"));
    }
}
