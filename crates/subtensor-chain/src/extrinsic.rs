//! Call composition and signed extrinsic building.
//!
//! Calls are checked against [`CALL_SHAPES`] before anything touches the
//! connection, so a malformed call never reaches the node.

use std::net::IpAddr;
use subtensor_core::{Balance, Modality, Uid, ip_to_int};
use subxt::dynamic::Value;
use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;

use crate::connection::Connection;
use crate::error::ChainError;

/// Which of the wallet's two keys signs a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// Operational key: registration and weights.
    Hotkey,
    /// Custodial key: stake and transfers.
    Coldkey,
}

/// Module, function, ordered parameter names and signing key of a known call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallShape {
    pub module: &'static str,
    pub function: &'static str,
    pub params: &'static [&'static str],
    pub signer: KeyRole,
}

/// Every call this client knows how to build.
pub const CALL_SHAPES: &[CallShape] = &[
    CallShape {
        module: "SubtensorModule",
        function: "subscribe",
        params: &["ip", "port", "ip_type", "modality", "coldkey"],
        signer: KeyRole::Hotkey,
    },
    CallShape {
        module: "SubtensorModule",
        function: "add_stake",
        params: &["hotkey", "ammount_staked"],
        signer: KeyRole::Coldkey,
    },
    CallShape {
        module: "SubtensorModule",
        function: "remove_stake",
        params: &["hotkey", "ammount_unstaked"],
        signer: KeyRole::Coldkey,
    },
    CallShape {
        module: "Balances",
        function: "transfer",
        params: &["dest", "value"],
        signer: KeyRole::Coldkey,
    },
    CallShape {
        module: "SubtensorModule",
        function: "set_weights",
        params: &["dests", "weights"],
        signer: KeyRole::Hotkey,
    },
];

/// Look up the shape of a call.
pub fn call_shape(module: &str, function: &str) -> Option<&'static CallShape> {
    CALL_SHAPES
        .iter()
        .find(|shape| shape.module == module && shape.function == function)
}

/// A validated call: a known module/function pair with exactly its parameters,
/// in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct CallData {
    shape: &'static CallShape,
    fields: Vec<(&'static str, Value)>,
}

impl CallData {
    /// Check `fields` against the known shape of `module::function`.
    pub fn compose<I, S>(module: &str, function: &str, fields: I) -> Result<Self, ChainError>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let shape = call_shape(module, function).ok_or_else(|| ChainError::NoSuchCall {
            module: module.to_string(),
            function: function.to_string(),
        })?;

        let mut given: Vec<(S, Value)> = fields.into_iter().collect();
        if let Some((extra, _)) = given
            .iter()
            .find(|(name, _)| !shape.params.contains(&name.as_ref()))
        {
            return Err(ChainError::InvalidArgument(format!(
                "{}::{} has no parameter '{}'",
                module,
                function,
                extra.as_ref()
            )));
        }

        let mut ordered = Vec::with_capacity(shape.params.len());
        for &param in shape.params {
            let pos = given
                .iter()
                .position(|(name, _)| name.as_ref() == param)
                .ok_or_else(|| {
                    ChainError::InvalidArgument(format!(
                        "{}::{} is missing parameter '{}'",
                        module, function, param
                    ))
                })?;
            let (_, value) = given.swap_remove(pos);
            ordered.push((param, value));
        }

        if !given.is_empty() {
            return Err(ChainError::InvalidArgument(format!(
                "{}::{} given a parameter more than once",
                module, function
            )));
        }

        Ok(Self {
            shape,
            fields: ordered,
        })
    }

    /// Register a peer endpoint. Signed by the hotkey.
    pub fn subscribe(
        ip: IpAddr,
        port: u16,
        modality: Modality,
        coldkey: &AccountId32,
    ) -> Result<Self, ChainError> {
        let (ip, ip_type) = ip_to_int(ip);
        Self::compose(
            "SubtensorModule",
            "subscribe",
            [
                ("ip", Value::u128(ip)),
                ("port", Value::u128(port.into())),
                ("ip_type", Value::u128(ip_type.into())),
                ("modality", Value::u128(modality.as_u8().into())),
                ("coldkey", Value::from_bytes(coldkey)),
            ],
        )
    }

    /// Stake `amount` into the peer with `uid`. Signed by the coldkey.
    pub fn add_stake(uid: Uid, amount: Balance) -> Result<Self, ChainError> {
        Self::compose(
            "SubtensorModule",
            "add_stake",
            [
                ("hotkey", Value::u128(uid.into())),
                ("ammount_staked", Value::u128(amount.rao().into())),
            ],
        )
    }

    /// Withdraw `amount` of stake from the peer with `uid`. Signed by the coldkey.
    pub fn remove_stake(uid: Uid, amount: Balance) -> Result<Self, ChainError> {
        Self::compose(
            "SubtensorModule",
            "remove_stake",
            [
                ("hotkey", Value::u128(uid.into())),
                ("ammount_unstaked", Value::u128(amount.rao().into())),
            ],
        )
    }

    /// Transfer `amount` to `dest`. Signed by the coldkey.
    pub fn transfer(dest: &AccountId32, amount: Balance) -> Result<Self, ChainError> {
        // MultiAddress::Id
        let dest = Value::unnamed_variant("Id", [Value::from_bytes(dest)]);
        Self::compose(
            "Balances",
            "transfer",
            [("dest", dest), ("value", Value::u128(amount.rao().into()))],
        )
    }

    /// Set the weights this peer assigns to `dests`. Signed by the hotkey.
    pub fn set_weights(dests: &[Uid], values: &[u32]) -> Result<Self, ChainError> {
        if dests.len() != values.len() {
            return Err(ChainError::InvalidArgument(format!(
                "weight destinations and values differ in length: {} != {}",
                dests.len(),
                values.len()
            )));
        }
        let dests = Value::unnamed_composite(dests.iter().map(|&uid| Value::u128(uid.into())));
        let weights = Value::unnamed_composite(values.iter().map(|&w| Value::u128(w.into())));
        Self::compose(
            "SubtensorModule",
            "set_weights",
            [("dests", dests), ("weights", weights)],
        )
    }

    pub fn module(&self) -> &'static str {
        self.shape.module
    }

    pub fn function(&self) -> &'static str {
        self.shape.function
    }

    /// Parameters in declaration order.
    pub fn fields(&self) -> &[(&'static str, Value)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(param, _)| *param == name)
            .map(|(_, value)| value)
    }

    /// The key that must sign this call.
    pub fn signer_role(&self) -> KeyRole {
        self.shape.signer
    }
}

/// A signed, encoded extrinsic ready for submission.
#[derive(Debug, Clone)]
pub struct Extrinsic {
    pub call: CallData,
    pub signer: AccountId32,
    pub nonce: u64,
    /// The full SCALE-encoded signed extrinsic.
    pub encoded: Vec<u8>,
    /// Hash of the extrinsic (blake2-256).
    pub hash: [u8; 32],
}

impl Extrinsic {
    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash))
    }
}

/// Builds extrinsics against a live connection.
pub struct ExtrinsicBuilder<'a, C: Connection + ?Sized> {
    connection: &'a C,
}

impl<'a, C: Connection + ?Sized> ExtrinsicBuilder<'a, C> {
    pub fn new(connection: &'a C) -> Self {
        Self { connection }
    }

    /// Read the signer's nonce, then sign `call` offline.
    pub async fn build(&self, call: CallData, signer: &Keypair) -> Result<Extrinsic, ChainError> {
        let account = AccountId32::from(signer.public_key().0);
        let nonce = self.connection.account_nonce(&account).await?;
        let encoded = self.connection.sign(&call, signer, nonce)?;
        let hash = blake2_256(&encoded);

        tracing::debug!(
            "Built {}::{} for {} (nonce {}): {} bytes, hash: 0x{}",
            call.module(),
            call.function(),
            account,
            nonce,
            encoded.len(),
            hex::encode(hash)
        );

        Ok(Extrinsic {
            call,
            signer: account,
            nonce,
            encoded,
            hash,
        })
    }
}

/// Blake2-256 hash using sp-crypto-hashing.
fn blake2_256(data: &[u8]) -> [u8; 32] {
    sp_crypto_hashing::blake2_256(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use subxt::ext::scale_value::{Primitive, ValueDef};

    fn as_u128(value: &Value) -> Option<u128> {
        match &value.value {
            ValueDef::Primitive(Primitive::U128(n)) => Some(*n),
            _ => None,
        }
    }

    fn sequence(value: &Value) -> Vec<u128> {
        match &value.value {
            ValueDef::Composite(c) => c.values().filter_map(as_u128).collect(),
            _ => panic!("expected a sequence"),
        }
    }

    #[test]
    fn test_unknown_call_rejected() {
        let err = CallData::compose("SubtensorModule", "burn", Vec::<(&str, Value)>::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ChainError::NoSuchCall { ref module, ref function }
                if module == "SubtensorModule" && function == "burn"
        ));

        let err = CallData::compose("Staking", "add_stake", Vec::<(&str, Value)>::new())
            .unwrap_err();
        assert!(matches!(err, ChainError::NoSuchCall { .. }));
    }

    #[test]
    fn test_missing_parameter_rejected() {
        let err = CallData::compose(
            "SubtensorModule",
            "add_stake",
            [("hotkey", Value::u128(1))],
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::InvalidArgument(ref m) if m.contains("ammount_staked")));
    }

    #[test]
    fn test_extra_parameter_rejected() {
        let err = CallData::compose(
            "Balances",
            "transfer",
            [
                ("dest", Value::u128(0)),
                ("value", Value::u128(1)),
                ("tip", Value::u128(1)),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::InvalidArgument(ref m) if m.contains("tip")));
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let err = CallData::compose(
            "SubtensorModule",
            "remove_stake",
            [
                ("hotkey", Value::u128(1)),
                ("ammount_unstaked", Value::u128(1)),
                ("hotkey", Value::u128(2)),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::InvalidArgument(_)));
    }

    #[test]
    fn test_fields_follow_declaration_order() {
        let call = CallData::compose(
            "SubtensorModule",
            "remove_stake",
            [
                ("ammount_unstaked", Value::u128(10)),
                ("hotkey", Value::u128(3)),
            ],
        )
        .unwrap();
        let names: Vec<_> = call.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["hotkey", "ammount_unstaked"]);
    }

    #[test]
    fn test_set_weights_length_mismatch() {
        let err = CallData::set_weights(&[1, 2, 3], &[88, 12345]).unwrap_err();
        assert!(matches!(err, ChainError::InvalidArgument(_)));
    }

    #[test]
    fn test_set_weights_fields() {
        let call = CallData::set_weights(&[1, 2], &[88, 12345]).unwrap();
        assert_eq!(call.module(), "SubtensorModule");
        assert_eq!(call.function(), "set_weights");
        assert_eq!(call.signer_role(), KeyRole::Hotkey);
        assert_eq!(sequence(call.field("dests").unwrap()), [1, 2]);
        assert_eq!(sequence(call.field("weights").unwrap()), [88, 12345]);
    }

    #[test]
    fn test_stake_amount_in_rao() {
        let call = CallData::add_stake(7, Balance::from_rao(1_500_000_000)).unwrap();
        assert_eq!(call.signer_role(), KeyRole::Coldkey);
        assert_eq!(as_u128(call.field("hotkey").unwrap()), Some(7));
        assert_eq!(
            as_u128(call.field("ammount_staked").unwrap()),
            Some(1_500_000_000)
        );

        let call = CallData::remove_stake(7, Balance::from_rao(5)).unwrap();
        assert_eq!(call.function(), "remove_stake");
        assert_eq!(as_u128(call.field("ammount_unstaked").unwrap()), Some(5));
    }

    #[test]
    fn test_subscribe_encodes_ip() {
        let coldkey = AccountId32::from([9u8; 32]);
        let call = CallData::subscribe(
            IpAddr::V4(Ipv4Addr::new(192, 122, 31, 4)),
            9221,
            Modality::Text,
            &coldkey,
        )
        .unwrap();
        assert_eq!(call.signer_role(), KeyRole::Hotkey);
        assert_eq!(as_u128(call.field("ip").unwrap()), Some(3_229_228_804));
        assert_eq!(as_u128(call.field("port").unwrap()), Some(9221));
        assert_eq!(as_u128(call.field("ip_type").unwrap()), Some(4));
        assert_eq!(as_u128(call.field("modality").unwrap()), Some(0));
    }

    #[test]
    fn test_transfer_dest_is_multiaddress_id() {
        let dest = AccountId32::from([1u8; 32]);
        let call = CallData::transfer(&dest, Balance::from_rao(42)).unwrap();
        assert_eq!(call.signer_role(), KeyRole::Coldkey);
        match &call.field("dest").unwrap().value {
            ValueDef::Variant(v) => assert_eq!(v.name, "Id"),
            other => panic!("unexpected dest encoding: {:?}", other),
        }
        assert_eq!(as_u128(call.field("value").unwrap()), Some(42));
    }

    #[test]
    fn test_every_shape_is_reachable() {
        for shape in CALL_SHAPES {
            assert_eq!(call_shape(shape.module, shape.function), Some(shape));
        }
    }

    #[test]
    fn test_blake2_256_deterministic() {
        assert_eq!(blake2_256(b"extrinsic"), blake2_256(b"extrinsic"));
        assert_ne!(blake2_256(b"a"), blake2_256(b"b"));
    }
}
