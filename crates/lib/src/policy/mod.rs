//! Authorization policies and the permission identifiers derived from them.
//!
//! A [`Policy`] is plain data: a kind tag plus two byte strings, the parameter
//! encoding (`policy_data`) and the type/metadata encoding
//! (`policy_info_bytes`, the 2-byte flag followed by the policy contract
//! address). The identifier of a policy set is computed from those bytes
//! alone, so a policy read back from storage behaves exactly like the one that
//! was written.

use alloy_sol_types::{SolType, SolValue, sol, sol_data};
use serde::{Deserialize, Serialize};

use crate::constants::{
    CALL_POLICY_CONTRACT, GAS_POLICY_CONTRACT, RATE_LIMIT_POLICY_CONTRACT, SUDO_POLICY_CONTRACT,
    TIMESTAMP_POLICY_CONTRACT,
};
use crate::primitives::{Address, B256, Bytes, Selector, U256};

mod permission_id;

pub use permission_id::{PermissionId, compute_id};

/// Size of the flag prefix in a policy's info bytes.
pub const POLICY_FLAG_SIZE: usize = 2;

sol! {
    struct CallRule {
        uint8 condition;
        uint64 offset;
        bytes32 params;
    }

    struct CallPolicyPermission {
        address target;
        bytes4 selector;
        uint256 valueLimit;
        CallRule[] rules;
    }
}

fn pack48(value: u64) -> [u8; 6] {
    let word = value.to_be_bytes();
    [word[2], word[3], word[4], word[5], word[6], word[7]]
}

fn contract_of(info: &[u8]) -> Option<Address> {
    let bytes: [u8; 20] = info.get(POLICY_FLAG_SIZE..)?.try_into().ok()?;
    Some(Address::from(bytes))
}

/// Which validation paths a policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolicyFlag {
    /// Applies to user operations and signatures alike.
    #[default]
    ForAllValidation,
    /// Skipped when validating user operations.
    NotForValidateUserOp,
    /// Skipped when validating signatures.
    NotForValidateSig,
}

impl PolicyFlag {
    pub fn to_bytes(self) -> [u8; POLICY_FLAG_SIZE] {
        match self {
            PolicyFlag::ForAllValidation => [0x00, 0x00],
            PolicyFlag::NotForValidateUserOp => [0x00, 0x01],
            PolicyFlag::NotForValidateSig => [0x00, 0x02],
        }
    }

    pub fn from_bytes(bytes: [u8; POLICY_FLAG_SIZE]) -> Option<Self> {
        match bytes {
            [0x00, 0x00] => Some(PolicyFlag::ForAllValidation),
            [0x00, 0x01] => Some(PolicyFlag::NotForValidateUserOp),
            [0x00, 0x02] => Some(PolicyFlag::NotForValidateSig),
            _ => None,
        }
    }
}

/// The kind of rule a policy enforces.
///
/// Derived from the policy contract address, so it survives storage without
/// being persisted itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Sudo,
    Gas,
    Timestamp,
    RateLimit,
    Call,
    /// A policy bound to a contract this library does not know about.
    Custom,
}

impl PolicyKind {
    fn from_contract(contract: &Address) -> Self {
        [
            (SUDO_POLICY_CONTRACT, PolicyKind::Sudo),
            (GAS_POLICY_CONTRACT, PolicyKind::Gas),
            (TIMESTAMP_POLICY_CONTRACT, PolicyKind::Timestamp),
            (RATE_LIMIT_POLICY_CONTRACT, PolicyKind::RateLimit),
            (CALL_POLICY_CONTRACT, PolicyKind::Call),
        ]
        .into_iter()
        .find_map(|(known, kind)| (known == *contract).then_some(kind))
        .unwrap_or(PolicyKind::Custom)
    }
}

/// Comparison applied to one argument of a permitted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParamOperator {
    #[default]
    Equal,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    NotEqual,
}

impl ParamOperator {
    /// On-chain condition code.
    pub fn code(self) -> u8 {
        match self {
            ParamOperator::Equal => 0,
            ParamOperator::GreaterThan => 1,
            ParamOperator::LessThan => 2,
            ParamOperator::GreaterThanOrEqual => 3,
            ParamOperator::LessThanOrEqual => 4,
            ParamOperator::NotEqual => 5,
        }
    }
}

/// A constraint on the ABI-encoded argument at `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamCondition {
    /// Position of the argument in the call signature
    pub index: u32,
    pub operator: ParamOperator,
    /// Right-hand side, as a 32-byte ABI word
    pub value: B256,
}

impl ParamCondition {
    pub fn new(index: u32, operator: ParamOperator, value: B256) -> Self {
        ParamCondition {
            index,
            operator,
            value,
        }
    }

    /// Require the address argument at `index` to equal `address`.
    pub fn address_equals(index: u32, address: Address) -> Self {
        Self::new(index, ParamOperator::Equal, address.into_word())
    }

    /// Byte offset of the argument within the call arguments.
    pub fn offset(&self) -> u64 {
        u64::from(self.index) * 32
    }

    fn to_rule(self) -> CallRule {
        CallRule {
            condition: self.operator.code(),
            offset: self.offset(),
            params: self.value,
        }
    }
}

/// One permitted call target for a call policy or a V2 session grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallPermission {
    /// Contract the session may call
    pub target: Address,
    /// Function the session may call; `None` allows any function on `target`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Selector>,
    /// Maximum native value per call
    #[serde(default)]
    pub value_limit: u128,
    /// Conditions on the call arguments, all of which must hold
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ParamCondition>,
}

impl CallPermission {
    pub fn new(target: Address) -> Self {
        CallPermission {
            target,
            selector: None,
            value_limit: 0,
            args: Vec::new(),
        }
    }

    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn with_value_limit(mut self, value_limit: u128) -> Self {
        self.value_limit = value_limit;
        self
    }

    pub fn with_condition(mut self, condition: ParamCondition) -> Self {
        self.args.push(condition);
        self
    }

    fn to_sol(&self) -> CallPolicyPermission {
        CallPolicyPermission {
            target: self.target,
            selector: self.selector.unwrap_or_default(),
            valueLimit: U256::from(self.value_limit),
            rules: self.args.iter().map(|arg| arg.to_rule()).collect(),
        }
    }
}

/// An immutable authorization rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Policy {
    kind: PolicyKind,
    data: Bytes,
    info: Bytes,
}

impl Policy {
    fn build(kind: PolicyKind, contract: Address, data: Vec<u8>) -> Self {
        let mut info = Vec::with_capacity(POLICY_FLAG_SIZE + 20);
        info.extend_from_slice(&PolicyFlag::default().to_bytes());
        info.extend_from_slice(contract.as_slice());
        Policy {
            kind,
            data: Bytes::from(data),
            info: Bytes::from(info),
        }
    }

    /// Allow any action.
    pub fn sudo() -> Self {
        Self::build(PolicyKind::Sudo, SUDO_POLICY_CONTRACT, Vec::new())
    }

    /// Cap the total gas the session may spend, in wei.
    pub fn gas(allowed: u128) -> Self {
        Self::gas_with_paymaster(allowed, None)
    }

    /// Cap gas and optionally require a specific paymaster.
    pub fn gas_with_paymaster(allowed: u128, paymaster: Option<Address>) -> Self {
        let data = (
            allowed,
            paymaster.is_some(),
            paymaster.unwrap_or(Address::ZERO),
        )
            .abi_encode();
        Self::build(PolicyKind::Gas, GAS_POLICY_CONTRACT, data)
    }

    /// Restrict use to a time window (unix seconds, 48-bit).
    pub fn timestamp(valid_after: u64, valid_until: u64) -> Self {
        let data = [pack48(valid_after), pack48(valid_until)].concat();
        Self::build(PolicyKind::Timestamp, TIMESTAMP_POLICY_CONTRACT, data)
    }

    /// Allow `count` uses per `interval` seconds starting at `start_at`.
    pub fn rate_limit(interval: u64, count: u64, start_at: u64) -> Self {
        let data = [pack48(interval), pack48(count), pack48(start_at)].concat();
        Self::build(PolicyKind::RateLimit, RATE_LIMIT_POLICY_CONTRACT, data)
    }

    /// Restrict calls to the given targets, functions and arguments.
    pub fn call(permissions: &[CallPermission]) -> Self {
        let permissions: Vec<CallPolicyPermission> =
            permissions.iter().map(CallPermission::to_sol).collect();
        let data = sol_data::Array::<CallPolicyPermission>::abi_encode(&permissions);
        Self::build(PolicyKind::Call, CALL_POLICY_CONTRACT, data)
    }

    /// Rebuild a policy from its two stored encodings.
    pub fn from_encoded(policy_data: Bytes, policy_info_bytes: Bytes) -> Self {
        let kind = contract_of(&policy_info_bytes)
            .map(|contract| PolicyKind::from_contract(&contract))
            .unwrap_or(PolicyKind::Custom);
        Policy {
            kind,
            data: policy_data,
            info: policy_info_bytes,
        }
    }

    /// Return a copy that applies only to the given validation paths.
    pub fn with_flag(mut self, flag: PolicyFlag) -> Self {
        let mut info = self.info.to_vec();
        if info.len() >= POLICY_FLAG_SIZE {
            info[..POLICY_FLAG_SIZE].copy_from_slice(&flag.to_bytes());
        }
        self.info = Bytes::from(info);
        self
    }

    pub fn kind(&self) -> PolicyKind {
        self.kind
    }

    /// Parameter encoding.
    pub fn policy_data(&self) -> &Bytes {
        &self.data
    }

    /// Type/metadata encoding: flag followed by the policy contract address.
    pub fn policy_info_bytes(&self) -> &Bytes {
        &self.info
    }

    pub fn flag(&self) -> Option<PolicyFlag> {
        let prefix: [u8; POLICY_FLAG_SIZE] = self
            .info
            .get(..POLICY_FLAG_SIZE)?
            .try_into()
            .ok()?;
        PolicyFlag::from_bytes(prefix)
    }

    pub fn contract(&self) -> Option<Address> {
        contract_of(&self.info)
    }
}

/// Storage form of a [`Policy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedPolicy {
    pub policy_data: Bytes,
    pub policy_info_bytes: Bytes,
}

impl From<&Policy> for EncodedPolicy {
    fn from(policy: &Policy) -> Self {
        EncodedPolicy {
            policy_data: policy.data.clone(),
            policy_info_bytes: policy.info.clone(),
        }
    }
}

impl From<EncodedPolicy> for Policy {
    fn from(encoded: EncodedPolicy) -> Self {
        Policy::from_encoded(encoded.policy_data, encoded.policy_info_bytes)
    }
}
