//! Constants used throughout the smart-session library.
//!
//! Default storage slot names, the identifier length, and the addresses of
//! the contracts that sessions are bound to.

use alloy_primitives::address;

use crate::primitives::Address;

/// Default storage slot for the persisted session collection.
pub const SESSION_STORAGE_KEY: &str = "kernel_session";

/// Default storage slot for the permission id → session key map.
pub const SESSION_KEY_STORAGE_KEY: &str = "kernel_session_keys";

/// Number of hash bytes kept for a permission identifier.
pub const PERMISSION_ID_SIZE: usize = 2;

/// ERC-4337 entry point v0.6, used by V2 accounts.
pub const ENTRY_POINT_V06: Address = address!("5ff137d4b0fdcd49dca30c7cf57e578a026d2789");

/// ERC-4337 entry point v0.7, used by V3 accounts.
pub const ENTRY_POINT_V07: Address = address!("0000000071727de22e5e9d8baf0edac6f37da032");

/// Sudo policy contract.
pub const SUDO_POLICY_CONTRACT: Address = address!("67b436cad8a6d025df6c82c5bb43fbf11fc5b9b7");

/// Gas policy contract.
pub const GAS_POLICY_CONTRACT: Address = address!("aefc5abc67ffd258abd0a3e54f65e70326f84b23");

/// Call policy contract.
pub const CALL_POLICY_CONTRACT: Address = address!("e4fec84b7b002273ecc86baa65a831ddb92d30a8");

/// Rate limit policy contract.
pub const RATE_LIMIT_POLICY_CONTRACT: Address =
    address!("f63d4139b25c836334edd76641356c6b74c86873");

/// Timestamp policy contract.
pub const TIMESTAMP_POLICY_CONTRACT: Address = address!("b9f8f524be6ecd8c945b1b87f9ae5c192fdce20f");
