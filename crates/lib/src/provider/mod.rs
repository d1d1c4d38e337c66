//! Account-abstraction collaborators.
//!
//! The library does not build, sign or price user operations itself. It
//! talks to an SDK through three traits:
//!
//! - [`AccountProvider`] builds account clients for a sudo validator, with or
//!   without a session validator installed
//! - [`SmartAccount`] answers whether a signer is enabled and encodes calls
//! - [`OperationClient`] submits a finished [`UserOperation`]
//!
//! A [`WalletContext`] bundles what the host application has connected so
//! far. Operations that need a missing piece are simply not offered.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::primitives::{Address, Bytes};

mod errors;
mod operation;
mod validator;

pub use errors::ProviderError;
pub use operation::{Call, NONCE_KEY_SIZE, NonceKey, OperationHash, UserOperation};
pub use validator::{ProtocolVersion, SessionValidator, SudoValidator};

/// Builds smart-account clients.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Create the account controlled by `sudo`.
    ///
    /// With a `session` validator the returned account signs through it;
    /// without one it is the plain owner account, used to learn the address.
    async fn create_account(
        &self,
        sudo: &SudoValidator,
        session: Option<&SessionValidator>,
    ) -> Result<Arc<dyn SmartAccount>>;
}

/// A smart-account client.
#[async_trait]
pub trait SmartAccount: Send + Sync {
    /// The counterfactual or deployed account address.
    fn address(&self) -> Address;

    /// Whether `signer` is currently enabled as a validator on `account`.
    async fn is_enabled(&self, account: Address, signer: Address) -> Result<bool>;

    /// Encode calls into the account's execute call data.
    async fn encode_call_data(&self, calls: &[Call]) -> Result<Bytes>;

    /// Have the owner sign the enablement of this account's session validator.
    async fn enable_signature(&self) -> Result<Bytes>;
}

/// Submits user operations to a bundler.
#[async_trait]
pub trait OperationClient: Send + Sync {
    async fn send_operation(&self, operation: UserOperation) -> Result<OperationHash>;
}

/// What the host application has connected.
#[derive(Clone, Default)]
pub struct WalletContext {
    pub protocol: ProtocolVersion,
    pub validator: Option<SudoValidator>,
    pub account: Option<Address>,
    pub provider: Option<Arc<dyn AccountProvider>>,
    pub client: Option<Arc<dyn OperationClient>>,
}

impl WalletContext {
    pub fn new(protocol: ProtocolVersion) -> Self {
        WalletContext {
            protocol,
            ..Default::default()
        }
    }

    pub fn with_validator(mut self, validator: SudoValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_account(mut self, account: Address) -> Self {
        self.account = Some(account);
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn AccountProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_client(mut self, client: Arc<dyn OperationClient>) -> Self {
        self.client = Some(client);
        self
    }
}

impl fmt::Debug for WalletContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletContext")
            .field("protocol", &self.protocol)
            .field("validator", &self.validator)
            .field("account", &self.account)
            .field("provider", &self.provider.is_some())
            .field("client", &self.client.is_some())
            .finish()
    }
}
