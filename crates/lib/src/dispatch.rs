//! Sending user operations through a stored session.

use std::sync::Arc;

use crate::Result;
use crate::policy::PermissionId;
use crate::primitives::Address;
use crate::provider::{
    AccountProvider, Call, NonceKey, OperationClient, OperationHash, ProtocolVersion,
    SessionValidator, SudoValidator, UserOperation, WalletContext,
};
use crate::session::{SessionError, SessionKeyStore, SessionStore, resolve_session};

/// Per-call options for [`SessionDispatcher::send_with`].
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Session to use; required when the account has more than one
    pub session_id: Option<PermissionId>,
    /// Nonce lane to use; overrides the configured randomization
    pub nonce_key: Option<NonceKey>,
}

impl SendOptions {
    pub fn with_session(mut self, id: PermissionId) -> Self {
        self.session_id = Some(id);
        self
    }

    pub fn with_nonce_key(mut self, nonce_key: NonceKey) -> Self {
        self.nonce_key = Some(nonce_key);
        self
    }
}

/// Submits calls signed by one of the account's stored sessions.
///
/// Only obtainable through [`SessionManager::dispatcher`](crate::SessionManager::dispatcher),
/// which requires the context to be fully connected.
#[derive(Clone)]
pub struct SessionDispatcher {
    keys: SessionKeyStore,
    sessions: SessionStore,
    protocol: ProtocolVersion,
    sudo: SudoValidator,
    account: Address,
    provider: Arc<dyn AccountProvider>,
    client: Arc<dyn OperationClient>,
    randomize_nonce: bool,
}

impl SessionDispatcher {
    pub(crate) fn from_context(
        keys: SessionKeyStore,
        sessions: SessionStore,
        randomize_nonce: bool,
        ctx: &WalletContext,
    ) -> Option<Self> {
        Some(SessionDispatcher {
            keys,
            sessions,
            protocol: ctx.protocol,
            sudo: ctx.validator.clone()?,
            account: ctx.account?,
            provider: ctx.provider.clone()?,
            client: ctx.client.clone()?,
            randomize_nonce,
        })
    }

    /// The account operations are sent from.
    pub fn account(&self) -> Address {
        self.account
    }

    /// Send `calls` through the given session, or through the account's only
    /// session when `session_id` is `None`.
    pub async fn send(
        &self,
        session_id: Option<&PermissionId>,
        calls: Vec<Call>,
    ) -> Result<OperationHash> {
        let options = SendOptions {
            session_id: session_id.cloned(),
            nonce_key: None,
        };
        self.send_with(calls, options).await
    }

    pub async fn send_with(&self, calls: Vec<Call>, options: SendOptions) -> Result<OperationHash> {
        if calls.is_empty() {
            return Err(SessionError::MissingArgument { name: "calls" }.into());
        }

        let sessions = self.sessions.get_all_sessions().unwrap_or_default();
        let (id, record) = resolve_session(options.session_id.as_ref(), &sessions, &self.account)?;

        if record.protocol != self.protocol {
            return Err(SessionError::ProtocolMismatch {
                expected: self.protocol,
                actual: record.protocol,
            }
            .into());
        }
        if record.protocol == ProtocolVersion::V2 && record.permissions.is_none() {
            return Err(SessionError::InvalidRecord {
                id: id.clone(),
                reason: "v2 session without a permission grant".to_string(),
            }
            .into());
        }

        // The record alone is not enough: the local key store must still hold
        // the key, and that key must be the session signer.
        let validator = self.keys.get_key(id).and_then(|key| {
            SessionValidator::from_stored(
                self.protocol,
                id,
                key,
                record.policies.clone(),
                Some(record),
            )
        });
        let Some(validator) = validator else {
            tracing::debug!(permission_id = %id, "No usable session key");
            return Err(SessionError::SessionExpired { id: id.clone() }.into());
        };

        let session_account = self
            .provider
            .create_account(&self.sudo, Some(&validator))
            .await?;
        let enabled = session_account
            .is_enabled(self.account, validator.signer())
            .await?;

        let validator = if enabled {
            validator.without_enable_signature()
        } else if validator.enable_signature().is_some() {
            tracing::debug!(permission_id = %id, "Attaching enable signature");
            validator
        } else {
            return Err(SessionError::SessionExpired { id: id.clone() }.into());
        };

        let call_data = session_account.encode_call_data(&calls).await?;
        let nonce_key = match options.nonce_key {
            Some(key) => Some(key),
            None if self.randomize_nonce => Some(NonceKey::random()),
            None => None,
        };

        let operation = UserOperation {
            sender: self.account,
            call_data,
            nonce_key,
            validator,
        };
        let hash = self.client.send_operation(operation).await?;

        tracing::info!(
            permission_id = %id,
            account = %self.account,
            calls = calls.len(),
            operation = %hash,
            "Submitted session operation"
        );
        Ok(hash)
    }
}
