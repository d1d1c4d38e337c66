//! Entry point tying storage, configuration and the connected wallet together.

use std::sync::Arc;

use crate::Result;
use crate::config::SessionConfig;
use crate::dispatch::SessionDispatcher;
use crate::permission::PermissionValidator;
use crate::policy::{CallPermission, PermissionId, Policy, compute_id};
use crate::provider::{ProtocolVersion, SessionValidator, WalletContext};
use crate::session::{
    SessionError, SessionKeyStore, SessionPermissions, SessionRecord, SessionStore,
};
use crate::storage::KeyValueStore;

/// Random identifiers are drawn this many times before giving up.
const MAX_ID_ATTEMPTS: usize = 64;

/// What a new session is allowed to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionGrant {
    /// A V3 policy set
    Policies(Vec<Policy>),
    /// A V2 session-key-plugin grant
    Permissions(Vec<CallPermission>),
}

impl SessionGrant {
    pub fn protocol(&self) -> ProtocolVersion {
        match self {
            SessionGrant::Policies(_) => ProtocolVersion::V3,
            SessionGrant::Permissions(_) => ProtocolVersion::V2,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            SessionGrant::Policies(policies) => policies.is_empty(),
            SessionGrant::Permissions(permissions) => permissions.is_empty(),
        }
    }
}

/// A session that has been authorized and persisted.
#[derive(Debug, Clone)]
pub struct CreatedSession {
    pub permission_id: PermissionId,
    pub record: SessionRecord,
}

/// Owns the session stores and hands out validators and dispatchers for a
/// connected wallet.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use smart_session::{SessionManager, storage::InMemory};
///
/// let manager = SessionManager::new(Arc::new(InMemory::new()));
/// if let Some(dispatcher) = manager.dispatcher(&ctx) {
///     let hash = dispatcher.send(None, calls).await?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionManager {
    config: SessionConfig,
    keys: SessionKeyStore,
    sessions: SessionStore,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, SessionConfig::default())
    }

    pub fn with_config(store: Arc<dyn KeyValueStore>, config: SessionConfig) -> Self {
        let keys = SessionKeyStore::with_slot(store.clone(), config.key_storage_key.clone());
        let sessions = SessionStore::with_slot(store, config.session_storage_key.clone());
        SessionManager {
            config,
            keys,
            sessions,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn key_store(&self) -> &SessionKeyStore {
        &self.keys
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.sessions
    }

    /// A permission validator, or `None` until the context has a provider
    /// and a sudo validator.
    pub fn permission_validator(&self, ctx: &WalletContext) -> Option<PermissionValidator> {
        PermissionValidator::from_context(self.keys.clone(), self.sessions.clone(), ctx)
    }

    /// A dispatcher, or `None` until the context has a provider, an
    /// operation client, a sudo validator and an account address.
    pub fn dispatcher(&self, ctx: &WalletContext) -> Option<SessionDispatcher> {
        SessionDispatcher::from_context(
            self.keys.clone(),
            self.sessions.clone(),
            self.config.randomize_nonce,
            ctx,
        )
    }

    /// Authorize a new session on the connected account and persist it.
    ///
    /// The owner is asked for the enable signature through the provider.
    /// Nothing is written unless every step before persistence succeeds.
    pub async fn create_session(
        &self,
        ctx: &WalletContext,
        grant: SessionGrant,
    ) -> Result<CreatedSession> {
        let sudo = ctx
            .validator
            .as_ref()
            .ok_or(SessionError::MissingArgument { name: "validator" })?;
        let provider = ctx
            .provider
            .as_ref()
            .ok_or(SessionError::MissingArgument { name: "provider" })?;
        if grant.protocol() != ctx.protocol {
            return Err(SessionError::ProtocolMismatch {
                expected: ctx.protocol,
                actual: grant.protocol(),
            }
            .into());
        }
        if grant.is_empty() {
            let name = match grant {
                SessionGrant::Policies(_) => "policies",
                SessionGrant::Permissions(_) => "permissions",
            };
            return Err(SessionError::MissingArgument { name }.into());
        }

        let session_key = self.keys.create_key();
        let (permission_id, validator) = match grant {
            SessionGrant::Policies(policies) => {
                let id = compute_id(Some(&policies));
                let validator =
                    SessionValidator::with_policies(id.clone(), session_key.clone(), policies);
                (id, validator)
            }
            SessionGrant::Permissions(permissions) => {
                let id = self.unused_random_id()?;
                let grant = SessionPermissions {
                    signer: session_key.address(),
                    permissions,
                };
                let validator =
                    SessionValidator::with_permissions(id.clone(), session_key.clone(), grant);
                (id, validator)
            }
        };

        let account = provider.create_account(sudo, Some(&validator)).await?;
        let enable_signature = account.enable_signature().await?;
        let smart_account = ctx.account.unwrap_or_else(|| account.address());

        let record = match validator.permissions() {
            Some(permissions) => SessionRecord::with_permissions(
                smart_account,
                enable_signature,
                session_key.clone(),
                permissions.clone(),
            ),
            None => SessionRecord::new(
                smart_account,
                enable_signature,
                validator.policies().to_vec(),
                session_key.clone(),
            ),
        };

        self.keys.set_key(&permission_id, &session_key)?;
        if let Err(err) = self.sessions.insert(&permission_id, &record) {
            if let Err(cleanup) = self.keys.remove_key(&permission_id) {
                tracing::warn!(
                    permission_id = %permission_id,
                    error = %cleanup,
                    "Failed to remove session key after a failed record write"
                );
            }
            return Err(err);
        }

        tracing::info!(
            permission_id = %permission_id,
            smart_account = %smart_account,
            protocol = %record.protocol,
            signer = %session_key.address(),
            "Created session"
        );
        Ok(CreatedSession {
            permission_id,
            record,
        })
    }

    fn unused_random_id(&self) -> Result<PermissionId> {
        let existing = self.sessions.get_all_sessions().unwrap_or_default();
        (0..MAX_ID_ATTEMPTS)
            .map(|_| PermissionId::random())
            .find(|id| !existing.contains_key(id))
            .ok_or_else(|| {
                SessionError::IdentifierExhausted {
                    attempts: MAX_ID_ATTEMPTS,
                }
                .into()
            })
    }
}
