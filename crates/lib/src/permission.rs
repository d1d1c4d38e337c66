//! Permission validation: is a session usable right now?
//!
//! A check never fails because local state is missing or unreadable; those
//! cases report the session as expired. Errors only come from the account
//! provider and are passed through unchanged.

use std::sync::Arc;

use crate::Result;
use crate::policy::{PermissionId, Policy, compute_id};
use crate::primitives::{Address, Bytes};
use crate::provider::{
    AccountProvider, ProtocolVersion, SessionValidator, SudoValidator, WalletContext,
};
use crate::session::{SessionKeyStore, SessionPermissions, SessionState, SessionStore};

/// What to check: a policy set, or an identifier already computed from one.
#[derive(Debug, Clone, Copy)]
pub enum PermissionTarget<'a> {
    Policies(&'a [Policy]),
    Id(&'a PermissionId),
}

/// Outcome of [`PermissionValidator::check_permission`].
#[derive(Debug, Clone)]
pub struct PermissionCheck {
    /// Identifier that was checked
    pub permission_id: PermissionId,
    /// `true` unless the account reports the session signer as enabled
    pub is_expired: bool,
    /// Policies of the session
    pub policies: Vec<Policy>,
    /// V2 plugin grant, if any
    pub permissions: Option<SessionPermissions>,
    /// Stored enable signature, if any
    pub enable_signature: Option<Bytes>,
    /// The validator that was queried; `None` when the check stopped early
    pub validator: Option<SessionValidator>,
    stored: bool,
}

impl PermissionCheck {
    fn expired(permission_id: PermissionId, policies: Vec<Policy>, stored: bool) -> Self {
        PermissionCheck {
            permission_id,
            is_expired: true,
            policies,
            permissions: None,
            enable_signature: None,
            validator: None,
            stored,
        }
    }

    /// Where the session sits in its lifecycle.
    pub fn state(&self) -> SessionState {
        if !self.stored {
            SessionState::Unknown
        } else if !self.is_expired {
            SessionState::Enabled
        } else if self.validator.is_some() && self.enable_signature.is_some() {
            SessionState::Activatable
        } else {
            SessionState::Expired
        }
    }
}

/// Checks sessions against the connected account.
///
/// Only obtainable through [`SessionManager::permission_validator`](crate::SessionManager::permission_validator),
/// which requires a provider and a sudo validator in the context.
#[derive(Clone)]
pub struct PermissionValidator {
    keys: SessionKeyStore,
    sessions: SessionStore,
    protocol: ProtocolVersion,
    sudo: SudoValidator,
    account: Option<Address>,
    provider: Arc<dyn AccountProvider>,
}

impl PermissionValidator {
    pub(crate) fn from_context(
        keys: SessionKeyStore,
        sessions: SessionStore,
        ctx: &WalletContext,
    ) -> Option<Self> {
        Some(PermissionValidator {
            keys,
            sessions,
            protocol: ctx.protocol,
            sudo: ctx.validator.clone()?,
            account: ctx.account,
            provider: ctx.provider.clone()?,
        })
    }

    /// Check whether the session for `target` is enabled on the account.
    pub async fn check_permission(&self, target: PermissionTarget<'_>) -> Result<PermissionCheck> {
        let (permission_id, requested) = match target {
            PermissionTarget::Policies(policies) => (compute_id(Some(policies)), Some(policies)),
            PermissionTarget::Id(id) => (id.clone(), None),
        };
        if permission_id.is_empty() {
            return Ok(PermissionCheck::expired(permission_id, Vec::new(), false));
        }

        let record = self.sessions.get_session(&permission_id);
        let policies = match (requested, &record) {
            (Some(policies), _) => policies.to_vec(),
            (None, Some(record)) => record.policies.clone(),
            (None, None) => Vec::new(),
        };

        let Some(key) = self.keys.get_key(&permission_id) else {
            tracing::debug!(permission_id = %permission_id, "No session key stored");
            return Ok(PermissionCheck::expired(
                permission_id,
                policies,
                record.is_some(),
            ));
        };

        let Some(validator) = SessionValidator::from_stored(
            self.protocol,
            &permission_id,
            key,
            policies.clone(),
            record.as_ref(),
        ) else {
            return Ok(PermissionCheck::expired(permission_id, policies, true));
        };

        let account = match self.account {
            Some(account) => account,
            None => self.provider.create_account(&self.sudo, None).await?.address(),
        };
        let session_account = self
            .provider
            .create_account(&self.sudo, Some(&validator))
            .await?;
        let enabled = session_account
            .is_enabled(account, validator.signer())
            .await?;

        tracing::debug!(
            permission_id = %permission_id,
            account = %account,
            enabled,
            "Checked session permission"
        );

        Ok(PermissionCheck {
            permission_id,
            is_expired: !enabled,
            policies,
            permissions: validator.permissions().cloned(),
            enable_signature: validator.enable_signature().cloned(),
            validator: Some(validator),
            stored: true,
        })
    }
}
