use std::sync::Arc;

use uuid::Uuid;

use crate::errors::AuthError;
use crate::monitor::audit::AuditLog;
use crate::monitor::SecurityMonitor;
use crate::registry::SessionRegistry;
use crate::token::{TokenCodec, TokenPair};

/// Orchestrates the codec, registry, and monitor into the two operations
/// exposed to callers: issue a new session, and rotate an existing one.
///
/// A session identifier moves Unborn -> Live (registry row exists) ->
/// Retired (row deleted). Retired is terminal: rotation deletes the old row
/// and inserts a fresh identifier, so a pair that has been exchanged once
/// can never be exchanged again.
#[derive(Clone)]
pub struct RotationProtocol {
    codec: TokenCodec,
    registry: Arc<dyn SessionRegistry>,
    monitor: SecurityMonitor,
    audit: AuditLog,
    revoke_on_ip_mismatch: bool,
}

impl RotationProtocol {
    pub fn new(
        codec: TokenCodec,
        registry: Arc<dyn SessionRegistry>,
        monitor: SecurityMonitor,
        revoke_on_ip_mismatch: bool,
    ) -> Self {
        Self {
            codec,
            registry,
            monitor,
            audit: AuditLog::new(),
            revoke_on_ip_mismatch,
        }
    }

    /// Mint a new session for an identity. The returned pair shares one
    /// freshly-live session identifier bound to the caller's origin.
    pub async fn issue(&self, guid: Uuid, origin: &str) -> Result<TokenPair, AuthError> {
        let jti = self.registry.create(guid).await?;
        let pair = self.codec.sign_pair(origin, jti)?;
        self.audit.session_issued(guid, jti);
        Ok(pair)
    }

    /// Exchange a live pair for a fresh one, exactly once.
    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
        origin: &str,
    ) -> Result<TokenPair, AuthError> {
        let access = self.codec.verify_access(access_token)?;
        let refresh = self.codec.verify_refresh(refresh_token)?;

        // Cross-binding: both halves must name the same session. A refresh
        // token from one session cannot ride on another session's access
        // token.
        if access.jti != refresh.jti {
            self.audit.refresh_rejected("cross_binding");
            return Err(AuthError::InvalidToken);
        }
        let jti = access.jti;

        // Liveness. A missing row covers logout, administrative purge, and
        // replay of an already-rotated refresh token alike.
        let guid = match self.registry.lookup(jti).await? {
            Some(guid) => guid,
            None => {
                self.audit.refresh_rejected("session_not_live");
                return Err(AuthError::SessionExpired);
            }
        };

        let origin_changed = self.monitor.origin_changed(&access.ip, origin, guid);
        if origin_changed && self.revoke_on_ip_mismatch {
            self.registry.delete(jti).await?;
            self.audit.session_revoked(guid, jti);
            return Err(AuthError::SessionExpired);
        }

        // The rotation itself: compare-and-delete on the old identifier.
        // Of two refreshers racing on the same stale pair, one observes the
        // removal and proceeds; the other sees nothing removed and stops
        // before creating a duplicate session.
        if !self.registry.delete(jti).await? {
            self.audit.refresh_rejected("already_rotated");
            return Err(AuthError::SessionExpired);
        }
        let new_jti = self.registry.create(guid).await?;

        let pair = self.codec.sign_pair(origin, new_jti)?;
        self.audit.session_rotated(guid, jti, new_jti);
        Ok(pair)
    }
}
