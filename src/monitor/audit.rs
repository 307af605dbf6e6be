use tracing::{info, warn};
use uuid::Uuid;

/// Structured audit trail for session lifecycle and security events.
/// Events go to the `audit` target so operators can route them separately
/// from application logs.
#[derive(Debug, Clone, Default)]
pub struct AuditLog;

impl AuditLog {
    pub fn new() -> Self {
        Self
    }

    pub fn session_issued(&self, guid: Uuid, jti: Uuid) {
        info!(target: "audit", event = "session_issued", %guid, %jti);
    }

    pub fn session_rotated(&self, guid: Uuid, old_jti: Uuid, new_jti: Uuid) {
        info!(target: "audit", event = "session_rotated", %guid, %old_jti, %new_jti);
    }

    pub fn refresh_rejected(&self, reason: &str) {
        warn!(target: "audit", event = "refresh_rejected", reason);
    }

    pub fn origin_mismatch(&self, guid: Uuid, minted_ip: &str, current_ip: &str) {
        warn!(target: "audit", event = "origin_mismatch", %guid, minted_ip, current_ip);
    }

    pub fn session_revoked(&self, guid: Uuid, jti: Uuid) {
        warn!(target: "audit", event = "session_revoked", %guid, %jti);
    }
}
