use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AuthError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryRegistry;
pub use postgres::PgRegistry;

/// Durable, authoritative membership of live session identifiers.
///
/// A session identifier is valid for refresh exactly as long as a record
/// exists here. Rotation is delete-old + insert-new; there is no update.
/// `delete` reports whether a row was actually removed — the rotation
/// protocol gates creation of the replacement session on that report, which
/// is what makes two refreshers racing on the same stale identifier resolve
/// to exactly one winner.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Mint a fresh session identifier, persist (jti, guid), return the jti.
    async fn create(&self, guid: Uuid) -> Result<Uuid, AuthError>;

    /// Membership query: the owning guid if the session is live.
    async fn lookup(&self, jti: Uuid) -> Result<Option<Uuid>, AuthError>;

    /// Remove the record if present. Returns whether a row was removed;
    /// deleting an absent identifier is not an error.
    async fn delete(&self, jti: Uuid) -> Result<bool, AuthError>;

    /// Remove every session owned by an identity. Administrative/teardown
    /// operation; returns the number of sessions removed.
    async fn delete_all(&self, guid: Uuid) -> Result<u64, AuthError>;
}
