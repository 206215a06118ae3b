// ─── Collaborator Boundary ───
// Async traits for the subsystems this crate consumes but does not
// implement: distribution fetch, manifest loading, identity and file
// integrity. Hosts wire in their own implementations.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::auth::AuthSession;
use crate::core::distribution::ServerEntry;
use crate::core::error::LauncherResult;
use crate::core::manifest::{LoaderManifest, VersionManifest};

/// Supplies the distribution index entry for a server.
#[async_trait]
pub trait DistributionService: Send + Sync {
    async fn server(&self, server_id: &str) -> LauncherResult<ServerEntry>;
}

/// Loads the version manifests referenced by a server entry from wherever
/// the host keeps them.
#[async_trait]
pub trait ManifestService: Send + Sync {
    async fn version_manifest(&self, server: &ServerEntry) -> LauncherResult<VersionManifest>;

    /// The loader manifest, when the server runs one. Vanilla servers
    /// return `None`.
    async fn loader_manifest(&self, server: &ServerEntry)
        -> LauncherResult<Option<LoaderManifest>>;
}

/// Supplies a valid, refreshed authentication session.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn session(&self) -> LauncherResult<AuthSession>;
}

/// One step of an integrity verification run.
#[derive(Debug, Clone)]
pub struct IntegrityProgress {
    pub stage: String,
    pub percent: u8,
}

/// Verifies and repairs a server installation before launch. The returned
/// value is the observed exit code of the verification run; anything
/// non-zero means the installation cannot be trusted.
#[async_trait]
pub trait IntegrityService: Send + Sync {
    async fn verify_and_repair(
        &self,
        server_id: &str,
        progress: mpsc::Sender<IntegrityProgress>,
    ) -> LauncherResult<i32>;
}
