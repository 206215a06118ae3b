// ─── Launch Session ───
// End-to-end launch flow: verify the installation, load manifests, compile
// the plan and hand it to the supervisor.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex, OnceCell};
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::compiler::{compile, CompileInputs};
use crate::core::launch::natives::sweep_stale_natives;
use crate::core::launch::supervisor::ProcessSupervisor;
use crate::core::services::{
    DistributionService, IdentityService, IntegrityProgress, IntegrityService, ManifestService,
};
use crate::core::settings::{DataPaths, LaunchSettings};

/// Wires the collaborator services to the compile/launch pipeline.
pub struct LaunchSession {
    pub distribution: Arc<dyn DistributionService>,
    pub manifests: Arc<dyn ManifestService>,
    pub identity: Arc<dyn IdentityService>,
    pub integrity: Arc<dyn IntegrityService>,
    pub supervisor: ProcessSupervisor,
    pub settings: LaunchSettings,
    pub paths: DataPaths,
    last_launched_at: Mutex<Option<DateTime<Utc>>>,
    stale_sweep: OnceCell<()>,
}

impl LaunchSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        distribution: Arc<dyn DistributionService>,
        manifests: Arc<dyn ManifestService>,
        identity: Arc<dyn IdentityService>,
        integrity: Arc<dyn IntegrityService>,
        supervisor: ProcessSupervisor,
        settings: LaunchSettings,
        paths: DataPaths,
    ) -> Self {
        Self {
            distribution,
            manifests,
            identity,
            integrity,
            supervisor,
            settings,
            paths,
            last_launched_at: Mutex::new(None),
            stale_sweep: OnceCell::new(),
        }
    }

    pub async fn last_launched_at(&self) -> Option<DateTime<Utc>> {
        *self.last_launched_at.lock().await
    }

    /// Run the full launch flow for one server. Every failure class
    /// surfaces as a `LauncherError` before the child is spawned; after
    /// spawn, failures flow through the supervisor's event listener.
    pub async fn launch_server(&self, server_id: &str) -> LauncherResult<()> {
        if self.supervisor.is_running().await {
            return Err(LauncherError::AlreadyRunning);
        }

        // First launch of this session reclaims natives directories left
        // behind by an abnormal exit of a previous run.
        self.stale_sweep
            .get_or_init(|| async { sweep_stale_natives().await })
            .await;

        let session = self.identity.session().await?;
        let server = self.distribution.server(server_id).await?;
        info!(
            "Launching `{}` ({}) as {}",
            server.name, server.minecraft_version, session.display_name
        );

        self.verify_installation(server_id).await?;

        let vanilla = self.manifests.version_manifest(&server).await?;
        let loader = self.manifests.loader_manifest(&server).await?;

        let plan = compile(CompileInputs {
            server: &server,
            vanilla: &vanilla,
            loader: loader.as_ref(),
            session: &session,
            settings: &self.settings,
            paths: &self.paths,
        })
        .await?;

        self.supervisor.launch(plan, &session.display_name).await?;
        *self.last_launched_at.lock().await = Some(Utc::now());
        Ok(())
    }

    /// Drive the integrity run, forwarding its progress into the log. A
    /// non-zero exit code means the installation cannot be trusted.
    async fn verify_installation(&self, server_id: &str) -> LauncherResult<()> {
        let (tx, mut rx) = mpsc::channel::<IntegrityProgress>(16);
        let progress = tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                debug!("Integrity {}: {}%", update.stage, update.percent);
            }
        });

        let exit_code = self.integrity.verify_and_repair(server_id, tx).await?;
        let _ = progress.await;

        if exit_code != 0 {
            return Err(LauncherError::IntegrityCheckFailed(exit_code));
        }
        Ok(())
    }
}
