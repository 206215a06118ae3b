// ─── Process Supervisor ───
// Spawns the compiled plan, classifies the child's output line by line and
// drives the launch state machine until exit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::compiler::LaunchPlan;
use crate::core::launch::natives::cleanup_natives;

/// Minimum time the launch is considered in-flight, even when the game
/// reports ready earlier. Keeps rapid crash loops visible.
pub const MIN_LINGER: Duration = Duration::from_millis(5000);

const LAUNCH_BANNER_PATTERN: &str = r"(?i)(ModLauncher .*starting:|ModLauncher running: args)";
const WORLD_LOADED_PATTERN: &str = r"\[.+\]: Sound engine started";
const FATAL_LAUNCHWRAPPER: &str =
    "Could not find or load main class net.minecraft.launchwrapper.Launch";

/// Launch lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Child process started, no launch banner seen yet.
    Spawned,
    /// Launch banner seen, linger floor not yet elapsed.
    AwaitingReady,
    Ready,
    Exited,
}

/// In-game presence transitions derived from the log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceUpdate {
    WorldLoaded,
    JoinedServer,
}

/// Host-side listener for supervisor events. Every method defaults to a
/// no-op so hosts implement only what they surface.
#[async_trait]
pub trait SupervisorEvents: Send + Sync {
    async fn on_ready(&self) {}
    async fn on_presence_update(&self, _update: PresenceUpdate) {}
    async fn on_fatal_error(&self, _line: &str) {}
    async fn on_exit(&self, _code: Option<i32>) {}
}

/// What one output line means for the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    LaunchBanner,
    WorldLoaded,
    PlayerJoined,
    FatalError,
}

/// Compiled per-launch patterns. The player-join pattern embeds the
/// session's display name, so a classifier is built per launch.
pub struct LineClassifier {
    banner: Regex,
    world_loaded: Regex,
    player_joined: Regex,
}

impl LineClassifier {
    pub fn new(display_name: &str) -> Self {
        let joined = format!(
            r"\[.+\]: \[CHAT\] {} joined the game",
            regex::escape(display_name)
        );
        Self {
            banner: Regex::new(LAUNCH_BANNER_PATTERN).expect("static pattern"),
            world_loaded: Regex::new(WORLD_LOADED_PATTERN).expect("static pattern"),
            player_joined: Regex::new(&joined).expect("escaped pattern"),
        }
    }

    pub fn classify(&self, line: &str) -> Option<LineEvent> {
        if line.contains(FATAL_LAUNCHWRAPPER) {
            Some(LineEvent::FatalError)
        } else if self.banner.is_match(line) {
            Some(LineEvent::LaunchBanner)
        } else if self.world_loaded.is_match(line) {
            Some(LineEvent::WorldLoaded)
        } else if self.player_joined.is_match(line) {
            Some(LineEvent::PlayerJoined)
        } else {
            None
        }
    }
}

/// Time left before the linger floor allows the ready transition.
fn remaining_linger(elapsed: Duration, floor: Duration) -> Duration {
    floor.saturating_sub(elapsed)
}

/// Owns at most one running child at a time.
pub struct ProcessSupervisor {
    events: Arc<dyn SupervisorEvents>,
    active: Arc<Mutex<Option<Child>>>,
    state: Arc<Mutex<SupervisorState>>,
    linger_floor: Duration,
}

impl ProcessSupervisor {
    pub fn new(events: Arc<dyn SupervisorEvents>) -> Self {
        Self::with_linger(events, MIN_LINGER)
    }

    /// Supervisor with a custom linger floor.
    pub fn with_linger(events: Arc<dyn SupervisorEvents>, linger_floor: Duration) -> Self {
        Self {
            events,
            active: Arc::new(Mutex::new(None)),
            state: Arc::new(Mutex::new(SupervisorState::Exited)),
            linger_floor,
        }
    }

    pub async fn state(&self) -> SupervisorState {
        *self.state.lock().await
    }

    pub async fn is_running(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Spawn the plan and start monitoring it. Fails with `AlreadyRunning`
    /// while a previous child is still alive.
    pub async fn launch(&self, plan: LaunchPlan, display_name: &str) -> LauncherResult<()> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(LauncherError::AlreadyRunning);
        }

        let mut cmd = Command::new(&plan.executable);
        cmd.args(&plan.args)
            .current_dir(&plan.cwd)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());
        for (key, value) in &plan.env {
            cmd.env(key, value);
        }
        configure_platform_spawn(&mut cmd, plan.detached);

        info!(
            "Launching {:?} in {:?} with args {:?}",
            plan.executable,
            plan.cwd,
            plan.scrubbed_args()
        );

        let mut child = cmd
            .spawn()
            .map_err(|e| LauncherError::Spawn(e.to_string()))?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        *active = Some(child);
        drop(active);

        *self.state.lock().await = SupervisorState::Spawned;

        let classifier = Arc::new(LineClassifier::new(display_name));
        let started_at = Instant::now();

        let mut readers = Vec::new();
        if let Some(stdout) = stdout {
            readers.push(self.spawn_reader(stdout, classifier.clone(), started_at));
        }
        if let Some(stderr) = stderr {
            readers.push(self.spawn_reader(stderr, classifier, started_at));
        }

        let events = self.events.clone();
        let active = self.active.clone();
        let state = self.state.clone();
        let natives_dir = plan.natives_dir.clone();
        tokio::spawn(async move {
            for reader in readers {
                let _ = reader.await;
            }

            let child = active.lock().await.take();
            let code = match child {
                Some(mut child) => match child.wait().await {
                    Ok(status) => status.code(),
                    Err(err) => {
                        error!("Failed to reap game process: {}", err);
                        None
                    }
                },
                None => None,
            };

            *state.lock().await = SupervisorState::Exited;
            info!("Game process exited with code {:?}", code);

            // Always attempted, regardless of how the child went down.
            cleanup_natives(&natives_dir).await;
            events.on_exit(code).await;
        });

        Ok(())
    }

    /// Kill the running child, if any. Returns whether one was killed.
    pub async fn kill_active(&self) -> LauncherResult<bool> {
        let mut active = self.active.lock().await;
        match active.as_mut() {
            Some(child) => {
                warn!("Killing active game process");
                child
                    .start_kill()
                    .map_err(|e| LauncherError::Spawn(e.to_string()))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn spawn_reader<R>(
        &self,
        stream: R,
        classifier: Arc<LineClassifier>,
        started_at: Instant,
    ) -> tokio::task::JoinHandle<()>
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        let events = self.events.clone();
        let state = self.state.clone();
        let linger_floor = self.linger_floor;

        tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("[game] {}", line);
                match classifier.classify(&line) {
                    Some(LineEvent::LaunchBanner) => {
                        let mut state_guard = state.lock().await;
                        if *state_guard == SupervisorState::Spawned {
                            *state_guard = SupervisorState::AwaitingReady;
                            drop(state_guard);

                            let wait = remaining_linger(started_at.elapsed(), linger_floor);
                            let state = state.clone();
                            let events = events.clone();
                            tokio::spawn(async move {
                                tokio::time::sleep(wait).await;
                                let mut state_guard = state.lock().await;
                                if *state_guard == SupervisorState::AwaitingReady {
                                    *state_guard = SupervisorState::Ready;
                                    drop(state_guard);
                                    events.on_ready().await;
                                }
                            });
                        }
                    }
                    Some(LineEvent::WorldLoaded) => {
                        events.on_presence_update(PresenceUpdate::WorldLoaded).await;
                    }
                    Some(LineEvent::PlayerJoined) => {
                        events.on_presence_update(PresenceUpdate::JoinedServer).await;
                    }
                    Some(LineEvent::FatalError) => {
                        error!("Fatal launch error: {}", line);
                        events.on_fatal_error(&line).await;
                    }
                    None => {}
                }
            }
        })
    }
}

fn configure_platform_spawn(cmd: &mut Command, detached: bool) {
    #[cfg(unix)]
    if detached {
        cmd.process_group(0);
    }
    #[cfg(not(unix))]
    let _ = detached;

    #[cfg(target_os = "windows")]
    {
        // Terminal-related vars can make Java/LWJGL treat the child as a
        // virtual terminal session.
        cmd.env_remove("WT_SESSION");
        cmd.env_remove("TERM");
        cmd.env_remove("ConEmuANSI");
    }
}
