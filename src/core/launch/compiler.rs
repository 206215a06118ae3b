// ─── Launch Plan Compiler ───
// Turns the resolved inputs of one launch into a concrete, immutable
// process invocation.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::auth::AuthSession;
use crate::core::distribution::{ModuleType, ServerEntry};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::args::{
    uses_modern_arguments, ArgumentContext, LegacyArguments, ModernArguments,
};
use crate::core::launch::classpath::assemble_classpath;
use crate::core::launch::modlist;
use crate::core::launch::natives::{ephemeral_natives_dir, extract_natives};
use crate::core::launch::resolver::resolve_modules;
use crate::core::manifest::{LoaderManifest, RuleContext, VersionManifest};
use crate::core::settings::{DataPaths, LaunchSettings};

const SCRUBBED_TOKEN: &str = "**********";

/// A fully compiled process invocation. Immutable once built; the
/// supervisor consumes it verbatim.
#[derive(Clone)]
pub struct LaunchPlan {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Environment overrides applied on top of the inherited environment.
    pub env: HashMap<String, String>,
    pub detached: bool,
    /// Per-launch natives directory, removed when the child exits.
    pub natives_dir: PathBuf,
    access_token: String,
}

impl LaunchPlan {
    /// Bare plan without environment overrides or a token to scrub. The
    /// compiler fills every field; this exists for hosts and tests that
    /// supervise a hand-built invocation.
    pub fn new(executable: PathBuf, args: Vec<String>, cwd: PathBuf, natives_dir: PathBuf) -> Self {
        Self {
            executable,
            args,
            cwd,
            env: HashMap::new(),
            detached: false,
            natives_dir,
            access_token: String::new(),
        }
    }

    /// Argument vector with the access token masked, safe for diagnostics.
    pub fn scrubbed_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                if !self.access_token.is_empty() && arg.contains(&self.access_token) {
                    arg.replace(&self.access_token, SCRUBBED_TOKEN)
                } else {
                    arg.clone()
                }
            })
            .collect()
    }
}

impl fmt::Debug for LaunchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchPlan")
            .field("executable", &self.executable)
            .field("args", &self.scrubbed_args())
            .field("cwd", &self.cwd)
            .field("env", &self.env)
            .field("detached", &self.detached)
            .field("natives_dir", &self.natives_dir)
            .finish()
    }
}

/// Borrowed inputs of one compilation.
pub struct CompileInputs<'a> {
    pub server: &'a ServerEntry,
    pub vanilla: &'a VersionManifest,
    pub loader: Option<&'a LoaderManifest>,
    pub session: &'a AuthSession,
    pub settings: &'a LaunchSettings,
    pub paths: &'a DataPaths,
}

/// Compile one launch: resolve modules, extract natives, assemble the
/// classpath, write mod-list side files and render the era-appropriate
/// argument vector.
pub async fn compile(inputs: CompileInputs<'_>) -> LauncherResult<LaunchPlan> {
    let CompileInputs {
        server,
        vanilla,
        loader,
        session,
        settings,
        paths,
    } = inputs;

    validate_loader_pairing(server, loader)?;

    let rule_ctx = RuleContext::current();
    let resolution = resolve_modules(server, &settings.mod_config, paths)?;

    let instance_dir = paths.instance_dir(&server.id);
    tokio::fs::create_dir_all(&instance_dir)
        .await
        .map_err(|e| LauncherError::Io {
            path: instance_dir.clone(),
            source: e,
        })?;

    let natives_dir = ephemeral_natives_dir();
    extract_natives(&vanilla.libraries, &paths.libraries_dir(), &natives_dir, &rule_ctx).await?;

    let classpath = assemble_classpath(server, vanilla, &resolution, paths, &rule_ctx)?;

    let cx = ArgumentContext {
        server,
        vanilla,
        loader,
        session,
        settings,
        paths,
        instance_dir: &instance_dir,
        natives_dir: &natives_dir,
        classpath: &classpath,
        resolution: &resolution,
        rule_ctx: &rule_ctx,
    };

    let main_class = cx.main_class().to_string();
    let args = if uses_modern_arguments(&server.minecraft_version) {
        let mut args = ModernArguments { cx: &cx }.build()?;
        args.extend(
            modlist::write_modern_list(
                &resolution.primary_mods,
                resolution.using_fabric,
                &instance_dir,
            )
            .await?,
        );
        args
    } else {
        let forge_list = match loader {
            Some(loader) => Some(
                modlist::write_legacy_forge_list(
                    &resolution.primary_mods,
                    loader,
                    paths,
                    &instance_dir,
                )
                .await?,
            ),
            None => None,
        };
        let liteloader_list = if resolution.using_liteloader() {
            Some(
                modlist::write_legacy_liteloader_list(
                    &resolution.secondary_mods,
                    paths,
                    &instance_dir,
                )
                .await?,
            )
        } else {
            None
        };
        LegacyArguments {
            cx: &cx,
            forge_list: forge_list.as_deref(),
            liteloader_list: liteloader_list.as_deref(),
        }
        .build()?
    };

    let plan = LaunchPlan {
        executable: settings.java_executable.clone(),
        args,
        cwd: instance_dir,
        env: native_library_env(&natives_dir),
        detached: settings.launch_detached,
        natives_dir,
        access_token: session.access_token.clone(),
    };

    info!(
        "Compiled launch plan for `{}` ({} args, main class {})",
        server.id,
        plan.args.len(),
        main_class
    );
    debug!("Launch plan: {:?}", plan);
    Ok(plan)
}

/// A loader manifest without a matching loader module in the distribution
/// points at a broken installation; refuse to spawn something that cannot
/// boot.
fn validate_loader_pairing(
    server: &ServerEntry,
    loader: Option<&LoaderManifest>,
) -> LauncherResult<()> {
    if loader.is_some()
        && !server
            .modules
            .iter()
            .any(|m| matches!(m.module_type, ModuleType::ForgeHosted | ModuleType::Fabric))
    {
        return Err(LauncherError::Config(format!(
            "server `{}` supplies a loader manifest but declares no loader module",
            server.id
        )));
    }
    Ok(())
}

/// Shared-library search path override pointing at the natives directory,
/// prepended to any inherited value.
fn native_library_env(natives_dir: &std::path::Path) -> HashMap<String, String> {
    let var = if cfg!(target_os = "windows") {
        "PATH"
    } else if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else {
        "LD_LIBRARY_PATH"
    };

    let mut env = HashMap::new();
    env.insert(
        var.to_string(),
        prepend_env_path(var, &natives_dir.to_string_lossy()),
    );
    env
}

fn prepend_env_path(var_name: &str, value: &str) -> String {
    let separator = if cfg!(target_os = "windows") { ";" } else { ":" };
    match std::env::var(var_name) {
        Ok(existing) if !existing.trim().is_empty() => {
            format!("{}{}{}", value, separator, existing)
        }
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::AccountKind;
    use crate::core::distribution::{DistroModule, RequiredSpec};
    use std::path::Path;

    fn session() -> AuthSession {
        AuthSession {
            display_name: "Steve".into(),
            uuid: "uuid-1234".into(),
            access_token: "secret-token".into(),
            kind: AccountKind::Microsoft,
        }
    }

    fn settings() -> LaunchSettings {
        LaunchSettings {
            min_ram_mb: 1024,
            max_ram_mb: 4096,
            ..LaunchSettings::default()
        }
    }

    fn temp_paths(tag: &str) -> DataPaths {
        let base = std::env::temp_dir().join(format!("compiler-{}-{}", tag, std::process::id()));
        DataPaths::new(base.join("common"), base.join("instances"))
    }

    fn cleanup(paths: &DataPaths, plan: Option<&LaunchPlan>) {
        if let Some(parent) = paths.common_dir.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
        if let Some(plan) = plan {
            let _ = std::fs::remove_dir_all(&plan.natives_dir);
        }
    }

    fn server(mc_version: &str, modules: Vec<DistroModule>) -> ServerEntry {
        ServerEntry {
            id: "hyperion".into(),
            name: "Hyperion".into(),
            minecraft_version: mc_version.into(),
            hostname: "play.example.net".into(),
            port: 25565,
            autoconnect: true,
            discord: None,
            modules,
        }
    }

    fn forge_hosted(id: &str) -> DistroModule {
        DistroModule {
            id: id.to_string(),
            name: id.to_string(),
            module_type: ModuleType::ForgeHosted,
            required: RequiredSpec::default(),
            classpath: None,
            sub_modules: Vec::new(),
        }
    }

    fn vanilla(id: &str) -> VersionManifest {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "mainClass": "net.minecraft.client.main.Main",
            "assets": "1.12",
            "type": "release",
            "minecraftArguments": "--username ${auth_player_name} --accessToken ${auth_access_token}"
        }))
        .unwrap()
    }

    fn legacy_loader() -> LoaderManifest {
        serde_json::from_value(serde_json::json!({
            "id": "1.12.2-forge-14.23.5.2860",
            "mainClass": "net.minecraft.launchwrapper.Launch",
            "minecraftArguments": "--username ${auth_player_name} --accessToken ${auth_access_token} --tweakClass net.minecraftforge.fml.common.launcher.FMLTweaker"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn legacy_compile_produces_a_complete_plan() {
        let paths = temp_paths("legacy");
        let serv = server("1.12.2", vec![forge_hosted("net.minecraftforge:forge:1.12.2")]);
        let loader = legacy_loader();
        let manifest = vanilla("1.12.2");

        let plan = compile(CompileInputs {
            server: &serv,
            vanilla: &manifest,
            loader: Some(&loader),
            session: &session(),
            settings: &settings(),
            paths: &paths,
        })
        .await
        .unwrap();

        assert_eq!(plan.cwd, paths.instance_dir("hyperion"));
        assert_eq!(plan.args[0], "-cp");
        assert!(plan
            .args
            .contains(&"net.minecraft.launchwrapper.Launch".to_string()));
        assert!(plan.args.contains(&"secret-token".to_string()));
        assert!(paths
            .instance_dir("hyperion")
            .join(modlist::LEGACY_FORGE_LIST)
            .exists());
        assert!(plan.natives_dir.starts_with(std::env::temp_dir()));

        cleanup(&paths, Some(&plan));
    }

    #[tokio::test]
    async fn scrubbed_args_mask_the_access_token() {
        let paths = temp_paths("scrub");
        let serv = server("1.12.2", vec![forge_hosted("net.minecraftforge:forge:1.12.2")]);
        let loader = legacy_loader();
        let manifest = vanilla("1.12.2");

        let plan = compile(CompileInputs {
            server: &serv,
            vanilla: &manifest,
            loader: Some(&loader),
            session: &session(),
            settings: &settings(),
            paths: &paths,
        })
        .await
        .unwrap();

        let scrubbed = plan.scrubbed_args();
        assert!(!scrubbed.iter().any(|a| a.contains("secret-token")));
        assert!(scrubbed.iter().any(|a| a == "**********"));
        // Debug formatting goes through the scrubber too.
        assert!(!format!("{:?}", plan).contains("secret-token"));

        cleanup(&paths, Some(&plan));
    }

    #[tokio::test]
    async fn loader_manifest_without_loader_module_is_rejected() {
        let paths = temp_paths("mismatch");
        let serv = server("1.12.2", vec![]);
        let loader = legacy_loader();
        let manifest = vanilla("1.12.2");

        let err = compile(CompileInputs {
            server: &serv,
            vanilla: &manifest,
            loader: Some(&loader),
            session: &session(),
            settings: &settings(),
            paths: &paths,
        })
        .await
        .unwrap_err();

        assert!(matches!(err, LauncherError::Config(_)));
        cleanup(&paths, None);
    }

    #[tokio::test]
    async fn vanilla_compile_without_loader_uses_the_base_main_class() {
        let paths = temp_paths("vanilla");
        let serv = server("1.12.2", vec![]);
        let manifest = vanilla("1.12.2");

        let plan = compile(CompileInputs {
            server: &serv,
            vanilla: &manifest,
            loader: None,
            session: &session(),
            settings: &settings(),
            paths: &paths,
        })
        .await
        .unwrap();

        assert!(plan
            .args
            .contains(&"net.minecraft.client.main.Main".to_string()));
        assert!(!plan.args.iter().any(|a| a == "--modListFile"));

        cleanup(&paths, Some(&plan));
    }

    #[test]
    fn native_library_env_prepends_the_natives_dir() {
        let env = native_library_env(Path::new("/tmp/natives/xyz"));
        let (_, value) = env.iter().next().unwrap();
        assert!(value.starts_with("/tmp/natives/xyz"));
    }
}
