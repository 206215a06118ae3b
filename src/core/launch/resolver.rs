// ─── Module Resolver ───
// Walks the per-server module tree and produces the flat, ordered mod lists
// the classpath and argument phases consume.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::core::distribution::{DistroModule, ModuleType, ServerEntry};
use crate::core::error::LauncherResult;
use crate::core::maven::MavenArtifact;
use crate::core::settings::{effective_enabled, DataPaths, ModConfigEntry};

/// One enabled mod with its on-disk artifact resolved.
#[derive(Debug, Clone)]
pub struct ResolvedMod {
    pub artifact: MavenArtifact,
    pub versionless_id: String,
    pub path: PathBuf,
}

impl ResolvedMod {
    fn from_module(module: &DistroModule, paths: &DataPaths) -> LauncherResult<Self> {
        let path = module.local_path(paths)?;
        if !path.exists() {
            // Not fatal here: the file may still appear before spawn, and a
            // missing mod surfaces as a game-side error, not a compile abort.
            warn!("Mod artifact missing on disk: {:?}", path);
        }
        Ok(Self {
            artifact: module.artifact()?,
            versionless_id: module.versionless_id(),
            path,
        })
    }
}

/// Outcome of module resolution, threaded explicitly through the compile
/// phases instead of living as mutable builder state.
#[derive(Debug, Clone, Default)]
pub struct ResolutionResult {
    /// Primary-loader mods (Forge/Fabric family), tree pre-order.
    pub primary_mods: Vec<ResolvedMod>,
    /// Secondary-loader mods (LiteLoader family), tree pre-order.
    pub secondary_mods: Vec<ResolvedMod>,
    /// Path of the enabled LiteLoader container, when one is usable.
    pub liteloader_path: Option<PathBuf>,
    /// A Fabric loader module is present on the server.
    pub using_fabric: bool,
}

impl ResolutionResult {
    pub fn using_liteloader(&self) -> bool {
        self.liteloader_path.is_some()
    }
}

/// Resolve the server's module tree against the user's mod configuration.
pub fn resolve_modules(
    server: &ServerEntry,
    mod_config: &HashMap<String, ModConfigEntry>,
    paths: &DataPaths,
) -> LauncherResult<ResolutionResult> {
    let mut result = ResolutionResult {
        using_fabric: server
            .modules
            .iter()
            .any(|m| m.module_type == ModuleType::Fabric),
        ..Default::default()
    };

    result.liteloader_path = find_liteloader(server, mod_config, paths)?;
    resolve_level(&server.modules, mod_config, paths, &mut result)?;

    debug!(
        "Resolved {} primary and {} secondary mods (liteloader: {}, fabric: {})",
        result.primary_mods.len(),
        result.secondary_mods.len(),
        result.using_liteloader(),
        result.using_fabric
    );
    Ok(result)
}

fn resolve_level(
    modules: &[DistroModule],
    config: &HashMap<String, ModConfigEntry>,
    paths: &DataPaths,
    result: &mut ResolutionResult,
) -> LauncherResult<()> {
    for module in modules {
        if !module.module_type.is_mod() {
            continue;
        }

        let entry = config.get(&module.versionless_id());
        let optional = !module.required.value;
        if optional && !effective_enabled(entry, &module.required) {
            continue;
        }

        if !module.sub_modules.is_empty() {
            let empty = HashMap::new();
            let nested = entry
                .and_then(ModConfigEntry::submodule_config)
                .unwrap_or(&empty);
            resolve_level(&module.sub_modules, nested, paths, result)?;
        }

        // A LiteLoader container only ever contributes its children.
        if module.module_type == ModuleType::LiteLoader {
            continue;
        }

        let resolved = ResolvedMod::from_module(module, paths)?;
        match module.module_type {
            ModuleType::ForgeMod => result.primary_mods.push(resolved),
            _ => result.secondary_mods.push(resolved),
        }
    }
    Ok(())
}

/// Locate a usable LiteLoader container: enabled (or mandatory) and present
/// on disk.
fn find_liteloader(
    server: &ServerEntry,
    config: &HashMap<String, ModConfigEntry>,
    paths: &DataPaths,
) -> LauncherResult<Option<PathBuf>> {
    for module in &server.modules {
        if module.module_type != ModuleType::LiteLoader {
            continue;
        }

        let mandatory = module.required.value;
        let enabled =
            mandatory || effective_enabled(config.get(&module.versionless_id()), &module.required);
        if !enabled {
            continue;
        }

        let path = module.local_path(paths)?;
        if path.exists() {
            return Ok(Some(path));
        }
        warn!("LiteLoader enabled but artifact missing: {:?}", path);
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distribution::RequiredSpec;

    fn module(id: &str, module_type: ModuleType) -> DistroModule {
        DistroModule {
            id: id.to_string(),
            name: id.to_string(),
            module_type,
            required: RequiredSpec::default(),
            classpath: None,
            sub_modules: Vec::new(),
        }
    }

    fn optional(mut m: DistroModule, default: bool) -> DistroModule {
        m.required = RequiredSpec {
            value: false,
            default,
        };
        m
    }

    fn server(modules: Vec<DistroModule>) -> ServerEntry {
        ServerEntry {
            id: "test".into(),
            name: "Test".into(),
            minecraft_version: "1.12.2".into(),
            hostname: "localhost".into(),
            port: 25565,
            autoconnect: false,
            discord: None,
            modules,
        }
    }

    fn paths() -> DataPaths {
        DataPaths::new(
            std::env::temp_dir().join(format!("resolver-common-{}", std::process::id())),
            std::env::temp_dir().join(format!("resolver-instances-{}", std::process::id())),
        )
    }

    #[test]
    fn required_mods_are_always_included_in_pre_order() {
        let mut parent = module("com.example:parent:1.0", ModuleType::ForgeMod);
        parent.sub_modules = vec![module("com.example:child:1.0", ModuleType::ForgeMod)];
        let serv = server(vec![parent, module("com.example:second:2.0", ModuleType::ForgeMod)]);

        let result = resolve_modules(&serv, &HashMap::new(), &paths()).unwrap();

        let ids: Vec<&str> = result
            .primary_mods
            .iter()
            .map(|m| m.versionless_id.as_str())
            .collect();
        // Children are concatenated before the parent is emitted.
        assert_eq!(
            ids,
            vec!["com.example:child", "com.example:parent", "com.example:second"]
        );
        assert!(result.secondary_mods.is_empty());
    }

    #[test]
    fn optional_mods_honor_configuration_and_defaults() {
        let serv = server(vec![
            optional(module("com.example:on:1.0", ModuleType::ForgeMod), true),
            optional(module("com.example:off:1.0", ModuleType::ForgeMod), true),
            optional(module("com.example:defaulted:1.0", ModuleType::ForgeMod), false),
        ]);

        let mut config = HashMap::new();
        config.insert("com.example:off".to_string(), ModConfigEntry::Toggle(false));

        let result = resolve_modules(&serv, &config, &paths()).unwrap();
        let ids: Vec<&str> = result
            .primary_mods
            .iter()
            .map(|m| m.versionless_id.as_str())
            .collect();
        assert_eq!(ids, vec!["com.example:on"]);
    }

    #[test]
    fn liteloader_contributes_children_but_never_itself() {
        let mut ll = optional(
            module("com.mumfrey:liteloader:1.12.2", ModuleType::LiteLoader),
            true,
        );
        ll.sub_modules = vec![module("com.example:litemod:1.0", ModuleType::LiteMod)];
        let serv = server(vec![ll]);

        let result = resolve_modules(&serv, &HashMap::new(), &paths()).unwrap();

        assert!(result.primary_mods.is_empty());
        let ids: Vec<&str> = result
            .secondary_mods
            .iter()
            .map(|m| m.versionless_id.as_str())
            .collect();
        assert_eq!(ids, vec!["com.example:litemod"]);
    }

    #[test]
    fn unusable_liteloader_still_yields_enabled_children() {
        let mut ll = optional(
            module("com.mumfrey:liteloader:1.12.2", ModuleType::LiteLoader),
            true,
        );
        ll.sub_modules = vec![module("com.example:litemod:1.0", ModuleType::LiteMod)];
        let serv = server(vec![ll]);

        // Container enabled in config but its jar is absent on disk: the
        // loader itself is unusable, its children still resolve.
        let mut nested = HashMap::new();
        nested.insert("com.example:litemod".to_string(), ModConfigEntry::Toggle(true));
        let mut config = HashMap::new();
        config.insert(
            "com.mumfrey:liteloader".to_string(),
            ModConfigEntry::Group {
                value: Some(true),
                mods: nested,
            },
        );

        let result = resolve_modules(&serv, &config, &paths()).unwrap();
        assert_eq!(result.secondary_mods.len(), 1);
        // No artifact exists on disk, so the loader itself is not usable.
        assert!(!result.using_liteloader());
    }

    #[test]
    fn liteloader_path_is_set_when_artifact_exists() {
        let data = paths();
        let ll = module("com.mumfrey:liteloader:1.12.2", ModuleType::LiteLoader);
        let jar = ll.local_path(&data).unwrap();
        std::fs::create_dir_all(jar.parent().unwrap()).unwrap();
        std::fs::write(&jar, b"liteloader").unwrap();

        let serv = server(vec![ll]);
        let result = resolve_modules(&serv, &HashMap::new(), &data).unwrap();

        assert_eq!(result.liteloader_path, Some(jar));

        let _ = std::fs::remove_dir_all(&data.common_dir);
    }

    #[test]
    fn fabric_loader_module_sets_the_flag() {
        let serv = server(vec![module(
            "net.fabricmc:fabric-loader:0.15.0",
            ModuleType::Fabric,
        )]);
        let result = resolve_modules(&serv, &HashMap::new(), &paths()).unwrap();
        assert!(result.using_fabric);
    }
}
