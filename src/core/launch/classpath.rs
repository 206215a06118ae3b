// ─── Classpath Assembler ───
// Merges base-runtime libraries, server-declared libraries and resolved
// module artifacts into one deduplicated, ordered classpath.

use std::collections::HashMap;

use tracing::debug;

use crate::core::distribution::{DistroModule, ModuleType, ServerEntry};
use crate::core::error::LauncherResult;
use crate::core::launch::resolver::ResolutionResult;
use crate::core::manifest::{RuleContext, VersionManifest};
use crate::core::maven::versionless_key;
use crate::core::settings::DataPaths;
use crate::core::version::version_at_least;

/// Platform-specific Java classpath separator.
pub fn classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// Insertion-ordered identifier→path map with last-writer-wins override
/// semantics: re-inserting a key replaces its value but keeps its position.
#[derive(Debug, Default)]
struct LibraryMap {
    order: Vec<String>,
    paths: HashMap<String, String>,
}

impl LibraryMap {
    fn insert(&mut self, key: String, path: String) {
        if !self.paths.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.paths.insert(key, path);
    }

    fn merge(&mut self, other: LibraryMap) {
        for key in other.order {
            let path = other.paths[&key].clone();
            self.insert(key, path);
        }
    }

    fn into_paths(self) -> Vec<String> {
        self.order
            .into_iter()
            .map(|key| self.paths[&key].clone())
            .collect()
    }
}

/// Build the ordered classpath for one launch.
///
/// Seeds the versioned client jar (newer merged-jar targets omit it unless a
/// Fabric loader is active), appends the LiteLoader jar when enabled, then
/// the merged base/server library sets where server-declared entries always
/// win a shared identifier.
pub fn assemble_classpath(
    server: &ServerEntry,
    vanilla: &VersionManifest,
    resolution: &ResolutionResult,
    paths: &DataPaths,
    ctx: &RuleContext,
) -> LauncherResult<Vec<String>> {
    let mut entries: Vec<String> = Vec::new();

    if !version_at_least("1.17", &server.minecraft_version) || resolution.using_fabric {
        let client_jar = paths
            .versions_dir()
            .join(&vanilla.id)
            .join(format!("{}.jar", vanilla.id));
        entries.push(client_jar.to_string_lossy().into_owned());
    }

    if let Some(ll_path) = &resolution.liteloader_path {
        entries.push(ll_path.to_string_lossy().into_owned());
    }

    let mut merged = base_runtime_libraries(vanilla, paths, ctx);
    merged.merge(server_libraries(server, paths)?);
    entries.extend(merged.into_paths());

    truncate_at_archive_extension(&mut entries);
    debug!("Assembled classpath with {} entries", entries.len());
    Ok(entries)
}

/// Base-runtime libraries compatible with this platform, excluding natives
/// containers, keyed by version-independent identifier.
fn base_runtime_libraries(
    vanilla: &VersionManifest,
    paths: &DataPaths,
    ctx: &RuleContext,
) -> LibraryMap {
    let libs_dir = paths.libraries_dir();
    let mut map = LibraryMap::default();

    for lib in &vanilla.libraries {
        if !lib.compatible(ctx) || lib.natives.is_some() {
            continue;
        }
        let Some(artifact) = &lib.downloads.artifact else {
            continue;
        };
        map.insert(
            versionless_key(&lib.name),
            libs_dir.join(&artifact.path).to_string_lossy().into_owned(),
        );
    }

    map
}

/// Server-declared loader/library modules, recursively through their
/// submodule trees, honoring the per-submodule classpath opt-out.
fn server_libraries(server: &ServerEntry, paths: &DataPaths) -> LauncherResult<LibraryMap> {
    let mut map = LibraryMap::default();

    for module in &server.modules {
        if module.module_type.is_classpath_root() {
            map.insert(
                module.versionless_id(),
                module.local_path(paths)?.to_string_lossy().into_owned(),
            );
            collect_submodule_libraries(module, paths, &mut map)?;
        }
    }

    Ok(map)
}

fn collect_submodule_libraries(
    module: &DistroModule,
    paths: &DataPaths,
    map: &mut LibraryMap,
) -> LauncherResult<()> {
    for sub in &module.sub_modules {
        if sub.module_type == ModuleType::Library && sub.on_classpath() {
            map.insert(
                sub.versionless_id(),
                sub.local_path(paths)?.to_string_lossy().into_owned(),
            );
        }
        collect_submodule_libraries(sub, paths, map)?;
    }
    Ok(())
}

/// Drop any trailing fragment after the archive extension. Some identifiers
/// smuggle extra path segments after `.jar`; the JVM rejects those.
fn truncate_at_archive_extension(entries: &mut [String]) {
    const EXT: &str = ".jar";
    for entry in entries.iter_mut() {
        if let Some(idx) = entry.find(EXT) {
            if idx + EXT.len() != entry.len() {
                entry.truncate(idx + EXT.len());
            }
        }
    }
}
