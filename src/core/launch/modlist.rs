// ─── Mod List Files ───
// Side files written into the instance directory that tell the loader which
// mods to pick up, in the era-appropriate format.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::resolver::ResolvedMod;
use crate::core::manifest::LoaderManifest;
use crate::core::maven::MavenArtifact;
use crate::core::settings::DataPaths;

pub const LEGACY_FORGE_LIST: &str = "forgeModList.json";
pub const LEGACY_LITELOADER_LIST: &str = "liteloaderModList.json";
pub const MODERN_LIST: &str = "forgeMods.list";

/// Legacy (pre-1.13) JSON mod-list format shared by Forge and LiteLoader.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonModList {
    repository_root: String,
    mod_ref: Vec<String>,
}

fn full_id(artifact: &MavenArtifact) -> String {
    if artifact.packaging == "jar" {
        artifact.extensionless_id()
    } else {
        format!("{}@{}", artifact.extensionless_id(), artifact.packaging)
    }
}

async fn write_json_list(path: &Path, list: &JsonModList) -> LauncherResult<()> {
    let json = serde_json::to_string_pretty(list)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| LauncherError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    debug!("Wrote mod list {:?} ({} refs)", path, list.mod_ref.len());
    Ok(())
}

/// Write the legacy Forge mod list. Forge references mods by extensionless
/// identifier; newer legacy builds additionally demand an
/// `absolute:`-prefixed repository root.
pub async fn write_legacy_forge_list(
    mods: &[ResolvedMod],
    loader: &LoaderManifest,
    paths: &DataPaths,
    instance_dir: &Path,
) -> LauncherResult<PathBuf> {
    let root = paths.modstore_dir().to_string_lossy().into_owned();
    let repository_root = if loader.forge_requires_absolute_modlist() {
        format!("absolute:{}", root)
    } else {
        root
    };

    let list = JsonModList {
        repository_root,
        mod_ref: mods.iter().map(|m| m.artifact.extensionless_id()).collect(),
    };
    let path = instance_dir.join(LEGACY_FORGE_LIST);
    write_json_list(&path, &list).await?;
    Ok(path)
}

/// Write the legacy LiteLoader mod list, referencing mods by full
/// identifier.
pub async fn write_legacy_liteloader_list(
    mods: &[ResolvedMod],
    paths: &DataPaths,
    instance_dir: &Path,
) -> LauncherResult<PathBuf> {
    let list = JsonModList {
        repository_root: paths.modstore_dir().to_string_lossy().into_owned(),
        mod_ref: mods.iter().map(|m| full_id(&m.artifact)).collect(),
    };
    let path = instance_dir.join(LEGACY_LITELOADER_LIST);
    write_json_list(&path, &list).await?;
    Ok(path)
}

/// Write the modern (1.13+) newline-delimited mod list and return the game
/// arguments referencing it. Fabric consumes absolute artifact paths, Forge
/// extensionless identifiers rooted in the shared mod store. An empty mod
/// set writes nothing and yields no arguments.
pub async fn write_modern_list(
    mods: &[ResolvedMod],
    using_fabric: bool,
    instance_dir: &Path,
) -> LauncherResult<Vec<String>> {
    let lines: Vec<String> = mods
        .iter()
        .map(|m| {
            if using_fabric {
                m.path.to_string_lossy().into_owned()
            } else {
                m.artifact.extensionless_id()
            }
        })
        .collect();

    if lines.is_empty() {
        return Ok(Vec::new());
    }

    let path = instance_dir.join(MODERN_LIST);
    tokio::fs::write(&path, lines.join("\n"))
        .await
        .map_err(|e| LauncherError::Io {
            path: path.clone(),
            source: e,
        })?;
    debug!("Wrote mod list {:?} ({} entries)", path, lines.len());

    let path_str = path.to_string_lossy().into_owned();
    Ok(if using_fabric {
        vec!["--fabric.addMods".into(), format!("@{}", path_str)]
    } else {
        vec![
            "--fml.mavenRoots".into(),
            ["..", "..", "common", "modstore"]
                .iter()
                .collect::<PathBuf>()
                .to_string_lossy()
                .into_owned(),
            "--fml.modLists".into(),
            path_str,
        ]
    })
}
