// ─── Native Extractor ───
// Unpacks platform-native shared libraries out of their archive containers
// into an ephemeral per-launch directory.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::manifest::{LibraryEntry, RuleContext};
use crate::core::os;

/// Folder under the OS temp dir that owns every per-launch natives
/// directory. Swept at startup to recover from abnormal exits.
const NATIVES_PARENT: &str = "embark-natives";

const DEFAULT_CLASSIFIER_EXCLUSIONS: &[&str] = &["META-INF/"];
const DEFAULT_ARCH_TAGGED_EXCLUSIONS: &[&str] = &["META-INF/", ".git", ".sha1"];

/// Allocate a uniquely named natives directory for one launch.
pub fn ephemeral_natives_dir() -> PathBuf {
    std::env::temp_dir()
        .join(NATIVES_PARENT)
        .join(uuid::Uuid::new_v4().simple().to_string())
}

/// Remove every leftover natives directory from previous runs. Run once
/// before a session's first launch; failures are logged, never escalated.
pub async fn sweep_stale_natives() {
    sweep_dir(&std::env::temp_dir().join(NATIVES_PARENT)).await;
}

async fn sweep_dir(parent: &Path) {
    if parent.exists() {
        if let Err(err) = tokio::fs::remove_dir_all(parent).await {
            warn!("Failed to sweep stale natives at {:?}: {}", parent, err);
        } else {
            debug!("Swept stale natives at {:?}", parent);
        }
    }
}

/// Delete one launch's natives directory after the child exits.
pub async fn cleanup_natives(dir: &Path) {
    if dir.exists() {
        if let Err(err) = tokio::fs::remove_dir_all(dir).await {
            warn!("Error while deleting natives dir {:?}: {}", dir, err);
        } else {
            debug!("Natives dir {:?} deleted", dir);
        }
    }
}

/// Extract the platform-native payload of every compatible library into
/// `dest`. Individual entry failures are logged and skipped; a corrupt
/// archive never aborts the batch.
pub async fn extract_natives(
    libraries: &[LibraryEntry],
    libs_dir: &Path,
    dest: &Path,
    ctx: &RuleContext,
) -> LauncherResult<()> {
    tokio::fs::create_dir_all(dest)
        .await
        .map_err(|e| LauncherError::Io {
            path: dest.to_path_buf(),
            source: e,
        })?;

    let arch_tagged = Regex::new(r"^.+:natives-([^-]+)(?:-(.+))?$").expect("static pattern");

    for lib in libraries {
        if !lib.compatible(ctx) {
            continue;
        }

        if let Some(classifier) = lib.native_classifier(ctx) {
            let Some(artifact) = lib
                .downloads
                .classifiers
                .as_ref()
                .and_then(|c| c.get(&classifier))
            else {
                warn!("No classifier artifact `{}` for {}", classifier, lib.name);
                continue;
            };
            let archive = libs_dir.join(&artifact.path);
            let exclusions = exclusion_list(lib, DEFAULT_CLASSIFIER_EXCLUSIONS);
            extract_archive(&archive, dest, exclusions, false).await;
        } else if let Some(captures) = arch_tagged.captures(&lib.name) {
            // Arch-tagged artifact without a classifier map. Skip entirely
            // when the tag names a different architecture.
            let arch = captures.get(2).map(|m| m.as_str()).unwrap_or("x64");
            if arch != os::process_arch() {
                debug!("Skipping {} (arch {} != {})", lib.name, arch, os::process_arch());
                continue;
            }
            let Some(artifact) = lib.downloads.artifact.as_ref() else {
                warn!("No artifact for arch-tagged native {}", lib.name);
                continue;
            };
            let archive = libs_dir.join(&artifact.path);
            let exclusions = exclusion_list(lib, DEFAULT_ARCH_TAGGED_EXCLUSIONS);
            extract_archive(&archive, dest, exclusions, true).await;
        }
    }

    Ok(())
}

fn exclusion_list(lib: &LibraryEntry, default: &[&str]) -> Vec<String> {
    match &lib.extract {
        Some(spec) if !spec.exclude.is_empty() => spec.exclude.clone(),
        _ => default.iter().map(|s| s.to_string()).collect(),
    }
}

/// Open one archive and write every non-excluded entry into `dest`. With
/// `flatten` set, directory entries are dropped and nested entries keep
/// only their basename.
async fn extract_archive(archive: &Path, dest: &Path, exclusions: Vec<String>, flatten: bool) {
    let bytes = match tokio::fs::read(archive).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("Cannot read native archive {:?}: {}", archive, err);
            return;
        }
    };

    let archive_debug = archive.to_path_buf();
    let dest = dest.to_path_buf();
    let join = tokio::task::spawn_blocking(move || {
        let cursor = std::io::Cursor::new(bytes);
        let mut zip = match zip::ZipArchive::new(cursor) {
            Ok(zip) => zip,
            Err(err) => {
                warn!("Cannot open native archive {:?}: {}", archive_debug, err);
                return;
            }
        };

        for index in 0..zip.len() {
            let mut entry = match zip.by_index(index) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Unreadable entry {} in {:?}: {}", index, archive_debug, err);
                    continue;
                }
            };
            if flatten && entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            if exclusions.iter().any(|excl| name.contains(excl.as_str())) {
                continue;
            }

            let out_name = if flatten {
                name.rsplit('/').next().unwrap_or(&name).to_string()
            } else {
                name.clone()
            };
            if out_name.is_empty() {
                continue;
            }

            let out_path = dest.join(&out_name);
            if let Some(parent) = out_path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let mut out = match std::fs::File::create(&out_path) {
                Ok(file) => file,
                Err(err) => {
                    warn!("Error while extracting native {}: {}", name, err);
                    continue;
                }
            };
            if let Err(err) = std::io::copy(&mut entry, &mut out) {
                warn!("Error while extracting native {}: {}", name, err);
            } else {
                debug!("Extracted native: {}", out_name);
            }
        }
    })
    .await;

    if let Err(err) = join {
        warn!("Native extraction task failed for {:?}: {}", archive, err);
    }
}
