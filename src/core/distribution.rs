// ─── Distribution Model ───
// Declarative description of one server installation: identity, network
// endpoint and the recursive module tree the launch plan is compiled from.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::error::LauncherResult;
use crate::core::maven::{versionless_key, MavenArtifact};
use crate::core::settings::DataPaths;

/// Closed set of module roles in the distribution index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModuleType {
    ForgeMod,
    LiteMod,
    LiteLoader,
    ForgeHosted,
    Fabric,
    Library,
}

impl ModuleType {
    /// Mod-like modules participate in enable/disable resolution.
    pub fn is_mod(&self) -> bool {
        matches!(
            self,
            ModuleType::ForgeMod | ModuleType::LiteMod | ModuleType::LiteLoader
        )
    }

    /// Loader-or-library modules contribute classpath entries directly.
    pub fn is_classpath_root(&self) -> bool {
        matches!(
            self,
            ModuleType::ForgeHosted | ModuleType::Fabric | ModuleType::Library
        )
    }
}

/// Required-flag with a default-enabled value for optional modules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequiredSpec {
    /// When true the module is mandatory and always included.
    #[serde(default = "default_true")]
    pub value: bool,
    /// Enabled-by-default state consulted when no configuration exists.
    #[serde(default = "default_true", rename = "def")]
    pub default: bool,
}

impl Default for RequiredSpec {
    fn default() -> Self {
        Self {
            value: true,
            default: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One node of the per-server module tree. Each module owns its children
/// exclusively, so the structure is a tree and cycles cannot occur.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistroModule {
    /// Maven-style identifier, `group:artifact:version[:classifier][@ext]`.
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    #[serde(default)]
    pub required: RequiredSpec,
    /// Opt-out flag for library submodules that must not reach the
    /// classpath (e.g. agents passed via dedicated flags).
    #[serde(default)]
    pub classpath: Option<bool>,
    #[serde(default)]
    pub sub_modules: Vec<DistroModule>,
}

impl DistroModule {
    pub fn artifact(&self) -> LauncherResult<MavenArtifact> {
        MavenArtifact::parse(&self.id)
    }

    /// Version-independent identifier used for configuration lookup and
    /// classpath override keys.
    pub fn versionless_id(&self) -> String {
        versionless_key(&self.id)
    }

    /// On-disk location of the module's artifact. Libraries and loaders
    /// live in the shared library store, mods in the mod store.
    pub fn local_path(&self, paths: &DataPaths) -> LauncherResult<PathBuf> {
        let root = if self.module_type.is_classpath_root() {
            paths.libraries_dir()
        } else {
            paths.modstore_dir()
        };
        Ok(root.join(self.artifact()?.local_path()))
    }

    /// Whether this module may contribute a classpath entry at all.
    pub fn on_classpath(&self) -> bool {
        self.classpath.unwrap_or(true)
    }
}

/// Discord rich-presence configuration carried by the distribution index.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RichPresenceConfig {
    pub short_id: String,
    #[serde(default)]
    pub large_image_text: String,
    #[serde(default)]
    pub large_image_key: String,
}

/// One server entry of the distribution index, immutable for the duration
/// of a launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerEntry {
    pub id: String,
    pub name: String,
    pub minecraft_version: String,
    pub hostname: String,
    pub port: u16,
    pub autoconnect: bool,
    #[serde(default)]
    pub discord: Option<RichPresenceConfig>,
    #[serde(default)]
    pub modules: Vec<DistroModule>,
}

impl ServerEntry {
    /// `host:port` form used by quick-play arguments.
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}
