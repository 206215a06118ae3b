// ─── Launch Settings ───
// Per-launch configuration supplied by the host application. Persistence is
// the host's concern; this crate only consumes the resolved values.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::distribution::RequiredSpec;

/// On-disk mod-enable configuration for one module, keyed by the module's
/// version-independent identifier.
///
/// The wire format is either a bare boolean or an object carrying an
/// explicit `value` plus nested per-submodule entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModConfigEntry {
    Toggle(bool),
    Group {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<bool>,
        #[serde(default)]
        mods: HashMap<String, ModConfigEntry>,
    },
}

/// What a configuration entry says about a module, before the module's own
/// required-flag default is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModEnableState {
    Enabled,
    Disabled,
    /// No explicit value; fall back to the module's declared default.
    Inherit,
}

impl ModConfigEntry {
    pub fn state(&self) -> ModEnableState {
        match self {
            ModConfigEntry::Toggle(true) => ModEnableState::Enabled,
            ModConfigEntry::Toggle(false) => ModEnableState::Disabled,
            // An object without an explicit value counts as enabled.
            ModConfigEntry::Group { value, .. } => match value {
                Some(true) | None => ModEnableState::Enabled,
                Some(false) => ModEnableState::Disabled,
            },
        }
    }

    /// Nested configuration for this module's submodules, if any.
    pub fn submodule_config(&self) -> Option<&HashMap<String, ModConfigEntry>> {
        match self {
            ModConfigEntry::Toggle(_) => None,
            ModConfigEntry::Group { mods, .. } => Some(mods),
        }
    }
}

/// The one place where dynamic configuration meets the module's declared
/// required-flag. Absent configuration resolves to the declared default.
pub fn effective_enabled(entry: Option<&ModConfigEntry>, required: &RequiredSpec) -> bool {
    match entry {
        Some(entry) => match entry.state() {
            ModEnableState::Enabled => true,
            ModEnableState::Disabled => false,
            ModEnableState::Inherit => required.default,
        },
        None => required.default,
    }
}

/// Everything the compiler needs from host configuration for one launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSettings {
    /// Java executable selected for the target server.
    pub java_executable: PathBuf,
    pub min_ram_mb: u32,
    pub max_ram_mb: u32,
    /// Extra JVM flags configured by the user.
    #[serde(default)]
    pub jvm_options: Vec<String>,
    pub launch_detached: bool,
    pub fullscreen: bool,
    pub game_width: u32,
    pub game_height: u32,
    pub auto_connect: bool,
    /// Mod-enable configuration for the selected server, keyed by
    /// version-independent module identifier.
    #[serde(default)]
    pub mod_config: HashMap<String, ModConfigEntry>,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            java_executable: PathBuf::from("java"),
            min_ram_mb: 1024,
            max_ram_mb: default_max_ram_mb(),
            jvm_options: Vec::new(),
            launch_detached: false,
            fullscreen: false,
            game_width: 1280,
            game_height: 720,
            auto_connect: true,
            mod_config: HashMap::new(),
        }
    }
}

/// Half of physical memory, clamped to a sane range for the JVM heap.
fn default_max_ram_mb() -> u32 {
    let mut system = sysinfo::System::new();
    system.refresh_memory();
    let total_mb = (system.total_memory() / (1024 * 1024)) as u32;
    (total_mb / 2).clamp(2048, 8192)
}

/// Data-directory layout shared by every launch. Mirrors the split between
/// a common artifact store and per-server instance directories.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub common_dir: PathBuf,
    pub instances_dir: PathBuf,
}

impl DataPaths {
    pub fn new(common_dir: PathBuf, instances_dir: PathBuf) -> Self {
        Self {
            common_dir,
            instances_dir,
        }
    }

    /// Default layout under the platform data directory.
    pub fn default_for_app(app_name: &str) -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(app_name);
        Self {
            common_dir: base.join("common"),
            instances_dir: base.join("instances"),
        }
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.common_dir.join("libraries")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.common_dir.join("assets")
    }

    pub fn modstore_dir(&self) -> PathBuf {
        self.common_dir.join("modstore")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.common_dir.join("versions")
    }

    /// Working directory for one server's installation.
    pub fn instance_dir(&self, server_id: &str) -> PathBuf {
        self.instances_dir.join(server_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(value: bool, default: bool) -> RequiredSpec {
        RequiredSpec { value, default }
    }

    #[test]
    fn boolean_entries_resolve_directly() {
        let req = required(false, false);
        assert!(effective_enabled(Some(&ModConfigEntry::Toggle(true)), &req));
        assert!(!effective_enabled(Some(&ModConfigEntry::Toggle(false)), &req));
    }

    #[test]
    fn object_entries_use_explicit_value_or_default_to_enabled() {
        let req = required(false, false);
        let explicit_off = ModConfigEntry::Group {
            value: Some(false),
            mods: HashMap::new(),
        };
        let implicit_on = ModConfigEntry::Group {
            value: None,
            mods: HashMap::new(),
        };
        assert!(!effective_enabled(Some(&explicit_off), &req));
        assert!(effective_enabled(Some(&implicit_on), &req));
    }

    #[test]
    fn absent_entries_fall_back_to_the_declared_default() {
        assert!(effective_enabled(None, &required(false, true)));
        assert!(!effective_enabled(None, &required(false, false)));
    }

    #[test]
    fn entries_deserialize_from_both_wire_shapes() {
        let parsed: HashMap<String, ModConfigEntry> = serde_json::from_value(serde_json::json!({
            "com.example:modone": true,
            "com.example:modtwo": { "value": false, "mods": { "com.example:child": true } }
        }))
        .unwrap();

        assert!(matches!(
            parsed["com.example:modone"].state(),
            ModEnableState::Enabled
        ));
        assert!(matches!(
            parsed["com.example:modtwo"].state(),
            ModEnableState::Disabled
        ));
        assert!(parsed["com.example:modtwo"]
            .submodule_config()
            .unwrap()
            .contains_key("com.example:child"));
    }

    #[test]
    fn instance_dir_is_per_server() {
        let paths = DataPaths::new(PathBuf::from("/data/common"), PathBuf::from("/data/instances"));
        assert_eq!(
            paths.instance_dir("hyperion"),
            PathBuf::from("/data/instances/hyperion")
        );
        assert_eq!(paths.modstore_dir(), PathBuf::from("/data/common/modstore"));
    }
}
