// ─── Version Manifests & Rule Evaluation ───
// Parses the base-runtime (vanilla) and loader manifests, and decides which
// conditional libraries / argument blocks apply on the current platform.

use std::collections::HashMap;

use regex::Regex;
use serde::Deserialize;

use crate::core::error::LauncherError;
use crate::core::os;

// ─── Rules ───

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
    /// Regex pattern matched against the running OS release.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuleFeatures {
    #[serde(default)]
    pub has_custom_resolution: Option<bool>,
    #[serde(flatten)]
    pub other: HashMap<String, bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
    #[serde(default)]
    pub features: Option<RuleFeatures>,
}

/// Platform/feature context rules are evaluated against. Built once per
/// launch; tests substitute their own.
#[derive(Debug, Clone)]
pub struct RuleContext {
    pub os_name: String,
    pub os_version: String,
    pub os_arch: String,
}

impl RuleContext {
    pub fn current() -> Self {
        Self {
            os_name: os::mojang_os_name().to_string(),
            os_version: os::os_release(),
            os_arch: os::mojang_arch().to_string(),
        }
    }
}

/// Outcome of evaluating a rule list as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulesVerdict {
    /// Every rule in the list was satisfied.
    pub satisfied: bool,
    /// A satisfied feature rule requested custom-resolution support.
    pub custom_resolution: bool,
}

/// Evaluate a conditional block's rule list. A block applies only when every
/// rule is satisfied. An OS rule is satisfied when the named OS matches and
/// the optional version pattern matches under `allow`, or when it fails to
/// match under `disallow`. The only recognized feature demand is
/// `has_custom_resolution`; a feature rule asking for anything else leaves
/// the block unsatisfied, so demo-mode and quick-play blocks drop out.
pub fn evaluate_rules(rules: &[Rule], ctx: &RuleContext) -> RulesVerdict {
    let mut satisfied_count = 0usize;
    let mut custom_resolution = false;

    for rule in rules {
        if let Some(os_rule) = &rule.os {
            let name_matches = os_rule
                .name
                .as_deref()
                .map(|name| name == ctx.os_name)
                .unwrap_or(true);
            let version_matches = match &os_rule.version {
                Some(pattern) => Regex::new(pattern)
                    .map(|re| re.is_match(&ctx.os_version))
                    .unwrap_or(false),
                None => true,
            };
            let arch_matches = os_rule
                .arch
                .as_deref()
                .map(|arch| arch == ctx.os_arch)
                .unwrap_or(true);

            if name_matches && version_matches && arch_matches {
                if rule.action == RuleAction::Allow {
                    satisfied_count += 1;
                }
            } else if rule.action == RuleAction::Disallow {
                satisfied_count += 1;
            }
        } else if let Some(features) = &rule.features {
            if features.has_custom_resolution == Some(true) {
                custom_resolution = true;
                satisfied_count += 1;
            }
        } else {
            // Bare rule with no condition applies by its action alone.
            if rule.action == RuleAction::Allow {
                satisfied_count += 1;
            }
        }
    }

    RulesVerdict {
        satisfied: satisfied_count == rules.len(),
        custom_resolution,
    }
}

// ─── Libraries ───

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactRef {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<ArtifactRef>,
    #[serde(default)]
    pub classifiers: Option<HashMap<String, ArtifactRef>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExtractSpec {
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: LibraryDownloads,
    #[serde(default)]
    pub rules: Option<Vec<Rule>>,
    /// Per-OS natives classifier map (`"linux": "natives-linux"`). The
    /// classifier may carry an `${arch}` placeholder.
    #[serde(default)]
    pub natives: Option<HashMap<String, String>>,
    #[serde(default)]
    pub extract: Option<ExtractSpec>,
}

impl LibraryEntry {
    /// Whether this library applies on the current platform. With no rules
    /// present, a natives-only library applies iff it carries a classifier
    /// for this OS.
    pub fn compatible(&self, ctx: &RuleContext) -> bool {
        match &self.rules {
            Some(rules) => evaluate_rules(rules, ctx).satisfied,
            None => match &self.natives {
                Some(natives) => natives.contains_key(ctx.os_name.as_str()),
                None => true,
            },
        }
    }

    /// Concrete natives classifier for this OS, with `${arch}` substituted.
    pub fn native_classifier(&self, ctx: &RuleContext) -> Option<String> {
        self.natives
            .as_ref()?
            .get(ctx.os_name.as_str())
            .map(|raw| raw.replace("${arch}", os::classifier_arch()))
    }
}

// ─── Manifests ───

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ArgumentsSpec {
    #[serde(default)]
    pub game: Vec<serde_json::Value>,
    #[serde(default)]
    pub jvm: Vec<serde_json::Value>,
}

/// Base-runtime (vanilla) manifest for the target version.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionManifest {
    pub id: String,
    pub main_class: String,
    /// Asset-index name (`"17"`, `"legacy"`, ...).
    pub assets: String,
    /// Release type tag (`"release"`, `"snapshot"`).
    #[serde(rename = "type")]
    pub release_type: String,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    #[serde(default)]
    pub arguments: Option<ArgumentsSpec>,
    /// Legacy single-string argument template (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
}

/// Loader (Forge/Fabric era) manifest for the target version pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderManifest {
    /// Loader identifier encoding `<mc>-<loader>-<version>`.
    pub id: String,
    pub main_class: String,
    #[serde(default)]
    pub arguments: Option<ArgumentsSpec>,
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
}

impl LoaderManifest {
    /// Minecraft minor version from the loader id (`1.12.2-forge-...` → 12).
    fn mc_minor_version(&self) -> Option<u32> {
        self.id.split('-').next()?.split('.').nth(1)?.parse().ok()
    }

    pub fn mc_minor_at_most(&self, minor: u32) -> bool {
        self.mc_minor_version().is_some_and(|v| v <= minor)
    }

    /// Whether the Forge mod-list file must carry an absolute repository
    /// root. Old Forge builds (before 14.23.3.2655) expect a relative root;
    /// anything unparseable is treated as new.
    pub fn forge_requires_absolute_modlist(&self) -> bool {
        if self.mc_minor_at_most(9) {
            return false;
        }
        const MIN: [u32; 4] = [14, 23, 3, 2655];
        let Some(version) = self.id.split('-').nth(2) else {
            return true;
        };
        for (part, min) in version.split('.').zip(MIN) {
            match part.parse::<u32>() {
                Ok(parsed) if parsed < min => return false,
                Ok(parsed) if parsed > min => return true,
                Ok(_) => continue,
                Err(_) => return true,
            }
        }
        true
    }

    /// The structured template, or an error naming the missing field.
    pub fn structured_arguments(&self) -> Result<&ArgumentsSpec, LauncherError> {
        self.arguments
            .as_ref()
            .ok_or(LauncherError::MissingManifestField("arguments"))
    }

    /// The legacy delimited argument string, or an error naming the field.
    pub fn legacy_arguments(&self) -> Result<&str, LauncherError> {
        self.minecraft_arguments
            .as_deref()
            .ok_or(LauncherError::MissingManifestField("minecraftArguments"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RuleContext {
        RuleContext {
            os_name: "linux".into(),
            os_version: "6.1.0".into(),
            os_arch: "x86_64".into(),
        }
    }

    fn os_rule(action: RuleAction, name: &str) -> Rule {
        Rule {
            action,
            os: Some(OsRule {
                name: Some(name.into()),
                version: None,
                arch: None,
            }),
            features: None,
        }
    }

    #[test]
    fn allow_on_current_os_is_satisfied() {
        let verdict = evaluate_rules(&[os_rule(RuleAction::Allow, "linux")], &ctx());
        assert!(verdict.satisfied);
    }

    #[test]
    fn allow_on_other_os_is_unsatisfied() {
        let verdict = evaluate_rules(&[os_rule(RuleAction::Allow, "osx")], &ctx());
        assert!(!verdict.satisfied);
    }

    #[test]
    fn disallow_on_other_os_is_satisfied() {
        let verdict = evaluate_rules(&[os_rule(RuleAction::Disallow, "osx")], &ctx());
        assert!(verdict.satisfied);
    }

    #[test]
    fn os_version_pattern_gates_the_match() {
        let mut rule = os_rule(RuleAction::Allow, "linux");
        rule.os.as_mut().unwrap().version = Some(r"^6\.".into());
        assert!(evaluate_rules(std::slice::from_ref(&rule), &ctx()).satisfied);

        rule.os.as_mut().unwrap().version = Some(r"^10\.".into());
        assert!(!evaluate_rules(std::slice::from_ref(&rule), &ctx()).satisfied);
    }

    #[test]
    fn arch_condition_gates_the_match() {
        let mut rule = Rule {
            action: RuleAction::Allow,
            os: Some(OsRule {
                name: None,
                version: None,
                arch: Some("x86".into()),
            }),
            features: None,
        };
        assert!(!evaluate_rules(std::slice::from_ref(&rule), &ctx()).satisfied);

        rule.os.as_mut().unwrap().arch = Some("x86_64".into());
        assert!(evaluate_rules(std::slice::from_ref(&rule), &ctx()).satisfied);
    }

    #[test]
    fn custom_resolution_feature_is_satisfied_and_flagged() {
        let rule = Rule {
            action: RuleAction::Allow,
            os: None,
            features: Some(RuleFeatures {
                has_custom_resolution: Some(true),
                other: HashMap::new(),
            }),
        };
        let verdict = evaluate_rules(&[rule], &ctx());
        assert!(verdict.satisfied);
        assert!(verdict.custom_resolution);
    }

    #[test]
    fn unrecognized_feature_rules_drop_the_block() {
        let demo: Rule = serde_json::from_value(serde_json::json!({
            "action": "allow",
            "features": { "is_demo_user": true }
        }))
        .unwrap();
        let verdict = evaluate_rules(std::slice::from_ref(&demo), &ctx());
        assert!(!verdict.satisfied);
        assert!(!verdict.custom_resolution);

        let quick_play: Rule = serde_json::from_value(serde_json::json!({
            "action": "allow",
            "features": { "is_quick_play_multiplayer": true }
        }))
        .unwrap();
        assert!(!evaluate_rules(&[quick_play], &ctx()).satisfied);
    }

    #[test]
    fn natives_only_library_requires_a_classifier_for_this_os() {
        let with_linux: LibraryEntry = serde_json::from_value(serde_json::json!({
            "name": "org.lwjgl:lwjgl:3.2.2",
            "natives": { "linux": "natives-linux", "windows": "natives-windows-${arch}" }
        }))
        .unwrap();
        let windows_only: LibraryEntry = serde_json::from_value(serde_json::json!({
            "name": "org.lwjgl:lwjgl:3.2.2",
            "natives": { "windows": "natives-windows" }
        }))
        .unwrap();

        assert!(with_linux.compatible(&ctx()));
        assert!(!windows_only.compatible(&ctx()));
        assert_eq!(
            with_linux.native_classifier(&ctx()),
            Some("natives-linux".to_string())
        );
    }

    #[test]
    fn loader_minor_version_parsing() {
        let manifest = LoaderManifest {
            id: "1.12.2-forge-14.23.5.2860".into(),
            main_class: "net.minecraft.launchwrapper.Launch".into(),
            arguments: None,
            minecraft_arguments: Some("--username ${auth_player_name}".into()),
        };
        assert!(manifest.mc_minor_at_most(12));
        assert!(!manifest.mc_minor_at_most(9));
        assert!(manifest.forge_requires_absolute_modlist());
    }

    #[test]
    fn old_forge_versions_use_relative_modlist_roots() {
        let old = LoaderManifest {
            id: "1.12.2-forge-14.23.2.1000".into(),
            main_class: "m".into(),
            arguments: None,
            minecraft_arguments: None,
        };
        assert!(!old.forge_requires_absolute_modlist());

        let ancient = LoaderManifest {
            id: "1.7.10-forge-10.13.4.1614".into(),
            main_class: "m".into(),
            arguments: None,
            minecraft_arguments: None,
        };
        assert!(!ancient.forge_requires_absolute_modlist());
    }

    #[test]
    fn unparseable_forge_versions_default_to_absolute() {
        let weird = LoaderManifest {
            id: "1.20.4-fancyloader".into(),
            main_class: "m".into(),
            arguments: None,
            minecraft_arguments: None,
        };
        assert!(weird.forge_requires_absolute_modlist());
    }
}
