// ─── Argument Template Engine ───
// Renders the JVM/game argument vector for one launch. Two template eras
// exist: the legacy single-string form (pre-1.13) and the structured
// rule-bearing form, both fed from one substitution table.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;

use crate::core::auth::AuthSession;
use crate::core::distribution::ServerEntry;
use crate::core::error::LauncherResult;
use crate::core::launch::classpath::classpath_separator;
use crate::core::launch::modlist::LEGACY_FORGE_LIST;
use crate::core::launch::resolver::ResolutionResult;
use crate::core::manifest::{evaluate_rules, LoaderManifest, Rule, RuleContext, VersionManifest};
use crate::core::settings::{DataPaths, LaunchSettings};
use crate::core::version::version_at_least;

pub const LAUNCHER_NAME: &str = "Embark";
pub const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

const LITELOADER_TWEAK_CLASS: &str = "com.mumfrey.liteloader.launch.LiteLoaderTweaker";

/// Everything the template engine reads while rendering one launch.
pub struct ArgumentContext<'a> {
    pub server: &'a ServerEntry,
    pub vanilla: &'a VersionManifest,
    pub loader: Option<&'a LoaderManifest>,
    pub session: &'a AuthSession,
    pub settings: &'a LaunchSettings,
    pub paths: &'a DataPaths,
    pub instance_dir: &'a Path,
    pub natives_dir: &'a Path,
    pub classpath: &'a [String],
    pub resolution: &'a ResolutionResult,
    pub rule_ctx: &'a RuleContext,
}

impl ArgumentContext<'_> {
    pub fn main_class(&self) -> &str {
        match self.loader {
            Some(loader) => &loader.main_class,
            None => &self.vanilla.main_class,
        }
    }

    fn memory_args(&self) -> Vec<String> {
        vec![
            format!("-Xmx{}M", self.settings.max_ram_mb),
            format!("-Xms{}M", self.settings.min_ram_mb),
        ]
    }

    fn dock_args(&self) -> Vec<String> {
        if cfg!(target_os = "macos") {
            vec![format!("-Xdock:name={}", LAUNCHER_NAME)]
        } else {
            Vec::new()
        }
    }

    /// Join-the-server arguments. Quick play replaced the explicit
    /// server/port pair in 1.20.
    fn autoconnect_args(&self) -> Vec<String> {
        if !(self.settings.auto_connect && self.server.autoconnect) {
            return Vec::new();
        }
        if version_at_least("1.20", &self.server.minecraft_version) {
            vec!["--quickPlayMultiplayer".into(), self.server.address()]
        } else {
            vec![
                "--server".into(),
                self.server.hostname.clone(),
                "--port".into(),
                self.server.port.to_string(),
            ]
        }
    }

    fn resolution_args(&self) -> Vec<String> {
        if self.settings.fullscreen {
            vec!["--fullscreen".into(), "true".into()]
        } else {
            vec![
                "--width".into(),
                self.settings.game_width.to_string(),
                "--height".into(),
                self.settings.game_height.to_string(),
            ]
        }
    }
}

// ─── Substitution Table ───

/// Central `${identifier}` substitution table. Game-side identifiers replace
/// the whole token; a small JVM-side set replaces the placeholder in place,
/// keeping the surrounding flag text. Unknown identifiers are left literal.
pub struct Substitutions {
    whole: HashMap<&'static str, String>,
    partial: HashMap<&'static str, String>,
    pattern: Regex,
}

impl Substitutions {
    pub fn build(cx: &ArgumentContext<'_>) -> Self {
        let mut whole = HashMap::new();
        whole.insert("auth_player_name", cx.session.display_name.clone());
        whole.insert("version_name", cx.server.id.clone());
        whole.insert(
            "game_directory",
            cx.instance_dir.to_string_lossy().into_owned(),
        );
        whole.insert(
            "assets_root",
            cx.paths.assets_dir().to_string_lossy().into_owned(),
        );
        whole.insert("assets_index_name", cx.vanilla.assets.clone());
        whole.insert("auth_uuid", cx.session.uuid.clone());
        whole.insert("auth_access_token", cx.session.access_token.clone());
        whole.insert("auth_session", cx.session.access_token.clone());
        whole.insert("user_type", cx.session.kind.user_type_arg().to_string());
        whole.insert("user_properties", "{}".to_string());
        whole.insert("version_type", cx.vanilla.release_type.clone());
        whole.insert("resolution_width", cx.settings.game_width.to_string());
        whole.insert("resolution_height", cx.settings.game_height.to_string());

        let mut partial = HashMap::new();
        partial.insert(
            "natives_directory",
            cx.natives_dir.to_string_lossy().into_owned(),
        );
        partial.insert("launcher_name", LAUNCHER_NAME.to_string());
        partial.insert("launcher_version", LAUNCHER_VERSION.to_string());
        partial.insert("classpath", cx.classpath.join(classpath_separator()));

        Self {
            whole,
            partial,
            pattern: Regex::new(r"\$\{([^}]+)\}").expect("static pattern"),
        }
    }

    /// Render one template token. `${id}` from the game-side table replaces
    /// the whole token; the JVM-side set substitutes in place.
    pub fn apply(&self, token: &str) -> String {
        let Some(captures) = self.pattern.captures(token) else {
            return token.to_string();
        };
        let identifier = &captures[1];
        if let Some(value) = self.whole.get(identifier) {
            return value.clone();
        }
        if let Some(value) = self.partial.get(identifier) {
            return self
                .pattern
                .replace(token, regex::NoExpand(value.as_str()))
                .into_owned();
        }
        token.to_string()
    }
}

// ─── Legacy Era (pre-1.13) ───

/// Renders the legacy single-string template: classpath and natives via
/// dedicated flags, tokens substituted one by one, mod lists referenced via
/// loader-specific arguments.
pub struct LegacyArguments<'a> {
    pub cx: &'a ArgumentContext<'a>,
    /// Legacy Forge mod-list file, when one was written.
    pub forge_list: Option<&'a Path>,
    /// Legacy LiteLoader mod-list file, when LiteLoader is active.
    pub liteloader_list: Option<&'a Path>,
}

impl LegacyArguments<'_> {
    pub fn build(&self) -> LauncherResult<Vec<String>> {
        let cx = self.cx;
        let subs = Substitutions::build(cx);

        let mut args: Vec<String> = vec![
            "-cp".into(),
            cx.classpath.join(classpath_separator()),
        ];
        args.extend(cx.dock_args());
        args.extend(cx.memory_args());
        args.extend(cx.settings.jvm_options.iter().cloned());
        args.push(format!(
            "-Djava.library.path={}",
            cx.natives_dir.to_string_lossy()
        ));
        args.push(cx.main_class().to_string());
        args.extend(self.game_args(&subs)?);
        Ok(args)
    }

    fn game_args(&self, subs: &Substitutions) -> LauncherResult<Vec<String>> {
        let cx = self.cx;
        let template = match cx.loader {
            Some(loader) => loader.legacy_arguments()?,
            None => cx.vanilla.minecraft_arguments.as_deref().unwrap_or(""),
        };

        let mut game: Vec<String> = template
            .split_whitespace()
            .map(|token| subs.apply(token))
            .collect();

        game.extend(cx.autoconnect_args());
        game.extend(cx.resolution_args());

        if let (Some(forge_list), Some(loader)) = (self.forge_list, cx.loader) {
            game.push("--modListFile".into());
            // Very old Forge only accepts a bare filename here.
            if loader.mc_minor_at_most(9) {
                game.push(LEGACY_FORGE_LIST.into());
            } else {
                game.push(format!("absolute:{}", forge_list.to_string_lossy()));
            }
        }

        if let Some(ll_list) = self.liteloader_list {
            game.push("--modRepo".into());
            game.push(ll_list.to_string_lossy().into_owned());
            game.insert(0, LITELOADER_TWEAK_CLASS.into());
            game.insert(0, "--tweakClass".into());
        }

        Ok(game)
    }
}

// ─── Modern Era (1.13+) ───

/// Renders the structured rule-bearing template: vanilla JVM and game
/// blocks with conditional entries, loader JVM strings with their own
/// replacement set, loader game arguments appended last.
pub struct ModernArguments<'a> {
    pub cx: &'a ArgumentContext<'a>,
}

impl ModernArguments<'_> {
    pub fn build(&self) -> LauncherResult<Vec<String>> {
        let cx = self.cx;
        let subs = Substitutions::build(cx);
        let vanilla_args = cx.vanilla.arguments.clone().unwrap_or_default();

        let mut args: Vec<String> = Vec::new();
        self.render_block(&vanilla_args.jvm, &subs, &mut args);
        args.extend(self.loader_jvm_args()?);
        args.extend(cx.dock_args());
        args.extend(cx.memory_args());
        args.extend(cx.settings.jvm_options.iter().cloned());
        args.push(cx.main_class().to_string());
        self.render_block(&vanilla_args.game, &subs, &mut args);
        args.extend(cx.autoconnect_args());
        args.extend(self.loader_game_args()?);
        Ok(args)
    }

    /// Loader JVM strings carry their own replacement set, rooted in the
    /// shared library directory.
    fn loader_jvm_args(&self) -> LauncherResult<Vec<String>> {
        let cx = self.cx;
        let Some(loader) = cx.loader else {
            return Ok(Vec::new());
        };
        let lib_dir = cx.paths.libraries_dir().to_string_lossy().into_owned();
        Ok(loader
            .structured_arguments()?
            .jvm
            .iter()
            .filter_map(|value| value.as_str())
            .map(|raw| {
                raw.replace("${library_directory}", &lib_dir)
                    .replace("${classpath_separator}", classpath_separator())
                    .replace("${version_name}", &loader.id)
            })
            .collect())
    }

    fn loader_game_args(&self) -> LauncherResult<Vec<String>> {
        let Some(loader) = self.cx.loader else {
            return Ok(Vec::new());
        };
        Ok(loader
            .structured_arguments()?
            .game
            .iter()
            .filter_map(|value| value.as_str())
            .map(str::to_string)
            .collect())
    }

    /// Render one vanilla argument block: plain strings are substituted,
    /// rule-bearing objects apply only when every rule is satisfied. A
    /// satisfied custom-resolution rule swaps its value for the fullscreen
    /// pair when fullscreen is configured.
    fn render_block(
        &self,
        block: &[serde_json::Value],
        subs: &Substitutions,
        out: &mut Vec<String>,
    ) {
        for entry in block {
            match entry {
                serde_json::Value::String(token) => out.push(subs.apply(token)),
                serde_json::Value::Object(obj) => {
                    let Some(rules) = obj
                        .get("rules")
                        .and_then(|r| serde_json::from_value::<Vec<Rule>>(r.clone()).ok())
                    else {
                        continue;
                    };
                    let verdict = evaluate_rules(&rules, self.cx.rule_ctx);
                    if !verdict.satisfied {
                        continue;
                    }
                    if verdict.custom_resolution && self.cx.settings.fullscreen {
                        out.push("--fullscreen".into());
                        out.push("true".into());
                        continue;
                    }
                    match obj.get("value") {
                        Some(serde_json::Value::String(token)) => out.push(subs.apply(token)),
                        Some(serde_json::Value::Array(tokens)) => out.extend(
                            tokens
                                .iter()
                                .filter_map(|v| v.as_str())
                                .map(|token| subs.apply(token)),
                        ),
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }
}

/// Era-dispatching entry point: the structured template applies from 1.13.
pub fn uses_modern_arguments(minecraft_version: &str) -> bool {
    version_at_least("1.13", minecraft_version)
}
