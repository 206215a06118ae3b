// ─── Platform Identity ───
// Mojang OS names and normalized architecture tokens used by library rules,
// natives classifiers and argument templates.

/// Mojang's name for the current platform, as used in manifest rules
/// and natives classifier maps.
pub fn mojang_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

/// Node-style architecture token for the running process.
///
/// Arch-tagged native artifacts (`...:natives-windows-arm64`) compare
/// against this value directly.
pub fn process_arch() -> &'static str {
    if cfg!(target_arch = "x86_64") {
        "x64"
    } else if cfg!(target_arch = "x86") {
        "ia32"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else {
        "unknown"
    }
}

/// Architecture token for the `${arch}` placeholder in natives classifiers
/// (`natives-windows-${arch}` → `natives-windows-64`). Mojang uses the bare
/// bit width here, i.e. the Node arch with the leading `x` removed.
pub fn classifier_arch() -> &'static str {
    match process_arch() {
        "x64" => "64",
        "ia32" => "ia32",
        other => other,
    }
}

/// Mojang's name for the current architecture, as used in `os.arch` rule
/// conditions.
pub fn mojang_arch() -> &'static str {
    if cfg!(target_arch = "x86_64") {
        "x86_64"
    } else if cfg!(target_arch = "x86") {
        "x86"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else {
        "unknown"
    }
}

/// Kernel release string, matched against `os.version` regex patterns in
/// manifest rules.
pub fn os_release() -> String {
    sysinfo::System::kernel_version().unwrap_or_default()
}
