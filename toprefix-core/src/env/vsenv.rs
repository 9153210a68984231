// toprefix-core/src/env/vsenv.rs
//! Recovers the MSVC build environment by running `vcvars64.bat` and
//! capturing the interpreter's `set` dump.
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::os::windows::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde_json::Value;
use toprefix_common::error::{Result, ToprefixError};
use tracing::debug;

use super::{
    filter_toolchain_vars, find_install_path, parse_env_dump, product_display_name, select_x64_kit,
    Environment,
};

const VCVARS_RELATIVE: &str = r"VC\Auxiliary\Build\vcvars64.bat";
const VSWHERE_RELATIVE: &str = r"Microsoft Visual Studio\Installer\vswhere.exe";

/// The toolchain variables to layer over `base`, already filtered to the
/// allow-list.
pub fn toolchain_env(base: &Environment) -> Result<HashMap<String, String>> {
    let vcvars = find_vcvars()?;
    let dump = capture_script_env(&vcvars, base)?;
    Ok(filter_toolchain_vars(parse_env_dump(&dump)))
}

/// Locates vcvars64.bat through the CMake Tools kit registry and the
/// Visual Studio installer metadata.
pub(super) fn find_vcvars() -> Result<PathBuf> {
    let local_app_data = std::env::var("LOCALAPPDATA").map_err(|_| {
        ToprefixError::ToolchainDiscovery("LOCALAPPDATA is not set".to_string())
    })?;
    let kits_file = PathBuf::from(local_app_data)
        .join("CMakeTools")
        .join("cmake-tools-kits.json");
    let text = fs::read_to_string(&kits_file).map_err(|e| {
        ToprefixError::ToolchainDiscovery(format!(
            "could not read {}: {e}",
            kits_file.display()
        ))
    })?;
    let kits: Value = serde_json::from_str(&text)?;
    let kit_name = select_x64_kit(&kits).ok_or_else(|| {
        ToprefixError::ToolchainDiscovery(format!(
            "no x64 host/target kit in {}",
            kits_file.display()
        ))
    })?;
    debug!("Selected kit: {}", kit_name);

    let display_name = product_display_name(&kit_name);
    let install_path = vs_install_path(&display_name)?;
    let vcvars = install_path.join(VCVARS_RELATIVE);
    if !vcvars.is_file() {
        return Err(ToprefixError::ToolchainDiscovery(format!(
            "{} does not exist",
            vcvars.display()
        )));
    }
    Ok(vcvars)
}

fn vs_install_path(display_name: &str) -> Result<PathBuf> {
    let program_files = std::env::var("ProgramFiles(x86)").map_err(|_| {
        ToprefixError::ToolchainDiscovery("ProgramFiles(x86) is not set".to_string())
    })?;
    let vswhere = PathBuf::from(program_files).join(VSWHERE_RELATIVE);
    let output = Command::new(&vswhere)
        .args(["-products", "*", "-utf8", "-format", "json"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            ToprefixError::ToolchainDiscovery(format!(
                "failed to run {}: {e}",
                vswhere.display()
            ))
        })?;
    if !output.status.success() {
        return Err(ToprefixError::ToolchainDiscovery(format!(
            "{} exited with {}",
            vswhere.display(),
            output.status
        )));
    }
    let products: Value = serde_json::from_slice(&output.stdout)?;
    find_install_path(&products, display_name).ok_or_else(|| {
        ToprefixError::ToolchainDiscovery(format!(
            "no Visual Studio product named '{display_name}'"
        ))
    })
}

/// Spawns `%ComSpec% /k <script> & set & exit` under `base` and returns
/// the raw dump. Lines that are not valid UTF-8 are decoded lossily.
fn capture_script_env(script: &Path, base: &Environment) -> Result<String> {
    let comspec = base.get("ComSpec").ok_or_else(|| {
        ToprefixError::ToolchainDiscovery("ComSpec is not set".to_string())
    })?;

    debug!("Capturing environment from {}", script.display());
    let mut command = Command::new(comspec);
    command.arg("/k");
    command.arg(script);
    command.raw_arg("& set & exit");
    base.apply_to_command(&mut command);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::null());

    let mut child = command.spawn().map_err(|e| {
        ToprefixError::ToolchainDiscovery(format!(
            "failed to spawn {}: {e}",
            script.display()
        ))
    })?;
    let stdout = child.stdout.take().ok_or_else(|| {
        ToprefixError::ToolchainDiscovery("interpreter stdout was not captured".to_string())
    })?;

    let mut reader = BufReader::new(stdout);
    let mut dump = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        dump.push_str(&String::from_utf8_lossy(&buf));
    }

    let status = child.wait()?;
    if !status.success() {
        return Err(ToprefixError::ToolchainDiscovery(format!(
            "'{}' exited with {status}",
            script.display()
        )));
    }
    Ok(dump)
}
