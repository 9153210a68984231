// toprefix/src/cli/report.rs
//! The no-subcommand diagnostic: whether the shell is wired to use the
//! prefix, and which build tools resolve on the ambient PATH.
use std::env;
use std::path::Path;

use colored::Colorize;
use toprefix_common::config::{unexpand_tilde, Config};
use which::which;

pub fn print(config: &Config) {
    let home = config.home_dir();
    println!();
    println!("environment:");
    println!(
        "  TOOLS: {}",
        unexpand_tilde(config.local_bin_dir(), &home).cyan()
    );
    println!(
        "  PREFIX: {}",
        unexpand_tilde(config.prefix(), &home).cyan()
    );
    check_prefix_env_path(config, "PATH", "bin");
    if cfg!(windows) {
        check_prefix_env_path(config, "PKG_CONFIG_PATH", "lib/pkgconfig");
    } else {
        check_prefix_env_path(config, "LD_LIBRARY_PATH", "lib64");
        check_prefix_env_path(config, "PKG_CONFIG_PATH", "lib64/pkgconfig");
    }
    check_prefix_env_path(config, "PKG_CONFIG_PATH", "share/pkgconfig");
    println!("  SRC: {}", unexpand_tilde(config.src_dir(), &home).cyan());
    println!();

    #[cfg(windows)]
    print_toolchain();

    println!("tools:");
    print_cmd(&["pkg-config"]);
    print_cmd(&["flex", "win_flex"]);
    print_cmd(&["bison", "win_bison"]);
    print_cmd(&["ninja"]);
    print_cmd(&["cmake"]);
    print_cmd(&["meson"]);
    print_cmd(&["make"]);
    print_cmd(&["m4"]);
    print_cmd(&["perl"]);
    println!();
}

#[cfg(windows)]
fn print_toolchain() {
    match toprefix_core::env::toolchain_script() {
        Ok(script) => println!("vcenv: {}", script.display().to_string().cyan()),
        Err(e) => println!("vcenv: {}", e.to_string().red()),
    }
    println!();
}

fn check_prefix_env_path(config: &Config, key: &str, value: &str) {
    let wanted = config.prefix().join(value);
    let state = if ambient_path_contains(key, &wanted) {
        "True".green()
    } else {
        "False".red()
    };
    println!("        ENV{{{key}}} has {{PREFIX}}/{value}: {state}");
}

fn ambient_path_contains(key: &str, wanted: &Path) -> bool {
    match env::var_os(key) {
        Some(joined) => env::split_paths(&joined).any(|entry| entry == wanted),
        None => false,
    }
}

/// Prints where the tool resolves, trying alternate names in order but
/// always reporting under the first.
fn print_cmd(names: &[&str]) {
    for name in names {
        if let Ok(found) = which(name) {
            println!("    {}: {}", names[0], found.display().to_string().green());
            return;
        }
    }
    println!("    {}: {}", names[0], "not found".red());
}
