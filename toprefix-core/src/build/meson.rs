// toprefix-core/src/build/meson.rs
use std::fs;
use std::path::Path;

use toprefix_common::config::Config;
use toprefix_common::error::{Result, Stage};
use tracing::debug;

use super::{configure_action, push_args, ConfigureAction, ProcessOptions, BUILD_DIR};
use crate::exec;

pub(super) fn process(
    package: &str,
    source_dir: &Path,
    config: &Config,
    args: &str,
    options: ProcessOptions,
) -> Result<()> {
    configure(package, source_dir, config, args, options)?;
    build(package, source_dir)?;
    install(package, source_dir)
}

fn setup_line(config: &Config, args: &str, reconfigure: bool) -> String {
    let mut line = format!("meson setup {BUILD_DIR} --prefix {}", config.prefix().display());
    push_args(&mut line, args);
    if reconfigure {
        line.push_str(" --reconfigure");
    }
    line
}

fn configure(
    package: &str,
    source_dir: &Path,
    config: &Config,
    args: &str,
    options: ProcessOptions,
) -> Result<()> {
    let build_dir = source_dir.join(BUILD_DIR);
    match configure_action(build_dir.exists(), options) {
        ConfigureAction::Setup => exec::run(
            package,
            Stage::Configure,
            &setup_line(config, args, false),
            source_dir,
        ),
        ConfigureAction::CleanThenSetup => {
            fs::remove_dir_all(&build_dir)?;
            exec::run(
                package,
                Stage::Configure,
                &setup_line(config, args, false),
                source_dir,
            )
        }
        ConfigureAction::Reconfigure => exec::run(
            package,
            Stage::Configure,
            &setup_line(config, args, true),
            source_dir,
        ),
        ConfigureAction::Skip => {
            debug!("[{package}] configure: {BUILD_DIR}/ already set up");
            Ok(())
        }
    }
}

fn build(package: &str, source_dir: &Path) -> Result<()> {
    exec::run(
        package,
        Stage::Build,
        &format!("meson compile -C {BUILD_DIR}"),
        source_dir,
    )
}

fn install(package: &str, source_dir: &Path) -> Result<()> {
    exec::run(
        package,
        Stage::Install,
        &format!("meson install -C {BUILD_DIR}"),
        source_dir,
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn test_config() -> Config {
        Config {
            prefix: PathBuf::from("/home/me/prefix"),
            src_dir: PathBuf::from("/home/me/local/src"),
            local_bin_dir: PathBuf::from("/home/me/local/bin"),
            config_dir: PathBuf::from("/home/me/.config/toprefix"),
        }
    }

    #[test]
    fn setup_line_places_args_before_the_reconfigure_flag() {
        let config = test_config();
        assert_eq!(
            setup_line(&config, "", false),
            "meson setup build --prefix /home/me/prefix"
        );
        assert_eq!(
            setup_line(&config, "-Dtests=false", false),
            "meson setup build --prefix /home/me/prefix -Dtests=false"
        );
        assert_eq!(
            setup_line(&config, "-Dtests=false", true),
            "meson setup build --prefix /home/me/prefix -Dtests=false --reconfigure"
        );
    }
}
