// toprefix-core/src/build/cmake.rs
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

fn setup_line(config: &Config, args: &str) -> String {
    let mut line = format!(
        "cmake -S . -B {BUILD_DIR} -G Ninja -DCMAKE_INSTALL_PREFIX={} -DCMAKE_BUILD_TYPE=Release",
        config.prefix().display()
    );
    push_args(&mut line, args);
    line
}

/// cmake has no separate reconfigure switch. Re-running the generate
/// command against an existing build directory is the incremental path.
fn configure(
    package: &str,
    source_dir: &Path,
    config: &Config,
    args: &str,
    options: ProcessOptions,
) -> Result<()> {
    let build_dir = source_dir.join(BUILD_DIR);
    match configure_action(build_dir.exists(), options) {
        ConfigureAction::Setup | ConfigureAction::Reconfigure => exec::run(
            package,
            Stage::Configure,
            &setup_line(config, args),
            source_dir,
        ),
        ConfigureAction::CleanThenSetup => {
            fs::remove_dir_all(&build_dir)?;
            exec::run(
                package,
                Stage::Configure,
                &setup_line(config, args),
                source_dir,
            )
        }
        ConfigureAction::Skip => {
            debug!("[{package}] configure: {BUILD_DIR}/ already generated");
            Ok(())
        }
    }
}

fn build(package: &str, source_dir: &Path) -> Result<()> {
    exec::run(
        package,
        Stage::Build,
        &format!("cmake --build {BUILD_DIR}"),
        source_dir,
    )
}

fn install(package: &str, source_dir: &Path) -> Result<()> {
    exec::run(
        package,
        Stage::Install,
        &format!("cmake --install {BUILD_DIR}"),
        source_dir,
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn setup_line_pins_generator_prefix_and_build_type() {
        let config = Config {
            prefix: PathBuf::from("/opt/stage"),
            src_dir: PathBuf::from("/tmp/src"),
            local_bin_dir: PathBuf::from("/tmp/bin"),
            config_dir: PathBuf::from("/tmp/config"),
        };
        assert_eq!(
            setup_line(&config, "-DENABLE_DOCS=OFF"),
            "cmake -S . -B build -G Ninja -DCMAKE_INSTALL_PREFIX=/opt/stage \
             -DCMAKE_BUILD_TYPE=Release -DENABLE_DOCS=OFF"
        );
    }
}
