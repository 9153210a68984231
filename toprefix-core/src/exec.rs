// toprefix-core/src/exec.rs
use std::path::Path;
use std::process::{Command, Stdio};

use toprefix_common::error::{Result, Stage, ToprefixError};
use tracing::{debug, error, info};

use crate::env::Environment;

/// Runs one shell command line for `package`.
///
/// Every subprocess the pipeline spawns goes through here: an explicit
/// working directory, a freshly resolved environment snapshot, and output
/// captured for the log. Non-zero exit is a `CommandFailed` carrying the
/// package, stage and command line.
pub fn run(package: &str, stage: Stage, line: &str, cwd: &Path) -> Result<()> {
    let env = Environment::resolve()?;
    run_with_env(package, stage, line, cwd, &env)
}

pub fn run_with_env(
    package: &str,
    stage: Stage,
    line: &str,
    cwd: &Path,
    env: &Environment,
) -> Result<()> {
    info!("[{package}] {stage}: {line}");
    let mut command = shell_command(line);
    command.current_dir(cwd);
    command.stdin(Stdio::null());
    env.apply_to_command(&mut command);

    let output = command.output().map_err(|e| ToprefixError::CommandFailed {
        package: package.to_string(),
        stage,
        command: line.to_string(),
        status: format!("failed to spawn: {e}"),
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() {
        error!(
            "[{package}] {stage} command failed ({}) in {}: {line}",
            output.status,
            cwd.display()
        );
        if !stdout.trim().is_empty() {
            error!("--- stdout ---\n{}", stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            error!("--- stderr ---\n{}", stderr.trim_end());
        }
        return Err(ToprefixError::CommandFailed {
            package: package.to_string(),
            stage,
            command: line.to_string(),
            status: output.status.to_string(),
        });
    }

    if !stdout.trim().is_empty() {
        debug!("{}", stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        debug!("{}", stderr.trim_end());
    }
    Ok(())
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c");
    command.arg(line);
    command
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    use std::os::windows::process::CommandExt;

    let comspec = std::env::var("ComSpec").unwrap_or_else(|_| "cmd.exe".to_string());
    let mut command = Command::new(comspec);
    command.arg("/C");
    command.raw_arg(line);
    command
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[cfg(unix)]
    fn test_env() -> Environment {
        Environment::from_vars(HashMap::from([(
            "PATH".to_string(),
            "/bin:/usr/bin".to_string(),
        )]))
    }

    #[cfg(unix)]
    #[test]
    fn zero_exit_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        run_with_env("demo", Stage::Build, "true", dir.path(), &test_env()).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn commands_run_in_the_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        run_with_env(
            "demo",
            Stage::Build,
            "touch created_here",
            dir.path(),
            &test_env(),
        )
        .unwrap();
        assert!(dir.path().join("created_here").exists());
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_reports_package_and_stage() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_with_env("demo", Stage::Configure, "exit 3", dir.path(), &test_env())
            .unwrap_err();
        match err {
            ToprefixError::CommandFailed {
                package,
                stage,
                command,
                status,
            } => {
                assert_eq!(package, "demo");
                assert_eq!(stage, Stage::Configure);
                assert_eq!(command, "exit 3");
                assert!(status.contains('3'));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn commands_do_not_see_ambient_variables() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("TOPREFIX_TEST_LEAK", "leaked");
        let err = run_with_env(
            "demo",
            Stage::Build,
            "test -z \"$TOPREFIX_TEST_LEAK\"",
            dir.path(),
            &test_env(),
        );
        std::env::remove_var("TOPREFIX_TEST_LEAK");
        err.unwrap();
    }
}
