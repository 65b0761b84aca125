//! Dependency and privilege checks

use std::env;
use std::path::{Path, PathBuf};

use airhook_common::{AirhookError, AirhookResult, ToolRunner};

/// Locate `program` on `PATH`. Paths containing a separator are checked as-is.
pub fn which(program: &str) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Names from `tools` the runner cannot find.
pub fn missing_tools<'a>(runner: &dyn ToolRunner, tools: &[&'a str]) -> Vec<&'a str> {
    tools
        .iter()
        .copied()
        .filter(|t| !runner.is_available(t))
        .collect()
}

/// Fail with `ToolMissing` listing every absent tool.
pub fn ensure_tools(runner: &dyn ToolRunner, tools: &[&str]) -> AirhookResult<()> {
    let missing = missing_tools(runner, tools);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AirhookError::ToolMissing(missing.join(", ")))
    }
}

/// Check if the process runs with root privileges
#[cfg(unix)]
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

pub fn ensure_root() -> AirhookResult<()> {
    if is_root() {
        Ok(())
    } else {
        Err(AirhookError::PermissionDenied(
            "monitor mode and frame injection require root, run with sudo".to_string(),
        ))
    }
}
