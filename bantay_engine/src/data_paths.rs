use std::env;
use std::path::PathBuf;
use std::sync::LazyLock;

use crate::config::CONFIG_FILE;

/// Cached path of the configuration file used when none is given on the command line.
static CONFIG_PATH: LazyLock<PathBuf> = LazyLock::new(detect_config_path);

/// Path of the default configuration file.
pub fn config_path() -> PathBuf {
    CONFIG_PATH.clone()
}

/// Candidate config locations, most specific first.
fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE)];

    if let Ok(exe_path) = env::current_exe()
        && let Some(dir) = exe_path.parent()
    {
        candidates.push(dir.join(CONFIG_FILE));
    }

    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("bantay").join(CONFIG_FILE));
    }

    candidates
}

/// Resolve the most likely location of the configuration file.
fn detect_config_path() -> PathBuf {
    config_candidates()
        .into_iter()
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_directory_is_checked_first() {
        let candidates = config_candidates();
        assert_eq!(candidates[0], PathBuf::from(CONFIG_FILE));
        assert!(candidates.iter().all(|c| c.ends_with(CONFIG_FILE)));
    }
}
