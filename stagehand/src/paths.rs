use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::{Mutex, MutexGuard, OnceLock};

/// Instance config file name, looked up in the working directory.
pub const INSTANCE_CONFIG_FILE: &str = "stagehand.toml";

/// Get Stagehand's global home directory.
///
/// `STAGEHAND_HOME` wins when set and non-empty, otherwise `~/.stagehand`.
pub fn stagehand_home_dir() -> Result<PathBuf, std::io::Error> {
    if let Ok(v) = std::env::var("STAGEHAND_HOME")
        && !v.trim().is_empty()
    {
        return Ok(PathBuf::from(v));
    }

    let home = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        )
    })?;

    Ok(home.join(".stagehand"))
}

/// Path of the instance config inside `dir`.
pub fn instance_config_path(dir: &Path) -> PathBuf {
    dir.join(INSTANCE_CONFIG_FILE)
}

/// Candidate dotenv files for `stage`, most specific first.
pub fn stage_env_files(dir: &Path, stage: &str) -> [PathBuf; 2] {
    [dir.join(format!(".env.{stage}")), dir.join(".env")]
}

#[cfg(test)]
pub(crate) fn test_home_env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stagehand_home_dir_respects_env_override() {
        let _lock = test_home_env_lock();
        let previous = std::env::var_os("STAGEHAND_HOME");
        let temp = TempDir::new().unwrap();
        unsafe {
            std::env::set_var("STAGEHAND_HOME", temp.path());
        }
        let got = stagehand_home_dir().unwrap();
        match previous {
            Some(value) => unsafe { std::env::set_var("STAGEHAND_HOME", value) },
            None => unsafe { std::env::remove_var("STAGEHAND_HOME") },
        }
        assert_eq!(got, temp.path());
    }

    #[test]
    fn stagehand_home_dir_ignores_blank_override() {
        let _lock = test_home_env_lock();
        let previous = std::env::var_os("STAGEHAND_HOME");
        unsafe {
            std::env::set_var("STAGEHAND_HOME", "  ");
        }
        let got = stagehand_home_dir();
        match previous {
            Some(value) => unsafe { std::env::set_var("STAGEHAND_HOME", value) },
            None => unsafe { std::env::remove_var("STAGEHAND_HOME") },
        }
        if let Ok(path) = got {
            assert!(path.ends_with(".stagehand"));
        }
    }

    #[test]
    fn stage_env_files_prefers_stage_specific_file() {
        let files = stage_env_files(Path::new("/srv/app"), "prod");
        assert_eq!(files[0], PathBuf::from("/srv/app/.env.prod"));
        assert_eq!(files[1], PathBuf::from("/srv/app/.env"));
    }

    #[test]
    fn instance_config_path_joins_file_name() {
        assert_eq!(
            instance_config_path(Path::new("/srv/app")),
            PathBuf::from("/srv/app/stagehand.toml")
        );
    }
}
