//! Project layout scaffolding for Jig applications.
//!
//! Creates the expected folders and an empty `.env` file under a root path.
//! Every operation is idempotent: existing folders and files are left as is.

use anyhow::{Context, Result};
use std::fs::{DirBuilder, OpenOptions};
use std::path::Path;
use tracing::{debug, info};

/// Folders a Jig application expects under its root.
pub const PROJECT_FOLDERS: &[&str] = &[
    "models",
    "templates",
    "controllers",
    "config",
    "migrations",
    "tmp",
    "public",
    "logs",
];

/// Name of the environment file ensured at the root.
pub const ENV_FILE: &str = ".env";

/// Create `path` (and missing parents) if it does not exist.
pub fn create_dir_if_not_exist(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder
        .create(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))?;

    debug!("Created directory {}", path.display());
    Ok(())
}

/// Create an empty file at `path` unless one already exists.
///
/// Existing content is never truncated.
pub fn create_file_if_not_exists(path: &Path) -> Result<()> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to create file {}", path.display()))?;
    Ok(())
}

/// Ensure `root` contains every folder in `folders` plus an `.env` file.
///
/// # Arguments
/// * `root` - Application root; created if missing
/// * `folders` - Folder names relative to `root`
pub fn ensure_project_layout<P: AsRef<Path>>(root: P, folders: &[&str]) -> Result<()> {
    let root = root.as_ref();
    create_dir_if_not_exist(root)?;
    for folder in folders {
        create_dir_if_not_exist(&root.join(folder))?;
    }
    create_file_if_not_exists(&root.join(ENV_FILE))?;

    info!("Project layout ready at {}", root.display());
    Ok(())
}

/// Ensure the default Jig layout under `root`.
pub fn init_project<P: AsRef<Path>>(root: P) -> Result<()> {
    ensure_project_layout(root, PROJECT_FOLDERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_creates_default_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("myapp");

        init_project(&root).unwrap();

        for folder in PROJECT_FOLDERS {
            assert!(root.join(folder).is_dir(), "missing {}", folder);
        }
        assert!(root.join(ENV_FILE).is_file());
    }

    #[test]
    fn test_is_idempotent_and_keeps_env() {
        let dir = tempfile::tempdir().unwrap();
        init_project(dir.path()).unwrap();
        fs::write(dir.path().join(ENV_FILE), "DEBUG=true\n").unwrap();
        fs::write(dir.path().join("logs").join("app.log"), "kept\n").unwrap();

        init_project(dir.path()).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join(ENV_FILE)).unwrap(), "DEBUG=true\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("logs").join("app.log")).unwrap(),
            "kept\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_folder_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        ensure_project_layout(dir.path(), &["public"]).unwrap();

        let mode = fs::metadata(dir.path().join("public")).unwrap().permissions().mode();
        // The process umask can only clear bits.
        assert_eq!(mode & 0o700, 0o700);
        assert_eq!(mode & 0o022, 0);
    }

    #[test]
    fn test_fails_when_root_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        fs::write(&file, "").unwrap();

        assert!(ensure_project_layout(&file, &["models"]).is_err());
    }
}
