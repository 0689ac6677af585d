//! Local staging files.
//!
//! Secrets are edited as `envs/<environment>.env` files in canonical form.
//! The directory only exists between a pull and the following push.

#[cfg(unix)]
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::codec::{self, SecretBundle};
use crate::core::constants;
use crate::core::types::VersionId;
use crate::error::{Result, SyncError};

/// The staging directory of a project.
#[derive(Debug, Clone)]
pub struct Staging {
    dir: PathBuf,
}

impl Staging {
    /// Staging directory under a project root.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(constants::ENVS_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Create the directory if missing.
    pub fn create(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Path of one environment's file.
    pub fn env_path(&self, env: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", env, constants::ENV_EXTENSION))
    }

    /// Remove the directory and everything in it.
    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => {
                debug!(dir = %self.dir.display(), "staging removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read and decode one environment's file, then rewrite it canonically.
    ///
    /// Returns the bundle and the version id of its canonical form.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::MissingEnvFile` if the file is absent and
    /// `SyncError::InvalidEnvFile` with the offending line if it is malformed.
    pub fn normalize(&self, env: &str) -> Result<(SecretBundle, VersionId)> {
        let path = self.env_path(env);
        if !path.exists() {
            return Err(SyncError::MissingEnvFile(path.display().to_string()).into());
        }

        let text = std::fs::read_to_string(&path)?;
        let (bundle, canonical, id) =
            codec::normalize(&text, env).map_err(|source| SyncError::InvalidEnvFile {
                path: path.display().to_string(),
                source,
            })?;

        if canonical != text {
            debug!(env, "normalizing staged file");
            write_secure(&path, &canonical)?;
        }

        Ok((bundle, id))
    }

    /// Write a bundle canonically for an environment.
    pub fn write(&self, env: &str, bundle: &SecretBundle) -> Result<PathBuf> {
        let path = self.env_path(env);
        write_secure(&path, &codec::encode(bundle, env))?;
        Ok(path)
    }

    /// Copy an existing environment file to `<file>.bak`.
    pub fn backup(&self, env: &str) -> Result<PathBuf> {
        let path = self.env_path(env);
        let backup = PathBuf::from(format!("{}.bak", path.display()));
        std::fs::copy(&path, &backup)?;
        Ok(backup)
    }
}

/// Write a file readable only by its owner.
///
/// # Errors
///
/// Returns error if the file cannot be written.
pub fn write_secure(path: &Path, content: &str) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        // Ensure secure permissions even when overwriting an existing file.
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, content)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_rewrites_file_canonically() {
        let tmp = TempDir::new().unwrap();
        let staging = Staging::new(tmp.path());
        staging.create().unwrap();
        fs::write(staging.env_path("test"), "DB_PORT=5432\nDB_HOST=db\n").unwrap();

        let (bundle, id) = staging.normalize("test").unwrap();

        let on_disk = fs::read_to_string(staging.env_path("test")).unwrap();
        assert_eq!(on_disk, codec::encode(&bundle, "test"));
        assert_eq!(id, codec::version_id(&on_disk));
    }

    #[test]
    fn test_normalize_reports_offending_line() {
        let tmp = TempDir::new().unwrap();
        let staging = Staging::new(tmp.path());
        staging.create().unwrap();
        fs::write(staging.env_path("qa"), "OK=1\nBROKEN LINE\n").unwrap();

        let err = staging.normalize("qa").unwrap_err();
        assert!(err.to_string().contains("BROKEN LINE"));
        // The file is left untouched on failure.
        assert_eq!(
            fs::read_to_string(staging.env_path("qa")).unwrap(),
            "OK=1\nBROKEN LINE\n"
        );
    }

    #[test]
    fn test_normalize_missing_file() {
        let tmp = TempDir::new().unwrap();
        let staging = Staging::new(tmp.path());
        staging.create().unwrap();
        assert!(matches!(
            staging.normalize("nope"),
            Err(crate::error::Error::Sync(SyncError::MissingEnvFile(_)))
        ));
    }

    #[test]
    fn test_backup_and_remove() {
        let tmp = TempDir::new().unwrap();
        let staging = Staging::new(tmp.path());
        staging.create().unwrap();
        let bundle: SecretBundle = [("A", "1")].into_iter().collect();
        staging.write("local", &bundle).unwrap();

        let backup = staging.backup("local").unwrap();
        assert!(backup.ends_with("local.env.bak"));
        assert!(backup.exists());

        staging.remove().unwrap();
        assert!(!staging.exists());
        // Removing twice is fine.
        staging.remove().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_write_sets_secure_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let staging = Staging::new(tmp.path());
        staging.create().unwrap();
        let path = staging.write("local", &SecretBundle::new()).unwrap();

        let mode = fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
