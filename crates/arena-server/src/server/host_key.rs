//! Persistent host key

use std::path::Path;

use anyhow::{Context, Result};
use russh_keys::key::KeyPair;
use ssh_key::{Algorithm, LineEnding, PrivateKey};

/// Load the host key at `path`, generating and saving a new Ed25519 key
/// first if the file does not exist.
///
/// An unreadable or malformed key file is an error; it is never replaced.
pub async fn load_or_generate_host_key(path: &Path) -> Result<KeyPair> {
    if !path.exists() {
        tracing::info!("Generating new host key at {:?}", path);

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let key = PrivateKey::random(&mut rand::rngs::OsRng, Algorithm::Ed25519)
            .context("Failed to generate Ed25519 key")?;
        key.write_openssh_file(path, LineEnding::LF)
            .with_context(|| format!("Failed to write host key to {:?}", path))?;
    }

    tracing::info!("Loading host key from {:?}", path);
    russh_keys::load_secret_key(path, None)
        .with_context(|| format!("Failed to load host key from {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fingerprint(key: &KeyPair) -> String {
        key.clone_public_key().unwrap().fingerprint()
    }

    #[tokio::test]
    async fn test_generated_key_is_reused() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("keys").join("host_key");

        let first = load_or_generate_host_key(&path).await.unwrap();
        assert!(path.exists());

        let second = load_or_generate_host_key(&path).await.unwrap();
        assert_eq!(fingerprint(&first), fingerprint(&second));
    }

    #[tokio::test]
    async fn test_corrupt_key_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("host_key");
        std::fs::write(&path, "not a key").unwrap();

        assert!(load_or_generate_host_key(&path).await.is_err());
        // the file is left alone
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not a key");
    }
}
