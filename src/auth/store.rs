use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::AuthError;
use super::token::Token;

const TOKEN_FILE_NAME: &str = "github-token";

/// Storage abstraction for the persisted GitHub token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<Token>, AuthError>;
    /// Persist `token`, returning the location it was written to.
    fn save(&self, token: &Token) -> Result<PathBuf, AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// Configuration for file-backed token storage.
#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    pub base_dir: PathBuf,
}

impl TokenStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }
}

/// Token store holding the raw access token in a single file.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never observes a partially written token.
///
/// # Example
/// ```no_run
/// use saml_to::auth::{FileTokenStore, Token, TokenStore, TokenStoreConfig};
///
/// let store = FileTokenStore::new(TokenStoreConfig::new("/tmp/saml-to".into()));
/// let location = store.save(&Token::new("gho_example"))?;
/// println!("Saved GitHub credentials to {}", location.display());
/// # Ok::<(), saml_to::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(config: TokenStoreConfig) -> Self {
        Self {
            path: config.base_dir.join(TOKEN_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<Token>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(Token::new(trimmed)))
    }

    fn save(&self, token: &Token) -> Result<PathBuf, AuthError> {
        write_token_file(&self.path, token.access_token.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "saved GitHub token");
        Ok(self.path.clone())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// Stage `data` in a sibling temp file, flush it to disk, then rename it over
/// `path`.
///
/// The staged file is created owner-only on unix and is deleted on drop if the
/// rename never happens.
fn write_token_file(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut staged = tempfile::Builder::new()
        .prefix(".github-token.")
        .tempfile_in(dir)?;
    staged.write_all(data)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| AuthError::from(err.error))?;
    Ok(())
}
