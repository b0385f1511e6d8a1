//! API credential providers
//!
//! A single `CredentialProvider` abstraction fronts every place a key can come
//! from: a packaged local file, an environment variable, or a value entered
//! interactively during the session.

use std::path::PathBuf;
use std::sync::RwLock;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::LlmConfig;

/// Source of the API credential for the model service
pub trait CredentialProvider: Send + Sync {
    /// The credential, or `None` when this source has nothing
    fn get_credential(&self) -> Option<String>;

    /// Short human-readable name of the source
    fn describe(&self) -> String;
}

/// Reads the key from a local file
///
/// Accepts either a YAML document with an `api-key` field or a plain file
/// whose first non-empty line is the key. The file is read on every lookup.
#[derive(Debug, Clone)]
pub struct FileCredentialProvider {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CredentialFile {
    #[serde(rename = "api-key")]
    api_key: Option<String>,
}

impl FileCredentialProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for FileCredentialProvider {
    fn get_credential(&self) -> Option<String> {
        debug!(path = %self.path.display(), "FileCredentialProvider::get_credential: called");
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(error = %e, "FileCredentialProvider::get_credential: unreadable");
                return None;
            }
        };
        parse_credential_file(&content)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

fn parse_credential_file(content: &str) -> Option<String> {
    if let Ok(file) = serde_yaml::from_str::<CredentialFile>(content) {
        return file.api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
    }
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
}

/// Reads the key from an environment variable
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    var: String,
}

impl EnvCredentialProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn get_credential(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn describe(&self) -> String {
        format!("environment variable {}", self.var)
    }
}

/// Fixed credential, mainly for one-shot commands and tests
#[derive(Debug, Clone, Default)]
pub struct StaticCredential {
    key: Option<String>,
}

impl StaticCredential {
    pub fn new(key: Option<String>) -> Self {
        Self { key }
    }
}

impl CredentialProvider for StaticCredential {
    fn get_credential(&self) -> Option<String> {
        self.key.clone()
    }

    fn describe(&self) -> String {
        "static value".to_string()
    }
}

/// Session-scoped credential chain
///
/// A key entered during the session wins; otherwise the configured sources
/// are consulted in order. Entered keys live only in memory.
pub struct SessionCredentials {
    entered: RwLock<Option<String>>,
    sources: Vec<Box<dyn CredentialProvider>>,
}

impl SessionCredentials {
    pub fn new(sources: Vec<Box<dyn CredentialProvider>>) -> Self {
        debug!(source_count = sources.len(), "SessionCredentials::new: called");
        Self {
            entered: RwLock::new(None),
            sources,
        }
    }

    /// Build the chain described by the LLM config: credentials file first,
    /// then the API key environment variable
    pub fn from_config(config: &LlmConfig) -> Self {
        let mut sources: Vec<Box<dyn CredentialProvider>> = Vec::new();
        if let Some(path) = &config.credentials_file {
            sources.push(Box::new(FileCredentialProvider::new(path.clone())));
        }
        sources.push(Box::new(EnvCredentialProvider::new(config.api_key_env.clone())));
        Self::new(sources)
    }

    /// Store a key entered by the user for the rest of the session
    pub fn enter(&self, key: impl Into<String>) {
        let key = key.into().trim().to_string();
        match self.entered.write() {
            Ok(mut slot) => *slot = Some(key).filter(|k| !k.is_empty()),
            Err(_) => warn!("SessionCredentials::enter: lock poisoned, key not stored"),
        }
    }

    /// Where the active credential comes from, if any
    pub fn active_source(&self) -> Option<String> {
        if self.entered_key().is_some() {
            return Some("entered this session".to_string());
        }
        self.sources
            .iter()
            .find(|s| s.get_credential().is_some())
            .map(|s| s.describe())
    }

    fn entered_key(&self) -> Option<String> {
        self.entered.read().ok().and_then(|slot| slot.clone())
    }
}

impl CredentialProvider for SessionCredentials {
    fn get_credential(&self) -> Option<String> {
        self.entered_key()
            .or_else(|| self.sources.iter().find_map(|s| s.get_credential()))
    }

    fn describe(&self) -> String {
        let names: Vec<String> = self.sources.iter().map(|s| s.describe()).collect();
        format!("session ({})", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_file_provider_plain_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("key");
        std::fs::write(&path, "\n# comment\nsk-plain-123\n").unwrap();

        let provider = FileCredentialProvider::new(&path);
        assert_eq!(provider.get_credential().as_deref(), Some("sk-plain-123"));
    }

    #[test]
    fn test_file_provider_yaml_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("credentials.yml");
        std::fs::write(&path, "api-key: sk-yaml-456\n").unwrap();

        let provider = FileCredentialProvider::new(&path);
        assert_eq!(provider.get_credential().as_deref(), Some("sk-yaml-456"));
    }

    #[test]
    fn test_file_provider_describes_its_path() {
        let provider = FileCredentialProvider::new("/etc/deskpilot/key");
        assert_eq!(provider.describe(), "file /etc/deskpilot/key");
    }

    #[test]
    fn test_file_provider_missing_file() {
        let provider = FileCredentialProvider::new("/nonexistent/deskpilot/key");
        assert!(provider.get_credential().is_none());
    }

    #[test]
    #[serial]
    fn test_env_provider() {
        let var = "DESKPILOT_TEST_ENV_KEY";
        unsafe { std::env::set_var(var, "  sk-env  ") };
        assert_eq!(EnvCredentialProvider::new(var).get_credential().as_deref(), Some("sk-env"));

        unsafe { std::env::set_var(var, "") };
        assert!(EnvCredentialProvider::new(var).get_credential().is_none());

        unsafe { std::env::remove_var(var) };
        assert!(EnvCredentialProvider::new(var).get_credential().is_none());
    }

    #[test]
    fn test_session_credentials_order() {
        let chain = SessionCredentials::new(vec![
            Box::new(StaticCredential::new(None)),
            Box::new(StaticCredential::new(Some("from-source".to_string()))),
        ]);
        assert_eq!(chain.get_credential().as_deref(), Some("from-source"));

        chain.enter("typed-in");
        assert_eq!(chain.get_credential().as_deref(), Some("typed-in"));
        assert_eq!(chain.active_source().as_deref(), Some("entered this session"));
    }

    #[test]
    fn test_session_credentials_absent() {
        let chain = SessionCredentials::new(vec![Box::new(StaticCredential::new(None))]);
        assert!(chain.get_credential().is_none());
        assert!(chain.active_source().is_none());

        chain.enter("   ");
        assert!(chain.get_credential().is_none());
    }
}
