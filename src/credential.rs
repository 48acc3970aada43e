//! API credential resolution.

use crate::error::{FlowVizError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Environment variable read when no other source supplies a key.
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";

/// An API key. Never printed: `Debug` is redacted and there is no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a key, returning `None` for empty or whitespace-only values.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the raw secret for placing in request headers or URLs.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Host surface that lets a user pick a key interactively.
#[async_trait]
pub trait KeySelector: Send + Sync {
    /// Whether a key has already been selected.
    async fn has_selected_key(&self) -> bool;

    /// Opens the selection dialog and returns once it is dismissed.
    ///
    /// Whether the user actually picked a key is not reported; the next
    /// request against the service is the real check.
    async fn open_select_key(&self);

    /// The key chosen through this selector, if it keeps one itself.
    fn selected_key(&self) -> Option<String> {
        None
    }
}

/// Where credentials come from, fixed when the client is built.
#[derive(Clone)]
pub enum CredentialProvider {
    /// A key supplied directly by the caller.
    Static(Credential),
    /// Prompt through a [`KeySelector`] when nothing is selected yet, then fall
    /// back to the environment variable.
    Interactive {
        /// Selection surface.
        selector: Arc<dyn KeySelector>,
        /// Fallback environment variable.
        env_var: String,
    },
    /// Read the key from an environment variable only.
    EnvironmentOnly {
        /// Environment variable holding the key.
        env_var: String,
    },
}

impl Default for CredentialProvider {
    fn default() -> Self {
        Self::environment(DEFAULT_API_KEY_ENV)
    }
}

impl std::fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(_) => f.write_str("Static(<redacted>)"),
            Self::Interactive { env_var, .. } => f
                .debug_struct("Interactive")
                .field("env_var", env_var)
                .finish_non_exhaustive(),
            Self::EnvironmentOnly { env_var } => f
                .debug_struct("EnvironmentOnly")
                .field("env_var", env_var)
                .finish(),
        }
    }
}

impl CredentialProvider {
    /// Environment-only provider reading `env_var`.
    pub fn environment(env_var: impl Into<String>) -> Self {
        Self::EnvironmentOnly {
            env_var: env_var.into(),
        }
    }

    /// Interactive provider with an environment fallback.
    pub fn interactive(selector: Arc<dyn KeySelector>, env_var: impl Into<String>) -> Self {
        Self::Interactive {
            selector,
            env_var: env_var.into(),
        }
    }

    /// Provider that always yields `key`. Empty keys fail at resolve time.
    pub fn fixed(key: impl Into<String>) -> Result<Self> {
        Credential::new(key)
            .map(Self::Static)
            .ok_or_else(|| FlowVizError::Credential("provided API key is empty".into()))
    }

    /// Resolves a credential. Fails before any network traffic when every
    /// source comes up empty.
    pub async fn resolve(&self) -> Result<Credential> {
        match self {
            Self::Static(credential) => Ok(credential.clone()),
            Self::Interactive { selector, env_var } => {
                if !selector.has_selected_key().await {
                    tracing::debug!("no key selected, opening key selection");
                    selector.open_select_key().await;
                }
                selector
                    .selected_key()
                    .and_then(Credential::new)
                    .or_else(|| from_env(env_var))
                    .ok_or_else(|| {
                        FlowVizError::Credential(format!(
                            "API key selection failed or was cancelled, and {env_var} is not set"
                        ))
                    })
            }
            Self::EnvironmentOnly { env_var } => from_env(env_var).ok_or_else(|| {
                FlowVizError::Credential(format!("{env_var} not set and no API key provided"))
            }),
        }
    }
}

fn from_env(var: &str) -> Option<Credential> {
    std::env::var(var).ok().and_then(Credential::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct FakeSelector {
        selected: bool,
        key_after_dialog: Option<String>,
        opened: AtomicU32,
        key: Mutex<Option<String>>,
    }

    impl FakeSelector {
        fn new(selected: bool, key_after_dialog: Option<&str>) -> Self {
            Self {
                selected,
                key_after_dialog: key_after_dialog.map(String::from),
                opened: AtomicU32::new(0),
                key: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl KeySelector for FakeSelector {
        async fn has_selected_key(&self) -> bool {
            self.selected
        }

        async fn open_select_key(&self) {
            self.opened.fetch_add(1, Ordering::SeqCst);
            *self.key.lock().unwrap() = self.key_after_dialog.clone();
        }

        fn selected_key(&self) -> Option<String> {
            self.key.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_credential_rejects_blank() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
        assert_eq!(Credential::new(" abc ").unwrap().expose(), "abc");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("super-secret").unwrap();
        let debug = format!("{:?}", cred);
        assert!(!debug.contains("super-secret"));

        let provider = CredentialProvider::fixed("super-secret").unwrap();
        assert!(!format!("{:?}", provider).contains("super-secret"));
    }

    #[test]
    fn test_fixed_rejects_empty() {
        let err = CredentialProvider::fixed("").unwrap_err();
        assert!(matches!(err, FlowVizError::Credential(_)));
    }

    #[tokio::test]
    async fn test_environment_missing_fails() {
        let provider = CredentialProvider::environment("FLOWVIZ_TEST_CRED_NEVER_SET");
        let err = provider.resolve().await.unwrap_err();
        assert!(matches!(err, FlowVizError::Credential(_)));
        assert!(err.to_string().contains("FLOWVIZ_TEST_CRED_NEVER_SET"));
    }

    // Cargo sets the package variables for test processes, so these tests
    // read the environment without mutating it.
    const PRESENT_VAR: &str = "CARGO_PKG_NAME";

    #[tokio::test]
    async fn test_environment_present() {
        let provider = CredentialProvider::environment(PRESENT_VAR);
        let cred = provider.resolve().await.unwrap();
        assert_eq!(cred.expose(), env!("CARGO_PKG_NAME"));
    }

    #[tokio::test]
    async fn test_interactive_opens_dialog_when_unselected() {
        let selector = Arc::new(FakeSelector::new(false, Some("picked")));
        let provider =
            CredentialProvider::interactive(selector.clone(), "FLOWVIZ_TEST_CRED_NEVER_SET");
        let cred = provider.resolve().await.unwrap();
        assert_eq!(cred.expose(), "picked");
        assert_eq!(selector.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_interactive_skips_dialog_when_selected() {
        let selector = Arc::new(FakeSelector::new(true, None));
        let provider = CredentialProvider::interactive(selector.clone(), PRESENT_VAR);
        let cred = provider.resolve().await.unwrap();
        assert_eq!(cred.expose(), env!("CARGO_PKG_NAME"));
        assert_eq!(selector.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_interactive_dismissed_without_fallback_fails() {
        let selector = Arc::new(FakeSelector::new(false, None));
        let provider =
            CredentialProvider::interactive(selector.clone(), "FLOWVIZ_TEST_CRED_NEVER_SET");
        let err = provider.resolve().await.unwrap_err();
        assert!(matches!(err, FlowVizError::Credential(_)));
        assert_eq!(selector.opened.load(Ordering::SeqCst), 1);
    }
}
