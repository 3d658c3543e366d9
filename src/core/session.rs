use crate::domain::model::{Claims, Role};
use crate::domain::ports::{GradingApi, SessionStore};
use crate::utils::error::{GradebookError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// 解析 JWT 的 payload 段落（不驗簽，驗證由後端負責）
///
/// 任何一步失敗都回傳 `None`。
pub fn decode_token(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD.decode(normalized.as_bytes()).ok()?;
    let json = String::from_utf8(bytes).ok()?;
    serde_json::from_str(&json).ok()
}

/// 以檔案保存 token
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for FileSessionStore {
    fn load_token(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GradebookError::IoError(e)),
        }
    }

    fn save_token(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        write_private(&self.path, token)?;
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GradebookError::IoError(e)),
        }
    }
}

/// token 只給擁有者讀寫
#[cfg(unix)]
fn write_private(path: &Path, token: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode 只在建立時生效，舊檔案要另外收緊
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(token.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, token: &str) -> std::io::Result<()> {
    fs::write(path, token)
}

/// In-process store, used by the interactive shell tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // 只存字串，被 poison 也還是可用
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load_token(&self) -> Result<Option<String>> {
        Ok(self.slot().clone())
    }

    fn save_token(&self, token: &str) -> Result<()> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

/// Authentication state on top of a [`SessionStore`].
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn login(&self, api: &dyn GradingApi, email: &str, password: &str) -> Result<Claims> {
        let token = api.login(email, password).await?;
        self.store.save_token(&token)?;
        let claims = decode_token(&token).unwrap_or_default();
        tracing::info!(
            "🔑 Logged in as {} (role: {})",
            email,
            claims.role.map(|r| r.as_str()).unwrap_or("none")
        );
        Ok(claims)
    }

    pub fn logout(&self) -> Result<()> {
        tracing::info!("🔒 Logging out");
        self.store.clear_token()
    }

    pub fn is_authenticated(&self) -> bool {
        match self.store.load_token() {
            Ok(token) => token.is_some(),
            Err(e) => {
                tracing::warn!("⚠️ Could not read stored token, treating as logged out: {}", e);
                false
            }
        }
    }

    /// 已登入但 token 無法解析時回傳空的 claims
    pub fn claims(&self) -> Result<Claims> {
        let token = self.store.load_token()?.ok_or(GradebookError::NotAuthenticated)?;
        Ok(decode_token(&token).unwrap_or_default())
    }

    pub fn role(&self) -> Option<Role> {
        self.claims().ok().and_then(|c| c.role)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.claims().ok().and_then(|c| c.user_id)
    }

    pub fn require_user_id(&self) -> Result<i64> {
        self.claims()?.user_id.ok_or_else(|| GradebookError::TokenError {
            message: "token carries no userId claim".to_string(),
        })
    }

    pub fn require_role(&self, required: Role) -> Result<()> {
        let actual = self.claims()?.role;
        if actual == Some(required) {
            return Ok(());
        }
        Err(GradebookError::RoleNotPermitted {
            required: required.to_string(),
            actual: actual.map(|r| r.to_string()).unwrap_or_else(|| "none".to_string()),
        })
    }
}
