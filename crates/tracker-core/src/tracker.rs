//! Main client state container

use tracker_api::{
    ApiClient, Department, DepartmentPayload, ForgotPasswordPayload, SignInPayload, SignUpPayload,
};
use tracker_auth::{CancelToken, Session, SessionManager, SessionPhase};
use tracker_storage::Database;

use crate::config::Config;
use crate::theme::{Theme, THEME_KEY};
use crate::Result;

/// Central state container for the dashboard client.
///
/// Construct one at startup and pass it down; every view reads session
/// state through it and never holds authentication state of its own.
pub struct Tracker {
    config: Config,
    db: Database,
    session_manager: SessionManager,
    api: ApiClient,
}

impl Tracker {
    pub fn new(config: Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        let session_manager = SessionManager::new(db.clone());
        let api = ApiClient::new(&config.base_url, config.request_timeout(), db.clone())?;

        Ok(Self {
            config,
            db,
            session_manager,
            api,
        })
    }

    /// Restore persisted client state. Returns the untrusted candidate
    /// session when one was found; run `verify_session` to settle it.
    pub fn initialize(&self) -> Option<Session> {
        let candidate = self.session_manager.initialize();
        tracing::info!("Tracker initialized");
        candidate
    }

    // === Session operations ===

    pub fn session_manager(&self) -> &SessionManager {
        &self.session_manager
    }

    /// Settle the candidate session against the verification endpoint.
    pub async fn verify_session(&self, cancel: CancelToken) -> SessionPhase {
        self.session_manager.verify(&self.api, cancel).await
    }

    pub async fn sign_in(&self, payload: &SignInPayload) -> Result<Session> {
        let success = self.api.sign_in(payload).await?;
        self.session_manager
            .establish(success.token.clone(), success.user.clone());

        Ok(Session {
            token: success.token,
            user: success.user,
        })
    }

    pub async fn sign_up(&self, payload: &SignUpPayload) -> Result<Session> {
        let success = self.api.sign_up(payload).await?;
        self.session_manager
            .establish(success.token.clone(), success.user.clone());

        Ok(Session {
            token: success.token,
            user: success.user,
        })
    }

    pub async fn forgot_password(&self, payload: &ForgotPasswordPayload) -> Result<String> {
        Ok(self.api.forgot_password(payload).await?.message)
    }

    pub fn logout(&self) {
        self.session_manager.clear();
    }

    pub fn is_authenticated(&self) -> bool {
        self.session_manager.is_authenticated()
    }

    // === Department operations ===

    pub async fn departments(&self) -> Result<Vec<Department>> {
        Ok(self.api.get_departments().await?)
    }

    pub async fn create_department(&self, payload: &DepartmentPayload) -> Result<Department> {
        Ok(self.api.create_department(payload).await?)
    }

    pub async fn update_department(
        &self,
        id: &str,
        payload: &DepartmentPayload,
    ) -> Result<Department> {
        Ok(self.api.update_department(id, payload).await?)
    }

    pub async fn delete_department(&self, id: &str) -> Result<String> {
        Ok(self.api.delete_department(id).await?.message)
    }

    // === Theme operations ===

    pub fn theme(&self) -> Result<Theme> {
        let stored = self.db.get_setting(THEME_KEY)?;
        Ok(stored.and_then(|v| v.parse().ok()).unwrap_or_default())
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.db.set_setting(THEME_KEY, theme.as_str())?;
        Ok(())
    }

    // === Accessors ===

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Clone for Tracker {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: self.db.clone(),
            session_manager: self.session_manager.clone(),
            api: self.api.clone(),
        }
    }
}
