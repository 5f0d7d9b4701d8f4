// src/session.rs

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use url::Url;

use crate::error::{Result, WorkspaceError};

/// Signed-in operator. The workspace only displays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Where the current user is remembered between page loads.
pub trait SessionStore {
    fn load(&self) -> Result<Option<CurrentUser>>;
    fn save(&self, user: &CurrentUser) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Session held in memory only; gone with the process.
#[derive(Debug, Default)]
pub struct MemorySession {
    user: RefCell<Option<CurrentUser>>,
}

impl MemorySession {
    pub fn signed_in(user: CurrentUser) -> Self {
        Self {
            user: RefCell::new(Some(user)),
        }
    }
}

impl SessionStore for MemorySession {
    fn load(&self) -> Result<Option<CurrentUser>> {
        Ok(self.user.borrow().clone())
    }

    fn save(&self, user: &CurrentUser) -> Result<()> {
        *self.user.borrow_mut() = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.user.borrow_mut().take();
        Ok(())
    }
}

/// Session persisted as a small JSON file.
#[derive(Debug, Clone)]
pub struct FileSession {
    path: PathBuf,
}

impl FileSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSession {
    /// A missing file means nobody is signed in. An unreadable one is
    /// discarded the same way rather than blocking the operator.
    fn load(&self) -> Result<Option<CurrentUser>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&text) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding corrupt session");
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn save(&self, user: &CurrentUser) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(user).map_err(|e| WorkspaceError::Session(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    user: Option<CurrentUser>,
}

/// Talks to the service's `/user/*` endpoints and keeps the session store in step.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base: Url,
}

impl AuthClient {
    pub fn new(client: Client, base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| WorkspaceError::Config(format!("auth URL {}: {}", base, e)))?;
        Ok(Self { client, base })
    }

    async fn post<T: Serialize>(&self, path: &str, payload: &T) -> Result<LoginResponse> {
        let url = self
            .base
            .join(path)
            .map_err(|e| WorkspaceError::Config(e.to_string()))?;
        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();
        let mut body: LoginResponse = response.json().await?;
        if !body.success && body.message.is_none() {
            body.message = Some(format!("{} rejected with status {}", path, status));
        }
        Ok(body)
    }

    /// Create an account. Does not sign in; returns the service's message.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<String> {
        let body = self
            .post(
                "/user/register",
                &RegisterRequest {
                    email,
                    password,
                    name,
                },
            )
            .await?;
        let message = body.message.unwrap_or_default();
        if body.success {
            info!(email, "registered");
            Ok(message)
        } else {
            warn!(email, %message, "registration refused");
            Err(WorkspaceError::Session(message))
        }
    }

    /// Sign in and remember the user. Credentials are sent once and never stored.
    pub async fn login<S: SessionStore + ?Sized>(
        &self,
        store: &S,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser> {
        let body = self
            .post("/user/login", &LoginRequest { email, password })
            .await?;

        match (body.success, body.user) {
            (true, Some(user)) => {
                store.save(&user)?;
                info!(email = %user.email, "signed in");
                Ok(user)
            }
            _ => Err(WorkspaceError::Session(
                body.message.unwrap_or_else(|| "login returned no user".to_string()),
            )),
        }
    }

    pub fn logout<S: SessionStore + ?Sized>(&self, store: &S) -> Result<()> {
        store.clear()?;
        info!("signed out");
        Ok(())
    }
}
