use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Token lifetime in hours. The shop's auth service issues day-long tokens.
const TOKEN_EXPIRY_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(username: &str, token: String) -> Self {
        Self {
            token,
            username: username.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::hours(TOKEN_EXPIRY_HOURS)
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        (self.expires_at() - Utc::now()).num_minutes().max(0)
    }
}

pub struct Session {
    cache_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: None,
        }
    }

    /// Load session from disk. Returns false when there is no usable session.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read session file")?;
            let data: SessionData = serde_json::from_str(&contents)
                .context("Failed to parse session file")?;

            if !data.is_expired() {
                self.data = Some(data);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents).context("Failed to write session file")?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Update session with new data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the bearer token if a session exists
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    pub fn username(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.username.as_str())
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}
