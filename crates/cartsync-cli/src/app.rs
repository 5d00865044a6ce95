//! Wiring shared by all commands: config, session, API client, local store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use cartsync_core::{
    ApiClient, AuthState, CartService, CategoryService, Config, LocalStore, Session, SessionData,
    StaticAuth,
};

pub struct App {
    pub config: Config,
    pub session: Arc<Session>,
    api: ApiClient,
    cache_dir: PathBuf,
    anonymous: bool,
}

impl App {
    pub fn new(config: Config, anonymous: bool) -> Result<Self> {
        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        // Load session from disk if it exists
        let mut session = Session::new(cache_dir.clone());
        if let Err(e) = session.load() {
            warn!(error = %e, "Failed to load session, continuing signed out");
        }

        let mut api = ApiClient::with_timeout(&config.api_base_url, config.request_timeout())?;
        if let Some(token) = session.token() {
            if session.is_valid() && !anonymous {
                api.set_token(token.to_string());
                debug!("Token set on API client");
            }
        }

        Ok(Self {
            config,
            session: Arc::new(session),
            api,
            cache_dir,
            anonymous,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        !self.anonymous && self.session.is_authenticated()
    }

    /// Replace the current session with a freshly issued one and persist it.
    pub fn start_session(&mut self, data: SessionData) -> Result<()> {
        self.api.set_token(data.token.clone());
        let mut session = Session::new(self.cache_dir.clone());
        session.update(data);
        session.save()?;
        self.session = Arc::new(session);
        self.anonymous = false;
        Ok(())
    }

    pub fn end_session(&mut self) -> Result<()> {
        let mut session = Session::new(self.cache_dir.clone());
        session.clear()?;
        self.session = Arc::new(session);
        self.api.clear_token();
        Ok(())
    }

    pub fn cart_service(&self) -> Result<CartService> {
        let auth: Arc<dyn AuthState> = if self.anonymous {
            Arc::new(StaticAuth(false))
        } else {
            self.session.clone()
        };
        let store = LocalStore::new(self.cache_dir.clone())?;
        Ok(CartService::new(self.api.clone(), store, auth))
    }

    pub fn category_service(&self) -> CategoryService {
        CategoryService::new(self.api.clone())
    }
}
