use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "cartsync";

/// API tokens in the OS keychain, keyed by username.
pub struct CredentialStore;

impl CredentialStore {
    /// Store a shopper's API token in the OS keychain
    pub fn store_token(username: &str, token: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(token)
            .context("Failed to store token in keychain")?;
        Ok(())
    }

    /// Retrieve the stored token for a username
    pub fn get_token(username: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve token from keychain")
    }

    /// Delete the stored token for a username
    pub fn delete(username: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    pub fn has_token(username: &str) -> bool {
        Entry::new(SERVICE_NAME, username)
            .map(|entry| entry.get_password().is_ok())
            .unwrap_or(false)
    }
}
