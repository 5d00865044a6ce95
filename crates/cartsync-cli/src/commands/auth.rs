//! Login, logout and status.

use anyhow::{Context, Result};
use tracing::{info, warn};

use cartsync_core::{CredentialStore, SessionData};

use crate::app::App;

/// Environment variable holding an API token, skipping the prompt
const TOKEN_ENV: &str = "CARTSYNC_TOKEN";

fn prompt_username() -> Result<String> {
    eprint!("Username: ");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Pick a token: environment first, then the keychain, then ask.
fn resolve_token(username: &str) -> Result<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            return Ok(token.trim().to_string());
        }
    }

    if CredentialStore::has_token(username) {
        return CredentialStore::get_token(username);
    }

    let token = rpassword::prompt_password("API token: ").context("Failed to read token")?;
    Ok(token.trim().to_string())
}

pub async fn login(app: &mut App, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| app.config.last_username.clone()) {
        Some(u) => u,
        None => prompt_username()?,
    };
    anyhow::ensure!(!username.is_empty(), "Username is required");

    let token = resolve_token(&username)?;
    anyhow::ensure!(!token.is_empty(), "API token is required");

    app.start_session(SessionData::new(&username, token.clone()))?;

    if let Err(e) = CredentialStore::store_token(&username, &token) {
        warn!(error = %e, "Could not save token to keychain");
    }

    app.config.last_username = Some(username.clone());
    if let Err(e) = app.config.save() {
        warn!(error = %e, "Failed to save config");
    }

    // The local cart only survives this step if the upload fails
    let cart = app.cart_service()?;
    let count = cart.merge_local_cart_on_login().await?;
    info!(username = %username, count, "Logged in");
    println!("Logged in as {}. Cart has {} line(s).", username, count);
    Ok(())
}

pub fn logout(app: &mut App) -> Result<()> {
    if let Some(username) = app.session.username().map(str::to_string) {
        if let Err(e) = CredentialStore::delete(&username) {
            warn!(error = %e, "Failed to delete keychain token");
        }
    }
    app.end_session()?;
    println!("Logged out. New items go to the local cart.");
    Ok(())
}

pub fn status(app: &App) -> Result<()> {
    match app.session.data {
        Some(ref data) if app.is_authenticated() => println!(
            "Signed in as {} (token expires in {} min)",
            data.username,
            data.minutes_until_expiry()
        ),
        _ => println!("Signed out - using the local cart"),
    }

    let cart = app.cart_service()?;
    println!("Cart count: {}", cart.cached_items_count()?);

    if let Some(local) = cart.store().load_cart()? {
        println!(
            "Local cart: {} line(s), {} item(s), saved {}",
            local.len(),
            local.total_quantity(),
            cart.store().cart_age().unwrap_or_else(|| "never".to_string())
        );
    }
    println!("API: {}", app.config.api_base_url);
    Ok(())
}
