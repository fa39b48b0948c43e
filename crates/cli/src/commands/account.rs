//! Session commands.

use quickcart_storefront::error::Result;
use quickcart_storefront::models::Session;
use quickcart_storefront::state::AppState;

/// Sign in with email and password.
///
/// # Errors
///
/// Returns an error if a field is blank or the session cannot be saved.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<()> {
    let session = state.session().login(email, password).await?;
    print_welcome(&session);
    Ok(())
}

/// Create an account with email and password.
///
/// # Errors
///
/// Returns an error if a field is blank or the session cannot be saved.
pub async fn signup(state: &AppState, email: &str, password: &str) -> Result<()> {
    let session = state.session().signup(email, password).await?;
    print_welcome(&session);
    Ok(())
}

/// Sign in with the federated provider.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
pub async fn login_federated(state: &AppState) -> Result<()> {
    let session = state.session().login_with_federated_provider().await?;
    print_welcome(&session);
    Ok(())
}

/// Create an account with the federated provider.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
pub async fn signup_federated(state: &AppState) -> Result<()> {
    let session = state.session().signup_with_federated_provider().await?;
    print_welcome(&session);
    Ok(())
}

/// Sign out.
///
/// # Errors
///
/// Returns an error if stored state cannot be removed.
#[allow(clippy::print_stdout)]
pub fn logout(state: &AppState) -> Result<()> {
    state.session().logout()?;
    println!("Signed out.");
    Ok(())
}

/// Show who is signed in.
#[allow(clippy::print_stdout)]
pub fn whoami(state: &AppState) {
    match state.session().current() {
        Some(session) => {
            println!("{} <{}>", session.greeting_name(), session.email);
            println!("  provider:  {}", session.provider);
            println!("  signed in: {}", session.signed_in_at.format("%Y-%m-%d %H:%M UTC"));
        }
        None => println!("Not signed in."),
    }
}

#[allow(clippy::print_stdout)]
fn print_welcome(session: &Session) {
    println!("Welcome, {}!", session.greeting_name());
}
