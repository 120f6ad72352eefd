//! Login, registration and session commands.

use qkart_client::{FileStore, Storefront};
use qkart_core::{LoginForm, RegisterForm};

use crate::{CliError, output};

pub async fn login(
    storefront: &Storefront<FileStore>,
    username: String,
    password: String,
) -> Result<(), CliError> {
    let session = storefront
        .login(&LoginForm::new(username, password))
        .await?;
    output::success(&format!(
        "Logged in as {} (wallet balance {})",
        session.username, session.balance
    ));
    Ok(())
}

pub async fn register(
    storefront: &Storefront<FileStore>,
    username: String,
    password: String,
    confirm: String,
) -> Result<(), CliError> {
    storefront
        .register(&RegisterForm::new(username, password, confirm))
        .await?;
    output::success("Registered successfully. Log in to continue.");
    Ok(())
}

pub fn logout(storefront: &Storefront<FileStore>) -> Result<(), CliError> {
    storefront.logout()?;
    output::success("Logged out");
    Ok(())
}

pub fn whoami(storefront: &Storefront<FileStore>) -> Result<(), CliError> {
    match storefront.current_session()? {
        Some(session) => output::line(&format!(
            "{} (wallet balance {})",
            session.username, session.balance
        )),
        None => output::line("Not logged in"),
    }
    Ok(())
}
