//! Auth subcommands: manage Spark credentials.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use dialoguer::{Confirm, Input, Password, theme::ColorfulTheme};
use yiqu_models::auth::{CredentialField, CredentialSource, CredentialStore};

use crate::prompts::print_success;

/// Keyring service name for stored credentials.
pub const KEYRING_SERVICE: &str = "yiqu";

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Store Spark credentials in the system keyring
    Set,
    /// Show where each credential comes from
    Status,
    /// Remove stored credentials from the keyring
    Delete {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub fn run(args: AuthArgs) -> Result<()> {
    let store = CredentialStore::new(KEYRING_SERVICE).with_env_fallback();
    match args.command {
        AuthCommand::Set => set(&store),
        AuthCommand::Status => status(&store),
        AuthCommand::Delete { yes } => delete(&store, yes),
    }
}

fn set(store: &CredentialStore) -> Result<()> {
    let theme = ColorfulTheme::default();
    println!("Enter your Spark console credentials");

    let app_id: String = Input::with_theme(&theme)
        .with_prompt(prompt_for(CredentialField::AppId))
        .interact_text()?;
    let api_key = Password::with_theme(&theme)
        .with_prompt(prompt_for(CredentialField::ApiKey))
        .interact()?;
    let api_secret = Password::with_theme(&theme)
        .with_prompt(prompt_for(CredentialField::ApiSecret))
        .interact()?;

    let values = [
        (CredentialField::AppId, app_id),
        (CredentialField::ApiKey, api_key),
        (CredentialField::ApiSecret, api_secret),
    ];
    for (field, value) in &values {
        if value.trim().is_empty() {
            bail!("{} cannot be empty", prompt_for(*field));
        }
    }
    for (field, value) in &values {
        store.set(*field, value.trim())?;
    }

    print_success("Credentials saved to keyring.");
    Ok(())
}

fn status(store: &CredentialStore) -> Result<()> {
    println!("Spark credentials:");
    let mut ready = true;
    for field in CredentialField::ALL {
        println!(
            "  {:<12} {}",
            prompt_for(field),
            describe_source(store.credential_source(field), field)
        );
        ready &= store.has(field);
    }
    println!();
    if ready {
        println!("Status: Ready");
    } else {
        println!("Status: Missing credentials (run `yiqu auth set`)");
    }
    Ok(())
}

fn delete(store: &CredentialStore, yes: bool) -> Result<()> {
    if !yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Delete stored Spark credentials from the keyring?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    for field in CredentialField::ALL {
        match store.delete(field) {
            Ok(()) => println!("Deleted {}.", field),
            Err(yiqu_models::Error::CredentialsNotFound(_)) => {
                println!("No stored value for {}.", field)
            }
            Err(e) => bail!("Failed to delete {}: {}", field, e),
        }
    }
    Ok(())
}

fn prompt_for(field: CredentialField) -> &'static str {
    match field {
        CredentialField::AppId => "App ID",
        CredentialField::ApiKey => "API key",
        CredentialField::ApiSecret => "API secret",
    }
}

fn describe_source(source: Option<CredentialSource>, field: CredentialField) -> String {
    match source {
        Some(CredentialSource::Keyring) => "keyring".to_string(),
        Some(CredentialSource::Environment) => format!("environment ({})", field.env_var()),
        None => format!("not set (or set {})", field.env_var()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_descriptions_name_env_var() {
        assert_eq!(
            describe_source(Some(CredentialSource::Keyring), CredentialField::AppId),
            "keyring"
        );
        assert_eq!(
            describe_source(Some(CredentialSource::Environment), CredentialField::ApiKey),
            "environment (SPARK_API_KEY)"
        );
        assert_eq!(
            describe_source(None, CredentialField::ApiSecret),
            "not set (or set SPARK_API_SECRET)"
        );
    }

    #[test]
    fn every_field_has_a_prompt() {
        for field in CredentialField::ALL {
            assert!(!prompt_for(field).is_empty());
        }
    }
}
