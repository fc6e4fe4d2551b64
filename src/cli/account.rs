//! Account CLI commands
//!
//! Sign-in state plus the account lifecycle hooks an identity provider
//! would normally fire.

use clap::Subcommand;

use crate::config::{paths::TallyPaths, Settings};
use crate::error::{TallyError, TallyResult};
use crate::models::UserId;
use crate::services::{AccountService, Identity};
use crate::storage::Storage;

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create an account and its profile document
    Create {
        /// User ID issued by the identity provider
        uid: String,
        /// Display name ("First Last")
        #[arg(short, long)]
        name: Option<String>,
        /// Email address
        #[arg(short, long)]
        email: Option<String>,
        /// Profile photo URL
        #[arg(long)]
        photo_url: Option<String>,
    },
    /// Delete an account with its profile and every expense
    Delete {
        /// User ID
        uid: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Handle an account command
pub fn handle_account_command(
    storage: &Storage,
    paths: &TallyPaths,
    settings: &mut Settings,
    cmd: AccountCommands,
) -> TallyResult<()> {
    let service = AccountService::new(storage);

    match cmd {
        AccountCommands::Create {
            uid,
            name,
            email,
            photo_url,
        } => {
            let identity = Identity {
                uid,
                display_name: name,
                email,
                photo_url,
            };
            let profile = service.on_user_created(&identity)?;

            println!("Created account: {}", identity.uid);
            if !profile.display_name().is_empty() {
                println!("  Name:  {}", profile.display_name());
            }
            if !profile.email.is_empty() {
                println!("  Email: {}", profile.email);
            }
        }

        AccountCommands::Delete { uid, yes } => {
            if !yes
                && !super::confirm(&format!(
                    "Delete account '{}' and all of its expenses?",
                    uid
                ))?
            {
                println!("Aborted.");
                return Ok(());
            }

            let report = service.on_user_deleted(&uid)?;

            if settings.active_user.as_ref().map(UserId::as_str) == Some(uid.as_str()) {
                settings.active_user = None;
                settings.save(paths)?;
            }

            println!("Deleted account: {}", uid);
            println!("  Expenses removed: {}", report.expenses_removed);
            println!(
                "  Profile removed:  {}",
                if report.profile_removed { "yes" } else { "no" }
            );
        }
    }

    Ok(())
}

/// Remember `uid` as the active user
pub fn handle_signin(paths: &TallyPaths, settings: &mut Settings, uid: &str) -> TallyResult<()> {
    let user = UserId::new(uid).map_err(|e| TallyError::Validation(e.to_string()))?;
    settings.active_user = Some(user.clone());
    settings.save(paths)?;

    tracing::info!(user = %user, "signed in");
    println!("Signed in as {}", user);
    Ok(())
}

/// Forget the active user
pub fn handle_signout(paths: &TallyPaths, settings: &mut Settings) -> TallyResult<()> {
    match settings.active_user.take() {
        Some(user) => {
            settings.save(paths)?;
            tracing::info!(user = %user, "signed out");
            println!("Signed out {}", user);
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

/// Print the active user and their profile
pub fn handle_whoami(storage: &Storage, user: Option<UserId>) -> TallyResult<()> {
    let Some(user) = user else {
        println!("Not signed in.");
        return Ok(());
    };

    match AccountService::new(storage).profile(&user)? {
        Some(profile) if !profile.display_name().is_empty() => {
            println!("{} ({})", user, profile.display_name());
        }
        _ => println!("{}", user),
    }
    Ok(())
}
