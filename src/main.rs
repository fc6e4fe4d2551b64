use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tally::cli::{
    handle_account_command, handle_expense_command, handle_signin, handle_signout, handle_whoami,
    resolve_user,
};
use tally::config::{paths::TallyPaths, settings::Settings};
use tally::display::format_audit_entries;
use tally::storage::Storage;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Terminal expense tracker with running-total charge ledgers",
    long_about = "Tally keeps one ledger per spending category. Each expense starts \
                  from an amount, collects debit and credit charges, and shows the \
                  running total as every charge is applied."
)]
struct Cli {
    /// Act as this user instead of the signed-in one
    #[arg(short, long, global = true, env = "TALLY_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Remember a user for later commands
    Signin {
        /// User ID
        uid: String,
    },

    /// Forget the signed-in user
    Signout,

    /// Show the active user
    Whoami,

    /// Account lifecycle commands
    #[command(subcommand)]
    Account(tally::cli::AccountCommands),

    /// Expense management commands
    #[command(subcommand, alias = "exp")]
    Expense(tally::cli::ExpenseCommands),

    /// Show current configuration and paths
    Config,

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_env("TALLY_LOG")
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = TallyPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;
    init_logging(&settings);

    // Initialize storage
    let storage = Storage::new(paths.clone())?;

    match cli.command {
        Some(Commands::Signin { uid }) => {
            handle_signin(&paths, &mut settings, &uid)?;
        }
        Some(Commands::Signout) => {
            handle_signout(&paths, &mut settings)?;
        }
        Some(Commands::Whoami) => {
            let user = resolve_user(cli.user.as_deref(), &settings).ok();
            handle_whoami(&storage, user)?;
        }
        Some(Commands::Account(cmd)) => {
            handle_account_command(&storage, &paths, &mut settings, cmd)?;
        }
        Some(Commands::Expense(cmd)) => {
            let user = resolve_user(cli.user.as_deref(), &settings)?;
            handle_expense_command(&storage, &settings, user, cmd)?;
        }
        Some(Commands::Config) => {
            println!("Tally Configuration");
            println!("===================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Data directory:  {}", paths.data_dir().display());
            println!("Settings file:   {}", paths.settings_file().display());
            println!("Audit log:       {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!(
                "  Active user:    {}",
                settings
                    .active_user
                    .as_ref()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "(none)".to_string())
            );
            println!("  Currency:       {}", settings.currency_symbol);
            println!("  Log level:      {}", settings.log_level);
            println!("  Default side:   {}", settings.default_side);
        }
        Some(Commands::Audit { limit }) => {
            let entries = storage.audit().read_recent(limit)?;
            println!("{}", format_audit_entries(&entries));
        }
        None => {
            println!("Tally - running-total expense ledgers");
            println!();
            println!("Run 'tally --help' for usage information.");
            println!("Run 'tally signin <user-id>' to get started.");
        }
    }

    Ok(())
}
