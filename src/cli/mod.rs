use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::application::AccountService;
use crate::domain::{AccountId, Amount, Description, NewTransaction, TransactionKind, parse_account_id};
use crate::http;
use crate::storage::StoreOptions;

/// ledgerd - bounded-overdraft account ledger
#[derive(Parser)]
#[command(name = "ledgerd")]
#[command(about = "Credit/debit ledger with a hard overdraft limit per account")]
#[command(version)]
pub struct Cli {
    /// Database URL
    #[arg(
        short,
        long,
        global = true,
        env = "DATABASE_URL",
        default_value = "postgres://localhost/ledgerd"
    )]
    pub database: String,

    /// Schema holding the ledger tables (defaults to the server's search path)
    #[arg(long, global = true, env = "DB_SCHEMA")]
    pub schema: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and schema
    Init {
        /// Provision the default accounts
        #[arg(long)]
        seed: bool,
    },

    /// Account provisioning commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Apply a credit or debit to an account
    Apply {
        /// Account id
        #[arg(value_parser = parse_account_id)]
        account: AccountId,

        /// Transaction kind: 'c' (credit) or 'd' (debit)
        kind: TransactionKind,

        /// Amount, a positive integer
        amount: Amount,

        /// Description, 1 to 10 characters
        description: String,
    },

    /// Show balance and recent transactions for an account
    Statement {
        /// Account id
        #[arg(value_parser = parse_account_id)]
        account: AccountId,
    },

    /// Run the HTTP server
    Serve(ServeArgs),
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Provision a new account with a zero balance
    Create {
        /// Account id
        #[arg(long, value_parser = parse_account_id)]
        id: AccountId,

        /// Overdraft limit (the balance may go down to -limit)
        #[arg(long)]
        limit: Amount,
    },

    /// Show an account's balance and limit
    Show {
        #[arg(value_parser = parse_account_id)]
        id: AccountId,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 9999)]
    pub port: u16,

    /// Maximum pooled store connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Connections kept open when idle
    #[arg(long, env = "DB_MIN_CONNECTIONS", default_value_t = 2)]
    pub min_connections: u32,

    /// How long a request waits for a free store connection, in milliseconds
    #[arg(long, env = "DB_ACQUIRE_TIMEOUT_MS", default_value_t = 5000)]
    pub acquire_timeout_ms: u64,

    /// Per-request deadline, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    pub request_timeout_ms: u64,
}

impl ServeArgs {
    /// Pool settings for the server, on top of the global store options.
    pub fn store_options(&self, base: StoreOptions) -> StoreOptions {
        StoreOptions {
            max_connections: self.max_connections,
            min_connections: self.min_connections.min(self.max_connections),
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
            ..base
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let options = StoreOptions {
            schema: self.schema.clone(),
            ..StoreOptions::default()
        };

        match self.command {
            Commands::Init { seed } => {
                let service = AccountService::init(&self.database, &options).await?;
                println!("Database initialized: {}", self.database);
                if seed {
                    let created = service.seed_default_accounts().await?;
                    for account in &created {
                        println!("Created account {} (limit {})", account.id, account.limit);
                    }
                    if created.is_empty() {
                        println!("Default accounts already present.");
                    }
                }
            }

            Commands::Account(cmd) => {
                let service = AccountService::connect(&self.database, &options).await?;
                run_account_command(&service, cmd).await?;
            }

            Commands::Apply {
                account,
                kind,
                amount,
                description,
            } => {
                let service = AccountService::connect(&self.database, &options).await?;
                let description =
                    Description::parse(description).context("Invalid description")?;
                let transaction =
                    NewTransaction::new(kind, amount, description).context("Invalid amount")?;
                let snapshot = service.apply_transaction(account, transaction).await?;
                println!(
                    "Account {}: balance {} (limit {})",
                    account, snapshot.balance, snapshot.limit
                );
            }

            Commands::Statement { account } => {
                let service = AccountService::connect(&self.database, &options).await?;
                let statement = service.get_statement(account).await?;
                println!(
                    "Account {} as of {}",
                    account,
                    statement.as_of.format("%Y-%m-%d %H:%M:%S")
                );
                println!("Balance: {}  Limit: {}", statement.balance, statement.limit);
                if statement.is_empty() {
                    println!("No transactions.");
                } else {
                    println!(
                        "{:<20} {:<6} {:>12}  {}",
                        "DATE", "KIND", "AMOUNT", "DESCRIPTION"
                    );
                    for tx in &statement.transactions {
                        println!(
                            "{:<20} {:<6} {:>12}  {}",
                            tx.occurred_at.format("%Y-%m-%d %H:%M:%S"),
                            tx.kind,
                            tx.amount,
                            tx.description
                        );
                    }
                }
            }

            Commands::Serve(args) => {
                let options = args.store_options(options);
                serve(&self.database, options, args).await?
            }
        }

        Ok(())
    }
}

async fn run_account_command(service: &AccountService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Create { id, limit } => {
            let account = service.create_account(id, limit).await?;
            println!("Created account {} (limit {})", account.id, account.limit);
        }
        AccountCommands::Show { id } => {
            let account = service.get_account(id).await?;
            println!(
                "Account {}: balance {} (limit {})",
                account.id, account.balance, account.limit
            );
        }
    }
    Ok(())
}

async fn serve(database: &str, options: StoreOptions, args: ServeArgs) -> Result<()> {
    let service = AccountService::init(database, &options).await?;
    service.repository().ping().await?;
    info!("Connected to the database");

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Server started");

    let app = http::router(
        service.clone(),
        Duration::from_millis(args.request_timeout_ms),
    );
    http::serve(listener, app, shutdown_signal()).await?;

    service.repository().close().await;
    info!("Server stopped");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
