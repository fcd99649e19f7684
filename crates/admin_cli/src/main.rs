use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{
    AppliedTransaction, ChargeCmd, Engine, EngineError, Money, NewAccountCmd, TopUpCmd,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "wallet_admin")]
#[command(about = "Admin utilities for the wallet ledger (accounts, manual adjustments, audits)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./wallet.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Account(Account),
    /// Add funds to an account.
    TopUp(BalanceChangeArgs),
    /// Take funds from an account.
    Charge(BalanceChangeArgs),
    /// Print the transactions of an account, oldest first.
    History(AccountIdArgs),
    /// Compare the stored balance with the replayed transaction log.
    Verify(AccountIdArgs),
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Create a user together with its account.
    Create(AccountCreateArgs),
    Show(AccountIdArgs),
    /// Soft-delete an account.
    Delete(AccountIdArgs),
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
}

#[derive(Args, Debug)]
struct AccountIdArgs {
    #[arg(long)]
    account: Uuid,
}

#[derive(Args, Debug)]
struct BalanceChangeArgs {
    #[arg(long)]
    account: Uuid,
    /// Amount in major units, e.g. `12.50` or `12,50`.
    #[arg(long, value_parser = parse_money)]
    amount: Money,
    /// Unique reference; generated when omitted.
    #[arg(long)]
    reference: Option<String>,
}

fn parse_money(raw: &str) -> Result<Money, String> {
    raw.parse::<Money>().map_err(|err| err.to_string())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Print a rejected operation and exit. Storage faults are propagated instead.
fn exit_on_rejection(err: EngineError) -> Box<dyn Error + Send + Sync> {
    if err.is_recoverable() {
        eprintln!("{err}");
        std::process::exit(1);
    }
    err.into()
}

fn print_applied(applied: &AppliedTransaction) {
    let tx = &applied.transaction;
    println!(
        "{} {} on {} ({}): balance {}",
        tx.kind.as_str(),
        tx.amount,
        tx.account_id,
        tx.reference,
        applied.balance
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Account(Account {
            command: AccountCommand::Create(args),
        }) => {
            let opened = engine
                .create_account_with_user(NewAccountCmd::new(
                    args.email,
                    args.first_name,
                    args.last_name,
                ))
                .await
                .map_err(exit_on_rejection)?;
            println!(
                "created account {} for {} ({})",
                opened.account.id, opened.user.email, opened.user.id
            );
        }
        Command::Account(Account {
            command: AccountCommand::Show(args),
        }) => {
            let account = engine
                .account(args.account)
                .await
                .map_err(exit_on_rejection)?;
            println!(
                "account {}\n  user:    {}\n  balance: {}\n  created: {}",
                account.id,
                account.user_id,
                account.balance,
                account.created_at.to_rfc3339()
            );
        }
        Command::Account(Account {
            command: AccountCommand::Delete(args),
        }) => {
            engine
                .delete_account(args.account)
                .await
                .map_err(exit_on_rejection)?;
            println!("deleted account {}", args.account);
        }
        Command::TopUp(args) => {
            let mut cmd = TopUpCmd::new(args.account, args.amount);
            if let Some(reference) = args.reference {
                cmd = cmd.reference(reference);
            }
            let applied = engine.top_up(cmd).await.map_err(exit_on_rejection)?;
            print_applied(&applied);
        }
        Command::Charge(args) => {
            let mut cmd = ChargeCmd::new(args.account, args.amount);
            if let Some(reference) = args.reference {
                cmd = cmd.reference(reference);
            }
            let applied = engine.charge(cmd).await.map_err(exit_on_rejection)?;
            print_applied(&applied);
        }
        Command::History(args) => {
            let txs = engine
                .transactions_for_account(args.account)
                .await
                .map_err(exit_on_rejection)?;
            for tx in txs {
                println!(
                    "{}  {:<7} {:>12}  {}",
                    tx.created_at.to_rfc3339(),
                    tx.kind.as_str(),
                    tx.signed_amount().to_string(),
                    tx.reference
                );
            }
        }
        Command::Verify(args) => {
            let check = engine
                .verify_balance(args.account)
                .await
                .map_err(exit_on_rejection)?;
            println!(
                "stored {} / replayed {} over {} transactions",
                check.stored, check.computed, check.transactions
            );
            if !check.is_consistent() {
                eprintln!("balance mismatch on account {}", check.account_id);
                std::process::exit(3);
            }
        }
    }

    Ok(())
}
