use std::error::Error;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use engine::{Engine, NewMerchant};
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use migration::MigratorTrait;

#[derive(Parser, Debug)]
#[command(name = "comptoir_admin")]
#[command(about = "Admin utilities for Comptoir (merchants, subscriptions, credit audits)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./comptoir.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Merchant(Merchant),
    Subscription(Subscription),
    Credit(Credit),
    /// Print the plan catalog.
    Plans,
}

#[derive(Args, Debug)]
struct Merchant {
    #[command(subcommand)]
    command: MerchantCommand,
}

#[derive(Subcommand, Debug)]
enum MerchantCommand {
    Create(MerchantCreateArgs),
}

#[derive(Args, Debug)]
struct MerchantCreateArgs {
    #[arg(long)]
    phone: String,
    #[arg(long)]
    shop_name: String,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    business_type: Option<String>,
}

#[derive(Args, Debug)]
struct Subscription {
    #[command(subcommand)]
    command: SubscriptionCommand,
}

#[derive(Subcommand, Debug)]
enum SubscriptionCommand {
    /// Show the subscription and the current access decision.
    Show(AccountArgs),
    /// Apply a payment confirmed out of band.
    Activate(ActivateArgs),
}

#[derive(Args, Debug)]
struct AccountArgs {
    #[arg(long)]
    account: Uuid,
}

#[derive(Args, Debug)]
struct ActivateArgs {
    #[arg(long)]
    account: Uuid,
    #[arg(long)]
    plan: String,
    #[arg(long)]
    transaction_ref: String,
    #[arg(long, default_value = "manual")]
    payment_method: String,
}

#[derive(Args, Debug)]
struct Credit {
    #[command(subcommand)]
    command: CreditCommand,
}

#[derive(Subcommand, Debug)]
enum CreditCommand {
    /// Replay every client's sales and payments against its stored credit.
    Audit(AuditArgs),
}

#[derive(Args, Debug)]
struct AuditArgs {
    #[arg(long)]
    account: Uuid,
    /// Overwrite drifted balances with the replayed value.
    #[arg(long)]
    fix: bool,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    if let Command::Plans = cli.command {
        for plan in engine::plans() {
            let marker = if plan.popular { " *" } else { "" };
            println!(
                "{:<12} {:>6} F  {:>3} days  {}{marker}",
                plan.plan.as_str(),
                plan.price,
                plan.duration_days,
                plan.name
            );
        }
        for saving in engine::savings() {
            println!(
                "{:<12} saves {} F ({}%), {} F/month",
                saving.plan.as_str(),
                saving.savings,
                saving.savings_percent,
                saving.monthly_equivalent
            );
        }
        return Ok(());
    }

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Merchant(Merchant {
            command: MerchantCommand::Create(args),
        }) => {
            let (merchant, subscription) = engine
                .register_merchant(
                    NewMerchant {
                        phone: args.phone,
                        shop_name: args.shop_name,
                        email: args.email,
                        business_type: args.business_type,
                    },
                    Utc::now(),
                )
                .await?;
            println!(
                "created merchant: {} ({}), trial until {}",
                merchant.shop_name, merchant.id, subscription.trial_end
            );
        }
        Command::Subscription(Subscription {
            command: SubscriptionCommand::Show(args),
        }) => {
            let info = engine.subscription_info(args.account, Utc::now()).await?;
            let sub = info.subscription;
            println!("status:   {}", sub.status.as_str());
            println!("trial:    {} -> {}", sub.trial_start, sub.trial_end);
            if let (Some(start), Some(end)) = (sub.period_start, sub.period_end) {
                println!("period:   {start} -> {end}");
            }
            if let Some(plan) = sub.plan {
                println!("plan:     {} ({} F)", plan.as_str(), plan.price());
            }
            println!("access:   {}", info.access.message);
        }
        Command::Subscription(Subscription {
            command: SubscriptionCommand::Activate(args),
        }) => {
            let sub = engine
                .activate(
                    args.account,
                    &args.plan,
                    &args.transaction_ref,
                    &args.payment_method,
                    Utc::now(),
                )
                .await?;
            match sub.period_end {
                Some(end) => println!("activated {} until {end}", args.plan),
                None => println!("activated {}", args.plan),
            }
        }
        Command::Credit(Credit {
            command: CreditCommand::Audit(args),
        }) => {
            let audits = engine.audit_account_credit(args.account).await?;
            let mut drifted = 0;
            for audit in audits.iter().filter(|a| !a.is_consistent()) {
                drifted += 1;
                println!(
                    "client {}: stored {} F, replayed {} F",
                    audit.client_id, audit.stored, audit.replayed
                );
                if args.fix {
                    let client = engine
                        .recompute_client_credit(args.account, audit.client_id)
                        .await?;
                    println!("  fixed {}: {} F", client.name, client.total_credit);
                }
            }
            println!("{} clients audited, {drifted} drifted", audits.len());
            if drifted > 0 && !args.fix {
                std::process::exit(1);
            }
        }
        Command::Plans => {}
    }

    Ok(())
}
