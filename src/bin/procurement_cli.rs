use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use procurement_ledger::{
    config::{self, AppConfig},
    context::RequestContext,
    db::{self, DbPool},
    dto::{PurchaseOrderFilter, ReceiveItemInput},
    models::PurchaseOrderStatus,
    services::PurchaseOrderService,
};
use serde::Serialize;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;
    let ctx = RequestContext {
        organization_id: cli.organization,
        user_id: cli.user,
    };

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&context.db)
                .await
                .context("failed to run migrations")?;
            println!("Migrations applied");
        }
        Commands::List(args) => {
            let orders = context
                .service()
                .find_all(&ctx, args.into_filter())
                .await
                .context("failed to list purchase orders")?;
            print_json(&orders)?;
        }
        Commands::Show { id } => {
            let order = context.service().find_one(&ctx, id).await?;
            print_json(&order)?;
        }
        Commands::Pending => {
            let orders = context.service().find_pending(&ctx).await?;
            print_json(&orders)?;
        }
        Commands::Approve { id } => {
            let order = context
                .service()
                .approve(&ctx, id)
                .await
                .with_context(|| format!("failed to approve purchase order {}", id))?;
            print_json(&order)?;
        }
        Commands::Cancel { id } => {
            let order = context
                .service()
                .cancel(&ctx, id)
                .await
                .with_context(|| format!("failed to cancel purchase order {}", id))?;
            print_json(&order)?;
        }
        Commands::Receive(args) => {
            let outcome = context
                .service()
                .receive(&ctx, args.id, args.items)
                .await
                .with_context(|| format!("failed to receive purchase order {}", args.id))?;
            print_json(&outcome)?;
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "procurement-cli",
    about = "Operate purchase orders and the inventory ledger",
    version
)]
struct Cli {
    #[arg(long, global = true, help = "Organization the command acts for")]
    organization: Option<i64>,
    #[arg(long, global = true, help = "User recorded on approvals and movements")]
    user: Option<i64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// List purchase orders, newest first
    List(ListArgs),
    /// Show one purchase order with its lines
    Show { id: i64 },
    /// List approved orders still awaiting goods
    Pending,
    Approve { id: i64 },
    Cancel { id: i64 },
    /// Record arriving goods against an order
    Receive(ReceiveArgs),
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, help = "draft, approved, received or cancelled")]
    status: Option<PurchaseOrderStatus>,
    #[arg(long)]
    supplier: Option<i64>,
    #[arg(long)]
    location: Option<i64>,
    #[arg(long)]
    store: Option<i64>,
    #[arg(long, help = "Case-sensitive match on references, notes and supplier name")]
    search: Option<String>,
}

impl ListArgs {
    fn into_filter(self) -> PurchaseOrderFilter {
        PurchaseOrderFilter {
            status: self.status,
            supplier_id: self.supplier,
            location_id: self.location,
            store_id: self.store,
            search: self.search,
            ..Default::default()
        }
    }
}

#[derive(Args)]
struct ReceiveArgs {
    id: i64,
    #[arg(
        long = "item",
        value_name = "ITEM_ID=QTY",
        value_parser = parse_receipt_line,
        required = true,
        help = "Received quantity for an order line; repeatable"
    )]
    items: Vec<ReceiveItemInput>,
}

fn parse_receipt_line(raw: &str) -> Result<ReceiveItemInput, String> {
    let (id, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ITEM_ID=QTY, got '{}'", raw))?;
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid item id '{}': {}", id, e))?;
    let quantity = quantity
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid quantity '{}': {}", quantity, e))?;
    Ok(ReceiveItemInput::new(id, quantity))
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(&config.log_level, config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        db::check_connection(&db_pool)
            .await
            .context("database did not answer a ping")?;
        if config.auto_migrate {
            db::run_migrations(&db_pool)
                .await
                .context("failed to run migrations")?;
        }
        debug!(target: "procurement_cli", engine = ?config.engine, "engine configuration");

        Ok(Self {
            config,
            db: Arc::new(db_pool),
        })
    }

    fn service(&self) -> PurchaseOrderService {
        PurchaseOrderService::new(self.db.clone(), self.config.engine)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_receipt_lines() {
        assert_eq!(
            parse_receipt_line("12=4").unwrap(),
            ReceiveItemInput::new(12, 4)
        );
        assert!(parse_receipt_line("12").is_err());
        assert!(parse_receipt_line("x=4").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
