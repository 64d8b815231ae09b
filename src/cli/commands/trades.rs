use chrono::{Local, NaiveDate};
use clap::Subcommand;
use serde_json::{json, Map, Value};

use crate::cli::config::CliConfig;
use crate::cli::utils::{describe_client_error, describe_validation_error, output_success, output_trade, output_trades};
use crate::cli::OutputFormat;
use crate::client::ClientError;
use crate::database::models::{GetQuery, TradeQuery};
use crate::validation::{validate_trade, ValidationError};

#[derive(Subcommand)]
pub enum TradeCommands {
    #[command(about = "List trades")]
    List {
        #[arg(long, help = "Only trades of this business")]
        business_id: Option<String>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
        #[arg(long, help = "Sort, e.g. \"trade_date desc,profit_or_loss asc\"")]
        order: Option<String>,
        #[arg(long, help = "Relations to expand: business,_count")]
        relations: Option<String>,
    },

    #[command(about = "Show one trade")]
    Get {
        #[arg(help = "Trade ID")]
        id: String,
        #[arg(long, help = "Relations to expand: business,_count")]
        relations: Option<String>,
    },

    #[command(about = "Create a trade (defaults: today, 0, no business)")]
    Create {
        #[arg(long, help = "Trade date (YYYY-MM-DD)")]
        date: Option<NaiveDate>,
        #[arg(long, allow_negative_numbers = true, help = "Profit (positive) or loss (negative)")]
        profit_or_loss: Option<i64>,
        #[arg(long)]
        business_id: Option<String>,
    },

    #[command(about = "Edit a trade; unspecified fields keep their current value")]
    Update {
        #[arg(help = "Trade ID")]
        id: String,
        #[arg(long, help = "Trade date (YYYY-MM-DD)")]
        date: Option<NaiveDate>,
        #[arg(long, allow_negative_numbers = true)]
        profit_or_loss: Option<i64>,
        #[arg(long, conflicts_with = "clear_business")]
        business_id: Option<String>,
        #[arg(long, help = "Detach the trade from its business")]
        clear_business: bool,
    },

    #[command(about = "Delete a trade")]
    Delete {
        #[arg(help = "Trade ID")]
        id: String,
    },
}

pub async fn handle(cmd: TradeCommands, output_format: OutputFormat, config: &CliConfig) -> anyhow::Result<()> {
    let client = config.client()?;

    match cmd {
        TradeCommands::List { business_id, limit, offset, order, relations } => {
            let query = TradeQuery {
                base: GetQuery { limit, offset, order, relations, fields: None },
                id: None,
                business_id,
            };
            let trades = client.list(Some(&query)).await.map_err(client_error)?;
            output_trades(output_format, &trades)
        }

        TradeCommands::Get { id, relations } => {
            let query = GetQuery { relations, ..Default::default() };
            match client.get_by_id(&id, Some(&query)).await.map_err(client_error)? {
                Some(trade) => output_trade(output_format, &trade),
                None => anyhow::bail!("Trade {} not found", id),
            }
        }

        TradeCommands::Create { date, profit_or_loss, business_id } => {
            let values = create_form(date, profit_or_loss, business_id);
            let input = validate_trade(&values).map_err(invalid)?;

            let created = client.create(&input).await.map_err(client_error)?;
            output_success(output_format, &format!("Created trade {}", created.id), Some(serde_json::to_value(&created)?))
        }

        TradeCommands::Update { id, date, profit_or_loss, business_id, clear_business } => {
            let current = client
                .get_by_id(&id, None)
                .await
                .map_err(client_error)?
                .ok_or_else(|| anyhow::anyhow!("Trade {} not found", id))?;

            let business = match (clear_business, business_id) {
                (true, _) => Some(None),
                (false, Some(b)) => Some(Some(b)),
                (false, None) => None,
            };
            let values = edit_form(serde_json::to_value(&current)?, date, profit_or_loss, business);
            validate_trade(&values).map_err(invalid)?;

            let updated = client.update_by_id(&id, &values).await.map_err(client_error)?;
            output_success(output_format, &format!("Updated trade {}", updated.id), Some(serde_json::to_value(&updated)?))
        }

        TradeCommands::Delete { id } => {
            let removed = client.delete_by_id(&id).await.map_err(client_error)?;
            output_success(output_format, &format!("Deleted trade {}", id), removed.map(|t| json!(t)))
        }
    }
}

/// Initial values of the create form, overridden by flags
fn create_form(date: Option<NaiveDate>, profit_or_loss: Option<i64>, business_id: Option<String>) -> Value {
    json!({
        "trade_date": date.unwrap_or_else(|| Local::now().date_naive()).to_string(),
        "profit_or_loss": profit_or_loss.unwrap_or(0),
        "business_id": business_id,
    })
}

/// Current record with the edited fields merged over it
fn edit_form(current: Value, date: Option<NaiveDate>, profit_or_loss: Option<i64>, business_id: Option<Option<String>>) -> Value {
    let mut values = match current {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Some(date) = date {
        values.insert("trade_date".into(), json!(date.to_string()));
    }
    if let Some(pnl) = profit_or_loss {
        values.insert("profit_or_loss".into(), json!(pnl));
    }
    if let Some(business_id) = business_id {
        values.insert("business_id".into(), json!(business_id));
    }
    Value::Object(values)
}

fn invalid(err: ValidationError) -> anyhow::Error {
    anyhow::anyhow!("Invalid trade:\n{}", describe_validation_error(&err))
}

fn client_error(err: ClientError) -> anyhow::Error {
    anyhow::anyhow!(describe_client_error(&err))
}
