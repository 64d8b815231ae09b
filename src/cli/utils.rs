use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::client::ClientError;
use crate::database::models::Trade;
use crate::validation::ValidationError;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({ "message": message });
            if let Some(data_value) = data {
                response["data"] = data_value;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

pub fn output_trades(output_format: OutputFormat, trades: &[Trade]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(trades)?),
        OutputFormat::Text if trades.is_empty() => println!("No trades found"),
        OutputFormat::Text => {
            println!("{:<36}  {:<10}  {:>14}  {}", "ID", "DATE", "PROFIT/LOSS", "BUSINESS");
            for trade in trades {
                println!("{}", trade_row(trade));
            }
        }
    }
    Ok(())
}

pub fn output_trade(output_format: OutputFormat, trade: &Trade) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(trade)?),
        OutputFormat::Text => {
            println!("ID:            {}", trade.id);
            println!("Trade date:    {}", trade.trade_date);
            println!("Profit/loss:   {}", trade.profit_or_loss);
            match (&trade.business, &trade.business_id) {
                (Some(business), _) => println!("Business:      {} ({})", business.name, business.id),
                (None, Some(id)) => println!("Business:      {}", id),
                (None, None) => println!("Business:      -"),
            }
            println!("Created:       {}", trade.created_at.to_rfc3339());
            println!("Updated:       {}", trade.updated_at.to_rfc3339());
        }
    }
    Ok(())
}

fn trade_row(trade: &Trade) -> String {
    format!(
        "{:<36}  {:<10}  {:>14}  {}",
        trade.id,
        trade.trade_date,
        trade.profit_or_loss,
        trade.business_id.as_deref().unwrap_or("-")
    )
}

/// Error text shown to the user: the server's `message` when it sent one
pub fn describe_client_error(err: &ClientError) -> String {
    match (err.status(), err.server_message()) {
        (Some(status), Some(message)) => format!("{} ({})", message, status),
        _ => err.to_string(),
    }
}

/// Field errors, one per line, the way the forms listed them
pub fn describe_validation_error(err: &ValidationError) -> String {
    err.field_errors
        .iter()
        .map(|(field, message)| format!("  {}: {}", field, message))
        .collect::<Vec<_>>()
        .join("\n")
}
