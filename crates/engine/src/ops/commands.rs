use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    ClientRef, Command, CommandData, CommandOutcome, EngineError, ExpenseCmd,
    InterpretedCommand, NewClientCmd, PaymentMode, ResultEngine, SaleCmd,
};

use super::Engine;

impl Engine {
    /// Validate and apply the output of the command interpreter.
    pub async fn apply_interpreted(
        &self,
        account_id: Uuid,
        interpreted: InterpretedCommand,
        at: DateTime<Utc>,
    ) -> ResultEngine<CommandOutcome> {
        let command = interpreted.into_command().inspect_err(|err| {
            tracing::debug!(%account_id, %err, "interpreted command rejected");
        })?;
        self.apply_command(account_id, command, at).await
    }

    /// Apply a validated command through the ledger operations.
    pub async fn apply_command(
        &self,
        account_id: Uuid,
        command: Command,
        at: DateTime<Utc>,
    ) -> ResultEngine<CommandOutcome> {
        match command {
            Command::Sale {
                amount,
                payment_mode: PaymentMode::Credit,
                client_name,
                notes,
            } => {
                let client_name = client_name.ok_or_else(|| {
                    EngineError::Validation("a credit sale requires the client name".to_string())
                })?;
                let mut cmd =
                    SaleCmd::credit(account_id, amount, ClientRef::Name(client_name), at);
                if let Some(notes) = notes {
                    cmd = cmd.notes(notes);
                }
                let receipt = self.record_sale(cmd).await?;
                let message = match &receipt.client {
                    Some(client) => format!(
                        "Credit sale of {amount} francs recorded for {}. Total owed: {} francs",
                        client.name, client.total_credit
                    ),
                    None => format!("Credit sale of {amount} francs recorded"),
                };
                Ok(CommandOutcome {
                    message,
                    data: CommandData::Sale(receipt),
                })
            }
            Command::Sale {
                amount,
                payment_mode: PaymentMode::Cash,
                client_name,
                notes,
            } => {
                let mut cmd = SaleCmd::cash(account_id, amount, at);
                if let Some(name) = client_name {
                    cmd = cmd.customer_name(name);
                }
                if let Some(notes) = notes {
                    cmd = cmd.notes(notes);
                }
                let receipt = self.record_sale(cmd).await?;
                Ok(CommandOutcome {
                    message: format!("Cash sale of {amount} francs recorded"),
                    data: CommandData::Sale(receipt),
                })
            }
            Command::Expense {
                amount,
                motif,
                category,
            } => {
                let mut cmd = ExpenseCmd::new(account_id, amount, motif, at);
                if let Some(category) = category {
                    cmd = cmd.category(category);
                }
                let expense = self.new_expense(cmd).await?;
                Ok(CommandOutcome {
                    message: format!(
                        "Expense of {} francs recorded: {}",
                        expense.amount, expense.motif
                    ),
                    data: CommandData::Expense(expense),
                })
            }
            Command::NewClient {
                name,
                phone,
                address,
            } => {
                let mut cmd = NewClientCmd::new(account_id, name, at);
                if let Some(phone) = phone {
                    cmd = cmd.phone(phone);
                }
                if let Some(address) = address {
                    cmd = cmd.address(address);
                }
                let client = self.new_client(cmd).await?;
                Ok(CommandOutcome {
                    message: format!("Client {} created", client.name),
                    data: CommandData::Client(client),
                })
            }
        }
    }
}
