//! Command structs for engine operations.
//!
//! Two families live here:
//!
//! - parameter objects for the ledger write operations (`SaleCmd`,
//!   `PaymentCmd`, `ExpenseCmd`, `NewClientCmd`), keeping call sites readable;
//! - the wire shape produced by the external command interpreter
//!   ([`InterpretedCommand`]) and its validated form ([`Command`]), consumed
//!   by the command applier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Client, EngineError, Expense, PaymentMode, ResultEngine, SaleReceipt};

/// How a sale designates its client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientRef {
    Id(Uuid),
    /// Resolved with the account-scoped fuzzy name lookup.
    Name(String),
}

/// Record a sale.
#[derive(Clone, Debug)]
pub struct SaleCmd {
    pub account_id: Uuid,
    pub amount: i64,
    pub payment_mode: PaymentMode,
    pub customer_name: Option<String>,
    pub client: Option<ClientRef>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl SaleCmd {
    #[must_use]
    pub fn new(
        account_id: Uuid,
        amount: i64,
        payment_mode: PaymentMode,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            amount,
            payment_mode,
            customer_name: None,
            client: None,
            notes: None,
            occurred_at,
        }
    }

    #[must_use]
    pub fn cash(account_id: Uuid, amount: i64, occurred_at: DateTime<Utc>) -> Self {
        Self::new(account_id, amount, PaymentMode::Cash, occurred_at)
    }

    #[must_use]
    pub fn credit(
        account_id: Uuid,
        amount: i64,
        client: ClientRef,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self::new(account_id, amount, PaymentMode::Credit, occurred_at).client(client)
    }

    #[must_use]
    pub fn client(mut self, client: ClientRef) -> Self {
        self.client = Some(client);
        self
    }

    #[must_use]
    pub fn customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Record a payment against a client's credit.
#[derive(Clone, Debug)]
pub struct PaymentCmd {
    pub account_id: Uuid,
    pub client_id: Uuid,
    pub amount: i64,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl PaymentCmd {
    #[must_use]
    pub fn new(
        account_id: Uuid,
        client_id: Uuid,
        amount: i64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            client_id,
            amount,
            notes: None,
            occurred_at,
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Record an expense.
#[derive(Clone, Debug)]
pub struct ExpenseCmd {
    pub account_id: Uuid,
    pub amount: i64,
    pub motif: String,
    pub category: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl ExpenseCmd {
    #[must_use]
    pub fn new(
        account_id: Uuid,
        amount: i64,
        motif: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            amount,
            motif: motif.into(),
            category: None,
            occurred_at,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Register a client.
#[derive(Clone, Debug)]
pub struct NewClientCmd {
    pub account_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewClientCmd {
    #[must_use]
    pub fn new(account_id: Uuid, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            account_id,
            name: name.into(),
            phone: None,
            address: None,
            created_at,
        }
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// Structured output of the command interpreter, as received on the wire.
///
/// Nothing here is trusted: every field is optional and checked by
/// [`InterpretedCommand::into_command`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InterpretedCommand {
    #[serde(rename = "vente")]
    Sale {
        #[serde(rename = "montant", default)]
        amount: Option<f64>,
        #[serde(rename = "modePaiement", default)]
        payment_mode: Option<String>,
        #[serde(rename = "nomClient", default)]
        client_name: Option<String>,
        #[serde(default)]
        notes: Option<String>,
    },
    #[serde(rename = "depense")]
    Expense {
        #[serde(rename = "montant", default)]
        amount: Option<f64>,
        #[serde(default)]
        motif: Option<String>,
        #[serde(rename = "categorie", default)]
        category: Option<String>,
    },
    #[serde(rename = "nouveau_client")]
    NewClient {
        #[serde(rename = "nom", default)]
        name: Option<String>,
        #[serde(rename = "telephone", default)]
        phone: Option<String>,
        #[serde(rename = "adresse", default)]
        address: Option<String>,
    },
    #[serde(rename = "erreur")]
    Error {
        #[serde(default)]
        message: Option<String>,
    },
}

/// A command that passed shape validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Sale {
        amount: i64,
        payment_mode: PaymentMode,
        client_name: Option<String>,
        notes: Option<String>,
    },
    Expense {
        amount: i64,
        motif: String,
        category: Option<String>,
    },
    NewClient {
        name: String,
        phone: Option<String>,
        address: Option<String>,
    },
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn whole_amount(amount: Option<f64>, errors: &mut Vec<String>) -> i64 {
    match amount {
        Some(value) if value.is_finite() && value > 0.0 && value.fract() == 0.0 => {
            if value > i64::MAX as f64 {
                errors.push("amount is too large".to_string());
                0
            } else {
                value as i64
            }
        }
        Some(value) if value.is_finite() && value > 0.0 => {
            errors.push("amount must be a whole number of francs".to_string());
            0
        }
        _ => {
            errors.push("amount must be > 0".to_string());
            0
        }
    }
}

impl InterpretedCommand {
    /// Validate the interpreter output, collecting every problem at once.
    ///
    /// An `erreur` command never reaches the applier: it becomes a
    /// validation error carrying the interpreter's reason.
    pub fn into_command(self) -> ResultEngine<Command> {
        let mut errors = Vec::new();
        let command = match self {
            Self::Error { message } => {
                return Err(EngineError::Validation(
                    non_blank(message).unwrap_or_else(|| "command not understood".to_string()),
                ));
            }
            Self::Sale {
                amount,
                payment_mode,
                client_name,
                notes,
            } => {
                let amount = whole_amount(amount, &mut errors);
                let payment_mode = match payment_mode.as_deref().map(str::trim) {
                    Some(raw) => PaymentMode::try_from(raw).ok(),
                    None => None,
                };
                if payment_mode.is_none() {
                    errors.push("payment mode must be cash or credit".to_string());
                }
                let client_name = non_blank(client_name);
                if payment_mode == Some(PaymentMode::Credit) && client_name.is_none() {
                    errors.push("a credit sale requires the client name".to_string());
                }
                payment_mode.map(|payment_mode| Command::Sale {
                    amount,
                    payment_mode,
                    client_name,
                    notes: non_blank(notes),
                })
            }
            Self::Expense {
                amount,
                motif,
                category,
            } => {
                let amount = whole_amount(amount, &mut errors);
                let motif = non_blank(motif);
                if motif.is_none() {
                    errors.push("an expense requires a motif".to_string());
                }
                motif.map(|motif| Command::Expense {
                    amount,
                    motif,
                    category: non_blank(category),
                })
            }
            Self::NewClient {
                name,
                phone,
                address,
            } => {
                let name = non_blank(name);
                if name.is_none() {
                    errors.push("a new client requires a name".to_string());
                }
                name.map(|name| Command::NewClient {
                    name,
                    phone: non_blank(phone),
                    address: non_blank(address),
                })
            }
        };

        match command {
            Some(command) if errors.is_empty() => Ok(command),
            _ => Err(EngineError::Validation(errors.join(", "))),
        }
    }
}

/// Entity produced by an applied command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entity", rename_all = "snake_case")]
pub enum CommandData {
    Sale(SaleReceipt),
    Expense(Expense),
    Client(Client),
}

/// Uniform `{message, data}` result of the command applier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub message: String,
    pub data: CommandData,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> InterpretedCommand {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_interpreter_sale() {
        let cmd = parse(
            r#"{"type":"vente","montant":5000,"modePaiement":"credit","nomClient":" Awa "}"#,
        );
        assert_eq!(
            cmd.into_command().unwrap(),
            Command::Sale {
                amount: 5000,
                payment_mode: PaymentMode::Credit,
                client_name: Some("Awa".to_string()),
                notes: None,
            }
        );
    }

    #[test]
    fn collects_every_sale_error() {
        let cmd = parse(r#"{"type":"vente","montant":-3,"modePaiement":"cheque"}"#);
        assert_eq!(
            cmd.into_command().unwrap_err(),
            EngineError::Validation(
                "amount must be > 0, payment mode must be cash or credit".to_string()
            )
        );
    }

    #[test]
    fn credit_sale_requires_client_name() {
        let cmd = parse(r#"{"type":"vente","montant":1000,"modePaiement":"credit","nomClient":"  "}"#);
        assert_eq!(
            cmd.into_command().unwrap_err(),
            EngineError::Validation("a credit sale requires the client name".to_string())
        );
    }

    #[test]
    fn fractional_amount_is_rejected() {
        let cmd = parse(r#"{"type":"depense","montant":12.5,"motif":"transport"}"#);
        assert_eq!(
            cmd.into_command().unwrap_err(),
            EngineError::Validation("amount must be a whole number of francs".to_string())
        );
    }

    #[test]
    fn expense_requires_motif() {
        let cmd = parse(r#"{"type":"depense","montant":1500}"#);
        assert_eq!(
            cmd.into_command().unwrap_err(),
            EngineError::Validation("an expense requires a motif".to_string())
        );
    }

    #[test]
    fn error_kind_short_circuits_with_reason() {
        let cmd = parse(r#"{"type":"erreur","message":"Reformulez svp."}"#);
        assert_eq!(
            cmd.into_command().unwrap_err(),
            EngineError::Validation("Reformulez svp.".to_string())
        );
    }

    #[test]
    fn new_client_keeps_optional_contact() {
        let cmd = parse(r#"{"type":"nouveau_client","nom":"Marie Koné","telephone":"0708070605"}"#);
        assert_eq!(
            cmd.into_command().unwrap(),
            Command::NewClient {
                name: "Marie Koné".to_string(),
                phone: Some("0708070605".to_string()),
                address: None,
            }
        );
    }

    #[test]
    fn unknown_kind_fails_to_parse() {
        assert!(serde_json::from_str::<InterpretedCommand>(r#"{"type":"stock"}"#).is_err());
    }
}
