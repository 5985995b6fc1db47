//! Transaction data structures for payment fraud scoring

use crate::error::{Result, ScoringError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Payment transaction type (closed set, PaySim vocabulary)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Transfer,
    CashOut,
    Payment,
    CashIn,
    Debit,
}

impl TransactionType {
    /// All types, in encoding order.
    pub const ALL: [TransactionType; 5] = [
        TransactionType::Transfer,
        TransactionType::CashOut,
        TransactionType::Payment,
        TransactionType::CashIn,
        TransactionType::Debit,
    ];

    /// Integer code the classifier was trained with.
    ///
    /// Must match the training-time encoding; nothing checks it against
    /// model metadata.
    pub fn code(self) -> u8 {
        match self {
            TransactionType::Transfer => 1,
            TransactionType::CashOut => 2,
            TransactionType::Payment => 3,
            TransactionType::CashIn => 4,
            TransactionType::Debit => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Transfer => "TRANSFER",
            TransactionType::CashOut => "CASH_OUT",
            TransactionType::Payment => "PAYMENT",
            TransactionType::CashIn => "CASH_IN",
            TransactionType::Debit => "DEBIT",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown transaction type `{0}` (expected one of TRANSFER, CASH_OUT, PAYMENT, CASH_IN, DEBIT)")]
pub struct ParseTransactionTypeError(String);

impl FromStr for TransactionType {
    type Err = ParseTransactionTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ParseTransactionTypeError(s.to_string()))
    }
}

/// A transaction to be scored. Built fresh per request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Time index (hours since simulation start in PaySim)
    pub step: u64,

    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    pub amount: f64,

    /// Sender balance before the transaction
    #[serde(alias = "oldbalanceOrg")]
    pub old_balance_origin: f64,

    /// Sender balance after the transaction
    #[serde(alias = "newbalanceOrig")]
    pub new_balance_origin: f64,

    /// Receiver balance before the transaction
    #[serde(alias = "oldbalanceDest")]
    pub old_balance_dest: f64,

    /// Receiver balance after the transaction
    #[serde(alias = "newbalanceDest")]
    pub new_balance_dest: f64,
}

impl TransactionRecord {
    /// Sender balance drop; negative when the sender balance grew.
    pub fn balance_diff(&self) -> f64 {
        self.old_balance_origin - self.new_balance_origin
    }

    /// Reject negative or non-finite monetary fields.
    ///
    /// Balances that are inconsistent with the amount are accepted as-is.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("amount", self.amount),
            ("oldbalanceOrg", self.old_balance_origin),
            ("newbalanceOrig", self.new_balance_origin),
            ("oldbalanceDest", self.old_balance_dest),
            ("newbalanceDest", self.new_balance_dest),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ScoringError::InvalidRecord(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TransactionRecord {
        TransactionRecord {
            step: 1,
            transaction_type: TransactionType::CashOut,
            amount: 181.0,
            old_balance_origin: 181.0,
            new_balance_origin: 0.0,
            old_balance_dest: 21182.0,
            new_balance_dest: 0.0,
        }
    }

    #[test]
    fn test_type_codes() {
        let codes: Vec<u8> = TransactionType::ALL.iter().map(|t| t.code()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_type_from_str() {
        assert_eq!("TRANSFER".parse(), Ok(TransactionType::Transfer));
        assert_eq!("cash_out".parse(), Ok(TransactionType::CashOut));
        assert_eq!("cash-in".parse(), Ok(TransactionType::CashIn));
        assert!("WIRE".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_balance_diff_is_signed() {
        let mut tx = sample();
        assert_eq!(tx.balance_diff(), 181.0);

        tx.new_balance_origin = 500.0;
        assert_eq!(tx.balance_diff(), -319.0);
    }

    #[test]
    fn test_validate_rejects_negative_amount() {
        let mut tx = sample();
        assert!(tx.validate().is_ok());

        tx.amount = -1.0;
        assert!(matches!(tx.validate(), Err(ScoringError::InvalidRecord(_))));
    }

    #[test]
    fn test_transaction_deserializes_paysim_columns() {
        let json = r#"{
            "step": 1,
            "type": "CASH_OUT",
            "amount": 181.0,
            "oldbalanceOrg": 181.0,
            "newbalanceOrig": 0.0,
            "oldbalanceDest": 21182.0,
            "newbalanceDest": 0.0
        }"#;

        let tx: TransactionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(tx, sample());
    }
}
