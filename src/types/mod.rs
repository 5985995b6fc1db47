//! Type definitions for the scoring pipeline

pub mod assessment;
pub mod transaction;

pub use assessment::{RiskTier, ScoringReport, ScoringResult};
pub use transaction::{TransactionRecord, TransactionType};
