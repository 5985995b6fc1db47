//! Test Transaction Generator
//!
//! Writes random PaySim-style transactions as CSV for exercising
//! `fraud-scorer batch`.

use clap::Parser;
use fraud_risk_scorer::{TransactionRecord, TransactionType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "generate-transactions", about = "Generate random test transactions as CSV")]
struct Args {
    /// Number of transactions to generate
    #[arg(long, default_value_t = 100)]
    count: u64,

    /// Fraction of suspicious transactions
    #[arg(long, default_value_t = 0.1)]
    fraud_rate: f64,

    /// Output file (default: stdout)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// RNG seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

/// Transaction generator for testing
struct TransactionGenerator {
    rng: StdRng,
    step: u64,
}

impl TransactionGenerator {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, step: 1 }
    }

    fn advance(&mut self) -> u64 {
        // Roughly one step (hour) every twenty transactions
        if self.rng.gen_bool(0.05) {
            self.step += 1;
        }
        self.step
    }

    /// Generate a random legitimate transaction
    fn generate_legitimate(&mut self) -> TransactionRecord {
        let step = self.advance();
        let transaction_type = self.random_choice(&[
            TransactionType::Payment,
            TransactionType::CashIn,
            TransactionType::Debit,
            TransactionType::Payment,
            TransactionType::CashOut,
        ]);
        let amount: f64 = self.rng.gen_range(10.0..20_000.0);
        let old_balance_origin: f64 = self.rng.gen_range(amount..amount * 20.0);
        let old_balance_dest: f64 = self.rng.gen_range(0.0..500_000.0);

        let (new_balance_origin, new_balance_dest) = match transaction_type {
            TransactionType::CashIn => (
                old_balance_origin + amount,
                (old_balance_dest - amount).max(0.0),
            ),
            TransactionType::Payment => (old_balance_origin - amount, 0.0),
            _ => (old_balance_origin - amount, old_balance_dest + amount),
        };

        TransactionRecord {
            step,
            transaction_type,
            amount: round_cents(amount),
            old_balance_origin: round_cents(old_balance_origin),
            new_balance_origin: round_cents(new_balance_origin),
            old_balance_dest: round_cents(old_balance_dest),
            new_balance_dest: round_cents(new_balance_dest),
        }
    }

    /// Generate a suspicious transaction: a large transfer or cash-out
    /// draining the sender account
    fn generate_suspicious(&mut self) -> TransactionRecord {
        let step = self.advance();
        let transaction_type =
            self.random_choice(&[TransactionType::Transfer, TransactionType::CashOut]);
        let amount: f64 = self.rng.gen_range(150_000.0..2_000_000.0);
        let old_balance_dest: f64 = if self.rng.gen_bool(0.5) {
            0.0
        } else {
            self.rng.gen_range(0.0..100_000.0)
        };

        TransactionRecord {
            step,
            transaction_type,
            amount: round_cents(amount),
            old_balance_origin: round_cents(amount),
            new_balance_origin: 0.0,
            old_balance_dest: round_cents(old_balance_dest),
            // Destination balance often not updated for fraudulent transfers
            new_balance_dest: round_cents(old_balance_dest),
        }
    }

    fn random_choice<T: Copy>(&mut self, choices: &[T]) -> T {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("generate_transactions=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.fraud_rate),
        "--fraud-rate must be within [0, 1]"
    );

    info!(
        count = args.count,
        fraud_rate = args.fraud_rate,
        seed = ?args.seed,
        "Generating transactions"
    );

    let writer: Box<dyn io::Write> = match &args.output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut wtr = csv::Writer::from_writer(writer);

    // PaySim column names
    wtr.write_record([
        "step",
        "type",
        "amount",
        "oldbalanceOrg",
        "newbalanceOrig",
        "oldbalanceDest",
        "newbalanceDest",
    ])?;

    let mut generator = TransactionGenerator::new(args.seed);
    let mut legitimate_count = 0u64;
    let mut suspicious_count = 0u64;

    for _ in 0..args.count {
        let tx = if generator.rng.gen_bool(args.fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };

        wtr.write_record([
            tx.step.to_string(),
            tx.transaction_type.to_string(),
            tx.amount.to_string(),
            tx.old_balance_origin.to_string(),
            tx.new_balance_origin.to_string(),
            tx.old_balance_dest.to_string(),
            tx.new_balance_dest.to_string(),
        ])?;
    }

    wtr.flush()?;

    info!(
        "Completed! Generated {} transactions ({} legitimate, {} suspicious)",
        args.count, legitimate_count, suspicious_count
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_records_are_valid() {
        let mut generator = TransactionGenerator::new(Some(7));

        for _ in 0..200 {
            let legit = generator.generate_legitimate();
            assert!(legit.validate().is_ok(), "{legit:?}");
            assert!(legit.amount >= 10.0 && legit.amount <= 20_000.0);

            let suspicious = generator.generate_suspicious();
            assert!(suspicious.validate().is_ok(), "{suspicious:?}");
            assert_eq!(suspicious.new_balance_origin, 0.0);
            assert!(matches!(
                suspicious.transaction_type,
                TransactionType::Transfer | TransactionType::CashOut
            ));
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let mut a = TransactionGenerator::new(Some(42));
        let mut b = TransactionGenerator::new(Some(42));

        for _ in 0..20 {
            assert_eq!(a.generate_legitimate(), b.generate_legitimate());
            assert_eq!(a.generate_suspicious(), b.generate_suspicious());
        }
    }
}
