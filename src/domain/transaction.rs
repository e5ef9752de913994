//! Transaction domain types.
//! Product kinds, status lifecycle and reference generation.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use uuid::Uuid;

/// Product categories a purchase can be made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Data,
    Airtime,
    Cable,
    Transfer,
    AirtimeToCash,
    Exam,
}

pub const ALL_TRANSACTION_TYPES: &[TransactionType] = &[
    TransactionType::Data,
    TransactionType::Airtime,
    TransactionType::Cable,
    TransactionType::Transfer,
    TransactionType::AirtimeToCash,
    TransactionType::Exam,
];

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Data => "data",
            TransactionType::Airtime => "airtime",
            TransactionType::Cable => "cable",
            TransactionType::Transfer => "transfer",
            TransactionType::AirtimeToCash => "airtime2cash",
            TransactionType::Exam => "exam",
        }
    }

    /// Prefix used when generating a transaction reference.
    pub fn reference_prefix(&self) -> &'static str {
        match self {
            TransactionType::Data => "DATA",
            TransactionType::Airtime => "AIRTIME",
            TransactionType::Cable => "CABLE",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::AirtimeToCash => "A2C",
            TransactionType::Exam => "EXAM",
        }
    }

    /// Human-readable product name for provider messages.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Data => "Data",
            TransactionType::Airtime => "Airtime",
            TransactionType::Cable => "Cable TV",
            TransactionType::Transfer => "Transfer",
            TransactionType::AirtimeToCash => "Airtime to cash",
            TransactionType::Exam => "Exam PIN",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "data" => Ok(TransactionType::Data),
            "airtime" => Ok(TransactionType::Airtime),
            "cable" => Ok(TransactionType::Cable),
            "transfer" => Ok(TransactionType::Transfer),
            "airtime2cash" => Ok(TransactionType::AirtimeToCash),
            "exam" => Ok(TransactionType::Exam),
            other => Err(format!("unknown product type: {}", other)),
        }
    }
}

/// Transaction lifecycle. Created as `Processing` after a successful wallet
/// deduction, finalized exactly once to `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Processing,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Processing => "processing",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "processing" => Ok(TransactionStatus::Processing),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// Generates a reference of the form `<PREFIX>-<unix-millis>-<random>`.
/// The random tail is 12 hex characters, so collisions are vanishingly
/// unlikely even for references generated within the same millisecond.
pub fn generate_reference(tx_type: TransactionType) -> String {
    let millis = Utc::now().timestamp_millis();
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", tx_type.reference_prefix(), millis, &salt[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn type_round_trips_through_str() {
        for tx_type in ALL_TRANSACTION_TYPES {
            assert_eq!(tx_type.as_str().parse::<TransactionType>(), Ok(*tx_type));
        }
        assert!("sms".parse::<TransactionType>().is_err());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            TransactionStatus::Processing,
            TransactionStatus::Completed,
            TransactionStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<TransactionStatus>(), Ok(status));
        }
        assert!("pending".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!TransactionStatus::Processing.is_terminal());
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
    }

    #[test]
    fn reference_has_expected_shape() {
        let reference = generate_reference(TransactionType::Data);
        let parts: Vec<&str> = reference.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "DATA");
        assert!(parts[1].parse::<i64>().unwrap() > 0);
        assert_eq!(parts[2].len(), 12);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn reference_prefix_follows_type() {
        assert!(generate_reference(TransactionType::AirtimeToCash).starts_with("A2C-"));
        assert!(generate_reference(TransactionType::Exam).starts_with("EXAM-"));
    }

    #[test]
    fn references_are_unique_across_10k_samples() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(generate_reference(TransactionType::Airtime)));
        }
    }
}
