pub mod transaction;

pub use transaction::{generate_reference, TransactionStatus, TransactionType};
