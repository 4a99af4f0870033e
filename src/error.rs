use crate::ledger::LedgerError;
use thiserror::Error;

/// Failure taxonomy for the transfer and issuance flows. Ledger
/// failures pass through unmodified; the caller owns user-facing
/// messaging.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("amount is higher than available balance ({requested} > {available})")]
    InsufficientBalance { requested: u64, available: u64 },
    #[error("amount {requested} cannot be reached with existing coins in this wallet")]
    UnreachableAmount { requested: u64 },
    #[error("no outstanding dividend to issue coins against")]
    NoOutstandingDividend,
    #[error("ledger rejected the issuance for amendment {amendment}")]
    IssuanceSubmissionFailed { amendment: u64 },
    #[error("ledger rejected the transfer")]
    TransferSubmissionFailed,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
