//! Error types for the collectible ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// Every precondition violation fails the whole operation synchronously with
/// no partial state change. Failures are deterministic for a given state and
/// input, except [`Error::TransferFailed`], which depends on the external
/// recipient's accept/reject behavior.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The empty address was supplied where a real party is required
    #[error("Zero address")]
    ZeroAddress,

    /// A zero amount was supplied where a positive amount is required
    #[error("Zero amount")]
    ZeroAmount,

    /// The external value-transfer primitive reported failure
    #[error("External value transfer failed")]
    TransferFailed,

    /// Account balance is below the requested debit
    #[error("Insufficient balance: have {available}, need {required}")]
    InsufficientBalance {
        /// Current balance
        available: u128,
        /// Requested debit
        required: u128,
    },

    /// Payment too small for the requested operation
    #[error("Insufficient payment")]
    InsufficientPayment,

    /// The global pause flag is set
    #[error("Ledger is paused")]
    Paused,

    /// Caller lacks the required role
    #[error("Caller {0} is not authorized")]
    NotAuthorized(String),

    /// Collectible supply cap reached (or would be crossed by a batch)
    #[error("Max collectible supply reached")]
    MaxSupplyReached,

    /// No collectible with the given id has been minted
    #[error("Collectible {0} not found")]
    NotFound(u64),

    /// Caller does not own the collectible being moved
    #[error("Collectible {id} is not owned by {claimed}")]
    NotOwner {
        /// Collectible id
        id: u64,
        /// The account that claimed ownership
        claimed: String,
    },

    /// Free-mint hold requirement not satisfied
    #[error("Hold requirement not met: have {balance}, need {required}")]
    HoldRequirementNotMet {
        /// Caller's token balance
        balance: u128,
        /// Required balance
        required: u128,
    },

    /// Argument out of range or mismatched lengths
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Token price is unset; purchases cannot be quoted
    #[error("Token price is zero")]
    PriceZero,

    /// A nested call re-entered the engine while an operation was in progress
    #[error("Reentrant call rejected")]
    Reentrancy,

    /// Checked arithmetic would overflow
    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Metrics(err.to_string())
    }
}
