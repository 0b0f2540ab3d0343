use election::ElectionError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Account has already voted")]
    DoubleVote,

    #[error("Candidate does not exist")]
    InvalidCandidate,

    #[error("No wallet connected")]
    WalletUnavailable,

    #[error("Failed to read ledger state: {0}")]
    ReadFailure(String),

    #[error("Ledger rejected the transaction: {0}")]
    Ledger(String),

    #[error("Invalid descriptor: {0}")]
    Descriptor(String),
}

impl From<anchor_lang::error::Error> for ClientError {
    fn from(err: anchor_lang::error::Error) -> Self {
        if err == anchor_lang::error::Error::from(ElectionError::DoubleVote) {
            ClientError::DoubleVote
        } else if err == anchor_lang::error::Error::from(ElectionError::InvalidCandidate) {
            ClientError::InvalidCandidate
        } else {
            ClientError::Ledger(err.to_string())
        }
    }
}
