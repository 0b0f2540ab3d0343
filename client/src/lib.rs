//! Client side of the election ballot.
//!
//! The ledger is the only system of record. [`App`] keeps a view of it for
//! one connected account: every `voted` notification from the ledger triggers
//! a full re-read of the tally and of the account's voter status, and the
//! voting control is hidden once that account has voted.

pub mod app;
pub mod config;
pub mod error;
pub mod ledger;
pub mod rpc;
pub mod view;

pub use app::{App, Command};
pub use config::Descriptor;
pub use error::ClientError;
pub use ledger::{InMemoryLedger, Ledger};
pub use rpc::RpcLedger;
pub use view::{Render, TextRenderer, View};
