use std::{env, fs, path::Path, str::FromStr};

use anchor_lang::prelude::Pubkey;
use election::DEFAULT_CANDIDATES;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ClientError;

pub const DESCRIPTOR_ENV: &str = "ELECTION_DESCRIPTOR";
pub const DEFAULT_DESCRIPTOR: &str = "election.json";

/// Static description of the deployed ballot, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub program_id: String,
    pub authority: String,
    /// RPC endpoint of the cluster running the program. Without one the
    /// client runs against an in-process ledger.
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub candidates: Vec<String>,
}

impl Descriptor {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| ClientError::Descriptor(format!("{}: {e}", path.display())))?;

        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let descriptor: Descriptor =
            serde_json::from_str(raw).map_err(|e| ClientError::Descriptor(e.to_string()))?;

        // Surface bad addresses at startup rather than on first use.
        descriptor.program_id()?;
        descriptor.authority()?;

        Ok(descriptor)
    }

    pub fn program_id(&self) -> Result<Pubkey, ClientError> {
        parse_pubkey("program_id", &self.program_id)
    }

    pub fn authority(&self) -> Result<Pubkey, ClientError> {
        parse_pubkey("authority", &self.authority)
    }

    /// Ballot names, falling back to the default two-candidate ballot.
    pub fn candidate_names(&self) -> Vec<String> {
        if self.candidates.is_empty() {
            DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect()
        } else {
            self.candidates.clone()
        }
    }

    /// Address of the election account owned by `program_id` for `authority`.
    pub fn election_address(&self) -> Result<Pubkey, ClientError> {
        let authority = self.authority()?;
        let (address, _) = Pubkey::find_program_address(
            &[election::Election::SEED, authority.as_ref()],
            &self.program_id()?,
        );
        Ok(address)
    }
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey, ClientError> {
    Pubkey::from_str(value)
        .map_err(|e| ClientError::Descriptor(format!("{field} `{value}`: {e}")))
}

/// Descriptor path from the command line, the environment, or the default.
pub fn descriptor_path(cli: Option<String>) -> String {
    if let Some(path) = cli {
        return path;
    }

    env::var(DESCRIPTOR_ENV).unwrap_or_else(|_| {
        info!("{DESCRIPTOR_ENV} not set, using default: {DEFAULT_DESCRIPTOR}");
        DEFAULT_DESCRIPTOR.to_string()
    })
}
