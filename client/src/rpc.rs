use std::{sync::Arc, time::Duration};

use anchor_lang::{prelude::Pubkey, AccountDeserialize};
use async_trait::async_trait;
use election::{Candidate, Election, VotedEvent, VoterRecord};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{account::Account, commitment_config::CommitmentConfig};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{error::ClientError, ledger::Ledger};

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Read-only view of a deployed election program over JSON-RPC.
///
/// Holds no signer, so `vote` always fails with `WalletUnavailable`. Voted
/// notifications come from [`RpcLedger::watch`], which polls the election
/// account and emits one event per counted ballot.
pub struct RpcLedger {
    rpc_client: RpcClient,
    program_id: Pubkey,
    election: Pubkey,
    events: broadcast::Sender<VotedEvent>,
}

impl RpcLedger {
    pub fn new(rpc_url: String, program_id: Pubkey, authority: Pubkey) -> Self {
        let (election, _) =
            Pubkey::find_program_address(&[Election::SEED, authority.as_ref()], &program_id);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            rpc_client: RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()),
            program_id,
            election,
            events,
        }
    }

    pub fn election_address(&self) -> Pubkey {
        self.election
    }

    pub fn voter_record_address(&self, account: &Pubkey) -> Pubkey {
        let (address, _) = Pubkey::find_program_address(
            &[VoterRecord::SEED, self.election.as_ref(), account.as_ref()],
            &self.program_id,
        );
        address
    }

    async fn fetch(&self, address: &Pubkey) -> Result<Option<Account>, ClientError> {
        let response = self
            .rpc_client
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await
            .map_err(|e| ClientError::ReadFailure(format!("{address}: {e}")))?;
        Ok(response.value)
    }

    async fn fetch_election(&self) -> Result<Election, ClientError> {
        let account = self.fetch(&self.election).await?.ok_or_else(|| {
            ClientError::ReadFailure(format!("election account {} not found", self.election))
        })?;
        decode_account(&account, &self.program_id)
    }

    /// Polls the election account every `period` and publishes a
    /// `VotedEvent` for each ballot counted since the previous poll.
    pub fn watch(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            let mut previous: Option<Vec<Candidate>> = None;

            loop {
                interval.tick().await;
                let current = match self.fetch_election().await {
                    Ok(election) => election.candidates,
                    Err(e) => {
                        warn!("Failed to poll election: {e}");
                        continue;
                    }
                };

                if let Some(previous) = &previous {
                    for event in new_ballots(previous, &current) {
                        debug!(candidate_id = event.candidate_id, "Ballot observed on chain");
                        let _ = self.events.send(event);
                    }
                }
                previous = Some(current);
            }
        })
    }
}

/// Decodes an account owned by `program_id`, checking its discriminator.
pub fn decode_account<T: AccountDeserialize>(
    account: &Account,
    program_id: &Pubkey,
) -> Result<T, ClientError> {
    if account.owner != *program_id {
        return Err(ClientError::ReadFailure(format!(
            "account owned by {}, expected {program_id}",
            account.owner
        )));
    }
    T::try_deserialize(&mut &account.data[..]).map_err(|e| ClientError::ReadFailure(e.to_string()))
}

/// One event per vote-count increment between two tally snapshots.
fn new_ballots(previous: &[Candidate], current: &[Candidate]) -> Vec<VotedEvent> {
    current
        .iter()
        .flat_map(|candidate| {
            let before = previous
                .iter()
                .find(|c| c.id == candidate.id)
                .map(|c| c.vote_count)
                .unwrap_or(0);
            let added = candidate.vote_count.saturating_sub(before);
            (0..added).map(move |_| VotedEvent {
                candidate_id: candidate.id,
            })
        })
        .collect()
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn candidates(&self) -> Result<Vec<Candidate>, ClientError> {
        Ok(self.fetch_election().await?.candidates)
    }

    async fn has_voted(&self, account: &Pubkey) -> Result<bool, ClientError> {
        let address = self.voter_record_address(account);
        match self.fetch(&address).await? {
            // No record yet means the account has not voted.
            None => Ok(false),
            Some(data) => {
                let record: VoterRecord = decode_account(&data, &self.program_id)?;
                Ok(record.has_voted)
            }
        }
    }

    async fn vote(&self, account: &Pubkey, candidate_id: u32) -> Result<VotedEvent, ClientError> {
        info!(%account, candidate_id, "No signer available for RPC ledger");
        Err(ClientError::WalletUnavailable)
    }

    fn subscribe(&self) -> broadcast::Receiver<VotedEvent> {
        self.events.subscribe()
    }
}
