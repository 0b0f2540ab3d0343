use std::sync::Arc;

use ahash::AHashMap;
use anchor_lang::prelude::Pubkey;
use async_trait::async_trait;
use election::{Candidate, Election, VotedEvent, VoterRecord};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

use crate::error::ClientError;

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// The system of record for candidates and ballots, as seen by the client.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Every candidate with its current tally, in id order.
    async fn candidates(&self) -> Result<Vec<Candidate>, ClientError>;

    async fn has_voted(&self, account: &Pubkey) -> Result<bool, ClientError>;

    /// Submits a ballot signed by `account`.
    async fn vote(&self, account: &Pubkey, candidate_id: u32) -> Result<VotedEvent, ClientError>;

    /// Receives a `VotedEvent` for every ballot committed after this call.
    fn subscribe(&self) -> broadcast::Receiver<VotedEvent>;
}

#[async_trait]
impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    async fn candidates(&self) -> Result<Vec<Candidate>, ClientError> {
        (**self).candidates().await
    }

    async fn has_voted(&self, account: &Pubkey) -> Result<bool, ClientError> {
        (**self).has_voted(account).await
    }

    async fn vote(&self, account: &Pubkey, candidate_id: u32) -> Result<VotedEvent, ClientError> {
        (**self).vote(account, candidate_id).await
    }

    fn subscribe(&self) -> broadcast::Receiver<VotedEvent> {
        (**self).subscribe()
    }
}

struct LedgerState {
    election: Election,
    voters: AHashMap<Pubkey, VoterRecord>,
}

/// Ledger that runs the ballot program's state machine in process.
///
/// All ballots go through a single lock, which gives them the same total
/// order a cluster would: of two ballots from one account only the first is
/// admitted.
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    events: broadcast::Sender<VotedEvent>,
}

impl InMemoryLedger {
    pub fn deploy(authority: Pubkey, names: Vec<String>) -> Result<Self, ClientError> {
        let election = Election::new(authority, names)?;
        info!(
            %authority,
            candidates = election.candidate_count(),
            "Deployed in-memory election"
        );

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            state: Mutex::new(LedgerState {
                election,
                voters: AHashMap::new(),
            }),
            events,
        })
    }

    /// Number of accounts whose ballot has been accepted.
    pub async fn voter_count(&self) -> usize {
        let state = self.state.lock().await;
        state.voters.values().filter(|r| r.has_voted).count()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn candidates(&self) -> Result<Vec<Candidate>, ClientError> {
        let state = self.state.lock().await;
        Ok(state.election.candidates.clone())
    }

    async fn has_voted(&self, account: &Pubkey) -> Result<bool, ClientError> {
        let state = self.state.lock().await;
        Ok(state
            .voters
            .get(account)
            .map(|record| record.has_voted)
            .unwrap_or(false))
    }

    async fn vote(&self, account: &Pubkey, candidate_id: u32) -> Result<VotedEvent, ClientError> {
        let mut state = self.state.lock().await;
        let LedgerState { election, voters } = &mut *state;

        // Work on a copy so a rejected ballot never creates a record.
        let mut record = voters
            .get(account)
            .cloned()
            .unwrap_or_else(|| VoterRecord::new(*account, 0));
        let event = election.record_vote(&mut record, candidate_id)?;
        voters.insert(*account, record);

        debug!(%account, candidate_id, "Ballot committed");
        // Published under the lock so subscribers see commit order.
        // No receivers is not an error.
        let _ = self.events.send(event.clone());

        Ok(event)
    }

    fn subscribe(&self) -> broadcast::Receiver<VotedEvent> {
        self.events.subscribe()
    }
}
