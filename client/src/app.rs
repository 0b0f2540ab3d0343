use anchor_lang::prelude::Pubkey;
use election::VotedEvent;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing::{debug, error, info, warn};

use crate::{
    error::ClientError,
    ledger::Ledger,
    view::{Render, View},
};

/// User actions fed into [`App::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect(Pubkey),
    Vote(u32),
}

/// Client state: the ledger handle, the renderer and the connected account.
///
/// Only [`App::connect`] and the sync operations change it. Tally data is
/// never kept between refreshes; every refresh reads the ledger again.
pub struct App<L, R> {
    ledger: L,
    renderer: R,
    account: Option<Pubkey>,
}

impl<L: Ledger, R: Render> App<L, R> {
    pub fn new(ledger: L, renderer: R) -> Self {
        Self {
            ledger,
            renderer,
            account: None,
        }
    }

    pub fn account(&self) -> Option<Pubkey> {
        self.account
    }

    pub fn connect(&mut self, account: Pubkey) {
        info!(%account, "Wallet connected");
        self.account = Some(account);
    }

    /// Re-reads the tally and the connected account's status, then renders.
    ///
    /// On a failed read the cycle is abandoned and the view is left on
    /// `Loading`.
    pub async fn refresh(&mut self) -> Result<View, ClientError> {
        let Some(account) = self.account else {
            self.renderer.render(&View::Disconnected);
            return Ok(View::Disconnected);
        };

        self.renderer.render(&View::Loading);

        let candidates = self.ledger.candidates().await.map_err(read_failure)?;
        let has_voted = self.ledger.has_voted(&account).await.map_err(read_failure)?;

        let view = View::Ready {
            account,
            candidates,
            can_vote: !has_voted,
        };
        self.renderer.render(&view);
        Ok(view)
    }

    /// Submits a ballot for the connected account.
    ///
    /// A rejected ballot is logged and returned with the view unchanged. An
    /// accepted one switches the view to `Loading` until the ledger's
    /// notification triggers the next refresh.
    pub async fn cast_vote(&mut self, candidate_id: u32) -> Result<VotedEvent, ClientError> {
        let Some(account) = self.account else {
            error!(candidate_id, "Cannot vote without a connected wallet");
            return Err(ClientError::WalletUnavailable);
        };

        match self.ledger.vote(&account, candidate_id).await {
            Ok(event) => {
                info!(%account, candidate_id, "Vote accepted");
                self.renderer.render(&View::Loading);
                Ok(event)
            }
            Err(e) => {
                error!(%account, candidate_id, "Vote rejected: {e}");
                Err(e)
            }
        }
    }

    async fn sync(&mut self) {
        // Failures are already logged by `refresh`.
        let _ = self.refresh().await;
    }

    /// Event loop: applies user commands and refreshes after every ledger
    /// notification until either the command channel or the ledger's event
    /// channel closes.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Self {
        let mut events = self.ledger.subscribe();
        self.sync().await;

        loop {
            tokio::select! {
                // Pending notifications go first so the final view reflects
                // every ballot committed before the command channel closed.
                biased;

                event = events.recv() => match event {
                    Ok(VotedEvent { candidate_id }) => {
                        debug!(candidate_id, "Voted event received");
                        self.sync().await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed voted events, refreshing");
                        self.sync().await;
                    }
                    Err(RecvError::Closed) => {
                        info!("Ledger event stream closed");
                        break;
                    }
                },
                command = commands.recv() => match command {
                    Some(Command::Connect(account)) => {
                        self.connect(account);
                        self.sync().await;
                    }
                    Some(Command::Vote(candidate_id)) => {
                        let _ = self.cast_vote(candidate_id).await;
                    }
                    None => break,
                },
            }
        }

        self
    }
}

fn read_failure(err: ClientError) -> ClientError {
    let err = match err {
        ClientError::ReadFailure(_) => err,
        other => ClientError::ReadFailure(other.to_string()),
    };
    warn!("Abandoning render: {err}");
    err
}
