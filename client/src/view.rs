use std::io::Write;

use anchor_lang::prelude::Pubkey;
use election::Candidate;
use tracing::warn;

/// What the client shows at a given moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// No wallet connected; only the connect prompt is shown.
    Disconnected,
    Loading,
    Ready {
        account: Pubkey,
        candidates: Vec<Candidate>,
        /// The voting control is shown only while the account has not voted.
        can_vote: bool,
    },
}

pub trait Render: Send {
    fn render(&mut self, view: &View);
}

/// Renders views as a plain-text results table.
pub struct TextRenderer<W> {
    out: W,
}

impl<W: Write + Send> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_view(&mut self, view: &View) -> std::io::Result<()> {
        match view {
            View::Disconnected => writeln!(self.out, "Connect a wallet to see the ballot.")?,
            View::Loading => writeln!(self.out, "Loading...")?,
            View::Ready {
                account,
                candidates,
                can_vote,
            } => {
                writeln!(self.out, "Connected: {account}")?;
                writeln!(self.out, "{:>3}  {:<32}  {:>6}", "#", "Name", "Votes")?;
                for candidate in candidates {
                    writeln!(
                        self.out,
                        "{:>3}  {:<32}  {:>6}",
                        candidate.id, candidate.name, candidate.vote_count
                    )?;
                }

                if *can_vote {
                    let options = candidates
                        .iter()
                        .map(|c| format!("[{}] {}", c.id, c.name))
                        .collect::<Vec<_>>()
                        .join("  ");
                    writeln!(self.out, "Vote: {options}")?;
                } else {
                    writeln!(self.out, "You have already voted.")?;
                }
            }
        }
        self.out.flush()
    }
}

impl<W: Write + Send> Render for TextRenderer<W> {
    fn render(&mut self, view: &View) {
        if let Err(e) = self.write_view(view) {
            warn!("Failed to render view: {e}");
        }
    }
}
