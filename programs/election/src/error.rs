use anchor_lang::prelude::*;

#[error_code]
pub enum ElectionError {
    #[msg("Voter has already cast a ballot")]
    DoubleVote,
    #[msg("Candidate does not exist")]
    InvalidCandidate,
    #[msg("Ballot needs at least one candidate")]
    NoCandidates,
    #[msg("Ballot has more candidates than the account can hold")]
    TooManyCandidates,
    #[msg("Candidate name is too long")]
    NameTooLong,
    #[msg("Vote count overflow")]
    TallyOverflow,
}
