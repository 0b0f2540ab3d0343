use anchor_lang::prelude::*;

use crate::error::ElectionError;

pub const MAX_CANDIDATES: usize = 8;
pub const MAX_NAME_LEN: usize = 32;

/// Ballot used by a fresh deployment when no names are supplied.
pub const DEFAULT_CANDIDATES: [&str; 2] = ["Candidate 1", "Candidate 2"];

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub id: u32,
    pub name: String,
    pub vote_count: u64,
}

impl Candidate {
    // id + (len prefix + name) + vote_count
    pub const LEN: usize = 4 + (4 + MAX_NAME_LEN) + 8;
}

// One election per authority. Candidates are fixed once `initialize` runs;
// only their vote counts change afterwards.
#[account]
#[derive(Default, Debug)]
pub struct Election {
    pub authority: Pubkey,
    pub bump: u8,
    pub candidates: Vec<Candidate>,
    pub total_votes: u64,
}

impl Election {
    pub const SEED: &'static [u8] = b"election";
    // discriminator + authority + bump + (vec prefix + candidates) + total_votes
    pub const LEN: usize = 8 + 32 + 1 + (4 + MAX_CANDIDATES * Candidate::LEN) + 8;

    pub fn new(authority: Pubkey, names: Vec<String>) -> Result<Self> {
        let mut election = Election {
            authority,
            ..Default::default()
        };
        election.register_candidates(names)?;
        Ok(election)
    }

    /// Assigns ids `1..=n` in the order given. Validation happens before any
    /// candidate is written.
    pub fn register_candidates(&mut self, names: Vec<String>) -> Result<()> {
        require!(!names.is_empty(), ElectionError::NoCandidates);
        require!(
            names.len() <= MAX_CANDIDATES,
            ElectionError::TooManyCandidates
        );
        require!(
            names.iter().all(|name| name.len() <= MAX_NAME_LEN),
            ElectionError::NameTooLong
        );

        self.candidates = names
            .into_iter()
            .zip(1u32..)
            .map(|(name, id)| Candidate {
                id,
                name,
                vote_count: 0,
            })
            .collect();
        self.total_votes = 0;
        Ok(())
    }

    pub fn candidate_count(&self) -> u32 {
        self.candidates.len() as u32
    }

    pub fn candidate(&self, candidate_id: u32) -> Option<&Candidate> {
        let index = candidate_id.checked_sub(1)? as usize;
        self.candidates.get(index)
    }

    /// Applies one ballot. Every check runs before the first write, so a
    /// rejected ballot leaves both the tally and the voter record untouched.
    pub fn record_vote(
        &mut self,
        voter: &mut VoterRecord,
        candidate_id: u32,
    ) -> Result<VotedEvent> {
        require!(!voter.has_voted, ElectionError::DoubleVote);

        let index = candidate_id
            .checked_sub(1)
            .map(|index| index as usize)
            .filter(|index| *index < self.candidates.len())
            .ok_or(ElectionError::InvalidCandidate)?;

        let total_votes = self
            .total_votes
            .checked_add(1)
            .ok_or(ElectionError::TallyOverflow)?;
        let candidate = &mut self.candidates[index];

        candidate.vote_count = candidate
            .vote_count
            .checked_add(1)
            .ok_or(ElectionError::TallyOverflow)?;
        self.total_votes = total_votes;
        voter.has_voted = true;

        Ok(VotedEvent { candidate_id })
    }
}

#[account]
#[derive(Default, Debug)]
pub struct VoterRecord {
    pub voter: Pubkey,
    pub has_voted: bool,
    pub bump: u8,
}

impl VoterRecord {
    pub const SEED: &'static [u8] = b"voter";
    // discriminator + voter + has_voted + bump
    pub const LEN: usize = 8 + 32 + 1 + 1;

    pub fn new(voter: Pubkey, bump: u8) -> Self {
        VoterRecord {
            voter,
            has_voted: false,
            bump,
        }
    }
}

#[event]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotedEvent {
    pub candidate_id: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_election() -> Election {
        let names = DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect();
        Election::new(Pubkey::new_unique(), names).unwrap()
    }

    fn tallies(election: &Election) -> Vec<u64> {
        election.candidates.iter().map(|c| c.vote_count).collect()
    }

    fn assert_rejected<T: std::fmt::Debug>(result: Result<T>, expected: ElectionError) {
        let err = result.expect_err("transition should be rejected");
        assert_eq!(err, anchor_lang::error::Error::from(expected));
    }

    #[test]
    fn initializes_with_two_candidates() {
        let election = fresh_election();

        assert_eq!(election.candidate_count(), 2);
        assert_eq!(
            election.candidate(1),
            Some(&Candidate {
                id: 1,
                name: "Candidate 1".to_string(),
                vote_count: 0,
            })
        );
        assert_eq!(
            election.candidate(2),
            Some(&Candidate {
                id: 2,
                name: "Candidate 2".to_string(),
                vote_count: 0,
            })
        );
        assert_eq!(election.candidate(0), None);
        assert_eq!(election.candidate(3), None);
        assert_eq!(election.total_votes, 0);
    }

    #[test]
    fn first_vote_is_counted() {
        let mut election = fresh_election();
        let mut voter = VoterRecord::new(Pubkey::new_unique(), 0);

        let event = election.record_vote(&mut voter, 1).unwrap();

        assert_eq!(event, VotedEvent { candidate_id: 1 });
        assert!(voter.has_voted);
        assert_eq!(tallies(&election), vec![1, 0]);
        assert_eq!(election.total_votes, 1);
    }

    #[test]
    fn second_vote_is_rejected() {
        let mut election = fresh_election();
        let mut voter = VoterRecord::new(Pubkey::new_unique(), 0);
        election.record_vote(&mut voter, 1).unwrap();

        assert_rejected(
            election.record_vote(&mut voter, 2),
            ElectionError::DoubleVote,
        );
        assert_rejected(
            election.record_vote(&mut voter, 1),
            ElectionError::DoubleVote,
        );

        assert!(voter.has_voted);
        assert_eq!(tallies(&election), vec![1, 0]);
        assert_eq!(election.total_votes, 1);
    }

    #[test]
    fn out_of_range_candidate_is_rejected() {
        let mut election = fresh_election();
        let mut voter = VoterRecord::new(Pubkey::new_unique(), 0);

        for candidate_id in [0, 3, 99, u32::MAX] {
            assert_rejected(
                election.record_vote(&mut voter, candidate_id),
                ElectionError::InvalidCandidate,
            );
        }

        assert!(!voter.has_voted);
        assert_eq!(tallies(&election), vec![0, 0]);
        assert_eq!(election.total_votes, 0);

        // The voter can still vote after a rejected ballot.
        election.record_vote(&mut voter, 2).unwrap();
        assert_eq!(tallies(&election), vec![0, 1]);
    }

    #[test]
    fn double_vote_is_checked_before_candidate_range() {
        let mut election = fresh_election();
        let mut voter = VoterRecord::new(Pubkey::new_unique(), 0);
        election.record_vote(&mut voter, 2).unwrap();

        assert_rejected(
            election.record_vote(&mut voter, 99),
            ElectionError::DoubleVote,
        );
    }

    #[test]
    fn overflow_leaves_state_unchanged() {
        let mut election = fresh_election();
        election.candidates[0].vote_count = u64::MAX;
        let mut voter = VoterRecord::new(Pubkey::new_unique(), 0);

        assert_rejected(
            election.record_vote(&mut voter, 1),
            ElectionError::TallyOverflow,
        );
        assert!(!voter.has_voted);
        assert_eq!(election.total_votes, 0);
    }

    #[test]
    fn candidate_range_is_checked_before_overflow() {
        let mut election = fresh_election();
        election.total_votes = u64::MAX;
        let mut voter = VoterRecord::new(Pubkey::new_unique(), 0);

        assert_rejected(
            election.record_vote(&mut voter, 99),
            ElectionError::InvalidCandidate,
        );
        assert_rejected(
            election.record_vote(&mut voter, 1),
            ElectionError::TallyOverflow,
        );
        assert!(!voter.has_voted);
        assert_eq!(tallies(&election), vec![0, 0]);
    }

    #[test]
    fn tally_matches_voters_after_mixed_sequence() {
        let mut election = fresh_election();
        let mut voters: Vec<VoterRecord> = (0..6)
            .map(|_| VoterRecord::new(Pubkey::new_unique(), 0))
            .collect();

        let attempts = [(0, 1), (1, 2), (0, 2), (2, 99), (3, 1), (2, 2), (3, 2), (4, 0)];
        for (voter, candidate_id) in attempts {
            let _ = election.record_vote(&mut voters[voter], candidate_id);
        }

        let voted = voters.iter().filter(|v| v.has_voted).count() as u64;
        let sum: u64 = tallies(&election).iter().sum();
        assert_eq!(sum, voted);
        assert_eq!(election.total_votes, voted);
        assert_eq!(tallies(&election), vec![2, 2]);
    }

    #[test]
    fn rejects_malformed_ballots() {
        let authority = Pubkey::new_unique();

        assert_rejected(
            Election::new(authority, vec![]),
            ElectionError::NoCandidates,
        );
        assert_rejected(
            Election::new(
                authority,
                (0..=MAX_CANDIDATES).map(|i| format!("Candidate {i}")).collect(),
            ),
            ElectionError::TooManyCandidates,
        );
        assert_rejected(
            Election::new(authority, vec!["x".repeat(MAX_NAME_LEN + 1)]),
            ElectionError::NameTooLong,
        );
    }

    #[test]
    fn account_space_fits_a_full_ballot() {
        let election = Election::new(
            Pubkey::new_unique(),
            (0..MAX_CANDIDATES).map(|_| "x".repeat(MAX_NAME_LEN)).collect(),
        )
        .unwrap();

        let data = election.try_to_vec().unwrap();
        assert_eq!(data.len() + 8, Election::LEN);

        let record = VoterRecord::new(Pubkey::new_unique(), 255);
        assert_eq!(record.try_to_vec().unwrap().len() + 8, VoterRecord::LEN);
    }
}
