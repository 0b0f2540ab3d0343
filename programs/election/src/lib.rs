use anchor_lang::prelude::*;

pub mod error;
pub mod state;

pub use error::ElectionError;
pub use state::*;

declare_id!("HjjGnp3pgkSojtsXyWn3dHvsRt7FsvfWNSwNpxvCKaJk");

#[program]
pub mod election {
    use super::*;

    pub fn initialize(ctx: Context<Initialize>, names: Vec<String>) -> Result<()> {
        let election = &mut ctx.accounts.election;
        election.authority = ctx.accounts.authority.key();
        election.bump = ctx.bumps.election;
        election.register_candidates(names)?;

        msg!(
            "Election opened with {} candidates",
            election.candidate_count()
        );
        Ok(())
    }

    pub fn vote(ctx: Context<CastVote>, candidate_id: u32) -> Result<()> {
        let voter_record = &mut ctx.accounts.voter_record;
        // Fresh record from init_if_needed
        if voter_record.voter == Pubkey::default() {
            voter_record.voter = ctx.accounts.voter.key();
            voter_record.bump = ctx.bumps.voter_record;
        }

        let event = ctx
            .accounts
            .election
            .record_vote(voter_record, candidate_id)?;

        msg!("Voted for candidate {}", candidate_id);
        emit!(event);
        Ok(())
    }

    pub fn candidates(ctx: Context<ReadElection>) -> Result<Vec<Candidate>> {
        Ok(ctx.accounts.election.candidates.clone())
    }

    pub fn voter_status(ctx: Context<ReadVoterStatus>, account: Pubkey) -> Result<bool> {
        let record = &ctx.accounts.voter_record;
        if record.data_is_empty() {
            return Ok(false);
        }

        let data = record.try_borrow_data()?;
        let record = VoterRecord::try_deserialize(&mut &data[..])?;
        require_keys_eq!(record.voter, account);
        Ok(record.has_voted)
    }
}

// Creates the election account for `authority` and fixes its candidate list.
#[derive(Accounts)]
pub struct Initialize<'info> {
    // One election per authority: PDA of ["election", authority].
    // space = Election::LEN: discriminator + authority + bump + a candidate
    // vector sized for MAX_CANDIDATES names of MAX_NAME_LEN bytes + total_votes.
    #[account(
        init,
        payer = authority,
        space = Election::LEN,
        seeds = [Election::SEED, authority.key().as_ref()],
        bump,
    )]
    pub election: Account<'info, Election>,

    // Pays rent for the election account
    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

// The voter record is created by the first ballot of each signer. Its
// `has_voted` flag is what rejects every later ballot from the same signer.
#[derive(Accounts)]
pub struct CastVote<'info> {
    // Tally is written, so the election is mutable
    #[account(
        mut,
        seeds = [Election::SEED, election.authority.as_ref()],
        bump = election.bump,
    )]
    pub election: Account<'info, Election>,

    // PDA of ["voter", election, voter]: at most one record per signer and election.
    // space = VoterRecord::LEN: discriminator + voter + has_voted + bump.
    #[account(
        init_if_needed,
        payer = voter,
        space = VoterRecord::LEN,
        seeds = [VoterRecord::SEED, election.key().as_ref(), voter.key().as_ref()],
        bump,
    )]
    pub voter_record: Account<'info, VoterRecord>,

    // The ballot's signer, paying rent for its own record
    #[account(mut)]
    pub voter: Signer<'info>,

    pub system_program: Program<'info, System>,
}

// Read-only view of the tally.
#[derive(Accounts)]
pub struct ReadElection<'info> {
    #[account(
        seeds = [Election::SEED, election.authority.as_ref()],
        bump = election.bump,
    )]
    pub election: Account<'info, Election>,
}

// Read-only view of one account's voter status.
#[derive(Accounts)]
#[instruction(account: Pubkey)]
pub struct ReadVoterStatus<'info> {
    #[account(
        seeds = [Election::SEED, election.authority.as_ref()],
        bump = election.bump,
    )]
    pub election: Account<'info, Election>,

    /// CHECK: absent until the account's first ballot, which reads as not voted.
    // Same seeds as CastVote::voter_record, derived for `account` instead of the signer.
    #[account(
        seeds = [VoterRecord::SEED, election.key().as_ref(), account.as_ref()],
        bump,
    )]
    pub voter_record: UncheckedAccount<'info>,
}
