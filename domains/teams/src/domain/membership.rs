//! Team membership rules
//!
//! [`TeamRoster`] is a snapshot of a team and its members taken inside the
//! store's critical section (a locked transaction, or the in-memory mutex).
//! The checks here decide whether a join or leave may proceed; the store then
//! applies the mutation atomically.

use peerteam_common::Error;
use thiserror::Error;

use super::entities::{Participant, Team};

/// Why a team or membership operation was refused.
///
/// The `Display` text is the message presented to the caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TeamError {
    #[error("Team name is already in use")]
    NameTaken,

    #[error("Team is already full")]
    TeamFull,

    #[error("User is already in team")]
    AlreadyMember,

    #[error("Participant is already in a team for this assignment")]
    AlreadyOnTeam,

    #[error("Participant does not belong to this team's assignment")]
    WrongAssignment,

    #[error("User is not in team")]
    NotMember,

    #[error("Participant is already enrolled in this assignment")]
    AlreadyEnrolled,

    #[error("Team not found")]
    TeamNotFound,

    #[error("Participant not found")]
    ParticipantNotFound,

    #[error("Assignment not found")]
    AssignmentNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Failed to {action}: {reason}")]
    Storage { action: &'static str, reason: String },
}

impl TeamError {
    /// Wrap a storage failure for the named action ("add member", "create team", ...)
    pub fn storage(action: &'static str, cause: impl std::fmt::Display) -> Self {
        TeamError::Storage {
            action,
            reason: cause.to_string(),
        }
    }
}

impl From<TeamError> for Error {
    fn from(err: TeamError) -> Self {
        match err {
            TeamError::TeamNotFound => Error::NotFound(err.to_string()),
            TeamError::Storage { action, reason } => {
                Error::internal(format!("Failed to {}", action), reason)
            }
            other => Error::Unprocessable(other.to_string()),
        }
    }
}

/// Outcome of a successful join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addition {
    /// Member count after the join
    pub team_size: i64,
}

impl Addition {
    pub fn message(&self) -> &'static str {
        "Member added successfully"
    }
}

/// Outcome of a successful removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Removal {
    /// The team became empty and was deleted
    pub team_deleted: bool,
    /// Pending invitations from the removed user that were purged
    pub invitations_purged: u64,
}

impl Removal {
    pub fn message(&self) -> &'static str {
        "Member removed successfully"
    }
}

/// A team together with its capacity and current member user ids
#[derive(Debug, Clone, PartialEq)]
pub struct TeamRoster {
    pub team: Team,
    pub capacity: i64,
    pub member_user_ids: Vec<i64>,
}

impl TeamRoster {
    pub fn new(team: Team, capacity: i64, member_user_ids: Vec<i64>) -> Self {
        Self {
            team,
            capacity,
            member_user_ids,
        }
    }

    /// Number of members
    pub fn size(&self) -> i64 {
        self.member_user_ids.len() as i64
    }

    /// True when the member count has reached the assignment's capacity
    pub fn is_full(&self) -> bool {
        self.size() >= self.capacity
    }

    pub fn is_member(&self, user_id: i64) -> bool {
        self.member_user_ids.contains(&user_id)
    }

    /// Decide whether `participant` may join this team
    pub fn check_add(&self, participant: &Participant) -> Result<(), TeamError> {
        if participant.assignment_id != self.team.assignment_id {
            return Err(TeamError::WrongAssignment);
        }
        if self.is_full() {
            return Err(TeamError::TeamFull);
        }
        if self.is_member(participant.user_id) {
            return Err(TeamError::AlreadyMember);
        }
        if participant.is_on_team() {
            return Err(TeamError::AlreadyOnTeam);
        }
        Ok(())
    }

    /// Decide whether `participant` may leave this team.
    ///
    /// Membership rows are keyed by user, so a participant from another
    /// assignment must be refused even when its user is a member here.
    pub fn check_remove(&self, participant: &Participant) -> Result<(), TeamError> {
        if participant.assignment_id != self.team.assignment_id {
            return Err(TeamError::WrongAssignment);
        }
        if !self.is_member(participant.user_id) {
            return Err(TeamError::NotMember);
        }
        Ok(())
    }

    /// Whether removing one member leaves the team empty
    pub fn empties_on_remove(&self) -> bool {
        self.size() <= 1
    }
}
