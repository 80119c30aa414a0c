//! Domain entities for the Peerteam teams domain
//!
//! Assignments scope everything: a participant is one user's enrollment in one
//! assignment, and a team is a named group of participants under one
//! assignment. Membership rows (`teams_users`) pair a team with a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Team capacity used when an assignment does not configure one
pub const DEFAULT_MAX_TEAM_SIZE: i64 = 3;

/// Longest team name accepted
pub const MAX_TEAM_NAME_LENGTH: usize = 255;

/// Assignment entity (the parent of teams and participants)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assignment {
    pub id: i64,
    pub name: String,
    pub max_team_size: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    /// Effective team capacity for this assignment
    #[mutants::skip] // Delegates to capacity_for, tested directly
    pub fn capacity(&self) -> i64 {
        capacity_for(self.max_team_size)
    }
}

/// Resolve a configured maximum team size to an effective capacity.
///
/// Unset and non-positive values fall back to [`DEFAULT_MAX_TEAM_SIZE`].
pub fn capacity_for(max_team_size: Option<i32>) -> i64 {
    match max_team_size {
        Some(size) if size > 0 => i64::from(size),
        _ => DEFAULT_MAX_TEAM_SIZE,
    }
}

/// User account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub handle: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The user's own handle, if set and non-blank
    pub fn preferred_handle(&self) -> Option<&str> {
        self.handle
            .as_deref()
            .map(str::trim)
            .filter(|handle| !handle.is_empty())
    }
}

/// Fields for registering a user account
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub handle: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl NewUser {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: None,
            email: None,
            full_name: None,
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }
}

/// A user's enrollment in one assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participant {
    pub id: i64,
    pub user_id: i64,
    pub assignment_id: i64,
    pub handle: String,
    /// Team the participant is currently on, if any
    pub team_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    /// Pick the display handle for a new enrollment.
    ///
    /// The user's own handle wins unless it is blank or another participant in
    /// the assignment already holds it, in which case the user's name is used.
    pub fn resolve_handle(user: &User, handle_taken: bool) -> String {
        match user.preferred_handle() {
            Some(handle) if !handle_taken => handle.to_string(),
            _ => user.name.clone(),
        }
    }

    /// Whether the participant is currently on any team
    pub fn is_on_team(&self) -> bool {
        self.team_id.is_some()
    }
}

/// Student team entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub assignment_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// Canonical stored form of a requested team name
    pub fn normalize_name(raw: &str) -> String {
        raw.trim().to_string()
    }

    /// Validate a requested team name, returning every failed rule
    pub fn validate_name(raw: &str) -> std::result::Result<(), Vec<String>> {
        let name = Self::normalize_name(raw);
        let mut errors = Vec::new();

        if name.is_empty() {
            errors.push("Name can't be blank".to_string());
        }
        if name.chars().count() > MAX_TEAM_NAME_LENGTH {
            errors.push(format!(
                "Name is too long (maximum is {} characters)",
                MAX_TEAM_NAME_LENGTH
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Membership row pairing a team with a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamMembership {
    pub id: i64,
    pub team_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Team member details for show responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamMember {
    /// The member's user id
    pub id: i64,
    pub name: String,
    pub handle: String,
}

/// Reply state of an invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "invitation_reply", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    #[default]
    Waiting,
    Accepted,
    Declined,
}

impl std::fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyStatus::Waiting => write!(f, "waiting"),
            ReplyStatus::Accepted => write!(f, "accepted"),
            ReplyStatus::Declined => write!(f, "declined"),
        }
    }
}

/// Invitation from one user to another to join their team in an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: i64,
    pub assignment_id: i64,
    pub from_id: i64,
    pub to_id: i64,
    pub reply_status: ReplyStatus,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Still awaiting a reply
    pub fn is_pending(&self) -> bool {
        self.reply_status == ReplyStatus::Waiting
    }
}
