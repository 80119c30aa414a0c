//! Repository implementations for the Teams domain
//!
//! [`TeamStore`] is the storage port the HTTP layer talks to. It is implemented
//! by [`TeamsRepositories`] (PostgreSQL) and by [`memory::InMemoryTeamStore`].
//! Every mutating method is atomic: it either applies completely or leaves
//! the store unchanged.

pub mod assignments;
pub mod invitations;
pub mod memberships;
pub mod memory;
pub mod participants;
pub mod store;
pub mod teams;
pub mod transactions;
pub mod users;

use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::entities::{
    Assignment, Invitation, NewUser, Participant, ReplyStatus, Team, TeamMember, User,
};
use crate::domain::membership::{Addition, Removal, TeamError, TeamRoster};
use peerteam_common::Result;

pub use assignments::AssignmentRepository;
pub use invitations::InvitationRepository;
pub use memberships::MembershipRepository;
pub use memory::InMemoryTeamStore;
pub use participants::ParticipantRepository;
pub use teams::TeamRepository;
pub use transactions::{
    count_members_for_team_tx, create_membership_tx, create_participant_tx, create_team_tx,
    delete_membership_tx, delete_participant_tx, delete_pending_invitations_tx, delete_team_tx,
    get_assignment_tx, get_user_tx, handle_taken_tx, load_roster_tx, lock_participant_tx,
    lock_team_tx, rename_team_tx, set_participant_team_tx, team_name_taken_tx,
};
pub use users::UserRepository;

/// Embedded schema migrations
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Storage port for assignments, participants, teams, and invitations
#[async_trait::async_trait]
pub trait TeamStore: Send + Sync {
    async fn find_assignment(&self, assignment_id: i64) -> Result<Option<Assignment>>;

    async fn find_user(&self, user_id: i64) -> Result<Option<User>>;

    async fn find_participant(&self, participant_id: i64) -> Result<Option<Participant>>;

    async fn find_team(&self, team_id: i64) -> Result<Option<Team>>;

    async fn find_team_by_name(&self, assignment_id: i64, name: &str) -> Result<Option<Team>>;

    /// Teams the participant's user belongs to, ordered by name
    async fn teams_for_participant(&self, participant: &Participant) -> Result<Vec<Team>>;

    /// Members of a team with their names and handles, ordered by handle
    async fn team_members(&self, team_id: i64) -> Result<Vec<TeamMember>>;

    /// Snapshot of a team's capacity and members
    async fn team_roster(&self, team_id: i64) -> Result<Option<TeamRoster>>;

    async fn pending_invitations_from(
        &self,
        user_id: i64,
        assignment_id: i64,
    ) -> Result<Vec<Invitation>>;

    async fn create_assignment(&self, name: &str, max_team_size: Option<i32>)
        -> Result<Assignment>;

    async fn create_user(&self, user: &NewUser) -> Result<User>;

    async fn create_invitation(
        &self,
        assignment_id: i64,
        from_id: i64,
        to_id: i64,
    ) -> Result<Invitation>;

    /// Record the invitee's reply. `None` when the invitation does not exist.
    async fn respond_to_invitation(
        &self,
        invitation_id: i64,
        reply_status: ReplyStatus,
    ) -> Result<Option<Invitation>>;

    /// Enroll a user in an assignment, resolving the participant's handle
    async fn enroll(
        &self,
        assignment_id: i64,
        user_id: i64,
    ) -> std::result::Result<Participant, TeamError>;

    /// Remove a participant, leaving its team first. Returns the team removal, if any.
    async fn unenroll(
        &self,
        participant_id: i64,
    ) -> std::result::Result<Option<Removal>, TeamError>;

    /// Create a team under the founder's assignment with the founder as first member
    async fn create_team(&self, founder_id: i64, name: &str)
        -> std::result::Result<Team, TeamError>;

    /// Rename a team; renaming to its current name is a successful no-op
    async fn rename_team(&self, team_id: i64, name: &str) -> std::result::Result<Team, TeamError>;

    /// Delete a team and its memberships. `Ok(false)` when nothing was deleted.
    async fn delete_team(&self, team_id: i64) -> std::result::Result<bool, TeamError>;

    async fn add_member(
        &self,
        team_id: i64,
        participant_id: i64,
    ) -> std::result::Result<Addition, TeamError>;

    /// Remove a member, deleting the team if it empties and purging the
    /// member's pending invitations for the assignment
    async fn remove_member(
        &self,
        team_id: i64,
        participant_id: i64,
    ) -> std::result::Result<Removal, TeamError>;
}

/// Combined repository access for the Teams domain
#[derive(Clone)]
pub struct TeamsRepositories {
    pool: PgPool,
    pub assignments: AssignmentRepository,
    pub users: UserRepository,
    pub participants: ParticipantRepository,
    pub teams: TeamRepository,
    pub memberships: MembershipRepository,
    pub invitations: InvitationRepository,
}

impl TeamsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            assignments: AssignmentRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool.clone()),
            teams: TeamRepository::new(pool.clone()),
            memberships: MembershipRepository::new(pool.clone()),
            invitations: InvitationRepository::new(pool.clone()),
            pool,
        }
    }

    /// Begin a new database transaction.
    pub async fn begin(&self) -> std::result::Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }
}
