//! PostgreSQL implementation of [`TeamStore`]
//!
//! Membership mutations lock the team row first and the participant row
//! second, load a [`TeamRoster`], run the membership checks, and commit the
//! membership row together with the participant's `team_id`.

use sqlx::{Postgres, Transaction};

use super::transactions::{
    count_members_for_team_tx, create_membership_tx, create_participant_tx, create_team_tx,
    delete_membership_tx, delete_participant_tx, delete_pending_invitations_tx, delete_team_tx,
    get_assignment_tx, get_user_tx, handle_taken_tx, load_roster_tx, lock_participant_tx,
    lock_team_tx, rename_team_tx, set_participant_team_tx, team_name_taken_tx,
};
use super::{TeamStore, TeamsRepositories};
use crate::domain::entities::{
    Assignment, Invitation, NewUser, Participant, ReplyStatus, Team, TeamMember, User,
};
use crate::domain::membership::{Addition, Removal, TeamError, TeamRoster};
use peerteam_common::{RepositoryError, Result};

/// Map a driver error, turning unique violations into `conflict`
fn classify(action: &'static str, conflict: TeamError) -> impl Fn(sqlx::Error) -> TeamError {
    move |err| match RepositoryError::from_sqlx(err) {
        RepositoryError::AlreadyExists => conflict.clone(),
        RepositoryError::Connection(e) => TeamError::storage(action, e),
        other => TeamError::storage(action, other),
    }
}

/// Remove `participant` from a locked team and clean up after it.
async fn remove_locked_tx(
    transaction: &mut Transaction<'_, Postgres>,
    roster: &TeamRoster,
    participant: &Participant,
) -> std::result::Result<Removal, sqlx::Error> {
    let team = &roster.team;

    delete_membership_tx(transaction, team.id, participant.user_id).await?;
    if participant.team_id == Some(team.id) {
        set_participant_team_tx(transaction, participant.id, None).await?;
    }

    let invitations_purged =
        delete_pending_invitations_tx(transaction, participant.user_id, team.assignment_id)
            .await?;

    let remaining = count_members_for_team_tx(transaction, team.id).await?;
    let team_deleted = if remaining == 0 {
        delete_team_tx(transaction, team.id).await?
    } else {
        false
    };

    Ok(Removal {
        team_deleted,
        invitations_purged,
    })
}

#[async_trait::async_trait]
impl TeamStore for TeamsRepositories {
    async fn find_assignment(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        self.assignments.get_by_id(assignment_id).await
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        self.users.get_by_id(user_id).await
    }

    async fn find_participant(&self, participant_id: i64) -> Result<Option<Participant>> {
        self.participants.get_by_id(participant_id).await
    }

    async fn find_team(&self, team_id: i64) -> Result<Option<Team>> {
        self.teams.get_by_id(team_id).await
    }

    async fn find_team_by_name(&self, assignment_id: i64, name: &str) -> Result<Option<Team>> {
        self.teams.get_by_name(assignment_id, name).await
    }

    async fn teams_for_participant(&self, participant: &Participant) -> Result<Vec<Team>> {
        self.teams.list_by_user(participant.user_id).await
    }

    async fn team_members(&self, team_id: i64) -> Result<Vec<TeamMember>> {
        self.memberships.list_by_team(team_id).await
    }

    async fn team_roster(&self, team_id: i64) -> Result<Option<TeamRoster>> {
        let Some(team) = self.teams.get_by_id(team_id).await? else {
            return Ok(None);
        };
        let capacity = match self.assignments.get_by_id(team.assignment_id).await? {
            Some(assignment) => assignment.capacity(),
            None => {
                return Err(RepositoryError::InvalidData("Team has no assignment".into()).into())
            }
        };
        let member_user_ids = self.memberships.list_user_ids(team_id).await?;
        Ok(Some(TeamRoster::new(team, capacity, member_user_ids)))
    }

    async fn pending_invitations_from(
        &self,
        user_id: i64,
        assignment_id: i64,
    ) -> Result<Vec<Invitation>> {
        self.invitations
            .list_pending_from(user_id, assignment_id)
            .await
    }

    async fn create_assignment(
        &self,
        name: &str,
        max_team_size: Option<i32>,
    ) -> Result<Assignment> {
        self.assignments.create(name, max_team_size).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.users.create(user).await
    }

    async fn create_invitation(
        &self,
        assignment_id: i64,
        from_id: i64,
        to_id: i64,
    ) -> Result<Invitation> {
        self.invitations.create(assignment_id, from_id, to_id).await
    }

    async fn respond_to_invitation(
        &self,
        invitation_id: i64,
        reply_status: ReplyStatus,
    ) -> Result<Option<Invitation>> {
        self.invitations
            .update_reply(invitation_id, reply_status)
            .await
    }

    async fn enroll(
        &self,
        assignment_id: i64,
        user_id: i64,
    ) -> std::result::Result<Participant, TeamError> {
        const ACTION: &str = "enroll participant";
        let storage = |e: sqlx::Error| TeamError::storage(ACTION, e);

        let mut tx = self.begin().await.map_err(storage)?;

        get_assignment_tx(&mut tx, assignment_id)
            .await
            .map_err(storage)?
            .ok_or(TeamError::AssignmentNotFound)?;
        let user = get_user_tx(&mut tx, user_id)
            .await
            .map_err(storage)?
            .ok_or(TeamError::UserNotFound)?;

        let handle_taken = match user.preferred_handle() {
            Some(handle) => handle_taken_tx(&mut tx, assignment_id, handle)
                .await
                .map_err(storage)?,
            None => false,
        };
        let handle = Participant::resolve_handle(&user, handle_taken);

        let participant = create_participant_tx(&mut tx, assignment_id, user_id, &handle)
            .await
            .map_err(classify(ACTION, TeamError::AlreadyEnrolled))?;

        tx.commit().await.map_err(storage)?;

        tracing::info!(
            participant_id = participant.id,
            assignment_id,
            user_id,
            handle = %participant.handle,
            "Participant enrolled"
        );
        Ok(participant)
    }

    async fn unenroll(
        &self,
        participant_id: i64,
    ) -> std::result::Result<Option<Removal>, TeamError> {
        const ACTION: &str = "unenroll participant";
        let storage = |e: sqlx::Error| TeamError::storage(ACTION, e);

        // Peek at the participant's team so the team can be locked before the participant.
        let peeked = self
            .participants
            .get_by_id(participant_id)
            .await
            .map_err(|e| TeamError::storage(ACTION, e))?
            .ok_or(TeamError::ParticipantNotFound)?;

        let mut tx = self.begin().await.map_err(storage)?;

        let team = match peeked.team_id {
            Some(team_id) => lock_team_tx(&mut tx, team_id).await.map_err(storage)?,
            None => None,
        };
        let participant = lock_participant_tx(&mut tx, participant_id)
            .await
            .map_err(storage)?
            .ok_or(TeamError::ParticipantNotFound)?;
        if participant.team_id != peeked.team_id {
            return Err(TeamError::storage(
                ACTION,
                "participant changed teams during unenrollment",
            ));
        }

        let removal = match team {
            Some(team) => {
                let roster = load_roster_tx(&mut tx, team).await.map_err(storage)?;
                if roster.is_member(participant.user_id) {
                    Some(
                        remove_locked_tx(&mut tx, &roster, &participant)
                            .await
                            .map_err(storage)?,
                    )
                } else {
                    None
                }
            }
            None => None,
        };

        delete_participant_tx(&mut tx, participant.id)
            .await
            .map_err(storage)?;
        tx.commit().await.map_err(storage)?;

        tracing::info!(
            participant_id,
            assignment_id = participant.assignment_id,
            team_deleted = removal.map(|r| r.team_deleted).unwrap_or(false),
            "Participant unenrolled"
        );
        Ok(removal)
    }

    async fn create_team(
        &self,
        founder_id: i64,
        name: &str,
    ) -> std::result::Result<Team, TeamError> {
        const ACTION: &str = "create team";
        let storage = |e: sqlx::Error| TeamError::storage(ACTION, e);
        let name = Team::normalize_name(name);

        let mut tx = self.begin().await.map_err(storage)?;

        let founder = lock_participant_tx(&mut tx, founder_id)
            .await
            .map_err(storage)?
            .ok_or(TeamError::ParticipantNotFound)?;

        if team_name_taken_tx(&mut tx, founder.assignment_id, &name, None)
            .await
            .map_err(storage)?
        {
            return Err(TeamError::NameTaken);
        }

        let team = create_team_tx(&mut tx, founder.assignment_id, &name)
            .await
            .map_err(classify(ACTION, TeamError::NameTaken))?;

        // The founder joins under the same rules as any other member.
        let roster = load_roster_tx(&mut tx, team.clone())
            .await
            .map_err(storage)?;
        roster.check_add(&founder)?;

        create_membership_tx(&mut tx, team.id, founder.user_id)
            .await
            .map_err(classify(ACTION, TeamError::AlreadyMember))?;
        set_participant_team_tx(&mut tx, founder.id, Some(team.id))
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        tracing::info!(
            team_id = team.id,
            assignment_id = team.assignment_id,
            participant_id = founder.id,
            "Team created"
        );
        Ok(team)
    }

    async fn rename_team(&self, team_id: i64, name: &str) -> std::result::Result<Team, TeamError> {
        const ACTION: &str = "rename team";
        let storage = |e: sqlx::Error| TeamError::storage(ACTION, e);
        let name = Team::normalize_name(name);

        let mut tx = self.begin().await.map_err(storage)?;

        let team = lock_team_tx(&mut tx, team_id)
            .await
            .map_err(storage)?
            .ok_or(TeamError::TeamNotFound)?;

        if team.name == name {
            tracing::debug!(team_id, "Rename to current name, nothing to do");
            return Ok(team);
        }

        if team_name_taken_tx(&mut tx, team.assignment_id, &name, Some(team.id))
            .await
            .map_err(storage)?
        {
            return Err(TeamError::NameTaken);
        }

        let renamed = rename_team_tx(&mut tx, team.id, &name)
            .await
            .map_err(classify(ACTION, TeamError::NameTaken))?;
        tx.commit().await.map_err(storage)?;

        tracing::info!(team_id, name = %renamed.name, "Team renamed");
        Ok(renamed)
    }

    async fn delete_team(&self, team_id: i64) -> std::result::Result<bool, TeamError> {
        const ACTION: &str = "delete team";
        let storage = |e: sqlx::Error| TeamError::storage(ACTION, e);

        let mut tx = self.begin().await.map_err(storage)?;
        let deleted = delete_team_tx(&mut tx, team_id).await.map_err(storage)?;
        tx.commit().await.map_err(storage)?;

        if deleted {
            tracing::info!(team_id, "Team deleted");
        }
        Ok(deleted)
    }

    async fn add_member(
        &self,
        team_id: i64,
        participant_id: i64,
    ) -> std::result::Result<Addition, TeamError> {
        const ACTION: &str = "add member";
        let storage = |e: sqlx::Error| TeamError::storage(ACTION, e);

        let mut tx = self.begin().await.map_err(storage)?;

        let team = lock_team_tx(&mut tx, team_id)
            .await
            .map_err(storage)?
            .ok_or(TeamError::TeamNotFound)?;
        let participant = lock_participant_tx(&mut tx, participant_id)
            .await
            .map_err(storage)?
            .ok_or(TeamError::ParticipantNotFound)?;

        let roster = load_roster_tx(&mut tx, team).await.map_err(storage)?;
        roster.check_add(&participant)?;

        create_membership_tx(&mut tx, team_id, participant.user_id)
            .await
            .map_err(classify(ACTION, TeamError::AlreadyMember))?;
        set_participant_team_tx(&mut tx, participant.id, Some(team_id))
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        let addition = Addition {
            team_size: roster.size() + 1,
        };
        tracing::info!(
            team_id,
            participant_id,
            team_size = addition.team_size,
            "Member added"
        );
        Ok(addition)
    }

    async fn remove_member(
        &self,
        team_id: i64,
        participant_id: i64,
    ) -> std::result::Result<Removal, TeamError> {
        const ACTION: &str = "remove member";
        let storage = |e: sqlx::Error| TeamError::storage(ACTION, e);

        let mut tx = self.begin().await.map_err(storage)?;

        let team = lock_team_tx(&mut tx, team_id)
            .await
            .map_err(storage)?
            .ok_or(TeamError::TeamNotFound)?;
        let participant = lock_participant_tx(&mut tx, participant_id)
            .await
            .map_err(storage)?
            .ok_or(TeamError::ParticipantNotFound)?;

        let roster = load_roster_tx(&mut tx, team).await.map_err(storage)?;
        roster.check_remove(&participant)?;

        let removal = remove_locked_tx(&mut tx, &roster, &participant)
            .await
            .map_err(storage)?;
        tx.commit().await.map_err(storage)?;

        tracing::info!(
            team_id,
            participant_id,
            team_deleted = removal.team_deleted,
            invitations_purged = removal.invitations_purged,
            "Member removed"
        );
        Ok(removal)
    }
}
