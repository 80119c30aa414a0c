//! In-memory [`TeamStore`] used by tests and local demos
//!
//! All state sits behind one mutex; each mutation runs its checks and applies
//! its changes while holding the lock, so it is atomic in the same sense as
//! the PostgreSQL transactions.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::TeamStore;
use crate::domain::entities::{
    Assignment, Invitation, NewUser, Participant, ReplyStatus, Team, TeamMember, TeamMembership,
    User,
};
use crate::domain::membership::{Addition, Removal, TeamError, TeamRoster};
use peerteam_common::{Error, Result};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    assignments: BTreeMap<i64, Assignment>,
    users: BTreeMap<i64, User>,
    participants: BTreeMap<i64, Participant>,
    teams: BTreeMap<i64, Team>,
    memberships: Vec<TeamMembership>,
    invitations: BTreeMap<i64, Invitation>,
    outage: Option<String>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_available(&self) -> std::result::Result<(), String> {
        match &self.outage {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    fn roster(&self, team_id: i64) -> Option<TeamRoster> {
        let team = self.teams.get(&team_id)?.clone();
        let max_team_size = self
            .assignments
            .get(&team.assignment_id)
            .and_then(|a| a.max_team_size);
        let member_user_ids = self
            .memberships
            .iter()
            .filter(|m| m.team_id == team_id)
            .map(|m| m.user_id)
            .collect();
        Some(TeamRoster::new(
            team,
            crate::domain::entities::capacity_for(max_team_size),
            member_user_ids,
        ))
    }

    fn name_taken(&self, assignment_id: i64, name: &str, excluding: Option<i64>) -> bool {
        self.teams.values().any(|team| {
            team.assignment_id == assignment_id && team.name == name && Some(team.id) != excluding
        })
    }

    fn add_membership(&mut self, team_id: i64, user_id: i64) {
        let id = self.next_id();
        self.memberships.push(TeamMembership {
            id,
            team_id,
            user_id,
            created_at: Utc::now(),
        });
    }

    /// Drop a team with its memberships, clearing participants that pointed at it
    fn drop_team(&mut self, team_id: i64) -> bool {
        if self.teams.remove(&team_id).is_none() {
            return false;
        }
        self.memberships.retain(|m| m.team_id != team_id);
        for participant in self.participants.values_mut() {
            if participant.team_id == Some(team_id) {
                participant.team_id = None;
                participant.updated_at = Utc::now();
            }
        }
        true
    }

    fn remove_from_team(&mut self, roster: &TeamRoster, participant_id: i64) -> Removal {
        let team = &roster.team;
        let Some(participant) = self.participants.get_mut(&participant_id) else {
            return Removal::default();
        };
        let user_id = participant.user_id;
        if participant.team_id == Some(team.id) {
            participant.team_id = None;
            participant.updated_at = Utc::now();
        }

        self.memberships
            .retain(|m| !(m.team_id == team.id && m.user_id == user_id));

        let before = self.invitations.len();
        self.invitations.retain(|_, invitation| {
            !(invitation.from_id == user_id
                && invitation.assignment_id == team.assignment_id
                && invitation.is_pending())
        });
        let invitations_purged = (before - self.invitations.len()) as u64;

        let remaining = self
            .memberships
            .iter()
            .filter(|m| m.team_id == team.id)
            .count();
        let team_deleted = remaining == 0 && self.drop_team(team.id);

        Removal {
            team_deleted,
            invitations_purged,
        }
    }
}

/// Thread-safe in-memory store
#[derive(Debug, Clone, Default)]
pub struct InMemoryTeamStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryTeamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail with `reason` until cleared with `None`
    pub fn set_outage(&self, reason: Option<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.outage = reason;
        }
    }

    fn read(&self) -> Result<MutexGuard<'_, State>> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::Unexpected(anyhow::anyhow!("team store lock poisoned")))?;
        state
            .check_available()
            .map_err(|reason| Error::Unexpected(anyhow::anyhow!(reason)))?;
        Ok(state)
    }

    fn write(&self, action: &'static str) -> std::result::Result<MutexGuard<'_, State>, TeamError> {
        let state = self
            .state
            .lock()
            .map_err(|_| TeamError::storage(action, "team store lock poisoned"))?;
        state
            .check_available()
            .map_err(|reason| TeamError::storage(action, reason))?;
        Ok(state)
    }
}

#[async_trait::async_trait]
impl TeamStore for InMemoryTeamStore {
    async fn find_assignment(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        Ok(self.read()?.assignments.get(&assignment_id).cloned())
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.read()?.users.get(&user_id).cloned())
    }

    async fn find_participant(&self, participant_id: i64) -> Result<Option<Participant>> {
        Ok(self.read()?.participants.get(&participant_id).cloned())
    }

    async fn find_team(&self, team_id: i64) -> Result<Option<Team>> {
        Ok(self.read()?.teams.get(&team_id).cloned())
    }

    async fn find_team_by_name(&self, assignment_id: i64, name: &str) -> Result<Option<Team>> {
        Ok(self
            .read()?
            .teams
            .values()
            .find(|team| team.assignment_id == assignment_id && team.name == name)
            .cloned())
    }

    async fn teams_for_participant(&self, participant: &Participant) -> Result<Vec<Team>> {
        let state = self.read()?;
        let mut teams: Vec<Team> = state
            .memberships
            .iter()
            .filter(|m| m.user_id == participant.user_id)
            .filter_map(|m| state.teams.get(&m.team_id).cloned())
            .collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        teams.dedup_by_key(|team| team.id);
        Ok(teams)
    }

    async fn team_members(&self, team_id: i64) -> Result<Vec<TeamMember>> {
        let state = self.read()?;
        let Some(team) = state.teams.get(&team_id) else {
            return Ok(Vec::new());
        };
        let mut members: Vec<TeamMember> = state
            .memberships
            .iter()
            .filter(|m| m.team_id == team_id)
            .filter_map(|m| state.users.get(&m.user_id))
            .map(|user| {
                let handle = state
                    .participants
                    .values()
                    .find(|p| p.user_id == user.id && p.assignment_id == team.assignment_id)
                    .map(|p| p.handle.clone())
                    .unwrap_or_else(|| user.name.clone());
                TeamMember {
                    id: user.id,
                    name: user.name.clone(),
                    handle,
                }
            })
            .collect();
        members.sort_by(|a, b| a.handle.cmp(&b.handle).then(a.id.cmp(&b.id)));
        Ok(members)
    }

    async fn team_roster(&self, team_id: i64) -> Result<Option<TeamRoster>> {
        Ok(self.read()?.roster(team_id))
    }

    async fn pending_invitations_from(
        &self,
        user_id: i64,
        assignment_id: i64,
    ) -> Result<Vec<Invitation>> {
        Ok(self
            .read()?
            .invitations
            .values()
            .filter(|i| i.from_id == user_id && i.assignment_id == assignment_id && i.is_pending())
            .cloned()
            .collect())
    }

    async fn create_assignment(
        &self,
        name: &str,
        max_team_size: Option<i32>,
    ) -> Result<Assignment> {
        let mut state = self.read()?;
        let now = Utc::now();
        let assignment = Assignment {
            id: state.next_id(),
            name: name.to_string(),
            max_team_size,
            created_at: now,
            updated_at: now,
        };
        state.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut state = self.read()?;
        let created = User {
            id: state.next_id(),
            name: user.name.clone(),
            handle: user.handle.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            created_at: Utc::now(),
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn create_invitation(
        &self,
        assignment_id: i64,
        from_id: i64,
        to_id: i64,
    ) -> Result<Invitation> {
        let mut state = self.read()?;
        let invitation = Invitation {
            id: state.next_id(),
            assignment_id,
            from_id,
            to_id,
            reply_status: ReplyStatus::Waiting,
            created_at: Utc::now(),
        };
        state.invitations.insert(invitation.id, invitation.clone());
        Ok(invitation)
    }

    async fn respond_to_invitation(
        &self,
        invitation_id: i64,
        reply_status: ReplyStatus,
    ) -> Result<Option<Invitation>> {
        let mut state = self.read()?;
        Ok(state.invitations.get_mut(&invitation_id).map(|invitation| {
            invitation.reply_status = reply_status;
            invitation.clone()
        }))
    }

    async fn enroll(
        &self,
        assignment_id: i64,
        user_id: i64,
    ) -> std::result::Result<Participant, TeamError> {
        let mut state = self.write("enroll participant")?;

        if !state.assignments.contains_key(&assignment_id) {
            return Err(TeamError::AssignmentNotFound);
        }
        let user = state
            .users
            .get(&user_id)
            .cloned()
            .ok_or(TeamError::UserNotFound)?;
        if state
            .participants
            .values()
            .any(|p| p.assignment_id == assignment_id && p.user_id == user_id)
        {
            return Err(TeamError::AlreadyEnrolled);
        }

        let handle_taken = user.preferred_handle().is_some_and(|handle| {
            state
                .participants
                .values()
                .any(|p| p.assignment_id == assignment_id && p.handle == handle)
        });

        let now = Utc::now();
        let participant = Participant {
            id: state.next_id(),
            user_id,
            assignment_id,
            handle: Participant::resolve_handle(&user, handle_taken),
            team_id: None,
            created_at: now,
            updated_at: now,
        };
        state
            .participants
            .insert(participant.id, participant.clone());
        Ok(participant)
    }

    async fn unenroll(
        &self,
        participant_id: i64,
    ) -> std::result::Result<Option<Removal>, TeamError> {
        let mut state = self.write("unenroll participant")?;

        let participant = state
            .participants
            .get(&participant_id)
            .cloned()
            .ok_or(TeamError::ParticipantNotFound)?;

        let removal = match participant.team_id.and_then(|team_id| state.roster(team_id)) {
            Some(roster) if roster.is_member(participant.user_id) => {
                Some(state.remove_from_team(&roster, participant_id))
            }
            _ => None,
        };

        state.participants.remove(&participant_id);
        Ok(removal)
    }

    async fn create_team(
        &self,
        founder_id: i64,
        name: &str,
    ) -> std::result::Result<Team, TeamError> {
        let mut state = self.write("create team")?;
        let name = Team::normalize_name(name);

        let founder = state
            .participants
            .get(&founder_id)
            .cloned()
            .ok_or(TeamError::ParticipantNotFound)?;
        if state.name_taken(founder.assignment_id, &name, None) {
            return Err(TeamError::NameTaken);
        }

        let now = Utc::now();
        let team = Team {
            id: state.next_id(),
            name,
            assignment_id: founder.assignment_id,
            created_at: now,
            updated_at: now,
        };

        // Check the founder's join against the prospective team before anything is stored.
        let capacity = state
            .assignments
            .get(&team.assignment_id)
            .map(Assignment::capacity)
            .unwrap_or(crate::domain::entities::DEFAULT_MAX_TEAM_SIZE);
        TeamRoster::new(team.clone(), capacity, Vec::new()).check_add(&founder)?;

        state.teams.insert(team.id, team.clone());
        state.add_membership(team.id, founder.user_id);
        if let Some(participant) = state.participants.get_mut(&founder_id) {
            participant.team_id = Some(team.id);
            participant.updated_at = now;
        }
        Ok(team)
    }

    async fn rename_team(&self, team_id: i64, name: &str) -> std::result::Result<Team, TeamError> {
        let mut state = self.write("rename team")?;
        let name = Team::normalize_name(name);

        let team = state
            .teams
            .get(&team_id)
            .cloned()
            .ok_or(TeamError::TeamNotFound)?;
        if team.name == name {
            return Ok(team);
        }
        if state.name_taken(team.assignment_id, &name, Some(team_id)) {
            return Err(TeamError::NameTaken);
        }

        let team = state
            .teams
            .get_mut(&team_id)
            .ok_or(TeamError::TeamNotFound)?;
        team.name = name;
        team.updated_at = Utc::now();
        Ok(team.clone())
    }

    async fn delete_team(&self, team_id: i64) -> std::result::Result<bool, TeamError> {
        let mut state = self.write("delete team")?;
        Ok(state.drop_team(team_id))
    }

    async fn add_member(
        &self,
        team_id: i64,
        participant_id: i64,
    ) -> std::result::Result<Addition, TeamError> {
        let mut state = self.write("add member")?;

        let roster = state.roster(team_id).ok_or(TeamError::TeamNotFound)?;
        let participant = state
            .participants
            .get(&participant_id)
            .cloned()
            .ok_or(TeamError::ParticipantNotFound)?;
        roster.check_add(&participant)?;

        state.add_membership(team_id, participant.user_id);
        if let Some(participant) = state.participants.get_mut(&participant_id) {
            participant.team_id = Some(team_id);
            participant.updated_at = Utc::now();
        }
        Ok(Addition {
            team_size: roster.size() + 1,
        })
    }

    async fn remove_member(
        &self,
        team_id: i64,
        participant_id: i64,
    ) -> std::result::Result<Removal, TeamError> {
        let mut state = self.write("remove member")?;

        let roster = state.roster(team_id).ok_or(TeamError::TeamNotFound)?;
        let participant = state
            .participants
            .get(&participant_id)
            .ok_or(TeamError::ParticipantNotFound)?;
        roster.check_remove(participant)?;

        Ok(state.remove_from_team(&roster, participant_id))
    }
}
