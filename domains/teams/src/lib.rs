//! Teams domain: assignments, participants, student teams, memberships, invitations

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;
pub use domain::membership::{Addition, Removal, TeamError, TeamRoster};

// Re-export repository types
pub use repository::{
    AssignmentRepository, InMemoryTeamStore, InvitationRepository, MembershipRepository,
    ParticipantRepository, TeamRepository, TeamStore, TeamsRepositories, UserRepository,
    MIGRATOR,
};

// Re-export API types
pub use api::routes;
pub use api::TeamsState;
