//! Student team endpoint integration tests
//!
//! Drives the full router over the in-memory store:
//! - GET    /api/v1/student_teams?id=
//! - GET    /api/v1/student_teams/{id}
//! - POST   /api/v1/student_teams?id=
//! - PUT    /api/v1/student_teams/{id}
//! - DELETE /api/v1/student_teams/{id}
//! - POST   /api/v1/student_teams/{id}/add_participant?participant_id=
//! - DELETE /api/v1/student_teams/{id}/remove_participant?participant_id=

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::assertions::{assert_error, assert_success};
use common::TestApp;
use peerteam_teams::TeamStore;

mod test_list_teams {
    use super::*;

    #[tokio::test]
    async fn test_lists_teams_by_name() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;
        let team = app.team(&alice, "Zebra").await;

        // alice also belongs to a team in another assignment
        let other = app.store.create_assignment("Program 2", None).await.unwrap();
        let again = app.store.enroll(other.id, alice.user_id).await.unwrap();
        app.store.create_team(again.id, "Aardvark").await.unwrap();

        let (status, body) = app
            .send(Method::GET, &format!("/api/v1/student_teams?id={}", alice.id), None)
            .await;
        assert_success(status, &body, StatusCode::OK);

        let names: Vec<&str> = body["teams"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Aardvark", "Zebra"]);
        assert_eq!(body["teams"][1]["id"], team.id);
        assert_eq!(body["teams"][1]["assignment_id"], app.assignment.id);
    }

    #[tokio::test]
    async fn test_unknown_student_is_not_found() {
        let app = TestApp::new().await;
        for uri in [
            "/api/v1/student_teams?id=999",
            "/api/v1/student_teams?id=abc",
            "/api/v1/student_teams",
        ] {
            let (status, body) = app.send(Method::GET, uri, None).await;
            assert_error(status, &body, StatusCode::NOT_FOUND, "Student not found");
        }
    }
}

mod test_show_team {
    use super::*;

    #[tokio::test]
    async fn test_shows_members_ordered_by_handle() {
        let app = TestApp::new().await;
        let zed = app.participant("zed").await;
        let amy = app.participant("amy").await;
        let team = app.team(&zed, "Blue").await;
        app.store.add_member(team.id, amy.id).await.unwrap();

        let (status, body) = app
            .send(Method::GET, &format!("/api/v1/student_teams/{}", team.id), None)
            .await;
        assert_success(status, &body, StatusCode::OK);
        assert_eq!(body["team"]["name"], "Blue");
        assert_eq!(
            body["members"],
            json!([
                {"id": amy.user_id, "name": "amy", "handle": "amy"},
                {"id": zed.user_id, "name": "zed", "handle": "zed"},
            ])
        );
    }

    #[tokio::test]
    async fn test_missing_team_is_not_found() {
        let app = TestApp::new().await;
        let (status, body) = app.send(Method::GET, "/api/v1/student_teams/42", None).await;
        assert_error(status, &body, StatusCode::NOT_FOUND, "Team not found");
    }
}

mod test_create_team {
    use super::*;

    #[tokio::test]
    async fn test_creates_team_with_founder() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/api/v1/student_teams?id={}", alice.id),
                Some(json!({"team": {"name": "Blue"}})),
            )
            .await;
        assert_success(status, &body, StatusCode::CREATED);
        assert_eq!(body["message"], "Team created successfully");
        assert_eq!(body["team"]["name"], "Blue");

        let team_id = body["team"]["id"].as_i64().unwrap();
        let roster = app.store.team_roster(team_id).await.unwrap().unwrap();
        assert_eq!(roster.member_user_ids, vec![alice.user_id]);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;
        let bob = app.participant("bob").await;
        app.team(&alice, "Blue").await;

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/api/v1/student_teams?id={}", bob.id),
                Some(json!({"team": {"name": "Blue"}})),
            )
            .await;
        assert_error(
            status,
            &body,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Team name is already in use",
        );
    }

    #[tokio::test]
    async fn test_blank_name_reports_validation_details() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/api/v1/student_teams?id={}", alice.id),
                Some(json!({"team": {"name": "   "}})),
            )
            .await;
        assert_error(
            status,
            &body,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Failed to create team",
        );
        assert_eq!(body["details"], json!(["Name can't be blank"]));
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;

        let (status, body) = app
            .send_raw(
                Method::POST,
                &format!("/api/v1/student_teams?id={}", alice.id),
                r#"{"name": "Blue"}"#,
            )
            .await;
        assert_error(
            status,
            &body,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid request body",
        );
        assert!(body["details"].is_array());
    }

    #[tokio::test]
    async fn test_unknown_student_is_not_found() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/student_teams?id=999",
                Some(json!({"team": {"name": "Blue"}})),
            )
            .await;
        assert_error(status, &body, StatusCode::NOT_FOUND, "Student not found");
    }
}

mod test_update_team {
    use super::*;

    #[tokio::test]
    async fn test_renames_team() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;
        let team = app.team(&alice, "Blue").await;

        for method in [Method::PUT, Method::PATCH] {
            let (status, body) = app
                .send(
                    method,
                    &format!("/api/v1/student_teams/{}", team.id),
                    Some(json!({"team": {"name": "Crimson"}})),
                )
                .await;
            assert_success(status, &body, StatusCode::OK);
            assert_eq!(body["message"], "Team name updated successfully");
            assert_eq!(body["team"]["name"], "Crimson");
        }
    }

    #[tokio::test]
    async fn test_rename_to_taken_name_is_rejected() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;
        let bob = app.participant("bob").await;
        app.team(&alice, "Blue").await;
        let red = app.team(&bob, "Red").await;

        let (status, body) = app
            .send(
                Method::PUT,
                &format!("/api/v1/student_teams/{}", red.id),
                Some(json!({"team": {"name": "Blue"}})),
            )
            .await;
        assert_error(
            status,
            &body,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Team name is already in use",
        );
    }

    #[tokio::test]
    async fn test_invalid_name_reports_update_failure() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;
        let team = app.team(&alice, "Blue").await;

        let (status, body) = app
            .send(
                Method::PUT,
                &format!("/api/v1/student_teams/{}", team.id),
                Some(json!({"team": {"name": "x".repeat(256)}})),
            )
            .await;
        assert_error(
            status,
            &body,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Failed to update team name",
        );
        assert_eq!(
            body["details"],
            json!(["Name is too long (maximum is 255 characters)"])
        );
    }
}

mod test_delete_team {
    use super::*;

    #[tokio::test]
    async fn test_deletes_team_and_frees_members() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;
        let team = app.team(&alice, "Blue").await;

        let (status, body) = app
            .send(Method::DELETE, &format!("/api/v1/student_teams/{}", team.id), None)
            .await;
        assert_success(status, &body, StatusCode::OK);
        assert_eq!(body["message"], "Team successfully deleted");

        let alice = app.store.find_participant(alice.id).await.unwrap().unwrap();
        assert_eq!(alice.team_id, None);

        let (status, body) = app
            .send(Method::DELETE, &format!("/api/v1/student_teams/{}", team.id), None)
            .await;
        assert_error(status, &body, StatusCode::NOT_FOUND, "Team not found");
    }

    #[tokio::test]
    async fn test_storage_failure_is_server_error() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;
        let team = app.team(&alice, "Blue").await;
        app.store.set_outage(Some("connection reset".to_string()));

        let (status, body) = app
            .send(Method::DELETE, &format!("/api/v1/student_teams/{}", team.id), None)
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
    }
}

mod test_membership {
    use super::*;

    #[tokio::test]
    async fn test_add_and_remove_participant() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;
        let bob = app.participant("bob").await;
        let team = app.team(&alice, "Blue").await;

        let (status, body) = app
            .send(
                Method::POST,
                &format!(
                    "/api/v1/student_teams/{}/add_participant?participant_id={}",
                    team.id, bob.id
                ),
                None,
            )
            .await;
        assert_success(status, &body, StatusCode::OK);
        assert_eq!(body["message"], "Participant added to the team successfully");

        let (status, body) = app
            .send(
                Method::DELETE,
                &format!(
                    "/api/v1/student_teams/{}/remove_participant?participant_id={}",
                    team.id, bob.id
                ),
                None,
            )
            .await;
        assert_success(status, &body, StatusCode::OK);
        assert_eq!(body["message"], "Member removed successfully");

        let roster = app.store.team_roster(team.id).await.unwrap().unwrap();
        assert_eq!(roster.member_user_ids, vec![alice.user_id]);
    }

    #[tokio::test]
    async fn test_full_team_rejects_participant() {
        let app = TestApp::with_max_team_size(Some(1)).await;
        let alice = app.participant("alice").await;
        let bob = app.participant("bob").await;
        let team = app.team(&alice, "Blue").await;

        let (status, body) = app
            .send(
                Method::POST,
                &format!(
                    "/api/v1/student_teams/{}/add_participant?participant_id={}",
                    team.id, bob.id
                ),
                None,
            )
            .await;
        assert_error(
            status,
            &body,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Team is already full",
        );
        assert_eq!(app.store.team_roster(team.id).await.unwrap().unwrap().size(), 1);
    }

    #[tokio::test]
    async fn test_remove_with_other_assignment_enrollment_is_refused() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;
        let bob = app.participant("bob").await;
        let team = app.team(&alice, "Blue").await;
        app.store.add_member(team.id, bob.id).await.unwrap();

        let other = app.store.create_assignment("Program 2", None).await.unwrap();
        let alice_elsewhere = app.store.enroll(other.id, alice.user_id).await.unwrap();

        let (status, body) = app
            .send(
                Method::DELETE,
                &format!(
                    "/api/v1/student_teams/{}/remove_participant?participant_id={}",
                    team.id, alice_elsewhere.id
                ),
                None,
            )
            .await;
        assert_error(
            status,
            &body,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Participant does not belong to this team's assignment",
        );

        let roster = app.store.team_roster(team.id).await.unwrap().unwrap();
        assert!(roster.is_member(alice.user_id));
        let alice = app.store.find_participant(alice.id).await.unwrap().unwrap();
        assert_eq!(alice.team_id, Some(team.id));
    }

    #[tokio::test]
    async fn test_missing_or_unknown_participant() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;
        let team = app.team(&alice, "Blue").await;

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/api/v1/student_teams/{}/add_participant", team.id),
                None,
            )
            .await;
        assert_error(
            status,
            &body,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Participant ID is required",
        );

        let (status, body) = app
            .send(
                Method::DELETE,
                &format!(
                    "/api/v1/student_teams/{}/remove_participant?participant_id=999",
                    team.id
                ),
                None,
            )
            .await;
        assert_error(
            status,
            &body,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Participant not found",
        );
    }

    #[tokio::test]
    async fn test_remove_non_member_is_rejected() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;
        let bob = app.participant("bob").await;
        let team = app.team(&alice, "Blue").await;

        let (status, body) = app
            .send(
                Method::DELETE,
                &format!(
                    "/api/v1/student_teams/{}/remove_participant?participant_id={}",
                    team.id, bob.id
                ),
                None,
            )
            .await;
        assert_error(
            status,
            &body,
            StatusCode::UNPROCESSABLE_ENTITY,
            "User is not in team",
        );
    }

    #[tokio::test]
    async fn test_removing_last_member_deletes_team() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;
        let team = app.team(&alice, "Blue").await;

        let (status, _) = app
            .send(
                Method::DELETE,
                &format!(
                    "/api/v1/student_teams/{}/remove_participant?participant_id={}",
                    team.id, alice.id
                ),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .send(Method::GET, &format!("/api/v1/student_teams/{}", team.id), None)
            .await;
        assert_error(status, &body, StatusCode::NOT_FOUND, "Team not found");
    }

    #[tokio::test]
    async fn test_participant_on_another_team_is_rejected() {
        let app = TestApp::new().await;
        let alice = app.participant("alice").await;
        let bob = app.participant("bob").await;
        let blue = app.team(&alice, "Blue").await;
        app.team(&bob, "Red").await;

        let (status, body) = app
            .send(
                Method::POST,
                &format!(
                    "/api/v1/student_teams/{}/add_participant?participant_id={}",
                    blue.id, bob.id
                ),
                None,
            )
            .await;
        assert_error(
            status,
            &body,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Participant is already in a team for this assignment",
        );
    }
}

mod test_infrastructure {
    use super::*;

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = TestApp::new().await;
        let (status, _) = app.send(Method::GET, "/api/v1/nothing_here", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
