//! HTTP handlers for the Teams domain

pub mod student_teams;
