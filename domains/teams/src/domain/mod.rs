//! Teams domain layer: entities, membership rules, validation

pub mod entities;
pub mod membership;
pub mod validation;
