//! Teams domain state

use std::sync::Arc;

use crate::repository::TeamStore;

/// Application state for the Teams domain
#[derive(Clone)]
pub struct TeamsState {
    pub store: Arc<dyn TeamStore>,
}

impl TeamsState {
    pub fn new(store: Arc<dyn TeamStore>) -> Self {
        Self { store }
    }
}
