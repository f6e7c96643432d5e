//! Application state for the reference attendance service.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::ServerConfig;
use crate::models::Employee;

use super::store::AttendanceStore;

/// Shared application state.
///
/// Contains resources that are shared across all request handlers: the
/// employee roster and the attendance table.
#[derive(Clone)]
pub struct AppState {
    employees: Arc<Vec<Employee>>,
    store: Arc<RwLock<AttendanceStore>>,
}

impl AppState {
    /// Creates a new application state serving the configured roster.
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_employees(config.employees.clone())
    }

    /// Creates a new application state with an explicit roster.
    pub fn with_employees(employees: Vec<Employee>) -> Self {
        Self {
            employees: Arc::new(employees),
            store: Arc::new(RwLock::new(AttendanceStore::new())),
        }
    }

    /// Returns the employee roster.
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    /// Returns the attendance table.
    pub fn store(&self) -> &RwLock<AttendanceStore> {
        &self.store
    }
}
