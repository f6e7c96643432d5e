//! Employee model.

use serde::{Deserialize, Serialize};

/// An employee as listed by `GET /api/employees`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    #[serde(rename = "EmployeeId")]
    pub employee_id: i64,
    /// Display name.
    pub name: String,
}
