//! In-memory attendance table.

use chrono::NaiveDate;

use crate::models::{AttendanceRecord, ClockInRequest, ClockOutRequest, Employee};

/// Attendance rows held in memory, with sequential ids starting at 1.
#[derive(Debug, Clone)]
pub struct AttendanceStore {
    records: Vec<AttendanceRecord>,
    next_id: i64,
}

impl Default for AttendanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttendanceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Returns the rows matching both filters; a `None` filter matches all.
    pub fn query(&self, date: Option<NaiveDate>, employee_id: Option<i64>) -> Vec<AttendanceRecord> {
        self.records
            .iter()
            .filter(|r| date.is_none_or(|d| r.attendance_date == d))
            .filter(|r| employee_id.is_none_or(|id| r.employee_id == id))
            .cloned()
            .collect()
    }

    /// Inserts a clock-in row, joining the employee name from `roster`.
    pub fn insert(&mut self, request: ClockInRequest, roster: &[Employee]) -> AttendanceRecord {
        let id = self.next_id;
        self.next_id += 1;

        let name = roster
            .iter()
            .find(|e| e.employee_id == request.employee_id)
            .map(|e| e.name.clone());

        let record = AttendanceRecord {
            attendance_id: id,
            employee_id: request.employee_id,
            name,
            attendance_date: request.attendance_date,
            present: request.present != 0,
            in_time: request.in_time,
            out_time: Some(request.out_time),
            latitude: Some(request.latitude),
            longitude: Some(request.longitude),
            out_latitude: None,
            out_longitude: None,
        };
        self.records.push(record.clone());
        record
    }

    /// Writes the clock-out fields of row `id`. `None` if no such row.
    pub fn clock_out(&mut self, id: i64, request: ClockOutRequest) -> Option<AttendanceRecord> {
        let record = self.records.iter_mut().find(|r| r.attendance_id == id)?;
        record.out_time = Some(request.out_time);
        record.out_latitude = Some(request.out_latitude);
        record.out_longitude = Some(request.out_longitude);
        Some(record.clone())
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no row has been stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;
    use chrono::NaiveTime;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn clock_in(employee_id: i64, day: u32) -> ClockInRequest {
        ClockInRequest::new(
            employee_id,
            GeoPoint::new(52.50735, 88.33658),
            date(day),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        )
    }

    fn roster() -> Vec<Employee> {
        vec![Employee {
            employee_id: 1,
            name: "Asha Roy".to_string(),
        }]
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut store = AttendanceStore::new();
        assert_eq!(store.insert(clock_in(1, 14), &roster()).attendance_id, 1);
        assert_eq!(store.insert(clock_in(2, 14), &roster()).attendance_id, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_insert_joins_name_and_starts_open() {
        let mut store = AttendanceStore::new();
        let record = store.insert(clock_in(1, 14), &roster());

        assert_eq!(record.name.as_deref(), Some("Asha Roy"));
        assert!(record.present);
        assert!(record.is_open());

        let stranger = store.insert(clock_in(9, 14), &roster());
        assert_eq!(stranger.name, None);
    }

    #[test]
    fn test_query_filters_by_date_and_employee() {
        let mut store = AttendanceStore::new();
        store.insert(clock_in(1, 14), &roster());
        store.insert(clock_in(1, 15), &roster());
        store.insert(clock_in(2, 14), &roster());

        assert_eq!(store.query(None, None).len(), 3);
        assert_eq!(store.query(Some(date(14)), None).len(), 2);
        assert_eq!(store.query(None, Some(1)).len(), 2);
        assert_eq!(store.query(Some(date(15)), Some(1)).len(), 1);
        assert!(store.query(Some(date(16)), Some(1)).is_empty());
    }

    #[test]
    fn test_clock_out_closes_row() {
        let mut store = AttendanceStore::new();
        let id = store.insert(clock_in(1, 14), &roster()).attendance_id;

        let closed = store
            .clock_out(
                id,
                ClockOutRequest::new(
                    GeoPoint::new(52.6, 88.3),
                    NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
                ),
            )
            .unwrap();

        assert!(!closed.is_open());
        assert_eq!(closed.out_time.as_deref(), Some("17:30:00"));
        assert_eq!(closed.out_latitude.as_deref(), Some("52.6"));
    }

    #[test]
    fn test_clock_out_unknown_id() {
        let mut store = AttendanceStore::new();
        let request = ClockOutRequest::new(
            GeoPoint::new(0.0, 0.0),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        );
        assert!(store.clock_out(7, request).is_none());
    }
}
