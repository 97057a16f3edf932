//! Sample trouble records for the simulation command.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use plantops_core::mutation::Record;

/// Collection name of trouble records.
pub const TROUBLE_RECORDS: &str = "trouble_record";

/// An equipment fault reported by plant staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TroubleRecord {
    pub id: String,
    pub plant: String,
    pub equipment: String,
    pub status: String,
    pub notes: String,
    pub reported_on: NaiveDate,
}

impl Record for TroubleRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl TroubleRecord {
    pub fn new(plant: &str, equipment: &str, notes: &str, reported_on: NaiveDate) -> Self {
        Self {
            id: String::new(),
            plant: plant.to_string(),
            equipment: equipment.to_string(),
            status: "open".to_string(),
            notes: notes.to_string(),
            reported_on,
        }
    }

    fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }
}

/// Generate the seed rows of the simulated collection.
pub fn trouble_records() -> Vec<TroubleRecord> {
    let day = |d| NaiveDate::from_ymd_opt(2026, 3, d).unwrap_or_default();

    vec![
        TroubleRecord::new("north", "Feed pump P-101", "Seal leaking at low flow", day(2))
            .with_id("1"),
        TroubleRecord::new("north", "Cooling fan F-3", "Vibration above 7 mm/s", day(4))
            .with_id("2"),
        TroubleRecord::new("south", "Conveyor C-12", "Belt tracking off center", day(9))
            .with_id("3")
            .with_status("in_progress"),
    ]
}
