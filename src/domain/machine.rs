// Machine domain model and filter criteria
use serde::{Deserialize, Serialize};

/// Machine health status, ascending severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MachineStatus {
    #[default]
    Normal,
    Satisfactory,
    Alert,
    Unacceptable,
}

impl MachineStatus {
    /// Fixed display order used by every status breakdown.
    pub const ALL: [MachineStatus; 4] = [
        MachineStatus::Normal,
        MachineStatus::Satisfactory,
        MachineStatus::Alert,
        MachineStatus::Unacceptable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Normal => "Normal",
            MachineStatus::Satisfactory => "Satisfactory",
            MachineStatus::Alert => "Alert",
            MachineStatus::Unacceptable => "Unacceptable",
        }
    }
}

/// A machine record as returned by the monitoring backend.
/// Immutable once fetched; a reload replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "machineName")]
    pub machine_name: String,
    pub customer: String,
    pub area: String,
    pub subarea: String,
    #[serde(rename = "machineType", default, skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(default)]
    pub status: MachineStatus,
    #[serde(rename = "ingestedDate", default, skip_serializing_if = "Option::is_none")]
    pub ingested_date: Option<String>,
}

/// Current filter state. An unset or empty field means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub customer: Option<String>,
    pub area: Option<String>,
    pub subarea: Option<String>,
    pub machine_name: Option<String>,
    pub status: Option<String>,
}

/// Partial filter edit: `Some` overwrites the field, `None` leaves it alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterUpdate {
    pub customer: Option<String>,
    pub area: Option<String>,
    pub subarea: Option<String>,
    pub machine_name: Option<String>,
    pub status: Option<String>,
}

fn constrained(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

impl FilterCriteria {
    /// Merge a partial edit, last write wins per field. Unrelated fields are kept.
    pub fn merge(&mut self, update: FilterUpdate) {
        if let Some(customer) = update.customer {
            self.customer = Some(customer);
        }
        if let Some(area) = update.area {
            self.area = Some(area);
        }
        if let Some(subarea) = update.subarea {
            self.subarea = Some(subarea);
        }
        if let Some(machine_name) = update.machine_name {
            self.machine_name = Some(machine_name);
        }
        if let Some(status) = update.status {
            self.status = Some(status);
        }
    }

    /// True when no field constrains the result set.
    pub fn is_empty(&self) -> bool {
        constrained(&self.customer).is_none()
            && constrained(&self.area).is_none()
            && constrained(&self.subarea).is_none()
            && constrained(&self.machine_name).is_none()
            && constrained(&self.status).is_none()
    }

    /// Deterministic client-side match, used when the server-side search
    /// is unavailable. Free text matches case-insensitively against the
    /// machine name or its id; every other field is exact equality.
    pub fn matches(&self, machine: &Machine) -> bool {
        if let Some(customer) = constrained(&self.customer) {
            if machine.customer != customer {
                return false;
            }
        }
        if let Some(area) = constrained(&self.area) {
            if machine.area != area {
                return false;
            }
        }
        if let Some(subarea) = constrained(&self.subarea) {
            if machine.subarea != subarea {
                return false;
            }
        }
        if let Some(status) = constrained(&self.status) {
            if machine.status.as_str() != status {
                return false;
            }
        }
        if let Some(text) = constrained(&self.machine_name) {
            let needle = text.to_lowercase();
            let name_hit = machine.machine_name.to_lowercase().contains(&needle);
            let id_hit = machine.id.to_lowercase().contains(&needle);
            if !name_hit && !id_hit {
                return false;
            }
        }
        true
    }

    /// Filter a machine list, preserving its relative order.
    pub fn apply<'a>(&self, machines: impl IntoIterator<Item = &'a Machine>) -> Vec<Machine> {
        machines
            .into_iter()
            .filter(|m| self.matches(m))
            .cloned()
            .collect()
    }
}
