use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use super::{EntityId, ParseLabelError};
use crate::rollup::CompletionSummary;

/// Inspection disciplines a facility can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlCategory {
    Alarm,
    EmergencyLighting,
    SmokeVents,
    ExtinguishingEquipment,
    /// Serviced by an outside vendor, tracked here for completeness
    ExternalVendor,
}

impl ControlCategory {
    pub const ALL: [ControlCategory; 5] = [
        ControlCategory::Alarm,
        ControlCategory::EmergencyLighting,
        ControlCategory::SmokeVents,
        ControlCategory::ExtinguishingEquipment,
        ControlCategory::ExternalVendor,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ControlCategory::Alarm => "alarm",
            ControlCategory::EmergencyLighting => "emergency-lighting",
            ControlCategory::SmokeVents => "smoke-vents",
            ControlCategory::ExtinguishingEquipment => "extinguishing-equipment",
            ControlCategory::ExternalVendor => "external-vendor",
        }
    }
}

impl fmt::Display for ControlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ControlCategory {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ControlCategory::ALL
            .into_iter()
            .find(|category| category.label() == wanted)
            .ok_or_else(|| ParseLabelError::new("control category", s))
    }
}

/// Operator-chosen facility status.
///
/// Stored independently of the completion flags; see [`CompletionSummary::contradicts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FacilityStatus {
    #[default]
    NotStarted,
    Planned,
    InProgress,
    Completed,
    Deviations,
}

impl FacilityStatus {
    pub const ALL: [FacilityStatus; 5] = [
        FacilityStatus::NotStarted,
        FacilityStatus::Planned,
        FacilityStatus::InProgress,
        FacilityStatus::Completed,
        FacilityStatus::Deviations,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FacilityStatus::NotStarted => "not-started",
            FacilityStatus::Planned => "planned",
            FacilityStatus::InProgress => "in-progress",
            FacilityStatus::Completed => "completed",
            FacilityStatus::Deviations => "deviations",
        }
    }
}

impl fmt::Display for FacilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FacilityStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        FacilityStatus::ALL
            .into_iter()
            .find(|status| status.label() == wanted)
            .ok_or_else(|| ParseLabelError::new("facility status", s))
    }
}

/// A physical site under service contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub id: EntityId,
    pub name: String,
    /// Cleared when the owning customer is deactivated with the unlink disposition
    pub customer_id: Option<EntityId>,
    pub categories: BTreeSet<ControlCategory>,
    /// One flag per subscribed category, never an entry for anything else
    pub completion: BTreeMap<ControlCategory, bool>,
    #[serde(default)]
    pub operator_status: FacilityStatus,
    #[serde(default)]
    pub hidden: bool,
}

impl Facility {
    /// New facility with every subscribed category flagged incomplete
    pub fn new(
        name: impl Into<String>,
        customer_id: Option<EntityId>,
        categories: impl IntoIterator<Item = ControlCategory>,
    ) -> Self {
        let categories: BTreeSet<ControlCategory> = categories.into_iter().collect();
        let completion = categories.iter().map(|c| (*c, false)).collect();
        Self {
            id: EntityId::generate(),
            name: name.into(),
            customer_id,
            categories,
            completion,
            operator_status: FacilityStatus::NotStarted,
            hidden: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn is_subscribed(&self, category: ControlCategory) -> bool {
        self.categories.contains(&category)
    }

    /// Completion flag for a category; `None` when the facility does not subscribe to it
    pub fn completion_flag(&self, category: ControlCategory) -> Option<bool> {
        if !self.is_subscribed(category) {
            return None;
        }
        Some(self.completion.get(&category).copied().unwrap_or(false))
    }

    /// Flags restricted to subscribed categories; stray entries are ignored
    pub fn subscribed_flags(&self) -> impl Iterator<Item = (ControlCategory, bool)> + '_ {
        self.categories
            .iter()
            .map(|c| (*c, self.completion.get(c).copied().unwrap_or(false)))
    }

    pub fn completion_summary(&self) -> CompletionSummary {
        CompletionSummary::of(self)
    }
}
