use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Incident column holding the catalog entity id a ticket belongs to.
pub const ENTITY_ANNOTATION_FIELD: &str = "u_backstage_entity_id";

/// An incident as returned by the ServiceNow table API, limited to the
/// columns requested through `sysparm_fields`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncidentPick {
    #[serde(default)]
    pub sys_id: String,
    pub number: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sys_created_on: String,
    #[serde(default, deserialize_with = "numeric_field")]
    pub priority: u32,
    #[serde(default, deserialize_with = "numeric_field")]
    pub incident_state: u32,
}

/// Incident projection served to the catalog frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentsData {
    pub number: String,
    pub short_description: String,
    pub description: String,
    pub sys_created_on: String,
    pub priority: u32,
    pub incident_state: u32,
}

impl From<IncidentPick> for IncidentsData {
    fn from(pick: IncidentPick) -> Self {
        Self {
            number: pick.number,
            short_description: pick.short_description,
            description: pick.description,
            sys_created_on: pick.sys_created_on,
            priority: pick.priority,
            incident_state: pick.incident_state,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentField {
    Number,
    ShortDescription,
    Description,
    Created,
    Priority,
    IncidentState,
}

impl IncidentField {
    pub const ALL: [IncidentField; 6] = [
        IncidentField::Number,
        IncidentField::ShortDescription,
        IncidentField::Description,
        IncidentField::Created,
        IncidentField::Priority,
        IncidentField::IncidentState,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentField::Number => "number",
            IncidentField::ShortDescription => "short_description",
            IncidentField::Description => "description",
            IncidentField::Created => "sys_created_on",
            IncidentField::Priority => "priority",
            IncidentField::IncidentState => "incident_state",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == value.trim())
    }

    /// Value for `sysparm_fields`: every projected column plus `sys_id`.
    pub fn table_fields() -> String {
        std::iter::once("sys_id")
            .chain(Self::ALL.iter().map(IncidentField::as_str))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

pub fn priority_label(priority: u32) -> Option<&'static str> {
    match priority {
        1 => Some("Critical"),
        2 => Some("High"),
        3 => Some("Moderate"),
        4 => Some("Low"),
        5 => Some("Planning"),
        _ => None,
    }
}

pub fn incident_state_label(state: u32) -> Option<&'static str> {
    match state {
        1 => Some("New"),
        2 => Some("In Progress"),
        3 => Some("On Hold"),
        6 => Some("Resolved"),
        7 => Some("Closed"),
        8 => Some("Cancelled"),
        _ => None,
    }
}

// The table API returns choice values as strings unless display values are
// requested, so accept both shapes.
fn numeric_field<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) if text.trim().is_empty() => Ok(0),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected a numeric value, got '{text}'"))),
    }
}
