//! Translation of incident list filters into ServiceNow's encoded query
//! dialect (`sysparm_query`) and the table API parameters around it.

use serde::Deserialize;

use crate::domain::incident::{ENTITY_ANNOTATION_FIELD, IncidentField, SortOrder};
use crate::error::{AppError, AppResult};

const IN_PREFIX: &str = "IN";

/// Filter values supplied as `IN<v1>,<v2>,...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFilter {
    values: Vec<String>,
}

impl InFilter {
    pub fn parse(name: &str, raw: &str) -> AppResult<Self> {
        let invalid = || {
            AppError::Input(format!(
                "Query parameter '{name}' must use the 'IN' prefix format (e.g., 'INvalue1,value2' or 'INvalue')."
            ))
        };

        let list = raw.strip_prefix(IN_PREFIX).ok_or_else(invalid)?;
        let values = list
            .split(',')
            .map(str::trim)
            .map(|value| {
                if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()) {
                    Ok(value.to_string())
                } else {
                    Err(invalid())
                }
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self { values })
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

pub fn parse_non_negative(name: &str, raw: &str) -> AppResult<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| AppError::Input(format!("{name} must be a non-negative integer.")))
}

/// Raw `/incidents` query string as sent by the frontend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentQuery {
    pub entity_id: Option<String>,
    pub state: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub order: Option<String>,
    pub order_by: Option<String>,
}

impl IncidentQuery {
    pub fn into_params(self, user_email: Option<String>) -> AppResult<IncidentQueryParams> {
        let state = non_empty(self.state)
            .map(|raw| InFilter::parse("state", &raw))
            .transpose()?;
        let priority = non_empty(self.priority)
            .map(|raw| InFilter::parse("priority", &raw))
            .transpose()?;
        let order = non_empty(self.order)
            .map(|raw| {
                SortOrder::parse(&raw)
                    .ok_or_else(|| AppError::Input(format!("Invalid order parameter: {raw}")))
            })
            .transpose()?;
        let order_by = non_empty(self.order_by)
            .map(|raw| {
                IncidentField::parse(&raw)
                    .ok_or_else(|| AppError::Input(format!("Invalid orderBy parameter: {raw}")))
            })
            .transpose()?;
        let limit = self
            .limit
            .map(|raw| parse_non_negative("limit", &raw))
            .transpose()?;
        let offset = self
            .offset
            .map(|raw| parse_non_negative("offset", &raw))
            .transpose()?;

        Ok(IncidentQueryParams {
            user_email,
            entity_id: non_empty(self.entity_id),
            state,
            priority,
            search: non_empty(self.search),
            limit,
            offset,
            order,
            order_by,
        })
    }
}

/// Validated parameters handed to the incident client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentQueryParams {
    pub user_email: Option<String>,
    pub entity_id: Option<String>,
    pub state: Option<InFilter>,
    pub priority: Option<InFilter>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub order: Option<SortOrder>,
    pub order_by: Option<IncidentField>,
}

/// Whose incidents a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope<'a> {
    Entity(&'a str),
    User { field: &'a str, sys_id: &'a str },
}

impl IncidentQueryParams {
    pub fn encoded_query(&self, scope: QueryScope<'_>) -> String {
        let mut query = EncodedQuery::default();

        query = match scope {
            QueryScope::Entity(entity_id) => query.equals(ENTITY_ANNOTATION_FIELD, entity_id),
            QueryScope::User { field, sys_id } => query.equals(field, sys_id),
        };

        if let Some(search) = &self.search {
            query = query.like_any(
                &[
                    IncidentField::Number.as_str(),
                    IncidentField::ShortDescription.as_str(),
                    IncidentField::Description.as_str(),
                ],
                search,
            );
        }
        if let Some(state) = &self.state {
            query = query.in_list(IncidentField::IncidentState.as_str(), state);
        }
        if let Some(priority) = &self.priority {
            query = query.in_list(IncidentField::Priority.as_str(), priority);
        }

        let field = self.order_by.unwrap_or(IncidentField::Created);
        let order = match (self.order, self.order_by) {
            (Some(order), _) => order,
            (None, Some(_)) => SortOrder::Asc,
            (None, None) => SortOrder::Desc,
        };

        query.order_by(field.as_str(), order).build()
    }

    /// Query string pairs for `GET /api/now/table/incident`.
    pub fn table_params(&self, scope: QueryScope<'_>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("sysparm_query", self.encoded_query(scope)),
            ("sysparm_fields", IncidentField::table_fields()),
        ];
        if let Some(limit) = self.limit {
            params.push(("sysparm_limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("sysparm_offset", offset.to_string()));
        }
        params
    }
}

/// Builder for `sysparm_query` strings. Conditions are ANDed with `^`,
/// alternatives within one condition use `^OR`.
#[derive(Debug, Clone, Default)]
pub struct EncodedQuery {
    conditions: Vec<String>,
    order: Option<String>,
}

impl EncodedQuery {
    pub fn equals(mut self, field: &str, value: &str) -> Self {
        self.conditions.push(format!("{field}={}", escape(value)));
        self
    }

    pub fn in_list(mut self, field: &str, filter: &InFilter) -> Self {
        self.conditions
            .push(format!("{field}{IN_PREFIX}{}", filter.values().join(",")));
        self
    }

    pub fn like_any(mut self, fields: &[&str], needle: &str) -> Self {
        let needle = escape(needle.trim());
        let condition = fields
            .iter()
            .map(|field| format!("{field}LIKE{needle}"))
            .collect::<Vec<_>>()
            .join("^OR");
        if !condition.is_empty() {
            self.conditions.push(condition);
        }
        self
    }

    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order = Some(match order {
            SortOrder::Asc => format!("ORDERBY{field}"),
            SortOrder::Desc => format!("ORDERBYDESC{field}"),
        });
        self
    }

    pub fn build(&self) -> String {
        self.conditions
            .iter()
            .chain(self.order.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join("^")
    }
}

// A literal caret is written as `^^` in encoded queries.
fn escape(value: &str) -> String {
    value.replace('^', "^^")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
