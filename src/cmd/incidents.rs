use clap::Args;
use reqwest::Client;

use crate::config::AppConfig;
use crate::domain::incident::{IncidentsData, incident_state_label, priority_label};
use crate::domain::query::IncidentQuery;
use crate::error::{AppError, AppResult};
use crate::infra::servicenow::ServiceNowClient;
use crate::services::IncidentService;

#[derive(Args, Debug, Clone)]
pub struct IncidentsArgs {
    /// Email of the ServiceNow user whose incidents to list.
    #[arg(long, required_unless_present = "entity_id")]
    pub email: Option<String>,
    /// Catalog entity id stored on incidents (u_backstage_entity_id).
    #[arg(long)]
    pub entity_id: Option<String>,
    /// State filter, e.g. IN1,2.
    #[arg(long)]
    pub state: Option<String>,
    /// Priority filter, e.g. IN1.
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub limit: Option<String>,
    #[arg(long)]
    pub offset: Option<String>,
    /// asc or desc.
    #[arg(long)]
    pub order: Option<String>,
    #[arg(long)]
    pub order_by: Option<String>,
    /// Print a table instead of JSON.
    #[arg(long)]
    pub table: bool,
}

pub async fn run(config: AppConfig, args: IncidentsArgs) -> AppResult<()> {
    let query = IncidentQuery {
        entity_id: args.entity_id,
        state: args.state,
        priority: args.priority,
        search: args.search,
        limit: args.limit,
        offset: args.offset,
        order: args.order,
        order_by: args.order_by,
    };
    let params = query.into_params(args.email)?;

    let client = ServiceNowClient::new(Client::new(), config.servicenow);
    let incidents: Vec<IncidentsData> = client
        .fetch_incidents(&params)
        .await?
        .into_iter()
        .map(IncidentsData::from)
        .collect();

    if args.table {
        print!("{}", render_table(&incidents));
    } else {
        let json = serde_json::to_string_pretty(&incidents)
            .map_err(|err| AppError::Internal(format!("failed to encode incidents: {err}")))?;
        println!("{json}");
    }
    Ok(())
}

const HEADERS: [&str; 5] = ["Request ID", "Description", "Created", "Priority", "State"];

fn render_table(incidents: &[IncidentsData]) -> String {
    if incidents.is_empty() {
        return "No records found\n".to_string();
    }

    let rows: Vec<[String; 5]> = incidents
        .iter()
        .map(|incident| {
            [
                incident.number.clone(),
                incident.short_description.clone(),
                incident.sys_created_on.clone(),
                label_or_code(priority_label(incident.priority), incident.priority),
                label_or_code(
                    incident_state_label(incident.incident_state),
                    incident.incident_state,
                ),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(str::to_string), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn label_or_code(label: Option<&str>, code: u32) -> String {
    label
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string())
}
