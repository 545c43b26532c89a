//! `research-agent agents`: list the declared subagents.

use anyhow::Result;
use serde::Serialize;

use crate::{agents, output};

#[derive(Serialize)]
struct AgentRow<'a> {
    name: &'a str,
    model: &'a str,
    tools: Vec<&'a str>,
    description: &'a str,
}

pub fn handle() -> Result<()> {
    let roster = agents::roster();
    let rows: Vec<AgentRow<'_>> = roster
        .iter()
        .map(|agent| AgentRow {
            name: &agent.name,
            model: agent.model.as_str(),
            tools: agent.tools.iter().map(String::as_str).collect(),
            description: &agent.description,
        })
        .collect();

    output::header(&format!("Subagents ({})", rows.len()));
    let mut table = output::table();
    output::table_header(&mut table, &["Agent", "Model", "Tools", "Description"]);
    for row in &rows {
        let tools = row.tools.join(", ");
        output::table_row(&mut table, &[row.name, row.model, tools.as_str(), row.description]);
    }
    output::table_print(&table, "agents", &rows);
    output::dim("The lead agent itself only uses Task to delegate.");
    Ok(())
}
