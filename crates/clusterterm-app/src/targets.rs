use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use clusterterm_terminal::types::{Target, TargetKind};
use clusterterm_terminal::TerminalEndpoint;

/// One row of a target listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Thin REST client for the cluster's target collections
pub struct TargetsClient {
    base: String,
    client: reqwest::Client,
}

impl TargetsClient {
    pub fn new(endpoint: &TerminalEndpoint) -> Self {
        Self {
            base: endpoint.http_base(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn list(&self, kind: TargetKind) -> Result<Vec<TargetSummary>> {
        let url = format!("{}/{}", self.base, kind.collection());
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Listing {} failed ({}): {}", kind.collection(), status, error_text));
        }

        response
            .json::<Vec<TargetSummary>>()
            .await
            .with_context(|| format!("Unexpected response from {}", url))
    }

    /// Find a target by id or name
    pub async fn resolve(&self, kind: TargetKind, id_or_name: &str) -> Result<Target> {
        let found = self
            .list(kind)
            .await?
            .into_iter()
            .find(|t| t.id == id_or_name || t.name.as_deref() == Some(id_or_name))
            .ok_or_else(|| anyhow!("No {} named '{}'", kind, id_or_name))?;

        let target = Target::new(kind, found.id)?;
        Ok(match found.name {
            Some(name) => target.with_name(name),
            None => target,
        })
    }
}

/// Render a listing as an aligned table
pub fn format_table(targets: &[TargetSummary]) -> String {
    let id_width = targets.iter().map(|t| t.id.len()).max().unwrap_or(0).max(2);
    let name_width = targets
        .iter()
        .map(|t| t.name.as_deref().unwrap_or("-").len())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = format!(
        "{}\n",
        format!("{:<id_width$}  {:<name_width$}  STATUS", "ID", "NAME").bold()
    );
    for target in targets {
        let status = target.status.as_deref().unwrap_or("-");
        let status = match status {
            "running" | "active" => status.green(),
            "failed" | "error" => status.red(),
            _ => status.normal(),
        };
        out.push_str(&format!(
            "{:<id_width$}  {:<name_width$}  {}\n",
            target.id,
            target.name.as_deref().unwrap_or("-"),
            status
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_aligns_columns() {
        colored::control::set_override(false);
        let table = format_table(&[
            TargetSummary {
                id: "t-1".to_string(),
                name: Some("web".to_string()),
                status: Some("running".to_string()),
            },
            TargetSummary {
                id: "t-200".to_string(),
                name: None,
                status: None,
            },
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "ID     NAME  STATUS");
        assert_eq!(lines[1], "t-1    web   running");
        assert_eq!(lines[2], "t-200  -     -");
    }
}
