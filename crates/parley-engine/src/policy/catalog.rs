// Policy catalog: `{ "data": [ { "_id", "policyName": {..}, "pSubId": {..}, "pCategoryId": {..} } ] }`

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// One catalog entry. Immutable for the life of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub subcategory: String,
    pub category: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Entry exactly as it appears in the catalog file
    pub raw: Value,
}

#[derive(Deserialize)]
struct CatalogFile {
    data: Vec<Value>,
}

#[derive(Deserialize)]
struct CatalogEntry {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "policyName", default)]
    policy_name: PolicyName,
    #[serde(rename = "pSubId", default)]
    subcategory: Named,
    #[serde(rename = "pCategoryId", default)]
    category: Named,
}

#[derive(Deserialize, Default)]
struct PolicyName {
    name: Option<String>,
    desc: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: Option<String>,
}

#[derive(Deserialize, Default)]
struct Named {
    name: Option<String>,
}

/// Parse catalog JSON, keeping entry order
pub fn parse_catalog(json: &str) -> Result<Vec<PolicyRecord>> {
    let file: CatalogFile = serde_json::from_str(json).context("Invalid policy catalog")?;

    file.data
        .into_iter()
        .enumerate()
        .map(|(position, raw)| {
            let entry: CatalogEntry = serde_json::from_value(raw.clone())
                .with_context(|| format!("Invalid policy catalog entry at position {}", position))?;
            Ok(PolicyRecord {
                id: entry.id,
                name: entry.policy_name.name.unwrap_or_default(),
                description: entry.policy_name.desc.unwrap_or_default(),
                subcategory: entry.subcategory.name.unwrap_or_default(),
                category: entry.category.name.unwrap_or_default(),
                created_at: entry
                    .policy_name
                    .created_at
                    .as_deref()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|d| d.with_timezone(&Utc)),
                raw,
            })
        })
        .collect()
}

/// Read and parse the catalog file
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<PolicyRecord>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read policy catalog {}", path.display()))?;
    let records = parse_catalog(&json)?;
    tracing::info!(path = %path.display(), policies = records.len(), "policy catalog loaded");
    Ok(records)
}
