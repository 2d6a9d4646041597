use serde::Serialize;

use super::catalog::PolicyRecord;
use crate::classifier::PolicyMatcher;

/// Outcome of resolving a free-text query against the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyMatch {
    pub matched_policy_id: Option<String>,
    pub matched_name: Option<String>,
    pub confidence_reason: String,
}

impl PolicyMatch {
    pub fn none(reason: impl Into<String>) -> Self {
        Self {
            matched_policy_id: None,
            matched_name: None,
            confidence_reason: reason.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.matched_policy_id.is_some()
    }
}

/// Public view of a record, as served by the details endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDetails {
    pub name: String,
    pub description: String,
    pub category: String,
    pub subcategory: String,
    pub url: String,
    pub created: Option<String>,
}

/// Lowercased searchable fields of one record
struct Haystack {
    fields: [String; 3],
}

impl Haystack {
    fn new(record: &PolicyRecord) -> Self {
        Self {
            fields: [
                record.name.to_lowercase(),
                record.description.to_lowercase(),
                record.subcategory.to_lowercase(),
            ],
        }
    }

    /// Substring of a field, or prefix of any whitespace-delimited word in it
    fn matches(&self, term: &str) -> bool {
        self.fields.iter().any(|field| {
            field.contains(term) || field.split_whitespace().any(|word| word.starts_with(term))
        })
    }
}

/// Read-only lookup over the policy catalog
///
/// Matching is a linear scan in catalog order and the first hit wins; there
/// is no ranking.
pub struct PolicyIndex {
    records: Vec<PolicyRecord>,
    haystacks: Vec<Haystack>,
    public_base_url: String,
    index_url: String,
}

impl PolicyIndex {
    pub fn new(records: Vec<PolicyRecord>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        let haystacks = records.iter().map(Haystack::new).collect();
        Self {
            records,
            haystacks,
            index_url: public_base_url.clone(),
            public_base_url,
        }
    }

    /// Page listing every policy, offered when nothing matches
    pub fn with_index_url(mut self, index_url: impl Into<String>) -> Self {
        self.index_url = index_url.into();
        self
    }

    pub fn empty(public_base_url: impl Into<String>) -> Self {
        Self::new(Vec::new(), public_base_url)
    }

    pub fn records(&self) -> &[PolicyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    pub fn url_for(&self, record: &PolicyRecord) -> String {
        format!("{}/{}", self.public_base_url, record.id)
    }

    /// First record in catalog order whose name, description or subcategory
    /// matches the trimmed, case-folded term
    pub fn lookup(&self, term: &str) -> Option<&PolicyRecord> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return None;
        }

        let position = self.haystacks.iter().position(|h| h.matches(&term));
        match position {
            Some(i) => {
                let record = &self.records[i];
                tracing::debug!(term = %term, policy_id = %record.id, "policy lookup hit");
                Some(record)
            }
            None => {
                tracing::debug!(term = %term, "policy lookup miss");
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&PolicyRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn details(&self, record: &PolicyRecord) -> PolicyDetails {
        PolicyDetails {
            name: record.name.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            subcategory: record.subcategory.clone(),
            url: self.url_for(record),
            created: record.created_at.map(|d| d.format("%-m/%-d/%Y").to_string()),
        }
    }

    /// Resolve a free-text query, lexically first and then through the matcher
    ///
    /// Never fails: matcher errors, malformed verdicts and ids outside the
    /// catalog all come back as a no-match.
    pub async fn best_match(&self, query: &str, matcher: &dyn PolicyMatcher) -> PolicyMatch {
        if let Some(record) = self.lookup(query) {
            return PolicyMatch {
                matched_policy_id: Some(record.id.clone()),
                matched_name: Some(record.name.clone()),
                confidence_reason: format!("\"{}\" matches the policy catalog entry", query.trim()),
            };
        }

        if self.records.is_empty() {
            return PolicyMatch::none("The policy catalog is empty");
        }

        let verdict = match matcher.match_policy(query, &self.records).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(error = %e, "policy matcher failed, treating as no match");
                return PolicyMatch::none("No matching policy could be determined");
            }
        };

        let Some(policy_id) = verdict.policy_id.filter(|id| !id.is_empty()) else {
            return PolicyMatch::none(verdict.reason);
        };

        match self.get(&policy_id) {
            Some(record) => PolicyMatch {
                matched_policy_id: Some(record.id.clone()),
                matched_name: Some(record.name.clone()),
                confidence_reason: verdict.reason,
            },
            None => {
                tracing::warn!(policy_id = %policy_id, "policy matcher returned an unknown id");
                PolicyMatch::none("No matching policy could be determined")
            }
        }
    }
}
