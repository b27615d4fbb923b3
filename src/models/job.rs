/*
    Developer blog:
    - This is the snapshot of a posting as the api handed it to us when the user hit save.
        It is not refreshed, so the budget or title may be out of date compared to the server.
    - Validation mirrors what the api checks on its side. We still check here so a bad
        entry never lands in the saved list.
*/
use saved::Keyed;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

pub const MAX_BUDGET: f64 = 1_000_000.0;

#[derive(Debug, Error, PartialEq)]
pub enum JobError {
    #[error("Job id is required")]
    MissingId,
    #[error("Job title is required")]
    MissingTitle,
    #[error("Budget must be between 0 and 1000000, got {0}")]
    BudgetOutOfRange(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier from the api
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    // anything else the api sent along, kept untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// some endpoints send the id as a number.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

impl Job {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            budget: None,
            client: None,
            extra: Map::new(),
        }
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    /// Same rules as the job form: id and title required, budget within range.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.id.trim().is_empty() {
            return Err(JobError::MissingId);
        }
        if self.title.trim().is_empty() {
            return Err(JobError::MissingTitle);
        }
        match self.budget {
            Some(budget) if !(0.0..=MAX_BUDGET).contains(&budget) => {
                Err(JobError::BudgetOutOfRange(budget))
            }
            _ => Ok(()),
        }
    }
}

impl Keyed for Job {
    fn key(&self) -> Option<String> {
        Some(self.id.clone())
    }
}
