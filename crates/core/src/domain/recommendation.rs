use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Roas,
    Ctr,
    Conversion,
    Frequency,
    Spend,
    Creative,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Roas => "roas",
            Category::Ctr => "ctr",
            Category::Conversion => "conversion",
            Category::Frequency => "frequency",
            Category::Spend => "spend",
            Category::Creative => "creative",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort rank, lower sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

/// A single triggered rule outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub category: Category,
    pub condition: String,
    pub recommendation: String,
    pub priority: Priority,
    pub affected_ads: Vec<String>,
    pub metrics: BTreeMap<String, f64>,
}

impl Finding {
    pub fn for_ad(
        category: Category,
        priority: Priority,
        ad_id: String,
        condition: String,
        recommendation: &str,
        metrics: &[(&str, f64)],
    ) -> Self {
        Self {
            category,
            condition,
            recommendation: recommendation.to_string(),
            priority,
            affected_ads: vec![ad_id],
            metrics: metrics
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect(),
        }
    }

    pub fn affects(&self, ad_id: &str) -> bool {
        self.affected_ads.iter().any(|id| id == ad_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdStatus {
    Pause,
    Fix,
    Test,
    Keep,
}

impl fmt::Display for AdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdStatus::Pause => "pause",
            AdStatus::Fix => "fix",
            AdStatus::Test => "test",
            AdStatus::Keep => "keep",
        };
        f.write_str(s)
    }
}

/// Final per-ad status recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub ad_id: String,
    pub ad_name: String,
    pub status: AdStatus,
    pub recommendations: Vec<String>,
    pub metrics: BTreeMap<String, f64>,
    pub issues: Vec<String>,
}
