use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vpt_utils::{dejsonify, read_json_arg};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct SolverSettings {
    /// Wall-clock budget for tour construction. Absent means unbounded.
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
}

impl SolverSettings {
    /// Accepts a json string or a path to a `.json` file.
    pub fn load(arg: &str) -> Result<Self> {
        let json = read_json_arg(arg)?;
        dejsonify::<SolverSettings>(&json).map_err(|e| anyhow!("Failed to parse settings: {}", e))
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }
}
