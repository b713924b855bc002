//! Challenge repository: read-only lookup of Debug Dash challenges and logic circuits

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_CHALLENGE_POINTS: u32 = 15;
const DEFAULT_CIRCUIT_POINTS: u32 = 20;

/// A Debug Dash challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub starter_code: String,
    pub expected_output: String,
    #[serde(default = "default_challenge_points")]
    pub points: u32,
}

/// Public view of a challenge; never carries the expected output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub starter_code: String,
    pub points: u32,
}

impl From<&Challenge> for ChallengeSummary {
    fn from(challenge: &Challenge) -> Self {
        Self {
            id: challenge.id,
            title: challenge.title.clone(),
            description: challenge.description.clone(),
            starter_code: challenge.starter_code.clone(),
            points: challenge.points,
        }
    }
}

/// A logic-circuit puzzle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicCircuit {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub available_gates: Vec<String>,
    pub correct_sequence: Vec<String>,
    #[serde(default)]
    pub expected_output: serde_json::Value,
    #[serde(default = "default_circuit_points")]
    pub points: u32,
}

fn default_challenge_points() -> u32 {
    DEFAULT_CHALLENGE_POINTS
}

fn default_circuit_points() -> u32 {
    DEFAULT_CIRCUIT_POINTS
}

/// Source of challenge records
#[async_trait]
pub trait ChallengeRepository: Send + Sync {
    async fn get_challenge(&self, id: i64) -> anyhow::Result<Option<Challenge>>;

    /// All challenges, ordered by id
    async fn list_challenges(&self) -> anyhow::Result<Vec<Challenge>>;

    async fn get_circuit(&self, id: i64) -> anyhow::Result<Option<LogicCircuit>>;

    /// All circuits, ordered by id
    async fn list_circuits(&self) -> anyhow::Result<Vec<LogicCircuit>>;
}

/// Raw TOML layout of the challenge file
#[derive(Debug, Deserialize)]
struct RawChallengeFile {
    #[serde(default)]
    challenges: Vec<Challenge>,
    #[serde(default)]
    circuits: Vec<LogicCircuit>,
}

/// Challenges loaded once from a TOML file
#[derive(Debug, Default)]
pub struct FileChallengeRepository {
    challenges: BTreeMap<i64, Challenge>,
    circuits: BTreeMap<i64, LogicCircuit>,
}

impl FileChallengeRepository {
    /// Load `[[challenges]]` and `[[circuits]]` from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read challenge file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid challenge file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let raw: RawChallengeFile = toml::from_str(content)?;

        let mut challenges = BTreeMap::new();
        for challenge in raw.challenges {
            let id = challenge.id;
            if challenges.insert(id, challenge).is_some() {
                anyhow::bail!("Duplicate challenge id: {}", id);
            }
        }

        let mut circuits = BTreeMap::new();
        for circuit in raw.circuits {
            let id = circuit.id;
            if circuits.insert(id, circuit).is_some() {
                anyhow::bail!("Duplicate circuit id: {}", id);
            }
        }

        Ok(Self {
            challenges,
            circuits,
        })
    }

    pub fn challenge_count(&self) -> usize {
        self.challenges.len()
    }

    pub fn circuit_count(&self) -> usize {
        self.circuits.len()
    }
}

#[async_trait]
impl ChallengeRepository for FileChallengeRepository {
    async fn get_challenge(&self, id: i64) -> anyhow::Result<Option<Challenge>> {
        Ok(self.challenges.get(&id).cloned())
    }

    async fn list_challenges(&self) -> anyhow::Result<Vec<Challenge>> {
        Ok(self.challenges.values().cloned().collect())
    }

    async fn get_circuit(&self, id: i64) -> anyhow::Result<Option<LogicCircuit>> {
        Ok(self.circuits.get(&id).cloned())
    }

    async fn list_circuits(&self) -> anyhow::Result<Vec<LogicCircuit>> {
        Ok(self.circuits.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[[challenges]]
id = 2
title = "Sum"
starter_code = "console.log(2 + 3)"
expected_output = "5"
points = 10

[[challenges]]
id = 1
title = "Hello"
expected_output = "Hello, World!"

[[circuits]]
id = 1
title = "Half adder"
available_gates = ["AND", "XOR"]
correct_sequence = ["XOR", "AND"]
expected_output = [0, 1]
"#;

    fn create_test_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_applies_default_points() {
        let file = create_test_file(SAMPLE);
        let repo = FileChallengeRepository::load(file.path()).unwrap();

        let hello = repo.get_challenge(1).await.unwrap().unwrap();
        assert_eq!(hello.points, 15);
        assert_eq!(hello.description, "");

        let circuit = repo.get_circuit(1).await.unwrap().unwrap();
        assert_eq!(circuit.points, 20);
        assert_eq!(circuit.expected_output, serde_json::json!([0, 1]));
    }

    #[tokio::test]
    async fn test_listing_is_ordered_by_id() {
        let repo = FileChallengeRepository::from_toml(SAMPLE).unwrap();
        let ids: Vec<i64> = repo
            .list_challenges()
            .await
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_unknown_id_is_none() {
        let repo = FileChallengeRepository::from_toml(SAMPLE).unwrap();
        assert!(repo.get_challenge(99).await.unwrap().is_none());
        assert!(repo.get_circuit(99).await.unwrap().is_none());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let content = r#"
[[challenges]]
id = 1
title = "A"
expected_output = "a"

[[challenges]]
id = 1
title = "B"
expected_output = "b"
"#;
        let err = FileChallengeRepository::from_toml(content).unwrap_err();
        assert!(err.to_string().contains("Duplicate challenge id: 1"));
    }

    #[test]
    fn test_summary_hides_expected_output() {
        let repo = FileChallengeRepository::from_toml(SAMPLE).unwrap();
        let summary = ChallengeSummary::from(&repo.challenges[&2]);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("expected_output").is_none());
        assert_eq!(json["starter_code"], "console.log(2 + 3)");
    }

    #[test]
    fn test_missing_file_mentions_path() {
        let err = FileChallengeRepository::load("/nonexistent/challenges.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/challenges.toml"));
    }
}
