//! Challenge manifest: the list of challenges shown by the front-end.
//!
//! The manifest is a JSON document of the form `{ "challenges": [...] }`,
//! read once at startup.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid manifest: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate challenge id: {0}")]
    DuplicateId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intro,
    Intermediate,
    Advanced,
    Trivial,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intro => "Intro",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
            Difficulty::Trivial => "Trivial",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub points: u32,
    pub description: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    /// Decoy challenges whose flag does not feed the master flag.
    #[serde(default)]
    pub is_fake: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub challenges: Vec<Challenge>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::from_json(&raw)?;
        debug!(
            path = %path.display(),
            challenges = manifest.challenges.len(),
            "manifest loaded"
        );
        Ok(manifest)
    }

    pub fn from_json(raw: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_str(raw)?;

        let mut seen = HashSet::new();
        for challenge in &manifest.challenges {
            if !seen.insert(challenge.id.as_str()) {
                return Err(ManifestError::DuplicateId(challenge.id.clone()));
            }
        }

        Ok(manifest)
    }

    pub fn find(&self, id: &str) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.id == id)
    }

    pub fn real_challenges(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.iter().filter(|c| !c.is_fake)
    }
}

/// Local path of a downloadable challenge file.
pub fn challenge_file_path(dir: &Path, file: &str) -> PathBuf {
    dir.join(file)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "challenges": [
            {
                "id": "caesar",
                "title": "Caesar's Secret",
                "difficulty": "Beginner",
                "points": 100,
                "description": "A classic shift.",
                "files": ["caesar.txt"],
                "hints": ["Try all 26 shifts."],
                "is_fake": false
            },
            {
                "id": "decoy",
                "title": "Too Easy",
                "difficulty": "Trivial",
                "points": 5,
                "description": "Is it though?",
                "files": [],
                "hints": [],
                "is_fake": true
            },
            {
                "id": "rsa",
                "title": "Small e",
                "difficulty": "Advanced",
                "points": 500,
                "description": "Cube roots are fun."
            }
        ]
    }"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_json(SAMPLE).unwrap();
        assert_eq!(manifest.challenges.len(), 3);

        let caesar = manifest.find("caesar").unwrap();
        assert_eq!(caesar.difficulty, Difficulty::Beginner);
        assert_eq!(caesar.points, 100);
        assert_eq!(caesar.files, vec!["caesar.txt"]);

        let rsa = manifest.find("rsa").unwrap();
        assert!(rsa.files.is_empty());
        assert!(rsa.hints.is_empty());
        assert!(!rsa.is_fake);

        assert!(manifest.find("missing").is_none());
    }

    #[test]
    fn test_real_challenges_skip_fakes() {
        let manifest = Manifest::from_json(SAMPLE).unwrap();
        let ids: Vec<&str> = manifest.real_challenges().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["caesar", "rsa"]);
    }

    #[test]
    fn test_rejects_unknown_difficulty() {
        let raw = r#"{"challenges":[{"id":"x","title":"x","difficulty":"Expert","points":1,"description":""}]}"#;
        assert!(matches!(
            Manifest::from_json(raw),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let raw = r#"{"challenges":[
            {"id":"x","title":"a","difficulty":"Intro","points":1,"description":""},
            {"id":"x","title":"b","difficulty":"Intro","points":2,"description":""}
        ]}"#;
        match Manifest::from_json(raw) {
            Err(ManifestError::DuplicateId(id)) => assert_eq!(id, "x"),
            other => panic!("expected duplicate id error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let manifest = Manifest::load(file.path()).unwrap();
        assert_eq!(manifest.challenges[2].title, "Small e");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
        assert!(err.to_string().contains("manifest.json"));
    }

    #[test]
    fn test_challenge_file_path() {
        assert_eq!(
            challenge_file_path(Path::new("challenges"), "caesar.txt"),
            PathBuf::from("challenges/caesar.txt")
        );
    }
}
