//! The domain/problem knowledge store.
//!
//! Parses every file under the problem root exactly once, associates
//! problems to domains, attaches the mandatory predicate descriptions, and
//! persists the whole index so later runs skip re-parsing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use planeval_model::ast::{Domain, Problem};
use planeval_model::parser::{parse_pddl_file, PddlFile};

use crate::error::{Result, StoreError};

/// A parsed reference domain plus the file it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEntry {
    pub path: PathBuf,
    pub domain: Domain,
}

/// A parsed reference problem plus the file it came from. The file path is
/// what gets handed to the external tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemEntry {
    pub path: PathBuf,
    pub problem: Problem,
}

/// Immutable index over the reference corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeStore {
    domains: BTreeMap<String, DomainEntry>,
    predicate_descriptions: BTreeMap<String, String>,
    problems: BTreeMap<String, Vec<ProblemEntry>>,
}

impl KnowledgeStore {
    /// Parse and index the reference corpus.
    ///
    /// Every file under `problem_root` must be a PDDL domain or problem;
    /// anything else is fatal. Every domain must have a predicate
    /// description at `predicate_desc_root/<domain-file-stem>.txt`.
    /// Problems are matched to domains by substring: the declared domain
    /// name must occur in exactly one known domain name, otherwise the
    /// problem is dropped.
    pub fn build(problem_root: &Path, predicate_desc_root: &Path) -> Result<Self> {
        let mut files = Vec::new();
        collect_files(problem_root, &mut files)?;

        let mut domains: BTreeMap<String, DomainEntry> = BTreeMap::new();
        let mut parsed_problems: Vec<ProblemEntry> = Vec::new();
        for path in files {
            let text = std::fs::read_to_string(&path)?;
            match parse_pddl_file(&text) {
                Ok(PddlFile::Domain(domain)) => {
                    if domains.contains_key(&domain.name) {
                        warn!(domain = %domain.name, path = %path.display(), "duplicate domain definition, keeping the latest");
                    }
                    domains.insert(domain.name.clone(), DomainEntry { path, domain });
                }
                Ok(PddlFile::Problem(problem)) => {
                    parsed_problems.push(ProblemEntry { path, problem });
                }
                Err(source) => return Err(StoreError::UnclassifiedInput { path, source }),
            }
        }
        info!(
            domains = domains.len(),
            problems = parsed_problems.len(),
            "parsed reference corpus"
        );

        // Substring association: tolerant of naming-prefix mismatches in
        // the corpus, but ambiguity drops the problem rather than guessing.
        let mut problems: BTreeMap<String, Vec<ProblemEntry>> = BTreeMap::new();
        for entry in parsed_problems {
            let declared = &entry.problem.domain_name;
            let matches: Vec<&String> = domains
                .keys()
                .filter(|name| name.contains(declared.as_str()))
                .collect();
            match matches.as_slice() {
                [unique] => {
                    problems.entry((*unique).clone()).or_default().push(entry);
                }
                [] => {
                    debug!(
                        problem = %entry.path.display(),
                        declared = %declared,
                        "no known domain matches the declared domain name, dropping problem"
                    );
                }
                _ => {
                    debug!(
                        problem = %entry.path.display(),
                        declared = %declared,
                        candidates = matches.len(),
                        "declared domain name is ambiguous, dropping problem"
                    );
                }
            }
        }

        // Predicate descriptions are a required 1:1 association.
        let mut predicate_descriptions = BTreeMap::new();
        for (name, entry) in &domains {
            let stem = entry
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let desc_path = predicate_desc_root.join(format!("{stem}.txt"));
            if !desc_path.exists() {
                return Err(StoreError::MissingPredicateDescription {
                    domain: name.clone(),
                    path: desc_path,
                });
            }
            predicate_descriptions.insert(name.clone(), std::fs::read_to_string(&desc_path)?);
        }

        Ok(Self {
            domains,
            predicate_descriptions,
            problems,
        })
    }

    /// Load the persisted index, or build and persist it if absent.
    pub fn load_or_build(
        artifact: &Path,
        problem_root: &Path,
        predicate_desc_root: &Path,
    ) -> Result<Self> {
        if artifact.exists() {
            debug!(artifact = %artifact.display(), "loading knowledge index");
            return Self::load(artifact);
        }
        info!(artifact = %artifact.display(), "knowledge index absent, building");
        let store = Self::build(problem_root, predicate_desc_root)?;
        store.save(artifact)?;
        Ok(store)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = crate::to_artifact_bytes(self)?;
        crate::write_artifact(path, &bytes)?;
        info!(artifact = %path.display(), "knowledge index written");
        Ok(())
    }

    /// SHA-256 of the serialized index; identical inputs digest identically.
    pub fn artifact_digest(&self) -> Result<String> {
        crate::artifact_digest(self)
    }

    // -- accessors ----------------------------------------------------------

    pub fn domain(&self, name: &str) -> Option<&DomainEntry> {
        self.domains.get(name)
    }

    pub fn domain_names(&self) -> impl Iterator<Item = &String> {
        self.domains.keys()
    }

    pub fn domains(&self) -> impl Iterator<Item = (&String, &DomainEntry)> {
        self.domains.iter()
    }

    /// Problems associated with a domain, in indexing order. Empty for
    /// unknown domains.
    pub fn problems(&self, domain: &str) -> &[ProblemEntry] {
        self.problems.get(domain).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn predicate_description(&self, domain: &str) -> Option<&str> {
        self.predicate_descriptions.get(domain).map(String::as_str)
    }
}

/// Recursive, sorted file walk for deterministic indexing order.
fn collect_files(root: &Path, acc: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(root)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|e| e.path())
        .collect();
    entries.sort();
    for path in entries {
        if path.is_dir() {
            collect_files(&path, acc)?;
        } else {
            acc.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMAIN: &str = r#"
        (define (domain blocksworld)
          (:predicates (on ?x ?y) (clear ?x))
          (:action stack
            :parameters (?x ?y)
            :precondition (clear ?y)
            :effect (on ?x ?y)))
    "#;

    const PROBLEM: &str = r#"
        (define (problem blocks-2)
          (:domain blocksworld)
          (:objects a b)
          (:init (clear a) (clear b))
          (:goal (on a b)))
    "#;

    fn corpus() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let problems = dir.path().join("problems");
        let descriptions = dir.path().join("descriptions");
        std::fs::create_dir_all(&problems).unwrap();
        std::fs::create_dir_all(&descriptions).unwrap();
        std::fs::write(problems.join("blocksworld.pddl"), DOMAIN).unwrap();
        std::fs::write(problems.join("blocks-2.pddl"), PROBLEM).unwrap();
        std::fs::write(descriptions.join("blocksworld.txt"), "on: x is on y\n").unwrap();
        (dir, problems, descriptions)
    }

    #[test]
    fn test_build_indexes_domains_and_problems() {
        let (_dir, problems, descriptions) = corpus();
        let store = KnowledgeStore::build(&problems, &descriptions).unwrap();

        let entry = store.domain("blocksworld").expect("domain missing");
        assert_eq!(entry.domain.actions.len(), 1);
        assert_eq!(store.problems("blocksworld").len(), 1);
        assert_eq!(
            store.predicate_description("blocksworld"),
            Some("on: x is on y\n")
        );
    }

    #[test]
    fn test_missing_predicate_description_is_fatal() {
        let (_dir, problems, descriptions) = corpus();
        std::fs::remove_file(descriptions.join("blocksworld.txt")).unwrap();
        let err = KnowledgeStore::build(&problems, &descriptions).unwrap_err();
        assert!(matches!(err, StoreError::MissingPredicateDescription { .. }));
    }

    #[test]
    fn test_unclassifiable_file_is_fatal() {
        let (_dir, problems, descriptions) = corpus();
        std::fs::write(problems.join("junk.pddl"), "not pddl at all").unwrap();
        let err = KnowledgeStore::build(&problems, &descriptions).unwrap_err();
        assert!(matches!(err, StoreError::UnclassifiedInput { .. }));
    }

    #[test]
    fn test_substring_association() {
        let (_dir, problems, descriptions) = corpus();
        // Declared name "blocks" is a substring of "blocksworld".
        std::fs::write(
            problems.join("short-name.pddl"),
            "(define (problem short) (:domain blocks))",
        )
        .unwrap();
        let store = KnowledgeStore::build(&problems, &descriptions).unwrap();
        assert_eq!(store.problems("blocksworld").len(), 2);
    }

    #[test]
    fn test_unmatched_problem_is_dropped() {
        let (_dir, problems, descriptions) = corpus();
        std::fs::write(
            problems.join("stray.pddl"),
            "(define (problem stray) (:domain logistics))",
        )
        .unwrap();
        let store = KnowledgeStore::build(&problems, &descriptions).unwrap();
        assert_eq!(store.problems("blocksworld").len(), 1);
        assert!(store.problems("logistics").is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let (dir, problems, descriptions) = corpus();
        let store = KnowledgeStore::build(&problems, &descriptions).unwrap();
        let artifact = dir.path().join("cache").join("pddl_index.json");
        store.save(&artifact).unwrap();

        let loaded = KnowledgeStore::load(&artifact).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(
            loaded.artifact_digest().unwrap(),
            store.artifact_digest().unwrap()
        );
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let (_dir, problems, descriptions) = corpus();
        let first = KnowledgeStore::build(&problems, &descriptions).unwrap();
        let second = KnowledgeStore::build(&problems, &descriptions).unwrap();
        assert_eq!(
            first.artifact_digest().unwrap(),
            second.artifact_digest().unwrap()
        );
    }

    #[test]
    fn test_load_or_build_creates_artifact() {
        let (dir, problems, descriptions) = corpus();
        let artifact = dir.path().join("pddl_index.json");
        assert!(!artifact.exists());
        let built = KnowledgeStore::load_or_build(&artifact, &problems, &descriptions).unwrap();
        assert!(artifact.exists());
        let loaded = KnowledgeStore::load_or_build(&artifact, &problems, &descriptions).unwrap();
        assert_eq!(built, loaded);
    }
}
