//! Code ownership parsing.
//!
//! Maintainers come from one of two file formats. A root `CODEOWNERS` file is
//! preferred; without one, every `OWNERS` file in the default branch's tree is
//! read instead. Both produce `repo/path` entries attributed to logins.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use super::types::VENDOR_DIR;
use crate::entity::maintainer;
use crate::platform::PlatformError;

pub const CODEOWNERS_PATH: &str = "CODEOWNERS";
pub const OWNERS_FILE: &str = "OWNERS";

/// Why one repository's maintainers could not be established.
#[derive(Debug, Error)]
pub enum MaintainerError {
    #[error("unable to read CODEOWNERS body: {0}")]
    CodeOwners(#[source] PlatformError),

    #[error("unable to find the tip of {branch}: {source}")]
    Commit {
        branch: String,
        #[source]
        source: PlatformError,
    },

    #[error("unable to get tree: {0}")]
    Tree(#[source] PlatformError),

    #[error("unable to get {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: PlatformError,
    },

    #[error("unable to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("unable to resolve user {login}: {message}")]
    UserLookup { login: String, message: String },

    #[error("sync cancelled")]
    Cancelled,
}

/// One non-comment CODEOWNERS line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeOwnersRule {
    /// Normalized path, empty for the repository root.
    pub path: String,
    /// Logins with any leading `@` removed.
    pub logins: Vec<String>,
}

/// Strip one leading `/` and one trailing `/*`; a bare `*` is the root.
pub fn normalize_codeowners_path(pattern: &str) -> String {
    let path = pattern.strip_prefix('/').unwrap_or(pattern);
    let path = path.strip_suffix("/*").unwrap_or(path);
    if path == "*" {
        String::new()
    } else {
        path.to_string()
    }
}

pub fn parse_codeowners(content: &str) -> Vec<CodeOwnersRule> {
    content
        .lines()
        .map(|line| line.trim_matches(|c| c == ' ' || c == '\t'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let pattern = fields.next()?;
            Some(CodeOwnersRule {
                path: normalize_codeowners_path(pattern),
                logins: fields
                    .map(|login| login.strip_prefix('@').unwrap_or(login).to_string())
                    .collect(),
            })
        })
        .collect()
}

/// The contents of an `OWNERS` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OwnersFile {
    #[serde(default)]
    pub approvers: Vec<String>,
    #[serde(default)]
    pub reviewers: Vec<String>,
}

pub fn parse_owners(path: &str, body: &str) -> Result<OwnersFile, MaintainerError> {
    if body.trim().is_empty() {
        return Ok(OwnersFile::default());
    }
    serde_yaml_ng::from_str(body).map_err(|source| MaintainerError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Whether a tree path names an `OWNERS` file outside the vendor directory.
pub fn is_owners_file(path: &str) -> bool {
    let mut components = path.split('/');
    let first = components.next().unwrap_or_default();
    let last = path.rsplit('/').next().unwrap_or_default();
    last == OWNERS_FILE && first != VENDOR_DIR
}

/// The directory prefix of an `OWNERS` path, keeping its trailing slash.
pub fn owners_dir(path: &str) -> &str {
    path.strip_suffix(OWNERS_FILE).unwrap_or(path)
}

/// One organization's maintainers, accumulated across its repositories.
#[derive(Debug)]
pub struct MaintainerSet {
    org: String,
    by_login: BTreeMap<String, maintainer::Model>,
}

impl MaintainerSet {
    pub fn new(org: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            by_login: BTreeMap::new(),
        }
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    /// Append `repo/path` to a login's paths, creating the record on first use.
    pub fn add_path(&mut self, login: &str, repo: &str, path: &str) {
        self.by_login
            .entry(login.to_string())
            .or_insert_with(|| maintainer::Model::new(&self.org, login))
            .paths
            .push(format!("{repo}/{path}"));
    }

    pub fn len(&self) -> usize {
        self.by_login.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_login.is_empty()
    }

    pub fn get(&self, login: &str) -> Option<&maintainer::Model> {
        self.by_login.get(login)
    }

    pub fn into_models(self) -> Vec<maintainer::Model> {
        self.by_login.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codeowners_paths_are_normalized() {
        let rules = parse_codeowners("/a/b/* @alice @bob\n* @carol\n");

        assert_eq!(
            rules,
            vec![
                CodeOwnersRule {
                    path: "a/b".to_string(),
                    logins: vec!["alice".to_string(), "bob".to_string()],
                },
                CodeOwnersRule {
                    path: String::new(),
                    logins: vec!["carol".to_string()],
                },
            ]
        );
    }

    #[test]
    fn codeowners_skips_comments_and_blank_lines() {
        let content = "# owners\n\n   \n\t# indented comment\n/docs/ @dave\n";
        let rules = parse_codeowners(content);

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].path, "docs/");
        assert_eq!(rules[0].logins, ["dave"]);
    }

    #[test]
    fn codeowners_line_without_owners_has_no_logins() {
        let rules = parse_codeowners("/orphaned\n");
        assert_eq!(rules[0].path, "orphaned");
        assert!(rules[0].logins.is_empty());
    }

    #[test]
    fn codeowners_accepts_logins_without_at_sign() {
        let rules = parse_codeowners("pkg/*\terin   @istio/wg-networking");
        assert_eq!(rules[0].path, "pkg");
        assert_eq!(rules[0].logins, ["erin", "istio/wg-networking"]);
    }

    #[test]
    fn owners_files_outside_vendor_only() {
        assert!(is_owners_file("OWNERS"));
        assert!(is_owners_file("a/b/OWNERS"));
        assert!(!is_owners_file("vendor/OWNERS"));
        assert!(!is_owners_file("vendor/github.com/x/OWNERS"));
        assert!(!is_owners_file("a/OWNERS_ALIASES"));
        assert!(!is_owners_file("a/NOT_OWNERS/file"));
        assert!(is_owners_file("pkg/vendor/OWNERS"));
    }

    #[test]
    fn owners_dir_keeps_trailing_slash() {
        assert_eq!(owners_dir("a/b/OWNERS"), "a/b/");
        assert_eq!(owners_dir("OWNERS"), "");
    }

    #[test]
    fn owners_file_parses_both_lists() {
        let parsed = parse_owners(
            "a/b/OWNERS",
            "approvers:\n  - dave\nreviewers:\n  - erin\n  - frank\n",
        )
        .unwrap();

        assert_eq!(parsed.approvers, ["dave"]);
        assert_eq!(parsed.reviewers, ["erin", "frank"]);
    }

    #[test]
    fn owners_file_tolerates_missing_lists() {
        assert_eq!(parse_owners("OWNERS", "").unwrap(), OwnersFile::default());
        assert_eq!(
            parse_owners("OWNERS", "reviewers: [erin]\n").unwrap().approvers,
            Vec::<String>::new()
        );
    }

    #[test]
    fn malformed_owners_file_names_its_path() {
        let err = parse_owners("a/OWNERS", "approvers: [unclosed").unwrap_err();
        assert!(err.to_string().contains("a/OWNERS"));
    }

    #[test]
    fn maintainer_set_accumulates_paths_per_login() {
        let mut set = MaintainerSet::new("istio");
        set.add_path("alice", "istio", "a/b");
        set.add_path("alice", "api", "");
        set.add_path("bob", "istio", "a/b");

        assert_eq!(set.len(), 2);
        let alice = set.get("alice").unwrap();
        assert_eq!(alice.org_login, "istio");
        assert_eq!(alice.paths.0, ["istio/a/b", "api/"]);

        let models = set.into_models();
        assert_eq!(models[1].user_login, "bob");
    }
}
