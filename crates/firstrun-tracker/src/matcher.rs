use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use firstrun_core::InstallStatus;
use regex::Regex;
use serde::Deserialize;

/// One matched installation report: the package's base name, the version text
/// captured from the line (possibly empty) and the status the line encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedEvent {
    pub name: String,
    pub version: String,
    pub status: InstallStatus,
}

#[derive(Debug, Clone)]
pub struct MatchRule {
    status: InstallStatus,
    pattern: Regex,
}

impl MatchRule {
    /// The pattern must capture exactly two groups: package name, then
    /// version. Anything else is a configuration error.
    pub fn new(status: InstallStatus, pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).with_context(|| {
            format!("invalid match pattern for status '{}'", status.as_str())
        })?;
        let group_count = pattern.captures_len() - 1;
        if group_count != 2 {
            bail!(
                "match pattern for status '{}' must capture a package name and a version, found {} groups",
                status.as_str(),
                group_count
            );
        }
        Ok(Self { status, pattern })
    }

    pub fn status(&self) -> InstallStatus {
        self.status
    }
}

#[derive(Debug, Deserialize)]
struct RawRuleFile {
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    status: String,
    pattern: String,
}

/// Stateless classifier for installation log lines. Rules are checked in
/// declaration order and the first matching pattern wins, so overlapping
/// phrasings (a failure report usually contains the generic install wording)
/// must be declared most-specific first.
#[derive(Debug, Clone)]
pub struct LineMatcher {
    rules: Vec<MatchRule>,
}

impl LineMatcher {
    pub fn new(rules: Vec<MatchRule>) -> Self {
        Self { rules }
    }

    /// The phrasings the jamf install log uses, in priority order.
    pub fn jamf_default() -> Self {
        let defaults = [
            (
                InstallStatus::Failed,
                r"Installation failed\. The installer reported: installer: Package name is (.+)-([^-\s]+)\.pkg",
            ),
            (
                InstallStatus::Success,
                r"Successfully installed (.+)-([^-\s]+)\.pkg",
            ),
            (InstallStatus::Installing, r"Installing (.+)-([^-\s]+)\.pkg"),
        ];
        let rules = defaults
            .into_iter()
            .map(|(status, pattern)| {
                MatchRule::new(status, pattern).expect("built-in patterns are valid")
            })
            .collect();
        Self { rules }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read matcher rule file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to load matcher rule file: {}", path.display()))
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        let raw: RawRuleFile = toml::from_str(input).context("failed to parse rule file")?;
        if raw.rules.is_empty() {
            bail!("rule file declares no rules");
        }
        let mut rules = Vec::with_capacity(raw.rules.len());
        for rule in raw.rules {
            let status = InstallStatus::parse(&rule.status).ok_or_else(|| {
                anyhow!(
                    "unknown status '{}' in rule file; expected pending, installing, success or failed",
                    rule.status
                )
            })?;
            rules.push(MatchRule::new(status, &rule.pattern)?);
        }
        Ok(Self { rules })
    }

    /// Classifies one log line. Lines matching no rule are inert; a rule
    /// match where either capture group did not participate is not a match.
    pub fn classify(&self, line: &str) -> Option<MatchedEvent> {
        for rule in &self.rules {
            let Some(captures) = rule.pattern.captures(line) else {
                continue;
            };
            let (Some(name), Some(version)) = (captures.get(1), captures.get(2)) else {
                continue;
            };
            return Some(MatchedEvent {
                name: name.as_str().to_string(),
                version: version.as_str().to_string(),
                status: rule.status,
            });
        }
        None
    }
}
