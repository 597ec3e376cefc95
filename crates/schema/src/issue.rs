//! Path-addressed issues collected while walking a value.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Path key used for issues raised against the value itself.
pub const ROOT_PATH: &str = "$";

/// One validation or casting problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// Stable message key, e.g. `missing_property` or `validator.email`.
    pub key: String,
    /// Raw value, expected shape, validator parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<serde_json::Value>,
}

impl Issue {
    pub fn new(key: impl Into<String>) -> Self {
        Issue {
            key: key.into(),
            debug: None,
        }
    }

    pub fn with_debug(mut self, debug: serde_json::Value) -> Self {
        self.debug = Some(debug);
        self
    }
}

/// Every issue gathered by one `parse` or `serialize` call, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Failure {
    issues: BTreeMap<String, Vec<Issue>>,
}

impl Failure {
    pub fn issues(&self) -> &BTreeMap<String, Vec<Issue>> {
        &self.issues
    }

    /// Issues recorded at `path` (`"$"` for the root).
    pub fn at(&self, path: &str) -> &[Issue] {
        self.issues.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Message keys recorded at `path`.
    pub fn keys_at(&self, path: &str) -> Vec<&str> {
        self.at(path).iter().map(|i| i.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.issues.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (path, issues) in &self.issues {
            for issue in issues {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                write!(f, "{}: {}", path, issue.key)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Per-call path stack and issue accumulator. Owned by exactly one walk.
#[derive(Debug, Default)]
pub struct Context {
    path: Vec<Segment>,
    issues: BTreeMap<String, Vec<Issue>>,
}

/// Issues set aside while a union arm is being tried.
pub(crate) struct Checkpoint(BTreeMap<String, Vec<Issue>>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.path.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.path.pop();
    }

    /// Dotted path of the current position, `"$"` at the root.
    pub fn path(&self) -> String {
        if self.path.is_empty() {
            return ROOT_PATH.to_owned();
        }
        self.path
            .iter()
            .map(Segment::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn report(&mut self, issue: Issue) {
        let path = self.path();
        tracing::trace!(path = %path, key = %issue.key, "issue");
        self.issues.entry(path).or_default().push(issue);
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Start a trial: later issues can be dropped with [`Context::rollback`].
    pub(crate) fn checkpoint(&mut self) -> Checkpoint {
        Checkpoint(std::mem::take(&mut self.issues))
    }

    /// Drop issues recorded since `checkpoint`.
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.issues = checkpoint.0;
    }

    /// Keep issues recorded since `checkpoint` alongside the earlier ones.
    pub(crate) fn commit(&mut self, checkpoint: Checkpoint) {
        let recent = std::mem::replace(&mut self.issues, checkpoint.0);
        for (path, issues) in recent {
            self.issues.entry(path).or_default().extend(issues);
        }
    }

    pub fn into_failure(self) -> Failure {
        Failure {
            issues: self.issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paths_join_keys_and_indices() {
        let mut ctx = Context::new();
        assert_eq!(ctx.path(), "$");
        ctx.push(Segment::Key("users".into()));
        ctx.push(Segment::Index(1));
        ctx.push(Segment::Key("name".into()));
        assert_eq!(ctx.path(), "users.1.name");
        ctx.report(Issue::new("missing_property"));
        ctx.pop();
        ctx.pop();
        ctx.pop();
        ctx.report(Issue::new("casting_failed"));
        let failure = ctx.into_failure();
        assert_eq!(failure.keys_at("users.1.name"), vec!["missing_property"]);
        assert_eq!(failure.keys_at("$"), vec!["casting_failed"]);
        assert_eq!(failure.len(), 2);
    }

    #[test]
    fn rollback_discards_trial_issues() {
        let mut ctx = Context::new();
        ctx.report(Issue::new("kept"));
        let cp = ctx.checkpoint();
        ctx.report(Issue::new("dropped"));
        ctx.rollback(cp);
        let cp = ctx.checkpoint();
        ctx.report(Issue::new("merged"));
        ctx.commit(cp);
        assert_eq!(ctx.into_failure().keys_at("$"), vec!["kept", "merged"]);
    }

    #[test]
    fn failure_serializes_as_path_map() {
        let mut ctx = Context::new();
        ctx.report(Issue::new("invalid_type").with_debug(json!({"expected": "int"})));
        assert_eq!(
            ctx.into_failure().to_json_value(),
            json!({"$": [{"key": "invalid_type", "debug": {"expected": "int"}}]})
        );
    }
}
