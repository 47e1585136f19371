//! Unique task id generation

use std::sync::atomic::{AtomicU64, Ordering};

/// Width of the zero-padded counter
const COUNTER_WIDTH: usize = 5;

/// Race-free generator of task ids
///
/// Ids look like `perf-<scope>-00001`, or `perf-<session>-<scope>-00001`
/// when a session tag is set. One counter is shared by all scopes, so ids are
/// unique across every target of a run, and strictly increasing within each scope.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: String,
    session: Option<String>,
    counter: AtomicU64,
}

impl IdGenerator {
    /// Create a generator with the given prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            session: None,
            counter: AtomicU64::new(0),
        }
    }

    /// Tag ids with a session component so repeated runs do not collide remotely
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(sanitize(&session.into()));
        self
    }

    /// Next id for `scope`
    pub fn next(&self, scope: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let scope = sanitize(scope);
        match &self.session {
            Some(session) => format!(
                "{}-{}-{}-{:0width$}",
                self.prefix,
                session,
                scope,
                n,
                width = COUNTER_WIDTH
            ),
            None => format!("{}-{}-{:0width$}", self.prefix, scope, n, width = COUNTER_WIDTH),
        }
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new("perf")
    }
}

/// Keep ids URL-path friendly (`C++` becomes `cpp`)
fn sanitize(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => Some(c),
            'A'..='Z' => Some(c.to_ascii_lowercase()),
            '+' => Some('p'),
            _ => None,
        })
        .collect();
    if cleaned.is_empty() {
        "task".to_string()
    } else {
        cleaned
    }
}
