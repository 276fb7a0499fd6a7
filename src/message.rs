//! Commit message generation

use rand::seq::IndexedRandom;
use rand::Rng;

/// Produces commit subjects. Implementations must never return an empty string.
pub trait MessageSource {
    fn next_message<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String;
}

const KINDS: &[&str] = &["feat", "fix", "refactor", "docs", "test", "chore", "perf", "style"];

const SCOPES: &[&str] = &[
    "api", "cli", "core", "config", "parser", "ui", "build", "deps", "auth", "db", "tests",
];

const VERBS: &[&str] = &[
    "add", "update", "remove", "fix", "improve", "simplify", "clean up", "rework", "handle",
    "document", "rename", "tweak",
];

const OBJECTS: &[&str] = &[
    "error handling",
    "logging",
    "input validation",
    "edge cases",
    "README",
    "unit tests",
    "config loading",
    "build script",
    "dependency versions",
    "type annotations",
    "helper functions",
    "retry logic",
    "cache invalidation",
    "date parsing",
    "formatting",
    "empty input",
];

/// Word-list generator mixing conventional-commit subjects
/// (`fix(parser): handle empty input`) with plain ones (`Update logging`).
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomMessages;

impl MessageSource for RandomMessages {
    fn next_message<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        let verb = VERBS.choose(rng).copied().unwrap_or("update");
        let object = OBJECTS.choose(rng).copied().unwrap_or("code");
        let subject = format!("{} {}", verb, object);

        if !rng.random_bool(0.6) {
            return capitalize(&subject);
        }

        let kind = KINDS.choose(rng).copied().unwrap_or("chore");
        if rng.random_bool(0.5) {
            let scope = SCOPES.choose(rng).copied().unwrap_or("core");
            format!("{}({}): {}", kind, scope, subject)
        } else {
            format!("{}: {}", kind, subject)
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
