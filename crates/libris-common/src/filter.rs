//! Target block-list for log records
//!
//! Suppresses records emitted by noisy dependencies (for example `sqlx` or
//! `hyper`) before they reach any output. A blocked name also blocks every
//! module below it: blocking `sqlx` hides `sqlx::query` but not `sqlxtra`.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::Metadata;
use tracing_subscriber::layer::{Context, Filter};

#[derive(Debug, Clone, Default)]
pub struct BlockListFilter {
    blocked: Arc<HashSet<String>>,
}

impl BlockListFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let blocked = names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| !name.is_empty())
            .collect();
        Self {
            blocked: Arc::new(blocked),
        }
    }

    /// Parse a comma-separated list such as `"hyper, sqlx::query"`
    pub fn parse(list: &str) -> Self {
        Self::new(split_names(list))
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }

    /// Whether records from `target` may pass
    pub fn allows(&self, target: &str) -> bool {
        !self.blocked.iter().any(|name| {
            target == name
                || target
                    .strip_prefix(name.as_str())
                    .is_some_and(|rest| rest.starts_with("::"))
        })
    }
}

impl<S> Filter<S> for BlockListFilter {
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        self.allows(meta.target())
    }
}

/// Split a comma-separated block-list into names, dropping blanks
pub fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
