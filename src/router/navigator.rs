//! In-process navigation: guard, follow redirects, commit.

use std::sync::Arc;

use super::RouteTable;
use super::guard::{self, Decision};
use crate::auth::SessionSource;

/// Redirect hops followed before committing whatever was reached.
const MAX_REDIRECTS: usize = 1;

/// Outcome of one `navigate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub requested: String,
    pub committed: String,
    /// Decision taken for the requested path.
    pub decision: Decision,
}

pub struct Navigator {
    table: RouteTable,
    source: Arc<dyn SessionSource>,
    current: Option<String>,
}

impl Navigator {
    #[must_use]
    pub fn new(table: RouteTable, source: Arc<dyn SessionSource>) -> Self {
        Self { table, source, current: None }
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Path of the last committed navigation.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Guard `full_path`, follow redirect decisions, and commit the result.
    ///
    /// Each hop runs the guard again with a fresh session query.
    pub async fn navigate(&mut self, full_path: &str) -> Navigation {
        let decision = guard::evaluate(&self.table, full_path, self.source.as_ref()).await;

        let mut committed = full_path.to_owned();
        let mut next = decision.clone();
        let mut hops = 0;
        while let Decision::RedirectTo(redirect) = next {
            if hops == MAX_REDIRECTS {
                tracing::warn!(requested = full_path, reached = %committed, "redirect limit reached");
                break;
            }
            hops += 1;
            committed = redirect.location(&self.table);
            next = guard::evaluate(&self.table, &committed, self.source.as_ref()).await;
        }

        self.current = Some(committed.clone());
        Navigation { requested: full_path.to_owned(), committed, decision }
    }
}

#[cfg(test)]
#[path = "navigator_test.rs"]
mod tests;
