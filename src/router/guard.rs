//! Navigation guard for auth-protected and auth-entry routes.
//!
//! DESIGN
//! ======
//! `decide` is the policy as a pure function of the target route and a
//! session snapshot. `evaluate` adds the live session query: it asks the
//! source on every navigation and treats a failed query as signed out.

use url::form_urlencoded;

use super::{HOME, LOGIN, RouteDescriptor, RouteTable, query_of};
use crate::auth::{Session, SessionSource};

/// Query parameter carrying the originally requested path to the login page.
pub const REDIRECT_PARAM: &str = "redirectTo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub name: &'static str,
    pub query: Vec<(String, String)>,
}

impl Redirect {
    fn to(name: &'static str) -> Self {
        Self { name, query: Vec::new() }
    }

    /// Render as `path[?query]` against `table`. Unknown names resolve to `/`.
    #[must_use]
    pub fn location(&self, table: &RouteTable) -> String {
        let path = table.by_name(self.name).map_or("/", |route| route.path);
        if self.query.is_empty() {
            return path.to_owned();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{path}?{query}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(Redirect),
}

/// Terminal state of one navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Allowed,
    RedirectToLogin,
    RedirectToHome,
}

impl Decision {
    #[must_use]
    pub fn state(&self) -> GuardState {
        match self {
            Self::Allow => GuardState::Allowed,
            Self::RedirectTo(redirect) if redirect.name == LOGIN => GuardState::RedirectToLogin,
            Self::RedirectTo(_) => GuardState::RedirectToHome,
        }
    }
}

/// Policy for one navigation to `full_path`, resolved to `route` (if any).
#[must_use]
pub fn decide(route: Option<&RouteDescriptor>, full_path: &str, session: Option<&Session>) -> Decision {
    let Some(route) = route else {
        return Decision::Allow;
    };
    let logged_in = session.is_some();

    if route.requires_auth && !logged_in {
        let mut redirect = Redirect::to(LOGIN);
        redirect
            .query
            .push((REDIRECT_PARAM.to_owned(), full_path.to_owned()));
        return Decision::RedirectTo(redirect);
    }
    if route.is_auth_entry() && logged_in {
        return Decision::RedirectTo(Redirect::to(HOME));
    }
    Decision::Allow
}

/// Query `source` and decide. A failed query fails closed.
pub async fn evaluate(table: &RouteTable, full_path: &str, source: &dyn SessionSource) -> Decision {
    let session = match source.session().await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, path = full_path, "session check failed; treating as signed out");
            None
        }
    };
    let decision = decide(table.by_path(full_path), full_path, session.as_ref());
    tracing::debug!(path = full_path, state = ?decision.state(), "navigation guard");
    decision
}

/// Where to send a user after login, from the login page's query string.
///
/// Only same-origin absolute paths are honored; anything else goes home.
#[must_use]
pub fn redirect_back(login_query: &str) -> String {
    form_urlencoded::parse(query_of_login(login_query).as_bytes())
        .find(|(key, _)| key == REDIRECT_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|target| is_local_path(target))
        .unwrap_or_else(|| "/".to_owned())
}

/// Accept either a bare query or a whole `/login?…` path.
fn query_of_login(raw: &str) -> &str {
    if raw.starts_with('/') { query_of(raw) } else { raw.trim_start_matches('?') }
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
