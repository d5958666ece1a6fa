//! Client route table.
//!
//! SYSTEM CONTEXT
//! ==============
//! Static path → page bindings registered once at startup. The guard reads
//! `requires_auth` and the auth-entry set; the server mounts one page route
//! per descriptor.

pub mod guard;
pub mod navigator;

pub const HOME: &str = "home";
pub const LOGIN: &str = "login";
pub const SIGNUP: &str = "signup";
pub const CHECK_EMAIL: &str = "check-email";
pub const EMAIL_CONFIRMED: &str = "email-confirmed";
pub const PASSWORD_RESET: &str = "password-reset";
pub const UPDATE_PASSWORD: &str = "update-password";
pub const PROFILE: &str = "profile";
pub const PROJECTS: &str = "projects";
pub const IDEAS: &str = "ideas";

/// Pages meant only for signed-out visitors.
pub const AUTH_ENTRY_ROUTES: &[&str] = &[LOGIN, SIGNUP, CHECK_EMAIL, PASSWORD_RESET, UPDATE_PASSWORD];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub path: &'static str,
    pub name: &'static str,
    pub component: &'static str,
    pub requires_auth: bool,
}

impl RouteDescriptor {
    const fn public(path: &'static str, name: &'static str, component: &'static str) -> Self {
        Self { path, name, component, requires_auth: false }
    }

    const fn protected(path: &'static str, name: &'static str, component: &'static str) -> Self {
        Self { path, name, component, requires_auth: true }
    }

    #[must_use]
    pub fn is_auth_entry(&self) -> bool {
        AUTH_ENTRY_ROUTES.contains(&self.name)
    }
}

pub const ROUTES: &[RouteDescriptor] = &[
    RouteDescriptor::public("/", HOME, "HomePage"),
    RouteDescriptor::public("/login", LOGIN, "LoginView"),
    RouteDescriptor::public("/signup", SIGNUP, "SignupView"),
    RouteDescriptor::public("/check-email", CHECK_EMAIL, "CheckEmailView"),
    RouteDescriptor::public("/email-confirmed", EMAIL_CONFIRMED, "EmailConfirmedView"),
    RouteDescriptor::public("/password-reset", PASSWORD_RESET, "PasswordResetView"),
    RouteDescriptor::public("/update-password", UPDATE_PASSWORD, "UpdatePasswordView"),
    RouteDescriptor::protected("/profile", PROFILE, "ProfileView"),
    RouteDescriptor::protected("/projects", PROJECTS, "ProjectsView"),
    RouteDescriptor::protected("/ideas", IDEAS, "IdeasView"),
];

/// Immutable route registry. First match wins on duplicate paths or names.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    #[must_use]
    pub fn new(routes: Vec<RouteDescriptor>) -> Self {
        Self { routes }
    }

    /// The application's route table.
    #[must_use]
    pub fn canonical() -> Self {
        Self::new(ROUTES.to_vec())
    }

    #[must_use]
    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    /// Match a full path (query and fragment ignored, trailing slash tolerated).
    #[must_use]
    pub fn by_path(&self, full_path: &str) -> Option<&RouteDescriptor> {
        let path = path_of(full_path);
        self.routes.iter().find(|route| route.path == path)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|route| route.name == name)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Path component of `full_path`: no query, no fragment, no trailing slash.
#[must_use]
pub fn path_of(full_path: &str) -> &str {
    let end = full_path.find(['?', '#']).unwrap_or(full_path.len());
    let path = &full_path[..end];
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Query component of `full_path` without the leading `?`.
#[must_use]
pub fn query_of(full_path: &str) -> &str {
    let without_fragment = full_path.split_once('#').map_or(full_path, |(head, _)| head);
    without_fragment
        .split_once('?')
        .map_or("", |(_, query)| query)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
