//! flowdeck — SPA shell server, auth-route guard, and flow-API proxy.
//!
//! SYSTEM CONTEXT
//! ==============
//! `auth` mirrors the identity provider's session, `router` decides whether a
//! navigation may proceed, `flow` talks to the remote flow-execution API, and
//! `routes` binds all of it to an Axum router.
//!
//! The server guards pages per request through `auth::gotrue::TokenSession`.
//! `auth::SessionStore` and `router::navigator::Navigator` are the client-side
//! half: an in-process session mirror and navigation loop for a shell that
//! holds the provider connection itself.

pub mod auth;
pub mod config;
pub mod flow;
pub mod router;
pub mod routes;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
