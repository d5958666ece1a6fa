use super::*;
use crate::auth::test_helpers::{FakeProvider, session_for};
use crate::auth::{AuthError, AuthEvent, Session, SessionStore};
use crate::router::guard::{GuardState, redirect_back};

fn navigator(provider: &Arc<FakeProvider>) -> Navigator {
    Navigator::new(RouteTable::canonical(), Arc::clone(provider) as Arc<dyn SessionSource>)
}

#[tokio::test]
async fn allowed_navigation_commits_target() {
    let provider = Arc::new(FakeProvider::signed_out());
    let mut nav = navigator(&provider);

    let result = nav.navigate("/email-confirmed").await;

    assert_eq!(result.decision, Decision::Allow);
    assert_eq!(result.committed, "/email-confirmed");
    assert_eq!(nav.current(), Some("/email-confirmed"));
}

#[tokio::test]
async fn deep_link_round_trip_through_login() {
    let provider = Arc::new(FakeProvider::signed_out());
    let mut nav = navigator(&provider);

    let blocked = nav.navigate("/ideas?sort=new").await;
    assert_eq!(blocked.decision.state(), GuardState::RedirectToLogin);
    assert_eq!(blocked.committed, "/login?redirectTo=%2Fideas%3Fsort%3Dnew");

    provider.set_session(Some(session_for("u1")));
    let target = redirect_back(&blocked.committed);
    let resumed = nav.navigate(&target).await;

    assert_eq!(resumed.decision, Decision::Allow);
    assert_eq!(nav.current(), Some("/ideas?sort=new"));
}

#[tokio::test]
async fn signed_in_user_on_login_lands_home() {
    let provider = Arc::new(FakeProvider::with_session(session_for("u1")));
    let mut nav = navigator(&provider);

    let result = nav.navigate("/login").await;

    assert_eq!(result.decision.state(), GuardState::RedirectToHome);
    assert_eq!(result.committed, "/");
}

#[tokio::test]
async fn navigation_against_session_store_follows_events() {
    let provider = FakeProvider::signed_out();
    let store = Arc::new(SessionStore::new());
    store.listen(&provider);
    let mut nav = Navigator::new(RouteTable::canonical(), Arc::clone(&store) as Arc<dyn SessionSource>);

    assert_eq!(nav.navigate("/profile").await.decision.state(), GuardState::RedirectToLogin);

    provider.push(AuthEvent::SignedIn, Some(session_for("u1")));
    assert_eq!(nav.navigate("/profile").await.decision, Decision::Allow);

    provider.push(AuthEvent::SignedOut, None);
    assert_eq!(nav.navigate("/profile").await.decision.state(), GuardState::RedirectToLogin);
}

/// Alternates signed-in/signed-out on every query.
struct Flapping {
    calls: std::sync::atomic::AtomicUsize,
}

#[async_trait::async_trait]
impl SessionSource for Flapping {
    async fn session(&self) -> Result<Option<Session>, AuthError> {
        let n = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok((n % 2 == 1).then(|| session_for("u1")))
    }
}

#[tokio::test]
async fn at_most_one_redirect_hop_is_followed() {
    let source = Arc::new(Flapping { calls: std::sync::atomic::AtomicUsize::new(0) });
    let mut nav = Navigator::new(RouteTable::canonical(), Arc::clone(&source) as Arc<dyn SessionSource>);

    // /profile (out) → /login (in) would redirect home again; the hop limit stops at /login.
    let result = nav.navigate("/profile").await;

    assert_eq!(result.decision.state(), GuardState::RedirectToLogin);
    assert_eq!(result.committed, "/login?redirectTo=%2Fprofile");
    assert_eq!(nav.current(), Some("/login?redirectTo=%2Fprofile"));
    assert_eq!(source.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}
