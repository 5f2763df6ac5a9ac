use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use httpmock::prelude::*;
use parking_lot::Mutex;
use songdap_http::{
    ApiRequest, AuthRefreshGate, ClientOptions, ExpiryReason, GateOptions, HttpError,
    SessionObserver, SessionState, SessionStatus, StatusCode, TracedClient,
};

#[derive(Default)]
struct Recorder(Mutex<Vec<ExpiryReason>>);

impl SessionObserver for Recorder {
    fn on_session_expired(&self, reason: ExpiryReason) {
        self.0.lock().push(reason);
    }
}

fn gate_for(
    server: &MockServer,
    timeout: Duration,
    observer: Arc<dyn SessionObserver>,
) -> AuthRefreshGate {
    let client = TracedClient::from_options(&ClientOptions {
        base_url: server.base_url(),
        timeout,
        cookies: vec!["refresh=r-1; Path=/".into()],
        user_agent: Some("songdap-tests".into()),
    })
    .expect("client");
    AuthRefreshGate::new(Arc::new(client), observer, GateOptions::default())
}

#[tokio::test]
async fn expired_access_cookie_is_renewed_and_request_replayed() {
    let server = MockServer::start();

    let reissue = server.mock(|when, then| {
        when.method(POST)
            .path("/auth/reissue")
            .cookie("refresh", "r-1");
        then.status(200)
            .header("Set-Cookie", "access=new; Path=/");
    });
    let rejected = server.mock(|when, then| {
        when.method(GET).path("/albums/1").cookie_missing("access");
        then.status(401);
    });
    let accepted = server.mock(|when, then| {
        when.method(GET).path("/albums/1").cookie("access", "new");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"id":1,"title":"Spring"}"#);
    });

    let recorder = Arc::new(Recorder::default());
    let gate = gate_for(&server, Duration::from_secs(5), recorder.clone());

    let body: serde_json::Value = gate
        .execute_json(ApiRequest::get("/albums/1"))
        .await
        .expect("replayed request succeeds");

    assert_eq!(body["title"], "Spring");
    reissue.assert_hits(1);
    rejected.assert_hits(1);
    accepted.assert_hits(1);
    assert!(recorder.0.lock().is_empty());
}

#[tokio::test]
async fn concurrent_expiry_triggers_one_reissue() {
    let server = MockServer::start();

    let reissue = server.mock(|when, then| {
        when.method(POST).path("/auth/reissue");
        then.status(200)
            .header("Set-Cookie", "access=new; Path=/")
            .delay(Duration::from_millis(500));
    });
    server.mock(|when, then| {
        when.method(GET).path_matches(r"^/albums/\d+$").cookie_missing("access");
        then.status(401);
    });
    let accepted = server.mock(|when, then| {
        when.method(GET).path_matches(r"^/albums/\d+$").cookie("access", "new");
        then.status(200).body("{}");
    });

    let gate = gate_for(&server, Duration::from_secs(5), Arc::new(Recorder::default()));

    let results = join_all((1..=3).map(|i| gate.execute(ApiRequest::get(format!("/albums/{i}"))))).await;

    for r in results {
        assert!(r.is_ok(), "unexpected {r:?}");
    }
    reissue.assert_hits(1);
    accepted.assert_hits(3);
}

#[tokio::test]
async fn rejected_reissue_logs_out_and_expires_the_session_once() {
    let server = MockServer::start();

    let reissue = server.mock(|when, then| {
        when.method(POST).path("/auth/reissue");
        then.status(401);
    });
    let logout = server.mock(|when, then| {
        when.method(POST).path("/auth/logout");
        then.status(500);
    });
    let album = server.mock(|when, then| {
        when.method(DELETE).path("/albums/7");
        then.status(401);
    });

    let state = Arc::new(SessionState::new());
    let gate = gate_for(&server, Duration::from_secs(5), state.clone());

    let err = gate
        .execute(ApiRequest::delete("/albums/7"))
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::SessionExpired));
    reissue.assert_hits(1);
    logout.assert_hits(1);
    album.assert_hits(1);
    assert_eq!(
        state.status(),
        SessionStatus::Expired(ExpiryReason::RefreshFailed)
    );
}

#[tokio::test]
async fn timeout_is_reported_without_touching_the_session() {
    let server = MockServer::start();

    let reissue = server.mock(|when, then| {
        when.method(POST).path("/auth/reissue");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(GET).path("/albums");
        then.status(200).delay(Duration::from_secs(2));
    });

    let recorder = Arc::new(Recorder::default());
    let gate = gate_for(&server, Duration::from_millis(200), recorder.clone());

    let err = gate.execute(ApiRequest::get("/albums")).await.unwrap_err();

    assert!(matches!(err, HttpError::Network { timeout: true, .. }));
    reissue.assert_hits(0);
    assert!(recorder.0.lock().is_empty());
}

#[tokio::test]
async fn explicit_logout_reports_backend_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/auth/logout");
        then.status(503);
    });

    let gate = gate_for(&server, Duration::from_secs(5), Arc::new(Recorder::default()));

    let err = gate.logout().await.unwrap_err();
    assert_eq!(err.status_code(), Some(StatusCode::SERVICE_UNAVAILABLE));
}
