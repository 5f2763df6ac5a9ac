use std::sync::Arc;
use std::time::Duration;

use albums::config::AlbumsConfig;
use albums::contract::model::{AlbumSort, RowAccess};
use albums::domain::error::DomainError;
use albums::domain::service::AlbumListService;
use albums::infra::HttpAlbumsClient;
use httpmock::prelude::*;
use paging::FetchOutcome;
use serde_json::json;
use songdap_http::{
    AuthRefreshGate, ClientOptions, ExpiryReason, GateOptions, SessionState, SessionStatus,
    TracedClient,
};

fn wire(server: &MockServer, options: GateOptions) -> (AlbumListService, Arc<SessionState>) {
    let client = TracedClient::from_options(&ClientOptions {
        base_url: server.base_url(),
        timeout: Duration::from_secs(5),
        ..ClientOptions::default()
    })
    .expect("client");
    let session = Arc::new(SessionState::new());
    let gate = Arc::new(AuthRefreshGate::new(
        Arc::new(client),
        session.clone(),
        options,
    ));
    let backend = Arc::new(HttpAlbumsClient::new(gate));
    (
        AlbumListService::new(backend, &AlbumsConfig::default()),
        session,
    )
}

fn listing(ids: &[u32], total_elements: u64, total_pages: u32) -> serde_json::Value {
    let content: Vec<_> = ids
        .iter()
        .map(|id| json!({ "id": id, "title": format!("album {id}") }))
        .collect();
    json!({
        "content": content,
        "totalElements": total_elements,
        "totalPages": total_pages,
    })
}

#[tokio::test]
async fn list_sends_zero_based_page_and_marks_private_rows() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/albums")
            .query_param("sort", "LATEST")
            .query_param("page", "0")
            .query_param("size", "4")
            .header_exists("traceparent");
        then.status(200).json_body(listing(&[1, 2, 3], 3, 1));
    });
    server.mock(|when, then| {
        when.method(GET).path("/albums/1");
        then.status(200).json_body(json!({
            "title": "Spring mix",
            "ownerNickname": "mina",
            "songCount": 12,
            "isPublic": true,
            "createdAt": "2025-04-01T09:30:00Z"
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/albums/2");
        then.status(403);
    });
    server.mock(|when, then| {
        when.method(GET).path("/albums/3");
        then.status(500).body("detail backend down");
    });

    let (svc, session) = wire(
        &server,
        GateOptions {
            forbidden_signals_session_expiry: false,
            ..GateOptions::default()
        },
    );

    assert_eq!(
        svc.refresh().await.unwrap(),
        FetchOutcome::Applied { page: 1 }
    );

    list.assert();
    let rows = svc.view().rows;
    assert_eq!(rows.len(), 3);

    let detail = rows[0].detail.as_ref().expect("enriched");
    assert_eq!(detail.owner_nickname.as_deref(), Some("mina"));
    assert_eq!(detail.song_count, Some(12));
    assert!(detail.created_at.is_some());
    assert_eq!(rows[0].title(), Some("Spring mix"));

    assert_eq!(rows[1].access, RowAccess::PrivateToOther);
    assert_eq!(rows[2].access, RowAccess::Unknown);
    assert_eq!(rows[2].title(), Some("album 3"));
    assert_eq!(session.status(), SessionStatus::Active);
}

#[tokio::test]
async fn forbidden_detail_still_raises_session_signal_by_default() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/albums");
        then.status(200).json_body(listing(&[2], 1, 1));
    });
    server.mock(|when, then| {
        when.method(GET).path("/albums/2");
        then.status(403);
    });

    let (svc, session) = wire(&server, GateOptions::default());
    svc.refresh().await.unwrap();

    assert!(svc.view().rows[0].is_private());
    assert_eq!(
        session.status(),
        SessionStatus::Expired(ExpiryReason::Forbidden)
    );
}

#[tokio::test]
async fn expired_access_token_is_refreshed_transparently() {
    let server = MockServer::start();
    let reissue = server.mock(|when, then| {
        when.method(POST).path("/auth/reissue");
        then.status(200).header("Set-Cookie", "access=fresh; Path=/");
    });
    let rejected = server.mock(|when, then| {
        when.method(GET).path("/albums").cookie_missing("access");
        then.status(401);
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/albums")
            .query_param("sort", "POPULAR")
            .cookie("access", "fresh");
        then.status(200).json_body(listing(&[4, 5], 2, 1));
    });
    server.mock(|when, then| {
        when.method(GET).path_matches(r"^/albums/\d+$");
        then.status(200).json_body(json!({}));
    });

    let (svc, session) = wire(&server, GateOptions::default());
    svc.set_sort(AlbumSort::Popular).await.unwrap();

    reissue.assert_hits(1);
    rejected.assert_hits(1);
    let view = svc.view();
    assert_eq!(view.sort, AlbumSort::Popular);
    assert_eq!(view.rows.len(), 2);
    assert_eq!(session.status(), SessionStatus::Active);
}

#[tokio::test]
async fn failed_refresh_surfaces_session_expired() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/albums");
        then.status(401);
    });
    server.mock(|when, then| {
        when.method(POST).path("/auth/reissue");
        then.status(401);
    });
    let logout = server.mock(|when, then| {
        when.method(POST).path("/auth/logout");
        then.status(200);
    });

    let (svc, session) = wire(&server, GateOptions::default());
    let err = svc.refresh().await.unwrap_err();

    assert_eq!(err, DomainError::SessionExpired);
    logout.assert_hits(1);
    assert_eq!(
        session.status(),
        SessionStatus::Expired(ExpiryReason::RefreshFailed)
    );
    let view = svc.view();
    assert!(view.rows.is_empty());
    assert_eq!(view.total_pages, 0);
}

#[tokio::test]
async fn deleting_the_only_row_on_the_last_page_steps_back() {
    let server = MockServer::start();
    let mut last_page = server.mock(|when, then| {
        when.method(GET).path("/albums").query_param("page", "2");
        then.status(200).json_body(listing(&[9], 9, 3));
    });
    server.mock(|when, then| {
        when.method(GET).path_matches(r"^/albums/\d+$");
        then.status(200).json_body(json!({}));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/albums/9");
        then.status(204);
    });

    let (svc, _) = wire(&server, GateOptions::default());
    svc.set_page(3).await.unwrap();
    assert_eq!(svc.view().rows.len(), 1);

    last_page.delete();
    let emptied = server.mock(|when, then| {
        when.method(GET).path("/albums").query_param("page", "2");
        then.status(200).json_body(listing(&[], 8, 2));
    });
    let previous = server.mock(|when, then| {
        when.method(GET).path("/albums").query_param("page", "1");
        then.status(200).json_body(listing(&[5, 6, 7, 8], 8, 2));
    });

    let outcome = svc
        .delete_album(&albums::contract::model::AlbumId::new("9"))
        .await
        .unwrap();

    assert_eq!(outcome, FetchOutcome::Applied { page: 2 });
    delete.assert();
    emptied.assert();
    previous.assert();
    let view = svc.view();
    assert_eq!(view.current_page, 2);
    assert_eq!(view.rows.len(), 4);
    assert_eq!(view.total_elements, 8);
}

#[tokio::test]
async fn missing_album_on_delete_is_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(DELETE).path("/albums/404");
        then.status(404);
    });

    let (svc, _) = wire(&server, GateOptions::default());
    let err = svc
        .delete_album(&albums::contract::model::AlbumId::new("404"))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::AlbumNotFound { .. }));
}
