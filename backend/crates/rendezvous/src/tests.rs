//! Unit tests for the rendezvous crate

#[cfg(test)]
mod support {
    use crate::application::config::RendezvousConfig;
    use crate::infra::memory::MemoryRendezvousRepository;
    use platform::clock::{ManualClock, SharedClock};
    use std::sync::Arc;

    pub const START_MS: i64 = 1_700_000_000_000;

    pub struct Harness {
        pub repo: Arc<MemoryRendezvousRepository>,
        pub config: Arc<RendezvousConfig>,
        pub clock: Arc<ManualClock>,
    }

    impl Harness {
        pub fn new() -> Self {
            Self {
                repo: Arc::new(MemoryRendezvousRepository::new()),
                config: Arc::new(RendezvousConfig::default()),
                clock: Arc::new(ManualClock::at_ms(START_MS)),
            }
        }

        pub fn shared_clock(&self) -> SharedClock {
            self.clock.clone()
        }
    }
}

#[cfg(test)]
mod anonymous_pairing_tests {
    use super::support::*;
    use crate::application::lookup_code::LookupCodeUseCase;
    use crate::application::release_slot::ReleaseSlotUseCase;
    use crate::application::request_slot::RequestSlotUseCase;
    use crate::domain::repository::CodeRegistry;
    use crate::domain::value_objects::SlotStatus;
    use crate::error::RendezvousError;
    use std::collections::HashMap;
    use std::time::Duration;

    fn request_slot(h: &Harness) -> RequestSlotUseCase<crate::MemoryRendezvousRepository> {
        RequestSlotUseCase::new(h.repo.clone(), h.config.clone(), h.shared_clock())
    }

    #[tokio::test]
    async fn test_second_caller_joins_third_opens_new() {
        let h = Harness::new();
        let use_case = request_slot(&h);

        let first = use_case.execute().await.unwrap();
        assert_eq!(first.status, SlotStatus::Waiting);
        assert_eq!(first.expires_at_ms, START_MS + 120_000);
        assert!(h.config.generator().unwrap().matches(&first.code));

        h.clock.advance(Duration::from_secs(5));
        let second = use_case.execute().await.unwrap();
        assert_eq!(second.status, SlotStatus::Paired);
        assert_eq!(second.code, first.code);

        let third = use_case.execute().await.unwrap();
        assert_eq!(third.status, SlotStatus::Waiting);
        assert_ne!(third.code, first.code);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_two_concurrent_callers_meet_on_one_code() {
        let h = Harness::new();

        let spawn = || {
            let use_case = request_slot(&h);
            tokio::spawn(async move { use_case.execute().await })
        };
        let a = spawn();
        let b = spawn();
        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();

        assert_eq!(a.code, b.code);
        let mut statuses = [a.status, b.status];
        statuses.sort_by_key(|s| s.as_str());
        assert_eq!(statuses, [SlotStatus::Paired, SlotStatus::Waiting]);
        assert_eq!(h.repo.count().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_concurrent_callers_pair_off() {
        let h = Harness::new();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let use_case = request_slot(&h);
                tokio::spawn(async move { use_case.execute().await })
            })
            .collect();

        let mut by_code: HashMap<String, Vec<SlotStatus>> = HashMap::new();
        for handle in handles {
            let output = handle.await.unwrap().unwrap();
            by_code
                .entry(output.code.into_inner())
                .or_default()
                .push(output.status);
        }

        assert_eq!(by_code.len(), 10);
        for statuses in by_code.values() {
            assert_eq!(statuses.len(), 2);
            assert!(statuses.contains(&SlotStatus::Waiting));
            assert!(statuses.contains(&SlotStatus::Paired));
        }
    }

    #[tokio::test]
    async fn test_expired_waiting_slot_is_not_joined() {
        let h = Harness::new();
        let use_case = request_slot(&h);
        let lookup = LookupCodeUseCase::new(h.repo.clone(), h.shared_clock());

        let stale = use_case.execute().await.unwrap();
        h.clock.advance(Duration::from_secs(120));

        let fresh = use_case.execute().await.unwrap();
        assert_eq!(fresh.status, SlotStatus::Waiting);
        assert_ne!(fresh.code, stale.code);
        assert!(matches!(
            lookup.execute(stale.code.as_str()).await,
            Err(RendezvousError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_paired_slot_stays_readable_until_expiry() {
        let h = Harness::new();
        let use_case = request_slot(&h);
        let lookup = LookupCodeUseCase::new(h.repo.clone(), h.shared_clock());

        let first = use_case.execute().await.unwrap();
        use_case.execute().await.unwrap();

        let entry = lookup.execute(first.code.as_str()).await.unwrap();
        assert_eq!(entry.slot_status(), Some(SlotStatus::Paired));

        h.clock.advance(Duration::from_secs(121));
        assert!(lookup.execute(first.code.as_str()).await.is_err());
    }

    #[tokio::test]
    async fn test_release_slot() {
        let h = Harness::new();
        let use_case = request_slot(&h);
        let release = ReleaseSlotUseCase::new(h.repo.clone(), h.shared_clock());

        let waiting = use_case.execute().await.unwrap();
        release.execute(waiting.code.as_str()).await.unwrap();
        assert!(matches!(
            release.execute(waiting.code.as_str()).await,
            Err(RendezvousError::NotFound)
        ));

        // a released slot is not joined by the next caller
        let next = use_case.execute().await.unwrap();
        assert_eq!(next.status, SlotStatus::Waiting);

        // a paired slot cannot be released
        use_case.execute().await.unwrap();
        assert!(matches!(
            release.execute(next.code.as_str()).await,
            Err(RendezvousError::NotFound)
        ));
    }
}

#[cfg(test)]
mod directed_pairing_tests {
    use super::support::*;
    use crate::application::PairInput;
    use crate::application::accept_request::AcceptRequestUseCase;
    use crate::application::cancel_request::CancelRequestUseCase;
    use crate::application::lookup_code::LookupCodeUseCase;
    use crate::application::register_identity::RegisterIdentityUseCase;
    use crate::application::send_request::SendRequestUseCase;
    use crate::domain::entities::EntryKind;
    use crate::domain::repository::CodeRegistry;
    use crate::error::RendezvousError;
    use crate::infra::memory::MemoryRendezvousRepository;
    use std::time::Duration;

    const THREE_DAYS_MS: i64 = 3 * 24 * 60 * 60 * 1000;

    async fn register(h: &Harness, names: &[&str]) {
        let use_case = RegisterIdentityUseCase::new(h.repo.clone(), h.shared_clock());
        for name in names {
            use_case.execute(name).await.unwrap();
        }
    }

    fn send(h: &Harness) -> SendRequestUseCase<MemoryRendezvousRepository> {
        SendRequestUseCase::new(h.repo.clone(), h.config.clone(), h.shared_clock())
    }

    #[tokio::test]
    async fn test_request_accept_lookup() {
        let h = Harness::new();
        register(&h, &["alice", "bob"]).await;

        let sent = send(&h)
            .execute(PairInput::new("alice", "bob"))
            .await
            .unwrap();
        assert!(sent.created);
        assert_eq!(sent.expires_at_ms, START_MS + THREE_DAYS_MS);

        h.clock.advance(Duration::from_secs(60));
        let accepted = AcceptRequestUseCase::new(h.repo.clone(), h.shared_clock())
            .execute(PairInput::new("alice", "bob"))
            .await
            .unwrap();
        assert_eq!(accepted.code, sent.code);
        assert_eq!(accepted.expires_at_ms, sent.expires_at_ms);

        let entry = LookupCodeUseCase::new(h.repo.clone(), h.shared_clock())
            .execute(sent.code.as_str())
            .await
            .unwrap();
        match entry.kind {
            EntryKind::Directed {
                sender,
                receiver,
                accepted,
            } => {
                assert_eq!(sender.as_str(), "alice");
                assert_eq!(receiver.as_str(), "bob");
                assert!(accepted);
            }
            other => panic!("expected a directed entry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_is_idempotent_and_symmetric() {
        let h = Harness::new();
        register(&h, &["alice", "bob"]).await;
        let use_case = send(&h);

        let first = use_case
            .execute(PairInput::new("alice", "bob"))
            .await
            .unwrap();
        h.clock.advance(Duration::from_secs(10));
        let again = use_case
            .execute(PairInput::new("alice", "bob"))
            .await
            .unwrap();
        let reversed = use_case
            .execute(PairInput::new("bob", "alice"))
            .await
            .unwrap();

        assert_eq!(again.code, first.code);
        assert_eq!(reversed.code, first.code);
        assert!(!again.created);
        // existing entry is returned untouched
        assert_eq!(again.expires_at_ms, first.expires_at_ms);
        assert_eq!(h.repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_send_requires_registered_distinct_identities() {
        let h = Harness::new();
        register(&h, &["alice"]).await;
        let use_case = send(&h);

        match use_case.execute(PairInput::new("alice", "carol")).await {
            Err(RendezvousError::ParticipantUnknown(name)) => assert_eq!(name, "carol"),
            other => panic!("expected ParticipantUnknown, got {other:?}"),
        }
        assert!(matches!(
            use_case.execute(PairInput::new("alice", " alice ")).await,
            Err(RendezvousError::SelfRequest)
        ));
        assert!(matches!(
            use_case.execute(PairInput::new("alice", "")).await,
            Err(RendezvousError::InvalidIdentity(_))
        ));
        assert_eq!(h.repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_accept_without_request_is_not_found() {
        let h = Harness::new();
        register(&h, &["alice", "bob"]).await;

        let result = AcceptRequestUseCase::new(h.repo.clone(), h.shared_clock())
            .execute(PairInput::new("alice", "bob"))
            .await;
        assert!(matches!(result, Err(RendezvousError::NotFound)));
    }

    #[tokio::test]
    async fn test_cancel() {
        let h = Harness::new();
        register(&h, &["alice", "bob", "carol"]).await;
        let cancel = CancelRequestUseCase::new(h.repo.clone(), h.shared_clock());
        let lookup = LookupCodeUseCase::new(h.repo.clone(), h.shared_clock());

        let kept = send(&h)
            .execute(PairInput::new("alice", "carol"))
            .await
            .unwrap();
        let sent = send(&h)
            .execute(PairInput::new("alice", "bob"))
            .await
            .unwrap();

        cancel
            .execute(PairInput::new("bob", "alice"))
            .await
            .unwrap();
        assert!(matches!(
            lookup.execute(sent.code.as_str()).await,
            Err(RendezvousError::NotFound)
        ));

        // nothing left to cancel, and nothing else touched
        assert!(matches!(
            cancel.execute(PairInput::new("alice", "bob")).await,
            Err(RendezvousError::NotFound)
        ));
        assert!(lookup.execute(kept.code.as_str()).await.is_ok());
        assert_eq!(h.repo.count().await.unwrap(), 1);

        // a new request for the cancelled pair gets a fresh entry
        let renewed = send(&h)
            .execute(PairInput::new("alice", "bob"))
            .await
            .unwrap();
        assert!(renewed.created);
    }

    #[tokio::test]
    async fn test_expired_request_is_not_found() {
        let h = Harness::new();
        register(&h, &["alice", "bob"]).await;

        let sent = send(&h)
            .execute(PairInput::new("alice", "bob"))
            .await
            .unwrap();
        h.clock.advance(Duration::from_millis(THREE_DAYS_MS as u64));

        let accept = AcceptRequestUseCase::new(h.repo.clone(), h.shared_clock());
        assert!(matches!(
            accept.execute(PairInput::new("alice", "bob")).await,
            Err(RendezvousError::NotFound)
        ));
        let lookup = LookupCodeUseCase::new(h.repo.clone(), h.shared_clock());
        assert!(lookup.execute(sent.code.as_str()).await.is_err());
    }

    #[tokio::test]
    async fn test_register_identity() {
        let h = Harness::new();
        let use_case = RegisterIdentityUseCase::new(h.repo.clone(), h.shared_clock());

        let identity = use_case.execute("  alice ").await.unwrap();
        assert_eq!(identity.as_str(), "alice");

        assert!(matches!(
            use_case.execute("alice").await,
            Err(RendezvousError::AlreadyExists)
        ));
        assert!(matches!(
            use_case.execute("al ice").await,
            Err(RendezvousError::InvalidIdentity(_))
        ));
    }
}

#[cfg(test)]
mod reap_tests {
    use super::support::*;
    use crate::application::PairInput;
    use crate::application::lookup_code::LookupCodeUseCase;
    use crate::application::reap::ReapExpiredUseCase;
    use crate::application::register_identity::RegisterIdentityUseCase;
    use crate::application::request_slot::RequestSlotUseCase;
    use crate::application::send_request::SendRequestUseCase;
    use crate::domain::repository::CodeRegistry;
    use crate::error::RendezvousError;
    use std::time::Duration;

    #[tokio::test]
    async fn test_expired_entries_are_hidden_then_swept() {
        let h = Harness::new();
        let slots = RequestSlotUseCase::new(h.repo.clone(), h.config.clone(), h.shared_clock());
        let lookup = LookupCodeUseCase::new(h.repo.clone(), h.shared_clock());
        let reaper = ReapExpiredUseCase::new(h.repo.clone(), h.shared_clock());

        let a = slots.execute().await.unwrap();
        slots.execute().await.unwrap();
        let b = slots.execute().await.unwrap();
        assert_ne!(a.code, b.code);
        assert_eq!(h.repo.count().await.unwrap(), 2);

        h.clock.advance(Duration::from_secs(121));
        assert!(matches!(
            lookup.execute(a.code.as_str()).await,
            Err(RendezvousError::NotFound)
        ));

        // b was never touched, so only the sweep removes it
        assert_eq!(h.repo.count().await.unwrap(), 1);
        assert_eq!(reaper.execute().await.unwrap(), 1);
        assert_eq!(h.repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_directed_requests() {
        let h = Harness::new();
        let register = RegisterIdentityUseCase::new(h.repo.clone(), h.shared_clock());
        register.execute("alice").await.unwrap();
        register.execute("bob").await.unwrap();

        SendRequestUseCase::new(h.repo.clone(), h.config.clone(), h.shared_clock())
            .execute(PairInput::new("alice", "bob"))
            .await
            .unwrap();
        RequestSlotUseCase::new(h.repo.clone(), h.config.clone(), h.shared_clock())
            .execute()
            .await
            .unwrap();

        h.clock.advance(Duration::from_secs(3600));
        let reaper = ReapExpiredUseCase::new(h.repo.clone(), h.shared_clock());
        assert_eq!(reaper.execute().await.unwrap(), 1);
        assert_eq!(h.repo.count().await.unwrap(), 1);
    }
}

#[cfg(test)]
mod error_tests {
    use crate::error::RendezvousError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use kernel::error::app_error::AppError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (RendezvousError::NotFound, StatusCode::NOT_FOUND),
            (RendezvousError::AlreadyExists, StatusCode::CONFLICT),
            (
                RendezvousError::ParticipantUnknown("carol".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (RendezvousError::SelfRequest, StatusCode::UNPROCESSABLE_ENTITY),
            (
                RendezvousError::InvalidIdentity("empty".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                RendezvousError::CodeSpaceExhausted { attempts: 8 },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                RendezvousError::DuplicateCode,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RendezvousError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "{err:?}");
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_app_error_carries_action() {
        let app: AppError = RendezvousError::ParticipantUnknown("carol".to_string()).into();
        assert!(app.action().is_some());
        assert!(app.message().contains("carol"));

        let app: AppError = RendezvousError::NotFound.into();
        assert_eq!(app.status_code(), 404);
    }

    #[test]
    fn test_database_error_uses_kernel_mapping() {
        let app: AppError = RendezvousError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(app.is_server_error());
    }
}

#[cfg(test)]
mod dto_tests {
    use crate::domain::entities::Entry;
    use crate::domain::value_objects::{Code, Identity, SlotStatus};
    use crate::presentation::dto::{LookupResponse, SlotResponse};
    use serde_json::json;

    #[test]
    fn test_slot_response_is_camel_case() {
        let response = SlotResponse {
            code: Code::new("X1Y2Z3"),
            status: SlotStatus::Waiting,
            expires_at_ms: 42,
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"code": "X1Y2Z3", "status": "waiting", "expiresAtMs": 42})
        );
    }

    #[test]
    fn test_lookup_response_is_tagged() {
        let mut anonymous = Entry::anonymous(Code::new("X1Y2Z3"), 10, 100);
        anonymous.claim().unwrap();
        assert_eq!(
            serde_json::to_value(LookupResponse::from(anonymous)).unwrap(),
            json!({
                "kind": "anonymous",
                "code": "X1Y2Z3",
                "status": "paired",
                "createdAtMs": 10,
                "expiresAtMs": 110
            })
        );

        let directed = Entry::directed(
            Code::new("K1K1K1"),
            Identity::new("alice").unwrap(),
            Identity::new("bob").unwrap(),
            0,
            5,
        );
        assert_eq!(
            serde_json::to_value(LookupResponse::from(directed)).unwrap(),
            json!({
                "kind": "directed",
                "code": "K1K1K1",
                "sender": "alice",
                "receiver": "bob",
                "accepted": false,
                "createdAtMs": 0,
                "expiresAtMs": 5
            })
        );
    }
}

#[cfg(test)]
mod router_tests {
    use super::support::START_MS;
    use crate::application::config::RendezvousConfig;
    use crate::domain::repository::CodeRegistry;
    use crate::infra::memory::MemoryRendezvousRepository;
    use crate::presentation::router::rendezvous_router;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use platform::clock::ManualClock;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Router, MemoryRendezvousRepository) {
        let repo = MemoryRendezvousRepository::new();
        let router = rendezvous_router(
            repo.clone(),
            RendezvousConfig::default(),
            Arc::new(ManualClock::at_ms(START_MS)),
        );
        (router, repo)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_slot_flow() {
        let (app, _) = app();

        let (status, first) = call(&app, "POST", "/slots", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["status"], "waiting");
        assert_eq!(first["expiresAtMs"], START_MS + 120_000);

        let (_, second) = call(&app, "POST", "/slots", None).await;
        assert_eq!(second["status"], "paired");
        assert_eq!(second["code"], first["code"]);

        let code = first["code"].as_str().unwrap();
        let (status, entry) = call(&app, "GET", &format!("/codes/{code}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entry["kind"], "anonymous");
        assert_eq!(entry["status"], "paired");

        let (status, _) = call(&app, "DELETE", &format!("/slots/{code}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_release_waiting_slot() {
        let (app, repo) = app();

        let (_, slot) = call(&app, "POST", "/slots", None).await;
        let code = slot["code"].as_str().unwrap();

        let (status, body) = call(&app, "DELETE", &format!("/slots/{code}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_directed_flow() {
        let (app, _) = app();

        for name in ["alice", "bob"] {
            let (status, body) =
                call(&app, "POST", "/identities", Some(json!({"name": name}))).await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body, json!({}));
        }

        let pair = json!({"sender": "alice", "receiver": "bob"});
        let (status, sent) = call(&app, "POST", "/requests", Some(pair.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, accepted) = call(&app, "POST", "/requests/accept", Some(pair.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(accepted["code"], sent["code"]);
        assert_eq!(accepted["expiresAtMs"], sent["expiresAtMs"]);

        let code = sent["code"].as_str().unwrap();
        let (_, entry) = call(&app, "GET", &format!("/codes/{code}"), None).await;
        assert_eq!(entry["kind"], "directed");
        assert_eq!(entry["sender"], "alice");
        assert_eq!(entry["receiver"], "bob");
        assert_eq!(entry["accepted"], true);

        let (status, body) = call(&app, "POST", "/requests/cancel", Some(pair.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));

        let (status, problem) = call(&app, "GET", &format!("/codes/{code}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(problem["status"], 404);

        let (status, _) = call(&app, "POST", "/requests/cancel", Some(pair)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_error_responses() {
        let (app, _) = app();

        let (status, _) = call(&app, "POST", "/identities", Some(json!({"name": "alice"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, problem) =
            call(&app, "POST", "/identities", Some(json!({"name": "alice"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(problem["status"], 409);

        let (status, _) = call(&app, "POST", "/identities", Some(json!({"name": " "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, problem) = call(
            &app,
            "POST",
            "/requests",
            Some(json!({"sender": "alice", "receiver": "mallory"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(problem["detail"].as_str().unwrap().contains("mallory"));

        let (status, _) = call(&app, "GET", "/codes/NOPE00", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_payload() {
        let (app, repo) = app();

        let (status, body) = call(&app, "GET", "/payload", None).await;
        assert_eq!(status, StatusCode::OK);
        let payload = body["payload"].as_str().unwrap();
        assert_eq!(payload.len(), 8);
        assert!(payload.chars().all(|c| c.is_ascii_alphanumeric()));

        // payloads are not registered
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_payload_route() {
        let (app, repo) = app();

        let (status, body) = call(&app, "GET", "/getPayload", None).await;
        assert_eq!(status, StatusCode::OK);
        let payload = body["payload"].as_str().unwrap();
        assert_eq!(payload.len(), 8);
        assert!(payload.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(repo.count().await.unwrap(), 0);

        let (status, _) = call(&app, "POST", "/getPayload", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
