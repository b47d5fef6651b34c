//! End-to-end scenarios through the paste service.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use pastegate::core::ManualClock;
use pastegate::perms::memory::MemoryAccountService;
use pastegate::perms::{AnonymousPermissions, MemorySession, PASSPHRASES_KEY};
use pastegate::render::{Formatter, Language, LanguageRegistry, RENDER_FAILURE_PLACEHOLDER};
use pastegate::store::{GrantStore, MemoryGrantStore, MemoryPasteStore, SqliteGrantStore};
use pastegate::{
    Action, Collaborators, Expiration, ExpirationScheduler, MemoryExpirationScheduler, PasteDraft,
    PasteId, PasteService, Permission, Requester, ServiceConfig, ServiceError,
};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

#[derive(Default)]
struct CountingFormatter {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl CountingFormatter {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Formatter for CountingFormatter {
    async fn format(&self, body: &str, language: &Language) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("highlighter crashed");
        }
        Ok(format!("<pre class=\"{}\">{}</pre>", language.id, body))
    }
}

struct Harness {
    clock: Arc<ManualClock>,
    pastes: Arc<MemoryPasteStore>,
    accounts: MemoryAccountService,
    formatter: Arc<CountingFormatter>,
    expirations: Arc<MemoryExpirationScheduler>,
    service: PasteService,
}

fn harness_with(config: ServiceConfig, grants: Arc<dyn GrantStore>) -> Harness {
    init_tracing();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let accounts = MemoryAccountService::new();
    let formatter = Arc::new(CountingFormatter::default());
    let expirations = Arc::new(MemoryExpirationScheduler::new(clock.clone()));
    let pastes = Arc::new(MemoryPasteStore::new(clock.clone()));
    let service = PasteService::new(
        config,
        Collaborators {
            pastes: pastes.clone(),
            grants,
            accounts: Arc::new(accounts.clone()),
            formatter: formatter.clone(),
            expirations: expirations.clone(),
            languages: Arc::new(LanguageRegistry::builtin()),
            clock: clock.clone(),
        },
    )
    .unwrap();
    Harness {
        clock,
        pastes,
        accounts,
        formatter,
        expirations,
        service,
    }
}

fn harness() -> Harness {
    harness_with(ServiceConfig::default(), Arc::new(MemoryGrantStore::new()))
}

const SOURCE: &str = "198.51.100.1";

// ─────────────────────────────────────────────────────────────────────────────
// Permission scopes
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_second_session_cannot_edit() {
    let h = harness();
    let mut creator = MemorySession::new();
    let mut other = MemorySession::new();

    let paste = h
        .service
        .create_paste(
            &mut Requester::anonymous(SOURCE, &mut creator),
            PasteDraft::new("hello"),
            None,
        )
        .await
        .unwrap();

    let mut req = Requester::anonymous(SOURCE, &mut creator);
    assert!(h.service.check(&mut req, &paste.id, Permission::ALL).await.unwrap());

    let mut req = Requester::anonymous("203.0.113.9", &mut other);
    assert!(!h.service.check(&mut req, &paste.id, Permission::EDIT).await.unwrap());
    let err = h
        .service
        .update_paste(&mut req, &paste.id, PasteDraft::new("defaced"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::AccessDenied {
            action: Action::Edit,
            ..
        }
    ));
    assert!(other.is_empty());

    // Public pastes stay readable.
    let mut req = Requester::anonymous("203.0.113.9", &mut other);
    let seen = h.service.view_paste(&mut req, &paste.id).await.unwrap();
    assert_eq!(seen.body_text(), "hello");
}

#[tokio::test]
async fn test_account_scope_takes_precedence() {
    let h = harness();
    let alice = h.accounts.add_account("u-1", "alice");
    let mut session = MemorySession::new();

    let paste = h
        .service
        .create_paste(
            &mut Requester::anonymous(SOURCE, &mut session),
            PasteDraft::new("anonymous first"),
            None,
        )
        .await
        .unwrap();
    assert!(AnonymousPermissions::load(&session).contains(&paste.id));

    // Logging in hides the anonymous rights carried by the same session.
    let mut req = Requester::account(alice.clone(), SOURCE, &mut session);
    assert!(!h.service.check(&mut req, &paste.id, Permission::EDIT).await.unwrap());
    assert!(h
        .service
        .delete_paste(&mut req, &paste.id)
        .await
        .unwrap_err()
        .is_access_denied());

    // Rights created while logged in land in the account, not the session.
    let mine = h
        .service
        .create_paste(&mut req, PasteDraft::new("as alice"), None)
        .await
        .unwrap();
    assert_eq!(h.accounts.rights(&alice, &mine.id), Permission::ALL);
    assert!(!AnonymousPermissions::load(&session).contains(&mine.id));
}

#[tokio::test]
async fn test_view_requires_bit_when_not_default_allowed() {
    let config = ServiceConfig {
        default_view_allowed: false,
        ..ServiceConfig::default()
    };
    let h = harness_with(config, Arc::new(MemoryGrantStore::new()));
    let mut owner = MemorySession::new();
    let mut stranger = MemorySession::new();

    let paste = h
        .service
        .create_paste(
            &mut Requester::anonymous(SOURCE, &mut owner),
            PasteDraft::new("private-ish"),
            None,
        )
        .await
        .unwrap();

    let mut req = Requester::anonymous(SOURCE, &mut stranger);
    let err = h.service.view_paste(&mut req, &paste.id).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::AccessDenied {
            action: Action::View,
            ..
        }
    ));

    let mut req = Requester::anonymous(SOURCE, &mut owner);
    assert!(h.service.view_paste(&mut req, &paste.id).await.is_ok());
}

#[tokio::test]
async fn test_disavow_drops_all_rights() {
    let h = harness();
    let mut session = MemorySession::new();
    let mut req = Requester::anonymous(SOURCE, &mut session);

    let paste = h
        .service
        .create_paste(&mut req, PasteDraft::new("mine for now"), None)
        .await
        .unwrap();
    h.service.disavow(&mut req, &paste.id).await.unwrap();
    assert!(!h.service.check(&mut req, &paste.id, Permission::VIEW).await.unwrap());
    assert!(h
        .service
        .disavow(&mut req, &paste.id)
        .await
        .unwrap_err()
        .is_access_denied());
    drop(req);
    assert!(!AnonymousPermissions::load(&session).contains(&paste.id));
}

// ─────────────────────────────────────────────────────────────────────────────
// Grants
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_grant_redeems_exactly_once() {
    let h = harness();
    let mut owner = MemorySession::new();
    let mut friend = MemorySession::new();
    let mut third = MemorySession::new();

    let mut req = Requester::anonymous(SOURCE, &mut owner);
    let paste = h
        .service
        .create_paste(&mut req, PasteDraft::new("shared"), None)
        .await
        .unwrap();
    let grant = h
        .service
        .create_grant(&mut req, &paste.id, Permission::EDIT)
        .await
        .unwrap();
    assert_eq!(
        h.service.outstanding_grants(&mut req, &paste.id).await.unwrap().len(),
        1
    );

    let mut req = Requester::anonymous(SOURCE, &mut friend);
    let redeemed = h.service.redeem_grant(&mut req, &grant.id).await.unwrap();
    assert_eq!(redeemed.permission, Permission::EDIT);
    assert!(h.service.check(&mut req, &paste.id, Permission::EDIT).await.unwrap());
    assert!(!h.service.check(&mut req, &paste.id, Permission::DELETE).await.unwrap());
    h.service
        .update_paste(&mut req, &paste.id, PasteDraft::new("shared, edited"))
        .await
        .unwrap();

    let mut req = Requester::anonymous(SOURCE, &mut third);
    let err = h.service.redeem_grant(&mut req, &grant.id).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::AccessDenied {
            action: Action::Redeem,
            paste_id: None
        }
    ));
    assert!(!h.service.check(&mut req, &paste.id, Permission::EDIT).await.unwrap());
}

#[tokio::test]
async fn test_grant_requires_grant_right() {
    let h = harness();
    let mut owner = MemorySession::new();
    let mut friend = MemorySession::new();

    let mut req = Requester::anonymous(SOURCE, &mut owner);
    let paste = h
        .service
        .create_paste(&mut req, PasteDraft::new("x"), None)
        .await
        .unwrap();
    let edit_only = h
        .service
        .create_grant(&mut req, &paste.id, Permission::EDIT)
        .await
        .unwrap();

    let mut req = Requester::anonymous(SOURCE, &mut friend);
    h.service.redeem_grant(&mut req, &edit_only.id).await.unwrap();
    let err = h
        .service
        .create_grant(&mut req, &paste.id, Permission::EDIT)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::AccessDenied {
            action: Action::Grant,
            ..
        }
    ));

    let mut req = Requester::anonymous(SOURCE, &mut owner);
    assert!(matches!(
        h.service
            .create_grant(&mut req, &paste.id, Permission::NONE)
            .await,
        Err(ServiceError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn test_expired_grant_is_denied() {
    let h = harness();
    let mut owner = MemorySession::new();
    let mut late = MemorySession::new();

    let mut req = Requester::anonymous(SOURCE, &mut owner);
    let paste = h
        .service
        .create_paste(&mut req, PasteDraft::new("x"), None)
        .await
        .unwrap();
    let grant = h
        .service
        .create_grant(&mut req, &paste.id, Permission::VIEW)
        .await
        .unwrap();

    h.clock.advance(Duration::from_secs(8 * 24 * 3600));
    let mut req = Requester::anonymous(SOURCE, &mut late);
    assert!(h
        .service
        .redeem_grant(&mut req, &grant.id)
        .await
        .unwrap_err()
        .is_access_denied());
    assert_eq!(h.service.purge_expired_grants().await.unwrap(), 0);
}

#[tokio::test]
async fn test_account_outage_keeps_grant_redeemable() {
    let h = harness();
    let bob = h.accounts.add_account("u-2", "bob");
    let mut owner = MemorySession::new();
    let mut bob_session = MemorySession::new();

    let mut req = Requester::anonymous(SOURCE, &mut owner);
    let paste = h
        .service
        .create_paste(&mut req, PasteDraft::new("x"), None)
        .await
        .unwrap();
    let grant = h
        .service
        .create_grant(&mut req, &paste.id, Permission::EDIT)
        .await
        .unwrap();

    h.accounts.set_unavailable(true);
    let mut req = Requester::account(bob.clone(), SOURCE, &mut bob_session);
    let err = h.service.redeem_grant(&mut req, &grant.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Backend(_)));

    h.accounts.set_unavailable(false);
    h.service.redeem_grant(&mut req, &grant.id).await.unwrap();
    assert_eq!(h.accounts.rights(&bob, &paste.id), Permission::EDIT);
}

#[tokio::test]
async fn test_account_outage_during_create_leaves_no_orphan() {
    let h = harness();
    let alice = h.accounts.add_account("u-1", "alice");
    let mut session = MemorySession::new();
    let mut req = Requester::account(alice.clone(), SOURCE, &mut session);

    h.accounts.set_unavailable(true);
    let err = h
        .service
        .create_paste(&mut req, PasteDraft::new("during outage"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Backend(_)));
    assert_eq!(h.pastes.len(), 0);

    // The retry creates a paste the creator owns instead of folding into a
    // paste nobody owns.
    h.accounts.set_unavailable(false);
    let paste = h
        .service
        .create_paste(&mut req, PasteDraft::new("during outage"), None)
        .await
        .unwrap();
    assert_eq!(h.accounts.rights(&alice, &paste.id), Permission::ALL);
    assert!(h.service.check(&mut req, &paste.id, Permission::EDIT).await.unwrap());
    assert_eq!(h.pastes.len(), 1);
}

#[tokio::test]
async fn test_sqlite_grant_store_backs_service() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteGrantStore::open(dir.path().join("grants.db")).unwrap();
    let h = harness_with(ServiceConfig::default(), Arc::new(store));
    let mut owner = MemorySession::new();
    let mut friend = MemorySession::new();

    let mut req = Requester::anonymous(SOURCE, &mut owner);
    let paste = h
        .service
        .create_paste(&mut req, PasteDraft::new("persisted grant"), None)
        .await
        .unwrap();
    let grant = h
        .service
        .create_grant(&mut req, &paste.id, Permission::VIEW | Permission::EDIT)
        .await
        .unwrap();

    let mut req = Requester::anonymous(SOURCE, &mut friend);
    h.service.redeem_grant(&mut req, &grant.id).await.unwrap();
    assert!(h
        .service
        .redeem_grant(&mut req, &grant.id)
        .await
        .unwrap_err()
        .is_access_denied());
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_render_once_then_rerender_after_edit() {
    let h = harness();
    let mut session = MemorySession::new();
    let mut req = Requester::anonymous(SOURCE, &mut session);

    let paste = h
        .service
        .create_paste(&mut req, PasteDraft::new("<b>").language("rs"), None)
        .await
        .unwrap();
    assert_eq!(paste.language, "rust");

    let first = h.service.render_paste(&mut req, &paste.id).await.unwrap();
    let second = h.service.render_paste(&mut req, &paste.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(&*first, "<pre class=\"rust\"><b></pre>");
    assert_eq!(h.formatter.calls(), 1);

    h.clock.advance(Duration::from_secs(1));
    h.service
        .update_paste(&mut req, &paste.id, PasteDraft::new("<i>"))
        .await
        .unwrap();
    let third = h.service.render_paste(&mut req, &paste.id).await.unwrap();
    assert_eq!(&*third, "<pre class=\"rust\"><i></pre>");
    assert_eq!(h.formatter.calls(), 2);

    let stats = h.service.render_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
}

#[tokio::test]
async fn test_edit_in_same_instant_rerenders() {
    let h = harness();
    let mut session = MemorySession::new();
    let mut req = Requester::anonymous(SOURCE, &mut session);

    let paste = h
        .service
        .create_paste(&mut req, PasteDraft::new("v1"), None)
        .await
        .unwrap();
    let first = h.service.render_paste(&mut req, &paste.id).await.unwrap();
    assert_eq!(&*first, "<pre class=\"text\">v1</pre>");

    // The clock never moves between render, edit and render.
    h.service
        .update_paste(&mut req, &paste.id, PasteDraft::new("v2"))
        .await
        .unwrap();
    assert!(!h.service.is_render_cached(&paste.id));
    let second = h.service.render_paste(&mut req, &paste.id).await.unwrap();
    assert_eq!(&*second, "<pre class=\"text\">v2</pre>");
    assert_eq!(h.formatter.calls(), 2);
}

#[tokio::test]
async fn test_encrypted_paste_never_cached() {
    let h = harness();
    let mut session = MemorySession::new();
    let mut req = Requester::anonymous(SOURCE, &mut session);

    let paste = h
        .service
        .create_paste(&mut req, PasteDraft::new("secret"), Some("hunter2"))
        .await
        .unwrap();
    assert!(paste.encrypted);

    for _ in 0..3 {
        h.service.render_paste(&mut req, &paste.id).await.unwrap();
        assert!(!h.service.is_render_cached(&paste.id));
    }
    assert_eq!(h.formatter.calls(), 3);
}

#[tokio::test]
async fn test_render_failure_degrades_and_retries() {
    let h = harness();
    let mut session = MemorySession::new();
    let mut req = Requester::anonymous(SOURCE, &mut session);
    let paste = h
        .service
        .create_paste(&mut req, PasteDraft::new("x"), None)
        .await
        .unwrap();

    h.formatter.set_failing(true);
    let out = h.service.render_paste(&mut req, &paste.id).await.unwrap();
    assert_eq!(&*out, RENDER_FAILURE_PLACEHOLDER);
    assert!(!h.service.is_render_cached(&paste.id));

    h.formatter.set_failing(false);
    let out = h.service.render_paste(&mut req, &paste.id).await.unwrap();
    assert_ne!(&*out, RENDER_FAILURE_PLACEHOLDER);
    assert!(h.service.is_render_cached(&paste.id));
    assert_eq!(h.formatter.calls(), 2);
}

#[tokio::test]
async fn test_delete_clears_cache_and_grants() {
    let h = harness();
    let mut session = MemorySession::new();
    let mut req = Requester::anonymous(SOURCE, &mut session);
    let paste = h
        .service
        .create_paste(
            &mut req,
            PasteDraft::new("bye").expiration(Expiration::After(Duration::from_secs(600))),
            None,
        )
        .await
        .unwrap();
    h.service.render_paste(&mut req, &paste.id).await.unwrap();
    let grant = h
        .service
        .create_grant(&mut req, &paste.id, Permission::VIEW)
        .await
        .unwrap();
    assert!(h.expirations.object_has_expiration(&paste.id));

    h.service.delete_paste(&mut req, &paste.id).await.unwrap();
    assert!(!h.service.is_render_cached(&paste.id));
    assert!(!h.expirations.object_has_expiration(&paste.id));
    assert!(matches!(
        h.service.view_paste(&mut req, &paste.id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(h
        .service
        .redeem_grant(&mut req, &grant.id)
        .await
        .unwrap_err()
        .is_access_denied());
    drop(req);
    assert!(AnonymousPermissions::load(&session).is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Encrypted pastes and throttling
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_encrypted_paste_needs_passphrase() {
    let h = harness();
    let mut owner = MemorySession::new();
    let mut reader = MemorySession::new();

    let mut req = Requester::anonymous(SOURCE, &mut owner);
    let paste = h
        .service
        .create_paste(&mut req, PasteDraft::new("classified"), Some("s3cret"))
        .await
        .unwrap();
    assert_eq!(
        h.service.view_paste(&mut req, &paste.id).await.unwrap().body_text(),
        "classified"
    );
    drop(req);
    assert!(owner.contains_key(PASSPHRASES_KEY));

    let mut req = Requester::anonymous("192.0.2.50", &mut reader);
    assert!(matches!(
        h.service.view_paste(&mut req, &paste.id).await,
        Err(ServiceError::PassphraseRequired(_))
    ));
    assert!(matches!(
        h.service.authenticate(&mut req, &paste.id, "wrong").await,
        Err(ServiceError::InvalidPassphrase(_))
    ));
    h.service
        .authenticate(&mut req, &paste.id, "s3cret")
        .await
        .unwrap();
    let doc = h.service.paste_document(&mut req, &paste.id).await.unwrap();
    assert_eq!(doc.body, "classified");
    assert!(doc.encrypted);
}

#[tokio::test]
async fn test_throttle_blocks_sixth_attempt_until_cooldown() {
    let h = harness();
    let mut owner = MemorySession::new();
    let mut attacker = MemorySession::new();

    let paste = h
        .service
        .create_paste(
            &mut Requester::anonymous(SOURCE, &mut owner),
            PasteDraft::new("vault"),
            Some("correct horse"),
        )
        .await
        .unwrap();

    let mut req = Requester::anonymous("192.0.2.66", &mut attacker);
    for _ in 0..5 {
        assert!(matches!(
            h.service.authenticate(&mut req, &paste.id, "guess").await,
            Err(ServiceError::InvalidPassphrase(_))
        ));
    }
    // Even the right passphrase is refused while throttled.
    assert!(matches!(
        h.service
            .authenticate(&mut req, &paste.id, "correct horse")
            .await,
        Err(ServiceError::Throttled(_))
    ));

    // Another source is unaffected.
    let mut other = MemorySession::new();
    let mut other_req = Requester::anonymous("192.0.2.67", &mut other);
    assert!(h
        .service
        .authenticate(&mut other_req, &paste.id, "correct horse")
        .await
        .is_ok());

    h.clock.advance(Duration::from_secs(301));
    assert!(h
        .service
        .authenticate(&mut req, &paste.id, "correct horse")
        .await
        .is_ok());
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation, dedup, expiration
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_validation_rejects_before_mutation() {
    let config = ServiceConfig {
        max_paste_length: 8,
        ..ServiceConfig::default()
    };
    let h = harness_with(config, Arc::new(MemoryGrantStore::new()));
    let mut session = MemorySession::new();
    let mut req = Requester::anonymous(SOURCE, &mut session);

    assert!(matches!(
        h.service
            .create_paste(&mut req, PasteDraft::new(""), None)
            .await,
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        h.service
            .create_paste(&mut req, PasteDraft::new("way too long"), None)
            .await,
        Err(ServiceError::Validation(_))
    ));
    drop(req);
    assert!(session.is_empty());
}

#[tokio::test]
async fn test_duplicate_submission_returns_existing_paste() {
    let h = harness();
    let mut session = MemorySession::new();
    let mut req = Requester::anonymous(SOURCE, &mut session);

    let first = h
        .service
        .create_paste(&mut req, PasteDraft::new("same body"), None)
        .await
        .unwrap();
    let again = h
        .service
        .create_paste(&mut req, PasteDraft::new("same body").title("retitled"), None)
        .await
        .unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(again.title.as_deref(), Some("retitled"));

    // A different source gets its own paste.
    let mut other = MemorySession::new();
    let mut other_req = Requester::anonymous("203.0.113.200", &mut other);
    let theirs = h
        .service
        .create_paste(&mut other_req, PasteDraft::new("same body"), None)
        .await
        .unwrap();
    assert_ne!(first.id, theirs.id);

    // After an edit the old body no longer folds into the paste.
    h.service
        .update_paste(&mut req, &first.id, PasteDraft::new("new body"))
        .await
        .unwrap();
    let fresh = h
        .service
        .create_paste(&mut req, PasteDraft::new("same body"), None)
        .await
        .unwrap();
    assert_ne!(first.id, fresh.id);

    // Dedup only lasts for its TTL.
    h.clock.advance(Duration::from_secs(301));
    let later = h
        .service
        .create_paste(&mut req, PasteDraft::new("same body"), None)
        .await
        .unwrap();
    assert_ne!(fresh.id, later.id);
}

#[tokio::test]
async fn test_duplicate_from_shared_source_needs_edit_right() {
    let h = harness();
    let mut alice = MemorySession::new();
    let mut bob = MemorySession::new();

    let original = h
        .service
        .create_paste(
            &mut Requester::anonymous("10.0.0.1", &mut alice),
            PasteDraft::new("same body").title("alice's notes"),
            None,
        )
        .await
        .unwrap();

    // Bob sits behind the same address but holds no rights on alice's paste.
    let mut req = Requester::anonymous("10.0.0.1", &mut bob);
    let bobs = h
        .service
        .create_paste(&mut req, PasteDraft::new("same body").title("bob was here"), None)
        .await
        .unwrap();
    assert_ne!(bobs.id, original.id);
    assert!(h.service.check(&mut req, &bobs.id, Permission::ALL).await.unwrap());

    let mut req = Requester::anonymous("10.0.0.1", &mut alice);
    let seen = h.service.view_paste(&mut req, &original.id).await.unwrap();
    assert_eq!(seen.title.as_deref(), Some("alice's notes"));
}

#[tokio::test]
async fn test_expiration_calls_around_edits() {
    let h = harness();
    let mut session = MemorySession::new();
    let mut req = Requester::anonymous(SOURCE, &mut session);

    let paste = h
        .service
        .create_paste(
            &mut req,
            PasteDraft::new("short lived").expiration(Expiration::After(Duration::from_secs(
                90 * 24 * 3600,
            ))),
            None,
        )
        .await
        .unwrap();
    assert_eq!(
        paste.expiration,
        Some(Expiration::After(pastegate::MAX_EXPIRATION))
    );
    let now = 1_700_000_000_000;
    assert_eq!(
        h.expirations.deadline(&paste.id),
        Some(now + 15 * 24 * 3600 * 1000)
    );

    h.service
        .update_paste(
            &mut req,
            &paste.id,
            PasteDraft::new("keep me").expiration(Expiration::Never),
        )
        .await
        .unwrap();
    assert!(!h.expirations.object_has_expiration(&paste.id));

    h.service
        .update_paste(
            &mut req,
            &paste.id,
            PasteDraft::new("soon").expiration("1h".parse().unwrap()),
        )
        .await
        .unwrap();
    assert_eq!(
        h.expirations.deadline(&paste.id),
        Some(now + 3600 * 1000)
    );
}

#[tokio::test]
async fn test_download_filename() {
    let h = harness();
    let mut session = MemorySession::new();
    let mut req = Requester::anonymous(SOURCE, &mut session);

    let titled = h
        .service
        .create_paste(
            &mut req,
            PasteDraft::new("print(1)").language("python").title("script"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(h.service.download_filename(&titled), "script.py");

    let untitled = h
        .service
        .create_paste(&mut req, PasteDraft::new("???").language("brainfunk"), None)
        .await
        .unwrap();
    assert_eq!(untitled.language, "unknown");
    assert_eq!(
        h.service.download_filename(&untitled),
        format!("{}.txt", untitled.id)
    );
}

#[tokio::test]
async fn test_unknown_paste_is_not_found() {
    let h = harness();
    let mut session = MemorySession::new();
    let mut req = Requester::anonymous(SOURCE, &mut session);
    let missing = PasteId::new("nope9").unwrap();

    assert!(matches!(
        h.service.view_paste(&mut req, &missing).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        h.service
            .create_grant(&mut req, &missing, Permission::VIEW)
            .await,
        Err(ServiceError::NotFound(_))
    ));
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

proptest::proptest! {
    #![proptest_config(proptest::prelude::ProptestConfig::with_cases(32))]

    #[test]
    fn test_redeemer_holds_exactly_delegated_bits(raw in 1u32..=Permission::ALL.bits()) {
        let bits = Permission::from_bits_truncate(raw);
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let h = harness();

        let held = rt.block_on(async {
            let mut owner = MemorySession::new();
            let mut req = Requester::anonymous(SOURCE, &mut owner);
            let paste = h
                .service
                .create_paste(&mut req, PasteDraft::new(format!("body {raw}")), None)
                .await
                .unwrap();
            let grant = h.service.create_grant(&mut req, &paste.id, bits).await.unwrap();

            let mut friend = MemorySession::new();
            let mut req = Requester::anonymous(SOURCE, &mut friend);
            h.service.redeem_grant(&mut req, &grant.id).await.unwrap();
            drop(req);
            AnonymousPermissions::load(&friend).get(&paste.id)
        });
        proptest::prop_assert_eq!(held, bits);
    }
}
