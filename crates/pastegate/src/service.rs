//! The paste service: one API over storage, permissions, grants and rendering.
//!
//! A [`PasteService`] is built once at startup and shared by every request
//! handler. Per-request state arrives as a [`Requester`], which carries the
//! authenticated account (if any), the client's source address and a mutable
//! borrow of the session payload the web layer will persist afterwards.

use std::sync::Arc;

use pastegate_core::{
    validate_body, Clock, Expiration, Grant, GrantId, Paste, PasteDocument, PasteDraft, PasteId,
    Permission,
};
use pastegate_perms::{
    AccountId, AccountService, GrantBroker, PassphraseKeyring, PermissionScope, PermsError,
    ScopeResolver, SessionPayload,
};
use pastegate_render::{Formatter, LanguageRegistry, RenderCache, RenderStats};
use pastegate_store::memory::DEFAULT_LANGUAGE;
use pastegate_store::{AuthThrottle, ContentDedup, GrantStore, PasteStore, StoreError};
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::{Action, Result, ServiceError};
use crate::expiration::ExpirationScheduler;

/// Who is making a request.
pub struct Requester<'a> {
    /// Authenticated account. Takes precedence over the session's anonymous rights.
    pub account: Option<AccountId>,
    /// Client address, used for dedup and throttling.
    pub source: String,
    /// The requester's session payload.
    pub session: &'a mut dyn SessionPayload,
}

impl<'a> Requester<'a> {
    /// An unauthenticated requester.
    pub fn anonymous(source: impl Into<String>, session: &'a mut dyn SessionPayload) -> Self {
        Self {
            account: None,
            source: source.into(),
            session,
        }
    }

    /// An authenticated requester.
    pub fn account(
        account: AccountId,
        source: impl Into<String>,
        session: &'a mut dyn SessionPayload,
    ) -> Self {
        Self {
            account: Some(account),
            source: source.into(),
            session,
        }
    }

    fn scope(&mut self, resolver: &ScopeResolver, paste_id: &PasteId) -> PermissionScope<'_> {
        resolver.resolve(paste_id, self.account.as_ref(), &mut *self.session)
    }
}

/// External collaborators the service is wired to.
pub struct Collaborators {
    pub pastes: Arc<dyn PasteStore>,
    pub grants: Arc<dyn GrantStore>,
    pub accounts: Arc<dyn AccountService>,
    pub formatter: Arc<dyn Formatter>,
    pub expirations: Arc<dyn ExpirationScheduler>,
    pub languages: Arc<LanguageRegistry>,
    pub clock: Arc<dyn Clock>,
}

/// The paste service.
pub struct PasteService {
    config: ServiceConfig,
    pastes: Arc<dyn PasteStore>,
    expirations: Arc<dyn ExpirationScheduler>,
    languages: Arc<LanguageRegistry>,
    resolver: ScopeResolver,
    grants: GrantBroker,
    render: RenderCache,
    dedup: ContentDedup,
    throttle: AuthThrottle,
}

impl PasteService {
    /// Create a service over `collaborators`.
    pub fn new(config: ServiceConfig, collaborators: Collaborators) -> Result<Self> {
        let Collaborators {
            pastes,
            grants,
            accounts,
            formatter,
            expirations,
            languages,
            clock,
        } = collaborators;

        let render = RenderCache::new(
            config.render_cache.clone(),
            formatter,
            Arc::clone(&languages),
            Arc::clone(&clock),
        )
        .map_err(|e| ServiceError::Config(e.to_string()))?;

        Ok(Self {
            pastes,
            expirations,
            languages,
            resolver: ScopeResolver::new(accounts),
            grants: GrantBroker::new(grants, Arc::clone(&clock), config.grants.clone()),
            render,
            dedup: ContentDedup::new(Arc::clone(&clock), config.dedup_ttl),
            throttle: AuthThrottle::new(clock, config.throttle.clone()),
            config,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The language registry.
    pub fn languages(&self) -> &LanguageRegistry {
        &self.languages
    }

    /// Render cache counters.
    pub fn render_stats(&self) -> RenderStats {
        self.render.stats()
    }

    /// Whether a render for `paste_id` is currently cached.
    pub fn is_render_cached(&self, paste_id: &PasteId) -> bool {
        self.render.contains(paste_id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Paste Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a paste and give the creator every right on it.
    ///
    /// A non-empty `password` makes the paste encrypted and remembers the
    /// passphrase in the creator's session. Unencrypted submissions that
    /// repeat a recent one from the same source update and return the earlier
    /// paste instead, provided the requester can still edit it.
    pub async fn create_paste(
        &self,
        req: &mut Requester<'_>,
        mut draft: PasteDraft,
        password: Option<&str>,
    ) -> Result<Paste> {
        validate_body(&draft.body, self.config.max_paste_length)?;
        draft.language = Some(self.normalize_language(draft.language.as_deref()));
        draft.expiration = draft
            .expiration
            .map(|e| e.clamp(self.config.max_expiration));
        let password = password.filter(|p| !p.is_empty());

        if password.is_none() {
            if let Some(existing) = self.dedup.lookup(&req.source, &draft.body) {
                match self.pastes.get_paste(&existing, None).await {
                    Ok(mut paste) => {
                        // Someone else's paste behind the same source is left alone.
                        let editable = req
                            .scope(&self.resolver, &existing)
                            .has(Permission::EDIT)
                            .await?;
                        if editable {
                            paste.title = draft.title;
                            paste.language = draft.language.unwrap_or(paste.language);
                            if draft.expiration.is_some() {
                                paste.expiration = draft.expiration;
                            }
                            let paste = self.pastes.update_paste(paste).await?;
                            self.render.invalidate(&paste.id);
                            self.schedule_expiration(&paste.id, draft.expiration);
                            debug!(paste = %paste.id, "duplicate submission folded into existing paste");
                            return Ok(paste);
                        }
                    }
                    Err(StoreError::PasteNotFound(_)) => {
                        self.dedup.forget(&existing);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        let expiration = draft.expiration;
        let body = draft.body.clone();
        let paste = self
            .pastes
            .create_paste(draft, password.map(str::as_bytes))
            .await?;

        // A paste nobody owns must not survive a failed grant.
        let granted = req
            .scope(&self.resolver, &paste.id)
            .grant(Permission::ALL)
            .await;
        if let Err(e) = granted {
            if let Err(erase) = self.pastes.erase_paste(&paste.id).await {
                warn!(paste = %paste.id, error = %erase, "failed to erase unowned paste");
            }
            return Err(e.into());
        }

        match password {
            Some(password) => {
                let mut keyring = PassphraseKeyring::load(&*req.session);
                keyring.insert(&paste.id, password);
                keyring.store(&mut *req.session)?;
            }
            None => self.dedup.remember(&req.source, &body, &paste.id),
        }
        self.schedule_expiration(&paste.id, expiration);

        info!(
            paste = %paste.id,
            encrypted = paste.encrypted,
            language = %paste.language,
            "created paste"
        );
        Ok(paste)
    }

    /// Fetch a paste the requester may read.
    ///
    /// Encrypted pastes are unlocked with the passphrase remembered in the
    /// session.
    pub async fn view_paste(&self, req: &mut Requester<'_>, paste_id: &PasteId) -> Result<Paste> {
        let paste = self.load(req, paste_id).await?;
        if !self.config.default_view_allowed {
            self.require(req, paste_id, Action::View, Permission::VIEW)
                .await?;
        }
        Ok(paste)
    }

    /// Rendered markup for a readable paste.
    ///
    /// Formatter failures yield a placeholder rather than an error.
    pub async fn render_paste(
        &self,
        req: &mut Requester<'_>,
        paste_id: &PasteId,
    ) -> Result<Arc<str>> {
        let paste = self.view_paste(req, paste_id).await?;
        Ok(self.render.render(&paste).await)
    }

    /// The JSON document for a readable paste.
    pub async fn paste_document(
        &self,
        req: &mut Requester<'_>,
        paste_id: &PasteId,
    ) -> Result<PasteDocument> {
        Ok(self.view_paste(req, paste_id).await?.to_document())
    }

    /// File name offered when downloading `paste`.
    pub fn download_filename(&self, paste: &Paste) -> String {
        let stem = paste
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(paste.id.as_str());
        let language = self.languages.resolve(&paste.language);
        format!("{}.{}", stem, language.file_extension())
    }

    /// Replace a paste's body and any metadata set in `draft`.
    pub async fn update_paste(
        &self,
        req: &mut Requester<'_>,
        paste_id: &PasteId,
        draft: PasteDraft,
    ) -> Result<Paste> {
        let mut paste = self.load(req, paste_id).await?;
        self.require(req, paste_id, Action::Edit, Permission::EDIT)
            .await?;
        validate_body(&draft.body, self.config.max_paste_length)?;

        // The old body no longer identifies this paste.
        self.dedup.forget(paste_id);

        let expiration = draft
            .expiration
            .map(|e| e.clamp(self.config.max_expiration));
        paste.body = draft.body;
        if let Some(title) = draft.title {
            paste.title = Some(title).filter(|t| !t.is_empty());
        }
        if let Some(language) = draft.language {
            paste.language = self.normalize_language(Some(language.as_str()));
        }
        if expiration.is_some() {
            paste.expiration = expiration;
        }

        let paste = self.pastes.update_paste(paste).await?;
        self.render.invalidate(paste_id);
        self.schedule_expiration(paste_id, expiration);
        info!(paste = %paste_id, "updated paste");
        Ok(paste)
    }

    /// Delete a paste and everything that refers to it.
    pub async fn delete_paste(&self, req: &mut Requester<'_>, paste_id: &PasteId) -> Result<()> {
        self.load(req, paste_id).await?;
        self.require(req, paste_id, Action::Delete, Permission::DELETE)
            .await?;

        self.pastes.erase_paste(paste_id).await?;
        self.dedup.forget(paste_id);
        self.render.invalidate(paste_id);
        let revoked = self.grants.revoke_all(paste_id).await?;
        if self.expirations.object_has_expiration(paste_id) {
            self.expirations.cancel_object_expiration(paste_id);
        }

        req.scope(&self.resolver, paste_id)
            .revoke(Permission::ALL)
            .await?;
        let mut keyring = PassphraseKeyring::load(&*req.session);
        if keyring.remove(paste_id) {
            keyring.store(&mut *req.session)?;
        }

        info!(paste = %paste_id, grants_revoked = revoked, "deleted paste");
        Ok(())
    }

    /// Drop every right the requester holds on a paste they can edit.
    pub async fn disavow(&self, req: &mut Requester<'_>, paste_id: &PasteId) -> Result<()> {
        let mut scope = req.scope(&self.resolver, paste_id);
        if !scope.has(Permission::EDIT).await? {
            return Err(ServiceError::denied(Action::Edit, paste_id));
        }
        scope.revoke(Permission::ALL).await?;
        info!(paste = %paste_id, "disavowed paste");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permissions and Grants
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether the requester holds every bit in `bits` on a paste.
    pub async fn check(
        &self,
        req: &mut Requester<'_>,
        paste_id: &PasteId,
        bits: Permission,
    ) -> Result<bool> {
        Ok(req.scope(&self.resolver, paste_id).has(bits).await?)
    }

    /// Mint a single-use grant conferring `bits` on a paste.
    pub async fn create_grant(
        &self,
        req: &mut Requester<'_>,
        paste_id: &PasteId,
        bits: Permission,
    ) -> Result<Grant> {
        self.load(req, paste_id).await?;
        let scope = req.scope(&self.resolver, paste_id);
        self.grants
            .create(&scope, bits)
            .await
            .map_err(|e| match e {
                PermsError::PermissionDenied(_) => ServiceError::denied(Action::Grant, paste_id),
                other => other.into(),
            })
    }

    /// Redeem a grant into the requester's scope.
    ///
    /// Unknown, used and expired tokens fail identically.
    pub async fn redeem_grant(&self, req: &mut Requester<'_>, grant_id: &GrantId) -> Result<Grant> {
        let grant = self
            .grants
            .redeem(
                grant_id,
                &self.resolver,
                req.account.as_ref(),
                &mut *req.session,
            )
            .await?;
        Ok(grant)
    }

    /// Outstanding grants on a paste, for a requester holding `GRANT`.
    pub async fn outstanding_grants(
        &self,
        req: &mut Requester<'_>,
        paste_id: &PasteId,
    ) -> Result<Vec<Grant>> {
        self.require(req, paste_id, Action::Grant, Permission::GRANT)
            .await?;
        Ok(self.grants.outstanding(paste_id).await?)
    }

    /// Reclaim expired grant records.
    pub async fn purge_expired_grants(&self) -> Result<usize> {
        Ok(self.grants.purge_expired().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Encrypted Pastes
    // ─────────────────────────────────────────────────────────────────────────

    /// Unlock an encrypted paste and remember the passphrase in the session.
    ///
    /// Every attempt is counted before the passphrase is compared, and
    /// throttled requesters are refused outright.
    pub async fn authenticate(
        &self,
        req: &mut Requester<'_>,
        paste_id: &PasteId,
        passphrase: &str,
    ) -> Result<Paste> {
        if !self.throttle.try_begin_attempt(&req.source, paste_id) {
            return Err(ServiceError::Throttled(paste_id.clone()));
        }

        match self
            .pastes
            .get_paste(paste_id, Some(passphrase.as_bytes()))
            .await
        {
            Ok(paste) => {
                self.throttle.reset(&req.source, paste_id);
                if paste.encrypted {
                    let mut keyring = PassphraseKeyring::load(&*req.session);
                    keyring.insert(paste_id, passphrase);
                    keyring.store(&mut *req.session)?;
                }
                debug!(paste = %paste_id, "passphrase accepted");
                Ok(paste)
            }
            Err(StoreError::InvalidPassphrase(_)) => {
                let attempts = self.throttle.attempts(&req.source, paste_id);
                warn!(paste = %paste_id, attempts, "passphrase rejected");
                Err(ServiceError::InvalidPassphrase(paste_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    async fn load(&self, req: &Requester<'_>, paste_id: &PasteId) -> Result<Paste> {
        let keyring = PassphraseKeyring::load(&*req.session);
        let passphrase = keyring.get(paste_id).map(str::as_bytes);
        Ok(self.pastes.get_paste(paste_id, passphrase).await?)
    }

    async fn require(
        &self,
        req: &mut Requester<'_>,
        paste_id: &PasteId,
        action: Action,
        bits: Permission,
    ) -> Result<()> {
        if req.scope(&self.resolver, paste_id).has(bits).await? {
            Ok(())
        } else {
            debug!(paste = %paste_id, %action, "access denied");
            Err(ServiceError::denied(action, paste_id))
        }
    }

    fn normalize_language(&self, language: Option<&str>) -> String {
        match language.map(str::trim).filter(|l| !l.is_empty()) {
            Some(id) => self.languages.resolve(id).id.clone(),
            None => DEFAULT_LANGUAGE.to_string(),
        }
    }

    fn schedule_expiration(&self, paste_id: &PasteId, expiration: Option<Expiration>) {
        match expiration {
            Some(Expiration::After(after)) => {
                self.expirations.expire_object(paste_id, after);
            }
            Some(Expiration::Never) => {
                if self.expirations.object_has_expiration(paste_id) {
                    self.expirations.cancel_object_expiration(paste_id);
                }
            }
            None => {}
        }
    }
}
