use crate::credentials::CredentialCheck;
use crate::engine;
use crate::errors::{BookingError, BookingResult, StoreResult};
use crate::model::*;
use crate::store::{self, Store};
use crate::view::{AdminTab, ViewPartition};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SESSION_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn generate_session_id() -> String {
    let mut rng = rand::rng();
    let suffix = (0..9)
        .map(|_| char::from(SESSION_ID_ALPHABET[rng.random_range(0..SESSION_ID_ALPHABET.len())]))
        .collect::<String>();
    format!("session_{}_{suffix}", Utc::now().timestamp_millis())
}

/// One independently loaded view of the shared store, with its own logged-in
/// user. Every mutation reloads the collections from the store, applies the
/// booking rules and writes the collections back in full.
pub struct Session {
    id: String,
    store: Arc<dyn Store>,
    credentials: Arc<dyn CredentialCheck>,
    snapshot: Snapshot,
    user: Option<CurrentUser>,
    admin_tab: AdminTab,
}

impl Session {
    pub async fn open(store: Arc<dyn Store>, credentials: Arc<dyn CredentialCheck>) -> Session {
        Self::resume(store, credentials, generate_session_id()).await
    }

    /// Reopen a session, restoring the user it had logged in.
    pub async fn resume(
        store: Arc<dyn Store>,
        credentials: Arc<dyn CredentialCheck>,
        id: String,
    ) -> Session {
        let snapshot = store::load_snapshot(store.as_ref()).await;
        let mut session = Session {
            id,
            store,
            credentials,
            snapshot,
            user: None,
            admin_tab: AdminTab::default(),
        };
        session.restore_user().await;
        debug!(session = %session.id, logged_in = session.user.is_some(), "session opened");
        session
    }

    async fn restore_user(&mut self) {
        let key = store::current_user_key(&self.id);
        let stored = match self.store.get(&key).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(session = %self.id, error = %e, "cannot read stored user");
                return;
            }
        };
        let Some(raw) = stored else { return };
        match serde_json::from_str::<CurrentUser>(&raw) {
            Ok(user) => self.user = Some(user),
            Err(e) => {
                warn!(session = %self.id, error = %e, "discarding unreadable stored user");
                if let Err(e) = self.logout().await {
                    warn!(session = %self.id, error = %e, "cannot remove stored user");
                }
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn admin_tab(&self) -> AdminTab {
        self.admin_tab
    }

    async fn reload(&mut self) {
        self.snapshot = store::load_snapshot(self.store.as_ref()).await;
    }

    async fn store_user(&self) -> StoreResult<()> {
        let key = store::current_user_key(&self.id);
        match &self.user {
            Some(user) => self.store.set(&key, &serde_json::to_string(user)?).await,
            None => self.store.remove(&key).await,
        }
    }

    /// Copy the student's quota from the loaded record into the cached user.
    fn sync_user(&mut self) -> bool {
        if let Some(CurrentUser::Student {
            index,
            remaining_requests,
            ..
        }) = &mut self.user
        {
            if let Some(student) = self.snapshot.student(index) {
                *remaining_requests = student.remaining_requests;
                return true;
            }
        }
        false
    }

    /// Apply `op` to a fresh copy of the stored collections and write them
    /// back. Nothing is written when the collections cannot be read, and the
    /// cached state is left untouched when they cannot be written.
    async fn mutate<T, F>(&mut self, op: F) -> BookingResult<T>
    where
        F: FnOnce(&mut Snapshot, &mut Option<CurrentUser>) -> BookingResult<T>,
    {
        self.snapshot = store::try_load_snapshot(self.store.as_ref())
            .await
            .inspect_err(|e| warn!(session = %self.id, error = %e, "cannot read stored data"))?;
        self.sync_user();
        let mut snapshot = self.snapshot.clone();
        let mut user = self.user.clone();
        let value = op(&mut snapshot, &mut user)?;
        if let Err(e) = store::save_snapshot(self.store.as_ref(), &snapshot).await {
            warn!(session = %self.id, error = %e, "cannot save changes, discarding them");
            return Err(e.into());
        }
        self.snapshot = snapshot;
        self.user = user;
        Ok(value)
    }

    fn require_admin(&self) -> BookingResult<()> {
        match &self.user {
            Some(user) if user.is_admin() => Ok(()),
            _ => Err(BookingError::Forbidden(
                "only the administrator can manage companies".to_owned(),
            )),
        }
    }

    pub async fn register(
        &mut self,
        index: &str,
        name: &str,
        email: &str,
        password: &str,
    ) -> BookingResult<Student> {
        self.mutate(|snapshot, _| {
            engine::register_student(snapshot, index, name, email, password, Utc::now())
        })
        .await
    }

    pub async fn login_student(&mut self, index: &str, password: &str) -> BookingResult<CurrentUser> {
        self.reload().await;
        let student = engine::authenticate_student(
            &self.snapshot,
            self.credentials.as_ref(),
            index,
            password,
        )?;
        let user = CurrentUser::for_student(student);
        info!(session = %self.id, student = %student, "student logged in");
        self.user = Some(user.clone());
        self.store_user().await?;
        Ok(user)
    }

    pub async fn login_admin(&mut self, username: &str, password: &str) -> BookingResult<CurrentUser> {
        let user = engine::authenticate_admin(self.credentials.as_ref(), username, password)?;
        info!(session = %self.id, "administrator logged in");
        self.reload().await;
        self.user = Some(user.clone());
        self.admin_tab = AdminTab::Companies;
        self.store_user().await?;
        Ok(user)
    }

    pub async fn logout(&mut self) -> StoreResult<()> {
        if let Some(user) = self.user.take() {
            info!(session = %self.id, user = user.name(), "logged out");
        }
        self.admin_tab = AdminTab::default();
        self.store_user().await
    }

    pub async fn add_company(
        &mut self,
        name: &str,
        description: &str,
        total_slots: u32,
    ) -> BookingResult<Company> {
        self.require_admin()?;
        self.mutate(|snapshot, _| {
            engine::create_company(snapshot, name, description, total_slots, Utc::now())
        })
        .await
    }

    pub async fn update_company(
        &mut self,
        id: &CompanyId,
        name: &str,
        description: &str,
        total_slots: u32,
    ) -> BookingResult<Company> {
        self.require_admin()?;
        self.mutate(|snapshot, _| engine::update_company(snapshot, id, name, description, total_slots))
            .await
    }

    pub async fn delete_company(&mut self, id: &CompanyId) -> BookingResult<Company> {
        self.require_admin()?;
        self.mutate(|snapshot, _| engine::delete_company(snapshot, id))
            .await
    }

    pub async fn request_interview(&mut self, company: &CompanyId) -> BookingResult<InterviewRequest> {
        let request = self
            .mutate(|snapshot, user| {
                let user = user.as_mut().ok_or_else(|| {
                    BookingError::Forbidden("log in before requesting an interview".to_owned())
                })?;
                engine::request_interview(snapshot, user, company, Utc::now())
            })
            .await?;
        if let Err(e) = self.store_user().await {
            warn!(session = %self.id, error = %e, "cannot store user after granted request");
        }
        Ok(request)
    }

    /// Show another administrator tab, returning what has to be drawn.
    pub fn switch_admin_tab(&mut self, tab: AdminTab) -> Option<ViewPartition> {
        self.admin_tab = tab;
        self.visible_partition()
    }

    pub fn visible_partition(&self) -> Option<ViewPartition> {
        self.user.as_ref().map(|user| {
            if user.is_admin() {
                self.admin_tab.into()
            } else {
                ViewPartition::StudentCompanies
            }
        })
    }

    /// Reload the collections, refresh the cached student quota and report
    /// which partition must be redrawn, if anyone is logged in.
    pub async fn refresh(&mut self) -> Option<ViewPartition> {
        self.reload().await;
        if self.sync_user() {
            if let Err(e) = self.store_user().await {
                warn!(session = %self.id, error = %e, "cannot store refreshed user");
            }
        }
        self.visible_partition()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::PlaintextCredentials;
    use crate::errors::StoreError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Shared memory storage whose reads, collection writes or user record
    /// writes can be made to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
        fail_saves: AtomicBool,
        fail_user_writes: AtomicBool,
    }

    impl FlakyStore {
        fn check(&self, flag: &AtomicBool, key: &str) -> StoreResult<()> {
            if flag.load(Ordering::SeqCst) {
                return Err(StoreError::Io {
                    path: key.to_owned(),
                    source: std::io::Error::other("unavailable"),
                });
            }
            Ok(())
        }

        fn check_write(&self, key: &str) -> StoreResult<()> {
            if key.starts_with("currentUser_") {
                self.check(&self.fail_user_writes, key)
            } else {
                self.check(&self.fail_saves, key)
            }
        }
    }

    #[async_trait]
    impl Store for FlakyStore {
        async fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.check(&self.fail_reads, key)?;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            self.check_write(key)?;
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> StoreResult<()> {
            self.check_write(key)?;
            self.inner.remove(key).await
        }

        async fn set_many(&self, entries: &[(&str, String)]) -> StoreResult<()> {
            for (key, _) in entries {
                self.check_write(key)?;
            }
            self.inner.set_many(entries).await
        }
    }

    /// A logged-in student session on a flaky store holding one company with
    /// two slots.
    async fn flaky_student() -> (Arc<FlakyStore>, Session, Company) {
        let store = Arc::new(FlakyStore::default());
        let mut admin = Session::open(store.clone(), Arc::new(PlaintextCredentials::default())).await;
        admin.login_admin("admin", "admin123").await.unwrap();
        let acme = admin.add_company("Acme", "", 2).await.unwrap();
        let mut tab = Session::open(store.clone(), Arc::new(PlaintextCredentials::default())).await;
        tab.register("202601A", "Ada", "ada@example.org", "x")
            .await
            .unwrap();
        tab.login_student("202601A", "x").await.unwrap();
        (store, tab, acme)
    }

    async fn open(store: &MemoryStore) -> Session {
        Session::open(
            Arc::new(store.clone()),
            Arc::new(PlaintextCredentials::default()),
        )
        .await
    }

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        let parts = id.split('_').collect::<Vec<_>>();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].bytes().all(|b| SESSION_ID_ALPHABET.contains(&b)));
        assert_ne!(id, generate_session_id());
    }

    #[tokio::test]
    async fn test_login_is_scoped_to_the_session() {
        let store = MemoryStore::default();
        let mut tab = open(&store).await;
        tab.register("202601A", "Ada", "ada@example.org", "x")
            .await
            .unwrap();
        tab.login_student("202601A", "x").await.unwrap();
        let key = store::current_user_key(tab.id());
        assert!(store.get(&key).await.unwrap().is_some());

        let other = open(&store).await;
        assert!(other.user().is_none());

        let resumed = Session::resume(
            Arc::new(store.clone()),
            Arc::new(PlaintextCredentials::default()),
            tab.id().to_owned(),
        )
        .await;
        assert_eq!(resumed.user(), tab.user());

        tab.logout().await.unwrap();
        assert!(store.get(&key).await.unwrap().is_none());
        assert_eq!(tab.visible_partition(), None);
    }

    #[tokio::test]
    async fn test_unreadable_stored_user_is_logged_out() {
        let store = MemoryStore::default();
        let key = store::current_user_key("session_1_abc");
        store.set(&key, "{broken").await.unwrap();
        let session = Session::resume(
            Arc::new(store.clone()),
            Arc::new(PlaintextCredentials::default()),
            "session_1_abc".to_owned(),
        )
        .await;
        assert!(session.user().is_none());
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_company_management_requires_admin() {
        let store = MemoryStore::default();
        let mut tab = open(&store).await;
        assert!(matches!(
            tab.add_company("Acme", "", 1).await,
            Err(BookingError::Forbidden(_))
        ));
        assert!(matches!(
            tab.login_admin("admin", "nope").await,
            Err(BookingError::Auth(_))
        ));
        tab.login_admin("admin", "admin123").await.unwrap();
        let acme = tab.add_company("Acme", "", 1).await.unwrap();
        assert_eq!(tab.snapshot().companies, vec![acme.clone()]);
        assert!(matches!(
            tab.request_interview(&acme.id).await,
            Err(BookingError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_request_refreshes_cached_quota() {
        let store = MemoryStore::default();
        let mut admin = open(&store).await;
        admin.login_admin("admin", "admin123").await.unwrap();
        let acme = admin.add_company("Acme", "", 2).await.unwrap();

        let mut tab = open(&store).await;
        tab.register("202601A", "Ada", "ada@example.org", "x")
            .await
            .unwrap();
        tab.login_student("202601A", "x").await.unwrap();
        tab.request_interview(&acme.id).await.unwrap();
        assert_eq!(tab.user().unwrap().remaining_requests(), Some(4));

        let stored = store
            .get(&store::current_user_key(tab.id()))
            .await
            .unwrap()
            .unwrap();
        let stored: CurrentUser = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored.remaining_requests(), Some(4));
        assert_eq!(
            store::load_snapshot(&store).await.company(&acme.id).unwrap().available_slots,
            1
        );
    }

    #[tokio::test]
    async fn test_refresh_reports_visible_partition() {
        let store = MemoryStore::default();
        let mut tab = open(&store).await;
        assert_eq!(tab.refresh().await, None);
        tab.login_admin("admin", "admin123").await.unwrap();
        assert_eq!(tab.refresh().await, Some(ViewPartition::AdminCompanies));
        assert_eq!(
            tab.switch_admin_tab(AdminTab::Requests),
            Some(ViewPartition::AdminRequests)
        );
        assert_eq!(tab.refresh().await, Some(ViewPartition::AdminRequests));
    }

    #[tokio::test]
    async fn test_unreadable_store_is_never_overwritten() {
        let (store, mut tab, acme) = flaky_student().await;
        let before = store::load_snapshot(&store.inner).await;
        store.fail_reads.store(true, Ordering::SeqCst);
        assert!(matches!(
            tab.request_interview(&acme.id).await,
            Err(BookingError::Store(_))
        ));
        assert!(matches!(
            tab.register("202602B", "Bob", "bob@example.org", "y").await,
            Err(BookingError::Store(_))
        ));
        store.fail_reads.store(false, Ordering::SeqCst);
        assert_eq!(store::load_snapshot(&store.inner).await, before);
        assert_eq!(before.students.len(), 1);
        assert_eq!(before.companies.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_state() {
        let (store, mut tab, acme) = flaky_student().await;
        let before = store::load_snapshot(&store.inner).await;
        store.fail_saves.store(true, Ordering::SeqCst);
        assert!(matches!(
            tab.request_interview(&acme.id).await,
            Err(BookingError::Store(_))
        ));
        assert_eq!(tab.snapshot(), &before);
        assert_eq!(tab.user().unwrap().remaining_requests(), Some(INITIAL_REQUESTS));
        assert_eq!(store::load_snapshot(&store.inner).await, before);

        store.fail_saves.store(false, Ordering::SeqCst);
        tab.request_interview(&acme.id).await.unwrap();
        assert_eq!(tab.user().unwrap().remaining_requests(), Some(INITIAL_REQUESTS - 1));
    }

    #[tokio::test]
    async fn test_granted_request_survives_user_write_failure() {
        let (store, mut tab, acme) = flaky_student().await;
        store.fail_user_writes.store(true, Ordering::SeqCst);
        let request = tab.request_interview(&acme.id).await.unwrap();
        assert_eq!(request.company_id, acme.id);
        assert_eq!(tab.user().unwrap().remaining_requests(), Some(INITIAL_REQUESTS - 1));
        let stored = store::load_snapshot(&store.inner).await;
        assert_eq!(stored.requests, vec![request]);
        assert_eq!(stored.company(&acme.id).unwrap().available_slots, 1);
    }

    #[tokio::test]
    async fn test_unreadable_user_record_keeps_it_stored() {
        let (store, tab, _) = flaky_student().await;
        store.fail_reads.store(true, Ordering::SeqCst);
        let resumed = Session::resume(
            store.clone(),
            Arc::new(PlaintextCredentials::default()),
            tab.id().to_owned(),
        )
        .await;
        assert!(resumed.user().is_none());
        assert_eq!(resumed.snapshot(), &Snapshot::default());
        store.fail_reads.store(false, Ordering::SeqCst);
        let key = store::current_user_key(tab.id());
        assert!(store.inner.get(&key).await.unwrap().is_some());
    }
}
