//! The contact list of one group: loading, readiness, search and delete.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::api;
use crate::cascade;
use crate::error::{ApiError, DeleteError, GateError};
use crate::gate::ReadyGate;
use crate::list::{ContactList, RowRef};
use crate::model::{ContactRecord, GroupRecord};
use crate::remote::{RemoteClient, Session};
use crate::sections::ContactSections;

pub struct ContactListScreen<R> {
    remote: Arc<R>,
    session: Arc<Session>,
    group: GroupRecord,
    list: Arc<Mutex<ContactList>>,
    gate: ReadyGate,
    did_prefetch: AtomicBool,
}

impl<R> ContactListScreen<R>
where
    R: RemoteClient + 'static,
{
    pub fn new(remote: Arc<R>, session: Arc<Session>, group: GroupRecord) -> Self {
        Self {
            remote,
            session,
            group,
            list: Arc::new(Mutex::new(ContactList::new())),
            gate: ReadyGate::new(),
            did_prefetch: AtomicBool::new(false),
        }
    }

    /// Start loading the group's contacts in the background.
    ///
    /// Returns `false` if the gate is not idle, i.e. a load is running or a
    /// previous one has settled and [`appear`](Self::appear) has not reset it.
    pub fn prefetch(&self) -> bool {
        let started = self.start_load();
        if started {
            self.did_prefetch.store(true, Ordering::SeqCst);
        }
        started
    }

    /// Called each time the list becomes visible. Loads the contacts unless a
    /// prefetch already did, and leaves search mode.
    pub fn appear(&self) {
        if !self.did_prefetch.swap(false, Ordering::SeqCst) {
            self.gate.reset();
            self.start_load();
        }
        self.lock().clear_search();
    }

    /// Wait for the current load. Fails if it failed or was cancelled, or if
    /// nothing was ever started.
    pub async fn wait_ready(&self) -> Result<(), GateError> {
        self.gate.wait_ready().await
    }

    /// Abandon the running load. Waiters see `Cancelled` and the list keeps
    /// whatever it held before.
    pub fn cancel_prefetch(&self) {
        self.gate.cancel();
    }

    pub fn search(&self, query: &str) {
        self.lock().set_query(query);
    }

    /// Read the current list under its lock.
    pub fn with_list<T>(&self, f: impl FnOnce(&ContactList) -> T) -> T {
        f(&self.lock())
    }

    /// Remove a row locally right away, then delete the contact on the server
    /// in the background. The local removal stands whatever the server says.
    pub fn delete(
        &self,
        at: RowRef,
    ) -> Option<(ContactRecord, JoinHandle<Result<(), DeleteError>>)> {
        let record = self.lock().remove(at)?;
        log::info!("removing contact {} ({})", record.id, record.full_name());

        let remote = Arc::clone(&self.remote);
        let session = Arc::clone(&self.session);
        let contact_id = record.id;
        let handle = tokio::spawn(async move {
            cascade::delete_contact(remote.as_ref(), &session, contact_id).await
        });
        Some((record, handle))
    }

    // The fetched sections are swapped into the list by the gate, and only if
    // this load is still the current one when it finishes.
    fn start_load(&self) -> bool {
        let remote = Arc::clone(&self.remote);
        let session = Arc::clone(&self.session);
        let list = Arc::clone(&self.list);
        let group_id = self.group.id;

        let load = async move {
            let contacts = api::fetch_group_contacts(remote.as_ref(), &session, group_id).await?;
            Ok::<_, ApiError>(ContactSections::build(contacts))
        };
        self.gate.prefetch(load, move |sections| {
            list.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .replace(sections);
        })
    }

    fn lock(&self) -> MutexGuard<'_, ContactList> {
        self.list.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{json, Value};
    use tokio::time::timeout;

    use super::*;
    use crate::error::DeleteStage;
    use crate::remote::fake::{session, FakeRemote};
    use crate::remote::Method;

    const WAIT: Duration = Duration::from_secs(5);

    fn listing() -> Value {
        json!({
            "resource": [
                {"id": 1, "contact_id": 7, "contact_group_id": 2,
                 "contact_by_contact_id": {"id": 7, "first_name": "Jane", "last_name": "Doe"}},
                {"id": 2, "contact_id": 7, "contact_group_id": 2,
                 "contact_by_contact_id": {"id": 7, "first_name": "Jane", "last_name": "Doe"}},
                {"id": 3, "contact_id": 9, "contact_group_id": 2,
                 "contact_by_contact_id": {"id": 9, "first_name": "John", "last_name": "doe"}}
            ]
        })
    }

    fn screen(remote: FakeRemote) -> ContactListScreen<FakeRemote> {
        ContactListScreen::new(Arc::new(remote), Arc::new(session()), GroupRecord::new(2))
    }

    #[tokio::test]
    async fn test_prefetch_then_wait_groups_contacts() {
        let screen = screen(FakeRemote::new().reply(Ok(listing())));
        assert!(screen.prefetch());
        timeout(WAIT, screen.wait_ready()).await.unwrap().unwrap();

        screen.with_list(|list| {
            let sections = list.sections();
            assert_eq!(sections.alphabet(), vec!["D"]);
            let bucket: Vec<(&str, &str)> = sections
                .get("D")
                .unwrap()
                .iter()
                .map(|c| (c.last_name.as_str(), c.first_name.as_str()))
                .collect();
            assert_eq!(bucket, vec![("Doe", "Jane"), ("doe", "John")]);
        });
    }

    #[tokio::test]
    async fn test_load_failure_reaches_waiter() {
        let screen = screen(FakeRemote::new().reply(Err(ApiError::Status {
            status: 401,
            message: "expired".into(),
        })));
        screen.prefetch();
        let err = timeout(WAIT, screen.wait_ready()).await.unwrap().unwrap_err();
        assert!(matches!(err, GateError::Failed(_)));
        assert!(screen.with_list(|list| list.sections().is_empty()));
    }

    #[tokio::test]
    async fn test_appear_after_prefetch_does_not_reload() {
        let remote = Arc::new(FakeRemote::new().reply(Ok(listing())).reply(Ok(listing())));
        let screen = ContactListScreen::new(Arc::clone(&remote), Arc::new(session()), GroupRecord::new(2));
        screen.prefetch();
        screen.appear();
        timeout(WAIT, screen.wait_ready()).await.unwrap().unwrap();
        assert_eq!(remote.requests().len(), 1);

        // second appearance without prefetch loads again
        screen.appear();
        timeout(WAIT, screen.wait_ready()).await.unwrap().unwrap();
        assert_eq!(remote.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_second_prefetch_after_ready_is_refused() {
        let remote = Arc::new(FakeRemote::new().reply(Ok(listing())).reply(Ok(listing())));
        let screen = ContactListScreen::new(Arc::clone(&remote), Arc::new(session()), GroupRecord::new(2));
        assert!(screen.prefetch());
        timeout(WAIT, screen.wait_ready()).await.unwrap().unwrap();

        assert!(!screen.prefetch());
        timeout(WAIT, screen.wait_ready()).await.unwrap().unwrap();
        assert_eq!(remote.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_prefetch_wakes_waiter_and_keeps_list() {
        let screen = Arc::new(screen(FakeRemote::new().reply(Ok(listing())).stall()));
        assert!(screen.prefetch());

        let waiter = {
            let screen = Arc::clone(&screen);
            tokio::spawn(async move { screen.wait_ready().await })
        };
        tokio::task::yield_now().await;
        screen.cancel_prefetch();

        let result = timeout(WAIT, waiter).await.unwrap().unwrap();
        assert!(matches!(result, Err(GateError::Cancelled)));
        assert!(screen.with_list(|list| list.sections().is_empty()));
    }

    #[tokio::test]
    async fn test_appear_leaves_search_mode() {
        let screen = screen(FakeRemote::new().reply(Ok(listing())));
        screen.prefetch();
        timeout(WAIT, screen.wait_ready()).await.unwrap().unwrap();
        screen.search("do");
        assert!(screen.with_list(|list| list.is_searching()));
        screen.appear();
        assert!(!screen.with_list(|list| list.is_searching()));
    }

    #[tokio::test]
    async fn test_delete_last_in_section_then_cascade() {
        let remote = Arc::new(FakeRemote::new().reply(Ok(json!({
            "resource": [
                {"contact_by_contact_id": {"id": 5, "first_name": "Ann", "last_name": "Adams"}},
                {"contact_by_contact_id": {"id": 6, "first_name": "Bo", "last_name": "Berg"}}
            ]
        }))));
        let screen = ContactListScreen::new(Arc::clone(&remote), Arc::new(session()), GroupRecord::new(2));
        screen.prefetch();
        timeout(WAIT, screen.wait_ready()).await.unwrap().unwrap();

        let (record, handle) = screen.delete(RowRef::new(0, 0)).unwrap();
        assert_eq!(record.id, 5);
        screen.with_list(|list| {
            assert_eq!(list.sections().alphabet(), vec!["B"]);
            assert!(list.sections().get("A").is_none());
        });

        timeout(WAIT, handle).await.unwrap().unwrap().unwrap();
        let deletes: Vec<_> = remote
            .requests()
            .into_iter()
            .filter(|r| r.method == Method::Delete)
            .collect();
        assert_eq!(deletes.len(), 4);
    }

    #[tokio::test]
    async fn test_failed_cascade_keeps_local_removal() {
        let remote = FakeRemote::new()
            .reply(Ok(listing()))
            .reply(Ok(Value::Null))
            .reply(Err(ApiError::Status {
                status: 500,
                message: "nope".into(),
            }));
        let screen = screen(remote);
        screen.prefetch();
        timeout(WAIT, screen.wait_ready()).await.unwrap().unwrap();

        screen.search("d");
        let at = screen.with_list(|list| list.find(9)).unwrap();
        let (_, handle) = screen.delete(at).unwrap();
        let err = timeout(WAIT, handle).await.unwrap().unwrap().unwrap_err();
        assert_eq!(err.stage, DeleteStage::ContactInfo);

        screen.with_list(|list| {
            assert_eq!(list.row_count(0), 1);
            assert_eq!(list.sections().len(), 1);
        });
    }
}
