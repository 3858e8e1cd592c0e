//! Context provider: the entry point a UI tree binds to.
//!
//! A `Provider` owns the store and dispatcher for one mounted tree. Mounting
//! issues the initial `GET_LIST` exactly once; descendants read state and
//! dispatch intents through the `Context` handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{GraphQlTodoApi, TodoApi};
use crate::client::GraphQlClient;
use crate::dispatcher::{DispatchFuture, Dispatcher};
use crate::store::{Action, AppState, Store};

/// What descendants receive: a state snapshot and the intent dispatcher.
pub struct Context<A> {
    pub state: Arc<AppState>,
    pub dispatch: Dispatcher<A>,
}

/// Owns the store and dispatcher for one todo screen. `mount` fetches the
/// initial list the first time it is called and never again.
pub struct Provider<A> {
    dispatcher: Dispatcher<A>,
    mounted: AtomicBool,
}

impl Provider<GraphQlTodoApi> {
    /// A provider whose CRUD calls go through `client`.
    pub fn new(client: Arc<GraphQlClient>) -> Self {
        Self::with_api(Arc::new(GraphQlTodoApi::new(client)))
    }

    pub fn client(&self) -> &Arc<GraphQlClient> {
        self.dispatcher.api().client()
    }
}

impl<A: TodoApi> Provider<A> {
    pub fn with_api(api: Arc<A>) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::new(Store::default()), api),
            mounted: AtomicBool::new(false),
        }
    }

    /// Issue the initial list fetch. Only the first call does anything.
    pub fn mount(&self) -> Option<DispatchFuture> {
        if self.mounted.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.dispatcher.dispatch(Action::get_list()))
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn context(&self) -> Context<A> {
        Context {
            state: self.dispatcher.state(),
            dispatch: self.dispatcher.clone(),
        }
    }

    /// Receiver that is marked changed on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.dispatcher.store().subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::error::ApiError;
    use crate::types::{ListPayload, Todo};

    #[derive(Default)]
    struct CountingApi {
        lists: AtomicUsize,
    }

    #[async_trait]
    impl TodoApi for CountingApi {
        async fn get_list(&self) -> Result<ListPayload, ApiError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            Ok(ListPayload::new(vec![Todo {
                id: Uuid::from_u128(1),
                content: "seeded".to_string(),
                completed: false,
            }]))
        }

        async fn add(&self, _content: &str) -> Result<ListPayload, ApiError> {
            self.get_list().await
        }

        async fn delete_todo(&self, _ids: &[Uuid]) -> Result<ListPayload, ApiError> {
            self.get_list().await
        }

        async fn edit_todo(&self, _id: Uuid, _content: &str) -> Result<ListPayload, ApiError> {
            self.get_list().await
        }

        async fn search_todo(&self, _content: &str) -> Result<ListPayload, ApiError> {
            self.get_list().await
        }

        async fn set_completed(&self, _id: Uuid, _completed: bool) -> Result<ListPayload, ApiError> {
            self.get_list().await
        }
    }

    #[tokio::test]
    async fn mount_fetches_exactly_once() {
        let api = Arc::new(CountingApi::default());
        let provider = Provider::with_api(api.clone());
        assert!(!provider.is_mounted());

        provider.mount().unwrap().await.unwrap();
        assert!(provider.mount().is_none());
        assert!(provider.mount().is_none());

        assert_eq!(api.lists.load(Ordering::SeqCst), 1);
        assert_eq!(provider.context().state.todo_list[0].content, "seeded");
    }

    #[tokio::test]
    async fn context_starts_from_initial_state() {
        let provider = Provider::with_api(Arc::new(CountingApi::default()));
        let ctx = provider.context();
        assert_eq!(*ctx.state, AppState::default());
    }

    #[tokio::test]
    async fn subscribers_see_loading_then_list() {
        let provider = Provider::with_api(Arc::new(CountingApi::default()));
        let mut rx = provider.subscribe();

        let pending = provider.mount().unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().loading);

        pending.await.unwrap();
        rx.changed().await.unwrap();
        let state = rx.borrow_and_update().clone();
        assert!(!state.loading);
        assert_eq!(state.todo_list.len(), 1);
    }

    #[tokio::test]
    async fn dispatch_through_context_updates_provider_state() {
        let provider = Provider::with_api(Arc::new(CountingApi::default()));
        let ctx = provider.context();
        ctx.dispatch
            .dispatch(Action::Add {
                content: "x".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(provider.context().state.todo_list.len(), 1);
    }
}
