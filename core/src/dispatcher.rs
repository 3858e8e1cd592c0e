//! Async intent dispatcher.
//!
//! # Design
//! `dispatch` runs in two phases. The synchronous phase happens before it
//! returns: intents mark the store as loading, any other action goes straight
//! to the reducer. The returned future performs the CRUD call and dispatches
//! `GET_LIST` with the list it resolved to.
//!
//! Responses are not fenced. When several intents are in flight, whichever
//! call resolves last decides the final list. A failed call returns its
//! error and leaves `loading` set.

use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tracing::{debug, warn};

use crate::api::TodoApi;
use crate::error::ApiError;
use crate::store::{Action, AppState, Store};
use crate::types::ListPayload;

/// Future returned by `Dispatcher::dispatch`.
pub type DispatchFuture = BoxFuture<'static, Result<(), ApiError>>;

type ApiCall = BoxFuture<'static, Result<ListPayload, ApiError>>;

/// Turns intents into CRUD calls against `A` and folds their results into
/// the shared `Store`. Cheap to clone.
pub struct Dispatcher<A> {
    store: Arc<Store>,
    api: Arc<A>,
}

impl<A> Clone for Dispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: TodoApi> Dispatcher<A> {
    pub fn new(store: Arc<Store>, api: Arc<A>) -> Self {
        Self { store, api }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn state(&self) -> Arc<AppState> {
        self.store.state()
    }

    pub fn dispatch(&self, action: Action) -> DispatchFuture {
        let kind = action.kind();
        let call = match self.api_call(action) {
            Ok(call) => call,
            Err(action) => {
                self.store.dispatch(&action);
                return future::ready(Ok(())).boxed();
            }
        };

        self.store.dispatch(&Action::SetLoading);
        debug!(intent = kind, "intent started");

        let store = Arc::clone(&self.store);
        async move {
            match call.await {
                Ok(payload) => {
                    store.dispatch(&Action::GetList {
                        todo_list: payload.into_todo_list(),
                    });
                    debug!(intent = kind, "intent resolved");
                    Ok(())
                }
                Err(error) => {
                    warn!(intent = kind, %error, "intent failed");
                    Err(error)
                }
            }
        }
        .boxed()
    }

    /// Map an intent to its CRUD call. Non-intents are handed back unchanged.
    fn api_call(&self, action: Action) -> Result<ApiCall, Action> {
        let api = Arc::clone(&self.api);
        let call: ApiCall = match action {
            Action::GetList { .. } => async move { api.get_list().await }.boxed(),
            Action::Add { content } => async move { api.add(&content).await }.boxed(),
            Action::Delete { ids } => async move { api.delete_todo(&ids).await }.boxed(),
            Action::Edit { id, content } => {
                async move { api.edit_todo(id, &content).await }.boxed()
            }
            Action::Search { content } => {
                async move { api.search_todo(&content).await }.boxed()
            }
            Action::SetCompleted { id, completed } => {
                async move { api.set_completed(id, completed).await }.boxed()
            }
            other => return Err(other),
        };
        Ok(call)
    }
}
