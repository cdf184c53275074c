use tracing::debug;

use crate::cache::{QueryClient, QuerySubscription};
use crate::error::QueryError;
use crate::modal::ModalState;
use crate::mutation::{MutationPipeline, MutationState};
use crate::render::RenderedTable;
use crate::table::{Table, TableState};

use super::types::User;
use super::{delete_user, users_identity, users_table};

/// What the users page shows right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsersView {
  Loading,
  Failed(String),
  /// `refreshing` while a refetch runs behind the shown rows; `error` when
  /// the latest fetch failed and the rows are stale
  Ready {
    table: RenderedTable,
    refreshing: bool,
    error: Option<String>,
  },
}

/// State behind the users settings page.
///
/// Rows are always read from the cache entry when rendering, never copied
/// into the page, so an invalidation shows up on the next render.
pub struct UsersPage {
  users: QuerySubscription,
  table: Table<User>,
  pub table_state: TableState,
  pub modal: ModalState<User>,
  delete_state: MutationState<()>,
}

impl UsersPage {
  pub fn open(client: &QueryClient) -> Result<Self, QueryError> {
    Ok(Self {
      users: client.subscribe(users_identity())?,
      table: users_table(),
      table_state: TableState::default(),
      modal: ModalState::default(),
      delete_state: MutationState::Idle,
    })
  }

  /// Wait for the account list to finish loading.
  pub async fn settled(&mut self) -> Result<(), QueryError> {
    self.users.settled().await.map(|_| ())
  }

  /// Wait for the next change to the account list.
  pub async fn changed(&mut self) -> Result<(), QueryError> {
    self.users.changed().await.map(|_| ())
  }

  pub fn users(&self) -> Result<Vec<User>, QueryError> {
    Ok(
      self
        .users
        .state_as::<Vec<User>>()?
        .data()
        .cloned()
        .unwrap_or_default(),
    )
  }

  pub fn view(&self) -> UsersView {
    let state = match self.users.state_as::<Vec<User>>() {
      Ok(state) => state,
      Err(e) => return UsersView::Failed(e.to_string()),
    };

    match (state.data(), state.error()) {
      (Some(users), _) => {
        let page = self.table.page(users, &self.table_state);
        UsersView::Ready {
          table: RenderedTable::new(&self.table, &page),
          refreshing: state.is_loading(),
          error: state.error().map(ToString::to_string),
        }
      }
      (None, Some(error)) => UsersView::Failed(error.to_string()),
      (None, None) => UsersView::Loading,
    }
  }

  pub fn delete_state(&self) -> &MutationState<()> {
    &self.delete_state
  }

  /// Ask for confirmation before deleting `id_code`.
  pub fn request_delete(&mut self, id_code: &str) {
    self.modal.confirm_delete(id_code);
  }

  /// Delete the account awaiting confirmation, if any.
  ///
  /// The dialog closes on success and stays open on failure.
  pub async fn confirm_delete(&mut self, pipeline: &MutationPipeline) -> Result<(), QueryError> {
    let Some(id_code) = self.modal.pending_delete().map(str::to_string) else {
      return Ok(());
    };

    debug!(%id_code, "deleting user");
    self.delete_state = MutationState::Loading;
    let result = pipeline.mutate(delete_user(&id_code)).await.map(|_| ());
    self.delete_state = MutationState::from_result(&result);

    if result.is_ok() {
      self.modal.close();
    }
    result
  }
}
