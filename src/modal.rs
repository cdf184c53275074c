/// Which dialog a CRUD page shows.
///
/// Only one dialog is open at a time; opening another replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalState<T> {
  Closed,
  /// Form for a new record
  Create,
  /// Form prefilled with an existing record
  Edit(T),
  /// Yes/no confirmation before deleting the record with this id
  ConfirmDelete(String),
}

impl<T> Default for ModalState<T> {
  fn default() -> Self {
    ModalState::Closed
  }
}

impl<T> ModalState<T> {
  pub fn open_create(&mut self) {
    *self = ModalState::Create;
  }

  pub fn open_edit(&mut self, record: T) {
    *self = ModalState::Edit(record);
  }

  pub fn confirm_delete(&mut self, id: impl Into<String>) {
    *self = ModalState::ConfirmDelete(id.into());
  }

  pub fn close(&mut self) {
    *self = ModalState::Closed;
  }

  pub fn is_open(&self) -> bool {
    !matches!(self, ModalState::Closed)
  }

  pub fn editing(&self) -> Option<&T> {
    match self {
      ModalState::Edit(record) => Some(record),
      _ => None,
    }
  }

  pub fn pending_delete(&self) -> Option<&str> {
    match self {
      ModalState::ConfirmDelete(id) => Some(id),
      _ => None,
    }
  }
}
