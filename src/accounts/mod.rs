//! Customer support accounts: the users settings page and the
//! forward-to-colleague dialog.

mod columns;
mod page;
mod types;

use serde_json::json;

use crate::identity::RequestIdentity;
use crate::mutation::Mutation;

pub use columns::{forward_table, users_table};
pub use page::{UsersPage, UsersView};
pub use types::{Role, User, STATUS_ONLINE};

pub const USERS_PATH: &str = "accounts/customer-support-agents";
pub const DELETE_USER_PATH: &str = "accounts/delete";

pub const NOTIFICATION_TITLE: &str = "Notification";
pub const ERROR_TITLE: &str = "Error";
pub const USER_DELETED: &str = "User deleted";

/// The account list, served by the legacy backend.
pub fn users_identity() -> RequestIdentity {
  RequestIdentity::legacy(USERS_PATH)
}

/// Delete an account and refresh the account list.
pub fn delete_user(id_code: &str) -> Mutation {
  Mutation::post(RequestIdentity::legacy(DELETE_USER_PATH))
    .with_body(json!({ "userIdCode": id_code }))
    .invalidates(users_identity())
    .notify_success(NOTIFICATION_TITLE, USER_DELETED)
    .error_title(ERROR_TITLE)
}
