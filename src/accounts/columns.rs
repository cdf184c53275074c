use crate::table::{Column, Table};

use super::types::User;

/// The settings page listing every account.
pub fn users_table() -> Table<User> {
  Table::new(vec![
    Column::new("name", "Name", User::full_name),
    Column::new("idCode", "ID code", |u: &User| u.id_code.clone()),
    Column::new("roles", "Role", User::role_labels)
      .cell(|value, _| value.to_string())
      .filter_fn(|u: &User, filter: &str| {
        let needle = filter.to_lowercase();
        u.authorities
          .iter()
          .any(|role| role.label().to_lowercase().contains(&needle))
      }),
    Column::new("displayName", "Display name", |u: &User| u.display_name.clone()),
    Column::new("csaTitle", "Title", |u: &User| u.csa_title.clone()),
    Column::new("csaEmail", "Email", |u: &User| u.csa_email.clone()),
    Column::display("edit", "", |_: &User| "Edit".to_string()),
    Column::display("delete", "", |_: &User| "Delete".to_string()),
  ])
}

/// Colleagues a chat can be forwarded to.
pub fn forward_table(only_active: bool) -> Table<User> {
  let table = Table::new(vec![
    Column::new("displayName", "Name", |u: &User| u.display_name.clone()),
    Column::new("csaTitle", "Title", |u: &User| u.csa_title.clone()),
    Column::new("customerSupportStatus", "Status", |u: &User| {
      u.customer_support_status.clone()
    })
    .cell(|value, _| status_label(&value.to_string()).to_string()),
    Column::display("forward", "", |_: &User| "Forward".to_string()),
  ]);

  if only_active {
    table.with_row_filter(User::is_online)
  } else {
    table
  }
}

fn status_label(status: &str) -> &'static str {
  match status {
    "online" => "Online",
    "idle" => "Idle",
    _ => "Offline",
  }
}
