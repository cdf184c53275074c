use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use console_query::accounts::{UsersPage, UsersView};
use console_query::config::Config;
use console_query::logging;
use console_query::notify::ChannelNotifier;
use console_query::table::{SortKey, DEFAULT_PAGE_SIZE};
use console_query::{MutationPipeline, QueryClient, RequestIdentity};

const MAX_CELL_WIDTH: usize = 40;

#[derive(Parser, Debug)]
#[command(name = "console-query")]
#[command(about = "Query the administrative console backends from the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/console-query/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Write logs to this file instead of stderr
  #[arg(long, global = true)]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Fetch a resource and print the JSON the console would see
  Fetch {
    /// Resource path, e.g. accounts/customer-support-agents
    path: String,

    /// Backend variant: prod, prod-2 or an absolute http(s) origin
    #[arg(long)]
    variant: Option<String>,
  },

  /// Print a page of the users table
  Users {
    /// Case-insensitive text to search in every column
    #[arg(short, long)]
    filter: Option<String>,

    /// Sort key, most significant first (repeatable)
    #[arg(short, long, value_name = "COLUMN[:desc]")]
    sort: Vec<String>,

    /// Page number, starting at 1
    #[arg(short, long, default_value_t = 1)]
    page: usize,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,
  },

  /// Delete a user account
  DeleteUser {
    /// The account's id code
    id_code: String,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init_tracing(args.log_file.as_deref())?;

  let config = Config::load(args.config.as_deref())?;
  let client = QueryClient::from_config(&config)?;

  let result = match args.command {
    Command::Fetch { path, variant } => fetch(&client, path, variant).await,
    Command::Users {
      filter,
      sort,
      page,
      page_size,
    } => users(&client, filter, &sort, page, page_size).await,
    Command::DeleteUser { id_code } => delete_user(&client, &id_code).await,
  };

  client.clear();
  result
}

async fn fetch(client: &QueryClient, path: String, variant: Option<String>) -> Result<()> {
  let identity = RequestIdentity::from_variant(path, variant.as_deref())?;
  let data = client.fetch(identity).await?;
  println!("{}", serde_json::to_string_pretty(&*data)?);
  Ok(())
}

async fn users(
  client: &QueryClient,
  filter: Option<String>,
  sort: &[String],
  page: usize,
  page_size: usize,
) -> Result<()> {
  let mut users = UsersPage::open(client)?;
  users.table_state.set_page_size(page_size);
  if let Some(filter) = filter {
    users.table_state.set_global_filter(filter);
  }
  users.table_state.sorting = sort
    .iter()
    .map(|s| parse_sort_key(s))
    .collect::<Result<_>>()?;
  users.table_state.set_page(page.saturating_sub(1));

  users.settled().await?;
  match users.view() {
    UsersView::Ready { table, error, .. } => {
      if let Some(error) = error {
        eprintln!("Showing cached users, refresh failed: {}", error);
      }
      println!("{}", table.to_text(MAX_CELL_WIDTH));
      Ok(())
    }
    UsersView::Failed(message) => Err(eyre!(message)),
    UsersView::Loading => Err(eyre!("Users are still loading")),
  }
}

async fn delete_user(client: &QueryClient, id_code: &str) -> Result<()> {
  let (notifier, mut notifications) = ChannelNotifier::new();
  let pipeline = MutationPipeline::new(client.clone(), Arc::new(notifier));

  let mut users = UsersPage::open(client)?;
  users.settled().await?;
  users.request_delete(id_code);
  let result = users.confirm_delete(&pipeline).await;

  while let Ok(notification) = notifications.try_recv() {
    println!("{}: {}", notification.title, notification.message);
  }
  result?;

  users.settled().await?;
  println!("{} users remaining", users.users()?.len());
  Ok(())
}

/// Parse `column` or `column:asc` / `column:desc`.
fn parse_sort_key(value: &str) -> Result<SortKey> {
  match value.split_once(':') {
    None => Ok(SortKey::asc(value)),
    Some((column, "asc")) => Ok(SortKey::asc(column)),
    Some((column, "desc")) => Ok(SortKey::desc(column)),
    Some((_, direction)) => Err(eyre!(
      "Invalid sort direction '{}', expected asc or desc",
      direction
    )),
  }
}
