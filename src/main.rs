use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use groupbook::config::{self, Config};
use groupbook::model::GroupRecord;
use groupbook::remote::HttpRemote;
use groupbook::screen::ContactListScreen;

#[derive(Parser, Debug)]
#[command(name = "groupbook", about = "Browse and prune the contacts of a group")]
struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the group's contacts by first letter of last name
    List(GroupArgs),
    /// Show contacts whose last name starts with QUERY
    Search(SearchArgs),
    /// Delete a contact and everything that references it
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
struct GroupArgs {
    /// Contact group id
    #[arg(long)]
    group: i64,
}

#[derive(Args, Debug)]
struct SearchArgs {
    #[command(flatten)]
    group: GroupArgs,

    query: String,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    #[command(flatten)]
    group: GroupArgs,

    #[arg(value_name = "CONTACT_ID")]
    contact_id: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;
    log::debug!("loaded configuration from {}", config.config_path.display());

    match cli.command {
        Command::List(args) => handle_list(&config, args).await,
        Command::Search(args) => handle_search(&config, args).await,
        Command::Delete(args) => handle_delete(&config, args).await,
    }
}

async fn open_screen(config: &Config, group: &GroupArgs) -> Result<ContactListScreen<HttpRemote>> {
    let screen = ContactListScreen::new(
        Arc::new(HttpRemote::new()),
        Arc::new(config.session()),
        GroupRecord::new(group.group),
    );
    screen.appear();
    screen
        .wait_ready()
        .await
        .with_context(|| format!("failed to load contacts of group {}", group.group))?;
    Ok(screen)
}

fn print_rows(screen: &ContactListScreen<HttpRemote>) {
    screen.with_list(|list| {
        for (title, contacts) in list.rows() {
            println!("{}", title);
            for contact in contacts {
                println!("  {}\t{}", contact.full_name(), contact.id);
            }
        }
    });
}

async fn handle_list(config: &Config, args: GroupArgs) -> Result<()> {
    let screen = open_screen(config, &args).await?;

    let total = screen.with_list(|list| list.sections().len());
    if total == 0 {
        println!("Group {} has no contacts", args.group);
        return Ok(());
    }
    let index = screen.with_list(|list| list.sections().alphabet().join(" "));
    println!("Index: {}", index);
    print_rows(&screen);
    Ok(())
}

async fn handle_search(config: &Config, args: SearchArgs) -> Result<()> {
    if args.query.trim().is_empty() {
        bail!("search query must not be empty");
    }
    let screen = open_screen(config, &args.group).await?;
    screen.search(&args.query);

    let found = screen.with_list(|list| list.row_count(0));
    if found == 0 {
        println!("No matches for \"{}\"", args.query);
        return Ok(());
    }
    println!("Found {} contact(s) matching \"{}\"", found, args.query);
    print_rows(&screen);
    Ok(())
}

async fn handle_delete(config: &Config, args: DeleteArgs) -> Result<()> {
    let screen = open_screen(config, &args.group).await?;

    let at = screen
        .with_list(|list| list.find(args.contact_id))
        .with_context(|| {
            format!(
                "contact {} is not in group {}",
                args.contact_id, args.group.group
            )
        })?;

    let (record, handle) = screen
        .delete(at)
        .context("contact disappeared before it could be removed")?;

    handle
        .await
        .context("delete task panicked")?
        .context("remote delete did not complete")?;

    println!("Deleted {} ({})", record.full_name(), record.id);
    Ok(())
}
