use std::sync::Arc;

use admin_client::{
    config::normalize_base_url,
    error::Notice,
    load_settings, AgentDirectory, Completion, ContainerLimitsForm, DealBoard, FilterCriteria,
    HttpTransport, Keyed, ListSnapshot, PagedListController, PermissionEditor,
    PropertyManagement, ReqwestTransport, UserManagement,
};
use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use shared::domain::{
    AccountStatus, AgentId, DealId, DealStatus, ListingStatus, PropertyId, UserId, UserRole,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "estate-console", about = "Marketplace admin console")]
struct Cli {
    /// Overrides `api_base_url` from client.toml / the environment.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
struct Paging {
    /// How many pages to load before printing.
    #[arg(long, default_value_t = 1)]
    pages: u32,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Users(UsersCommand),
    #[command(subcommand)]
    Properties(PropertiesCommand),
    Agents {
        #[arg(long)]
        search: Option<String>,
        /// Client-side filter over the loaded agents.
        #[arg(long)]
        grep: Option<String>,
        #[command(flatten)]
        paging: Paging,
    },
    #[command(subcommand)]
    Deals(DealsCommand),
    #[command(subcommand)]
    Permissions(PermissionsCommand),
    #[command(subcommand)]
    Limits(LimitsCommand),
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        role: Option<UserRole>,
        #[arg(long)]
        status: Option<AccountStatus>,
        #[command(flatten)]
        paging: Paging,
    },
    Delete {
        id: i64,
    },
    SetRole {
        id: i64,
        role: UserRole,
    },
    SetStatus {
        id: i64,
        status: AccountStatus,
    },
}

#[derive(Subcommand, Debug)]
enum PropertiesCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<ListingStatus>,
        #[arg(long)]
        city: Option<String>,
        #[command(flatten)]
        paging: Paging,
    },
    Delete {
        id: i64,
    },
    SetStatus {
        id: i64,
        status: ListingStatus,
    },
}

#[derive(Subcommand, Debug)]
enum DealsCommand {
    List {
        #[arg(long)]
        agent_id: Option<i64>,
        #[arg(long)]
        status: Option<DealStatus>,
        #[command(flatten)]
        paging: Paging,
    },
    SetStatus {
        id: i64,
        status: DealStatus,
    },
}

#[derive(Subcommand, Debug)]
enum PermissionsCommand {
    Show {
        user_id: i64,
        #[arg(long)]
        filter: Option<String>,
    },
    /// Flips each listed permission, then saves.
    Toggle {
        user_id: i64,
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum LimitsCommand {
    Show {
        agent_id: i64,
    },
    /// Fields left out keep their current value; pass "" for unlimited.
    Set {
        agent_id: i64,
        #[arg(long)]
        max_listings: Option<String>,
        #[arg(long)]
        max_active_deals: Option<String>,
        #[arg(long)]
        max_images: Option<String>,
    },
}

fn criteria(pairs: &[(&str, Option<String>)]) -> FilterCriteria {
    let mut criteria = FilterCriteria::new();
    for (name, value) in pairs {
        if let Some(value) = value {
            criteria.set(*name, value);
        }
    }
    criteria
}

/// Pages forward from an already-issued first-page fetch.
async fn load_pages<T>(
    controller: &PagedListController<T>,
    first: Completion,
    paging: Paging,
) -> Result<ListSnapshot<T>>
where
    T: Keyed + Clone + Send + Sync + 'static,
{
    if let Completion::Failed(err) = first {
        let context = format!("failed to load {}", controller.name());
        return Err(anyhow::Error::new(err).context(context));
    }
    for _ in 1..paging.pages.max(1) {
        match controller.load_next_page().await {
            None => break,
            Some(Completion::Failed(err)) => {
                tracing::warn!(list = controller.name(), error = %err, "stopped paging early");
                break;
            }
            Some(_) => {}
        }
    }
    Ok(controller.snapshot().await)
}

fn print_footer<T>(snapshot: &ListSnapshot<T>) {
    println!(
        "-- {} item(s), page {}/{}",
        snapshot.items.len(),
        snapshot.cursor.page,
        snapshot.cursor.total_pages
    );
}

fn notice(notice: Notice) -> anyhow::Error {
    anyhow!(notice)
}

async fn run_users(transport: Arc<dyn HttpTransport>, command: UsersCommand) -> Result<()> {
    let screen = UserManagement::new(transport);
    let completion = match command {
        UsersCommand::List {
            search,
            role,
            status,
            paging,
        } => {
            let filter = criteria(&[
                ("search", search),
                ("role", role.map(|r| r.to_string())),
                ("status", status.map(|s| s.to_string())),
            ]);
            let first = screen.users().set_filter(filter).await;
            let snapshot = load_pages(screen.users(), first, paging).await?;
            for user in &snapshot.items {
                println!(
                    "{:>6}  {:<24} {:<32} {:<9} {}",
                    user.id, user.name, user.email, user.role, user.status
                );
            }
            print_footer(&snapshot);
            return Ok(());
        }
        UsersCommand::Delete { id } => screen.delete_user(UserId(id)).await.map_err(notice)?,
        UsersCommand::SetRole { id, role } => screen
            .update_role(UserId(id), role)
            .await
            .map_err(notice)?,
        UsersCommand::SetStatus { id, status } => screen
            .update_status(UserId(id), status)
            .await
            .map_err(notice)?,
    };
    report_refetch(completion);
    Ok(())
}

async fn run_properties(
    transport: Arc<dyn HttpTransport>,
    command: PropertiesCommand,
) -> Result<()> {
    let screen = PropertyManagement::new(transport);
    let completion = match command {
        PropertiesCommand::List {
            search,
            status,
            city,
            paging,
        } => {
            let filter = criteria(&[
                ("search", search),
                ("status", status.map(|s| s.to_string())),
                ("city", city),
            ]);
            let first = screen.properties().set_filter(filter).await;
            let snapshot = load_pages(screen.properties(), first, paging).await?;
            for property in &snapshot.items {
                println!(
                    "{:>6}  {:<32} {:<16} {:>12} {}",
                    property.id, property.title, property.city, property.price, property.status
                );
            }
            print_footer(&snapshot);
            return Ok(());
        }
        PropertiesCommand::Delete { id } => screen
            .delete_property(PropertyId(id))
            .await
            .map_err(notice)?,
        PropertiesCommand::SetStatus { id, status } => screen
            .update_status(PropertyId(id), status)
            .await
            .map_err(notice)?,
    };
    report_refetch(completion);
    Ok(())
}

async fn run_agents(
    transport: Arc<dyn HttpTransport>,
    search: Option<String>,
    grep: Option<String>,
    paging: Paging,
) -> Result<()> {
    let screen = AgentDirectory::new(transport);
    let first = screen.agents().set_filter(criteria(&[("search", search)])).await;
    let snapshot = load_pages(screen.agents(), first, paging).await?;
    let agents = match grep {
        Some(query) => screen.search_loaded(&query).await,
        None => snapshot.items.clone(),
    };
    for agent in &agents {
        println!(
            "{:>6}  {:<24} {:<32} {:<14} {} closed",
            agent.id,
            agent.name,
            agent.email,
            agent.phone.as_deref().unwrap_or("-"),
            agent.deals_closed
        );
    }
    print_footer(&snapshot);
    Ok(())
}

async fn run_deals(transport: Arc<dyn HttpTransport>, command: DealsCommand) -> Result<()> {
    let board = DealBoard::new(transport);
    match command {
        DealsCommand::List {
            agent_id,
            status,
            paging,
        } => {
            let first = board.show(agent_id.map(AgentId), status).await;
            let snapshot = load_pages(board.deals(), first, paging).await?;
            for deal in &snapshot.items {
                println!(
                    "{:>6}  property {:<6} agent {:<6} {:>12} {}",
                    deal.id, deal.property_id, deal.agent_id, deal.amount, deal.status
                );
            }
            print_footer(&snapshot);
        }
        DealsCommand::SetStatus { id, status } => {
            let completion = board
                .update_status(DealId(id), status)
                .await
                .map_err(notice)?;
            report_refetch(completion);
        }
    }
    Ok(())
}

async fn run_permissions(
    transport: Arc<dyn HttpTransport>,
    command: PermissionsCommand,
) -> Result<()> {
    match command {
        PermissionsCommand::Show { user_id, filter } => {
            let mut editor = PermissionEditor::new(transport, UserId(user_id));
            editor.load().await.map_err(notice)?;
            for permission in editor.visible(filter.as_deref().unwrap_or("")) {
                let mark = if permission.granted { "x" } else { " " };
                println!("[{mark}] {:<28} {}", permission.key, permission.label);
            }
        }
        PermissionsCommand::Toggle { user_id, keys } => {
            let mut editor = PermissionEditor::new(transport, UserId(user_id));
            editor.load().await.map_err(notice)?;
            for key in &keys {
                match editor.toggle(key) {
                    Some(granted) => {
                        println!("{key}: {}", if granted { "granted" } else { "revoked" })
                    }
                    None => bail!("user {user_id} has no permission `{key}`"),
                }
            }
            if !editor.is_dirty() {
                println!("no changes to save");
                return Ok(());
            }
            editor.save().await.map_err(notice)?;
            println!("saved {} granted permission(s)", editor.granted_keys().len());
        }
    }
    Ok(())
}

async fn run_limits(transport: Arc<dyn HttpTransport>, command: LimitsCommand) -> Result<()> {
    let show = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_else(|| "unlimited".into());
    match command {
        LimitsCommand::Show { agent_id } => {
            let mut form = ContainerLimitsForm::new(transport, AgentId(agent_id));
            let limits = form.load().await.map_err(notice)?;
            println!("max listings:           {}", show(limits.max_listings));
            println!("max active deals:       {}", show(limits.max_active_deals));
            println!("max images per listing: {}", show(limits.max_images_per_listing));
        }
        LimitsCommand::Set {
            agent_id,
            max_listings,
            max_active_deals,
            max_images,
        } => {
            let mut form = ContainerLimitsForm::new(transport, AgentId(agent_id));
            form.load().await.map_err(notice)?;
            if let Some(v) = max_listings {
                form.inputs.max_listings = v;
            }
            if let Some(v) = max_active_deals {
                form.inputs.max_active_deals = v;
            }
            if let Some(v) = max_images {
                form.inputs.max_images_per_listing = v;
            }
            let saved = form.save().await?;
            println!(
                "saved: listings {}, active deals {}, images {}",
                show(saved.max_listings),
                show(saved.max_active_deals),
                show(saved.max_images_per_listing)
            );
        }
    }
    Ok(())
}

fn report_refetch(completion: Completion) {
    match completion {
        Completion::Applied { .. } => println!("done"),
        Completion::Failed(err) => println!("done, but the list could not be reloaded: {err}"),
        Completion::Stale => println!("done"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings()?;
    if let Some(url) = cli.api_url {
        settings.api_base_url = normalize_base_url(&url)?;
    }
    if let Some(token) = cli.token {
        settings.auth_token = Some(token);
    }
    tracing::debug!(api = %settings.api_base_url, "using api");

    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::from_settings(&settings)?);
    match cli.command {
        Command::Users(command) => run_users(transport, command).await,
        Command::Properties(command) => run_properties(transport, command).await,
        Command::Agents {
            search,
            grep,
            paging,
        } => run_agents(transport, search, grep, paging).await,
        Command::Deals(command) => run_deals(transport, command).await,
        Command::Permissions(command) => run_permissions(transport, command).await,
        Command::Limits(command) => run_limits(transport, command).await,
    }
}
