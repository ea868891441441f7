use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password, Select};
use expresarte::AppState;
use expresarte_auth::{AccessPolicy, Role};
use expresarte_config::{AcademicConfig, BootstrapConfig, DatabaseConfig, LoggingConfig};
use expresarte_db::{Database, run_migrations};
use expresarte_models::principals::{CreatePrincipalDto, PrincipalProfile};
use tracing::info;

#[derive(Parser)]
#[command(name = "expresarte-cli")]
#[command(about = "Expresarte CLI - Administrative tools for the academy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create the first super admin (no-op when one already exists)
    BootstrapAdmin {
        /// First name (falls back to ADMIN_FIRST_NAME)
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name (falls back to ADMIN_LAST_NAME)
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Email address (falls back to ADMIN_EMAIL, then a prompt)
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (falls back to ADMIN_PASSWORD, then a secure prompt)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Create a principal, acting as an existing account
    CreateUser {
        /// Email of the principal performing the operation
        #[arg(long = "as")]
        acting_as: String,

        #[arg(short = 'f', long)]
        first_name: Option<String>,

        #[arg(short = 'l', long)]
        last_name: Option<String>,

        #[arg(short = 'e', long)]
        email: Option<String>,

        /// super_admin, admin, academic, teacher or student
        #[arg(short = 'r', long, value_parser = parse_role)]
        role: Option<Role>,

        /// Optional; students are usually created without one
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    expresarte_observability::init_basic_console_logging(&LoggingConfig::from_env())?;

    let db = Database::connect(&DatabaseConfig::from_env()?)
        .await
        .map_err(|e| e.error)
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Migrate => handle_migrate(&db).await,
        Commands::BootstrapAdmin {
            first_name,
            last_name,
            email,
            password,
        } => {
            let config = bootstrap_config(first_name, last_name, email, password)?;
            handle_bootstrap_admin(&app_state(db), &config).await
        }
        Commands::CreateUser {
            acting_as,
            first_name,
            last_name,
            email,
            role,
            password,
        } => {
            let state = app_state(db);
            let dto = create_principal_dto(first_name, last_name, email, role, password)?;
            handle_create_user(&state, &acting_as, dto).await
        }
    }
}

fn app_state(db: Database) -> AppState {
    AppState::new(db, Arc::new(AccessPolicy::standard()), &AcademicConfig::from_env())
}

async fn handle_migrate(db: &Database) -> anyhow::Result<()> {
    run_migrations(db.pool()).await.context("Failed to run migrations")?;
    println!("✅ Migrations applied");
    Ok(())
}

async fn handle_bootstrap_admin(state: &AppState, config: &BootstrapConfig) -> anyhow::Result<()> {
    let admin = state
        .principals
        .bootstrap_super_admin(config)
        .await
        .map_err(|e| e.error)
        .context("Error bootstrapping super admin")?;

    println!("\n✅ Super admin ready");
    println!("   Email: {}", admin.email);
    println!("   Name: {}", admin.full_name());
    Ok(())
}

async fn handle_create_user(
    state: &AppState,
    acting_as: &str,
    dto: CreatePrincipalDto,
) -> anyhow::Result<()> {
    let actor = state
        .principals
        .resolve_actor(acting_as)
        .await
        .map_err(|e| e.error)
        .context("Could not resolve the acting principal")?;

    let principal = state
        .principals
        .create_principal(Some(&actor), dto)
        .await
        .map_err(|e| anyhow::anyhow!("{}: {}", e.kind, e.error))?;

    info!(principal_id = %principal.id, "principal created from cli");
    println!("\n✅ {} created", principal.role);
    println!("   Email: {}", principal.email);
    println!("   Name: {}", principal.full_name());
    Ok(())
}

/// Arguments first, then `ADMIN_*` variables, then interactive prompts for
/// anything still missing.
fn bootstrap_config(
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<BootstrapConfig> {
    let email = match email.or_else(|| env_var("ADMIN_EMAIL")) {
        Some(email) => email,
        None => prompt_text("Email address")?,
    };
    let password = match password.or_else(|| env_var("ADMIN_PASSWORD")) {
        Some(password) => password,
        None => prompt_password(true)?,
    };

    BootstrapConfig::from_lookup(|key| match key {
        "ADMIN_FIRST_NAME" => first_name.clone().or_else(|| env_var(key)),
        "ADMIN_LAST_NAME" => last_name.clone().or_else(|| env_var(key)),
        "ADMIN_EMAIL" => Some(email.clone()),
        "ADMIN_PASSWORD" => Some(password.clone()),
        _ => None,
    })
}

fn create_principal_dto(
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    role: Option<Role>,
    password: Option<String>,
) -> anyhow::Result<CreatePrincipalDto> {
    let first_name = first_name.map_or_else(|| prompt_text("First name"), Ok)?;
    let last_name = last_name.map_or_else(|| prompt_text("Last name"), Ok)?;
    let email = email.map_or_else(|| prompt_text("Email address"), Ok)?;
    let role = role.map_or_else(prompt_role, Ok)?;

    Ok(CreatePrincipalDto {
        first_name,
        last_name,
        email,
        password: password.filter(|p| !p.is_empty()),
        role,
        profile: PrincipalProfile::default(),
    })
}

fn parse_role(value: &str) -> Result<Role, String> {
    value.parse().map_err(|e: expresarte::expresarte_core::AppError| e.error.to_string())
}

fn env_var(key: &str) -> Option<String> {
    expresarte_config::load_dotenv();
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn prompt_text(prompt: &str) -> anyhow::Result<String> {
    Input::new()
        .with_prompt(prompt)
        .interact_text()
        .with_context(|| format!("Failed to read {}", prompt.to_lowercase()))
}

fn prompt_password(confirm: bool) -> anyhow::Result<String> {
    let mut input = Password::new().with_prompt("Password");
    if confirm {
        input = input.with_confirmation("Confirm password", "Passwords don't match");
    }
    input.interact().context("Failed to read password")
}

fn prompt_role() -> anyhow::Result<Role> {
    let labels: Vec<&str> = Role::ALL.iter().map(|r| r.as_str()).collect();
    let index = Select::new()
        .with_prompt("Role")
        .items(&labels)
        .default(labels.len() - 1)
        .interact()
        .context("Failed to read role")?;
    Ok(Role::ALL[index])
}
