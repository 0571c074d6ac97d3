//! `admin` command handlers.

use anyhow::Context;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use clap::Subcommand;
use utrabeauty_cms::UserDocument;
use utrabeauty_core::AppConfig;
use utrabeauty_db::NewUser;

use crate::{cms_client, connect};

const MIN_PASSWORD_LENGTH: usize = 12;
const ROLES: [&str; 2] = ["admin", "customer"];

/// Sub-commands available under `admin`.
#[derive(Debug, Subcommand)]
pub enum AdminCommands {
    /// Create a user with a hashed password
    Create {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        /// Falls back to `UTRABEAUTY_ADMIN_PASSWORD` so it stays out of shell history
        #[arg(long, env = "UTRABEAUTY_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, default_value = "admin")]
        role: String,

        /// Also mirror the user into the CMS as a `user` document
        #[arg(long)]
        sync_cms: bool,
    },
}

pub(crate) async fn run_admin(config: &AppConfig, command: AdminCommands) -> anyhow::Result<()> {
    match command {
        AdminCommands::Create {
            email,
            name,
            password,
            role,
            sync_cms,
        } => run_admin_create(config, &email, &name, &password, &role, sync_cms).await,
    }
}

fn validate_role(role: &str) -> anyhow::Result<()> {
    if ROLES.contains(&role) {
        Ok(())
    } else {
        anyhow::bail!("role must be one of {ROLES:?}, got '{role}'")
    }
}

fn validate_password(password: &str) -> anyhow::Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        anyhow::bail!("password must be at least {MIN_PASSWORD_LENGTH} characters");
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))
}

async fn run_admin_create(
    config: &AppConfig,
    email: &str,
    name: &str,
    password: &str,
    role: &str,
    sync_cms: bool,
) -> anyhow::Result<()> {
    validate_role(role)?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let pool = connect(config).await?;
    let user = utrabeauty_db::create_user(
        &pool,
        &NewUser {
            email,
            name,
            password_hash: Some(&password_hash),
            role,
        },
    )
    .await
    .map_err(|e| {
        if e.is_unique_violation() {
            anyhow::anyhow!("a user with email '{email}' already exists")
        } else {
            e.into()
        }
    })?;

    tracing::info!(user_id = %user.public_id, role = %user.role, "user created");
    println!("created {} user {} ({})", user.role, user.email, user.public_id);

    if sync_cms {
        let cms = cms_client(config)?;
        let document = UserDocument::new(user.public_id, &user.name, &user.email, &user.role);
        let value = serde_json::to_value(&document)?;
        cms.create_or_replace(value)
            .await
            .with_context(|| format!("user {} created but CMS sync failed", user.public_id))?;
        println!("synced {} to CMS dataset '{}'", document.id, cms.dataset());
    }

    Ok(())
}
