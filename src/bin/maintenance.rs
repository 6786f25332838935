use std::env;

use anyhow::{bail, Context, Result};
use diesel::prelude::*;
use uuid::Uuid;

use nyayasathi::{
    auth::{password, Role},
    config::AppConfig,
    db,
    models::{Complaint, NewUser},
    schema::{complaints, users},
    storage::{AudioStore, S3AudioStore},
};

const USAGE: &str = "Usage:\n  maintenance create-officer <badge_id> <password>\n  maintenance purge-audio <complaint_id>";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    nyayasathi::init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["create-officer", badge_id, secret] => create_officer(badge_id, secret)?,
        ["purge-audio", complaint_id] => {
            let complaint_id: i64 = complaint_id
                .parse()
                .with_context(|| format!("invalid complaint id: {complaint_id}"))?;
            purge_audio(complaint_id).await?
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn load_config() -> Result<AppConfig> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "maintenance",
        database_url = %config.redacted_database_url(),
        s3_bucket = %config.s3_bucket,
        "loaded configuration"
    );
    Ok(config)
}

fn create_officer(badge_id: &str, raw_password: &str) -> Result<()> {
    let badge_id = badge_id.trim();
    if badge_id.is_empty() || raw_password.is_empty() {
        bail!("badge id and password must not be empty");
    }

    let config = load_config()?;
    let pool = db::init_pool_with_size(&config.database_url, 1)?;
    let mut conn = pool.get().context("failed to get database connection")?;
    db::run_migrations(&mut conn)?;

    let new_user = NewUser {
        id: Uuid::new_v4(),
        username: badge_id.to_string(),
        password_hash: password::hash_password(raw_password)?,
        role: Role::Officer.as_str().to_string(),
        badge_id: Some(badge_id.to_string()),
        email: String::new(),
        first_name: String::new(),
        last_name: String::new(),
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .execute(&mut conn)
        .with_context(|| format!("failed to create officer {badge_id}"))?;

    println!("Created officer {badge_id} ({})", new_user.id);
    Ok(())
}

async fn purge_audio(complaint_id: i64) -> Result<()> {
    let config = load_config()?;
    let pool = db::init_pool_with_size(&config.database_url, 1)?;
    let storage = S3AudioStore::connect(&config).await?;

    let mut conn = pool.get().context("failed to get database connection")?;
    let complaint: Complaint = complaints::table
        .find(complaint_id)
        .first(&mut conn)
        .optional()
        .context("failed to load complaint")?
        .with_context(|| format!("complaint {complaint_id} not found"))?;

    let Some(key) = complaint.audio_key else {
        println!("Complaint {complaint_id} has no stored audio.");
        return Ok(());
    };

    storage.remove(&key).await?;
    diesel::update(complaints::table.find(complaint_id))
        .set(complaints::audio_key.eq(None::<String>))
        .execute(&mut conn)
        .context("failed to clear audio reference")?;

    println!("Removed audio {key} for complaint {complaint_id}.");
    Ok(())
}
