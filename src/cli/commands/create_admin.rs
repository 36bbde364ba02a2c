use serde_json::json;

use crate::cli::{open_store, OutputFormat};
use crate::config::AppConfig;
use crate::database::models::user::NewUser;
use crate::services::user_service;
use crate::types::Role;

pub async fn handle(
    config: AppConfig,
    name: String,
    email: String,
    password: String,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let store = open_store(&config).await?;

    let input = NewUser {
        name: Some(name),
        email: Some(email),
        password: Some(password),
        role: Some(Role::Admin),
    };
    let created = user_service::create_user(&store, &config.security, input).await;
    store.close().await;

    let user = created.map_err(|e| anyhow::anyhow!(e.message().to_string()))?;

    match output_format {
        OutputFormat::Json => println!("{}", json!({ "success": true, "data": user.to_json() })),
        OutputFormat::Text => println!(
            "Created admin {} <{}> ({})",
            user.get_str("name").unwrap_or_default(),
            user.get_str("email").unwrap_or_default(),
            user.id
        ),
    }
    Ok(())
}
