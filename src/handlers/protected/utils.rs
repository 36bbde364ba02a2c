use uuid::Uuid;

use crate::database::{Collection, Document};
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::AuthUser;

/// Load a record by path id; 404 when missing, 403 when `user` neither owns it
/// through `owner_field` nor is an admin
pub async fn load_owned(
    collection: &dyn Collection,
    raw_id: &str,
    user: &AuthUser,
    owner_field: &str,
    noun: &str,
) -> Result<Document, ApiError> {
    let id = parse_id(raw_id, noun)?;
    let doc = load(collection, id, noun).await?;
    ensure_owner(&doc, user, owner_field, noun)?;
    Ok(doc)
}

pub async fn load(collection: &dyn Collection, id: Uuid, noun: &str) -> Result<Document, ApiError> {
    collection
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No {} with id {}", noun, id)))
}

pub fn owns(doc: &Document, user: &AuthUser, owner_field: &str) -> bool {
    doc.get_ref(owner_field) == Some(user.id)
}

pub fn ensure_owner(doc: &Document, user: &AuthUser, owner_field: &str, noun: &str) -> Result<(), ApiError> {
    if user.is_admin() || owns(doc, user, owner_field) {
        return Ok(());
    }
    tracing::warn!("User {} denied access to {} {}", user.id, noun, doc.id);
    Err(ApiError::forbidden(format!(
        "User {} is not authorized to access this {}",
        user.id, noun
    )))
}

/// Private cards exist only for their owner and admins; everyone else gets the missing-card 404
pub fn ensure_visible(card: &Document, user: &AuthUser) -> Result<(), ApiError> {
    if card.get_str("visibility") == Some("private") && !owns(card, user, "user") && !user.is_admin() {
        tracing::debug!("User {} asked for private card {}", user.id, card.id);
        return Err(ApiError::not_found(format!("No card with id {}", card.id)));
    }
    Ok(())
}

/// A card the user may save, favourite or collect
pub async fn load_visible_card(collection: &dyn Collection, id: Uuid, user: &AuthUser) -> Result<Document, ApiError> {
    let card = load(collection, id, "card").await?;
    ensure_visible(&card, user)?;
    Ok(card)
}
