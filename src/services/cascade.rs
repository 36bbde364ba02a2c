//! Deletes that reach across collections

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::{DatabaseError, Store};
use crate::filter::{Filter, FindOptions};

/// Delete a card with the favourites and connections that point at it.
/// Collections keep the stale id; listing them drops ids that no longer resolve.
pub async fn delete_card(store: &Store, card: Uuid) -> Result<bool, DatabaseError> {
    let by_card = Filter::eq("card", card.to_string());
    let favourites = store.favourites.delete_where(&by_card).await?;
    let connections = store.connections.delete_where(&by_card).await?;
    let deleted = store.cards.delete(card).await?;
    tracing::debug!(
        "Deleted card {} ({} favourites, {} connections)",
        card,
        favourites,
        connections
    );
    Ok(deleted)
}

/// Delete an organization and detach the cards that belonged to it
pub async fn delete_organization(store: &Store, organization: Uuid) -> Result<bool, DatabaseError> {
    let members = store
        .cards
        .find(&Filter::eq("organization", organization.to_string()), &FindOptions::default())
        .await?;

    let mut detach = Map::new();
    detach.insert("organization".into(), Value::Null);
    for card in &members {
        store.cards.update(card.id, detach.clone()).await?;
    }

    store.organizations.delete(organization).await
}

/// Delete a user and everything they own
pub async fn delete_user(store: &Store, user: Uuid) -> Result<bool, DatabaseError> {
    let by_user = Filter::eq("user", user.to_string());

    for card in store.cards.find(&by_user, &FindOptions::default()).await? {
        delete_card(store, card.id).await?;
    }
    let owned = Filter::eq("owner", user.to_string());
    for organization in store.organizations.find(&owned, &FindOptions::default()).await? {
        delete_organization(store, organization.id).await?;
    }

    store.connections.delete_where(&by_user).await?;
    store.collections.delete_where(&by_user).await?;
    store.favourites.delete_where(&by_user).await?;
    store.activities.delete_where(&by_user).await?;
    store.settings.delete_where(&by_user).await?;

    let deleted = store.users.delete(user).await?;
    if deleted {
        tracing::info!("Deleted user {} and owned records", user);
    }
    Ok(deleted)
}
