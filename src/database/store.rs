use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::database::collection::{Collection, CollectionSpec};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::memory::MemoryCollection;
use crate::database::postgres::PgCollection;

pub const USERS: CollectionSpec = CollectionSpec { name: "users", unique: &[&["email"]] };
pub const CARDS: CollectionSpec = CollectionSpec { name: "cards", unique: &[] };
pub const ORGANIZATIONS: CollectionSpec = CollectionSpec { name: "organizations", unique: &[] };
pub const CONNECTIONS: CollectionSpec = CollectionSpec { name: "connections", unique: &[&["user", "card"]] };
pub const COLLECTIONS: CollectionSpec = CollectionSpec { name: "collections", unique: &[] };
pub const FAVOURITES: CollectionSpec = CollectionSpec { name: "favourites", unique: &[&["user", "card"]] };
pub const ACTIVITIES: CollectionSpec = CollectionSpec { name: "activities", unique: &[] };
pub const SETTINGS: CollectionSpec = CollectionSpec { name: "settings", unique: &[&["user"]] };

pub const ALL: [CollectionSpec; 8] = [
    USERS,
    CARDS,
    ORGANIZATIONS,
    CONNECTIONS,
    COLLECTIONS,
    FAVOURITES,
    ACTIVITIES,
    SETTINGS,
];

/// Every collection the API works with, behind one backend
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn Collection>,
    pub cards: Arc<dyn Collection>,
    pub organizations: Arc<dyn Collection>,
    pub connections: Arc<dyn Collection>,
    pub collections: Arc<dyn Collection>,
    pub favourites: Arc<dyn Collection>,
    pub activities: Arc<dyn Collection>,
    pub settings: Arc<dyn Collection>,
    pool: Option<PgPool>,
}

impl Store {
    pub fn memory() -> Self {
        let memory = |spec: CollectionSpec| -> Arc<dyn Collection> { Arc::new(MemoryCollection::new(spec)) };
        Self {
            users: memory(USERS),
            cards: memory(CARDS),
            organizations: memory(ORGANIZATIONS),
            connections: memory(CONNECTIONS),
            collections: memory(COLLECTIONS),
            favourites: memory(FAVOURITES),
            activities: memory(ACTIVITIES),
            settings: memory(SETTINGS),
            pool: None,
        }
    }

    /// PostgreSQL-backed store; creates missing tables
    pub async fn postgres(pool: PgPool) -> Result<Self, DatabaseError> {
        for spec in ALL {
            PgCollection::new(spec, pool.clone())?.ensure_table().await?;
        }

        let pg = |spec: CollectionSpec| -> Result<Arc<dyn Collection>, DatabaseError> {
            Ok(Arc::new(PgCollection::new(spec, pool.clone())?))
        };
        let store = Self {
            users: pg(USERS)?,
            cards: pg(CARDS)?,
            organizations: pg(ORGANIZATIONS)?,
            connections: pg(CONNECTIONS)?,
            collections: pg(COLLECTIONS)?,
            favourites: pg(FAVOURITES)?,
            activities: pg(ACTIVITIES)?,
            settings: pg(SETTINGS)?,
            pool: Some(pool.clone()),
        };

        info!("Document store ready with {} collections", ALL.len());
        Ok(store)
    }

    /// Every collection, in `ALL` order
    pub fn all(&self) -> [&Arc<dyn Collection>; 8] {
        [
            &self.users,
            &self.cards,
            &self.organizations,
            &self.connections,
            &self.collections,
            &self.favourites,
            &self.activities,
            &self.settings,
        ]
    }

    pub fn backend(&self) -> &'static str {
        if self.pool.is_some() { "postgres" } else { "memory" }
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        match &self.pool {
            Some(pool) => DatabaseManager::health_check(pool).await,
            None => Ok(()),
        }
    }

    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    #[tokio::test]
    async fn memory_store_has_every_collection() {
        let store = Store::memory();
        assert_eq!(store.backend(), "memory");
        assert!(store.health_check().await.is_ok());
        assert_eq!(store.cards.name(), "cards");
        assert_eq!(store.favourites.name(), "favourites");
        assert_eq!(store.settings.count(&Filter::new()).await.unwrap(), 0);

        let names: Vec<&str> = store.all().iter().map(|c| c.name()).collect();
        let expected: Vec<&str> = ALL.iter().map(|spec| spec.name).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn collection_names_are_valid_tables() {
        for spec in ALL {
            assert!(DatabaseManager::is_valid_collection_name(spec.name), "{}", spec.name);
        }
    }
}
