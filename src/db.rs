use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, Set, Statement, sea_query::OnConflict,
};
use tracing::debug;

use crate::{
    entities::director,
    error::{AppError, AppResult, DbResultExt},
};

const PRAGMAS: [&str; 3] =
    ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL", "PRAGMA cache_size=-64000"];

/// Owns the database handle. Cloning shares the underlying pool.
#[derive(Clone, Debug)]
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    /// Connects, tunes the connection and brings the schema up to date.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let mut options = ConnectOptions::new(database_url);
        if database_url.contains(":memory:") {
            // every pooled connection would otherwise open its own empty database
            options.max_connections(1).min_connections(1);
        }

        let db = Database::connect(options).await.context("open database")?;

        for pragma in PRAGMAS {
            db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string()))
                .await
                .context("configure database")?;
        }

        Migrator::up(&db, None).await.context("run migrations")?;
        debug!(url = %database_url, "database ready");

        Ok(Self { db })
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns the id of the director with `name`, creating the row on first use.
    pub async fn ensure_director(&self, name: &str) -> AppResult<String> {
        if name.trim().is_empty() {
            return Err(AppError::invalid("director name is required"));
        }

        if let Some(existing) = self.find_director(name).await? {
            return Ok(existing.id);
        }

        let model = director::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            name: Set(name.to_string()),
        };

        // a concurrent writer may have inserted the same name since the lookup
        director::Entity::insert(model)
            .on_conflict(OnConflict::column(director::Column::Name).do_nothing().to_owned())
            .exec_without_returning(&self.db)
            .await
            .context("insert director")?;

        match self.find_director(name).await? {
            Some(director) => {
                debug!(director = %name, id = %director.id, "director ensured");
                Ok(director.id)
            },
            None => Err(AppError::Storage {
                op: "ensure director",
                source: DbErr::RecordNotFound(format!("director {name:?} vanished after insert")),
            }),
        }
    }

    async fn find_director(&self, name: &str) -> AppResult<Option<director::Model>> {
        director::Entity::find()
            .filter(director::Column::Name.eq(name))
            .one(&self.db)
            .await
            .context("look up director")
    }

    pub async fn close(self) -> AppResult<()> {
        self.db.close().await.context("close database")
    }
}

#[cfg(test)]
pub async fn memory_store() -> Store {
    Store::connect("sqlite::memory:").await.expect("in-memory store")
}
