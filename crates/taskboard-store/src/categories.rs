use tracing::{info, instrument};

use taskboard_core::{Category, CategoryId};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

const TABLE: &str = "categories";

pub struct CategoryRepo {
    db: Database,
}

impl CategoryRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All categories, alphabetical.
    #[instrument(skip(self))]
    pub fn list_all(&self) -> Result<Vec<Category>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name")?;
            let mut rows = stmt.query([])?;
            let mut categories = Vec::new();
            while let Some(row) = rows.next()? {
                categories.push(Category {
                    id: CategoryId::new(row_helpers::get(row, TABLE, "id")?),
                    name: row_helpers::get_opt(row, TABLE, "name")?.unwrap_or_default(),
                });
            }
            Ok(categories)
        })
    }

    /// Insert a category. A name that already exists is an ordinary
    /// database error.
    #[instrument(skip(self))]
    pub fn create(&self, name: &str) -> Result<CategoryId, StoreError> {
        self.db.with_conn(|conn| {
            conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])?;
            let id = CategoryId::new(conn.last_insert_rowid());
            info!(category_id = %id, name, "category created");
            Ok(id)
        })
    }
}
