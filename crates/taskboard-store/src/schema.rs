/// SQL DDL for the taskboard database.
/// WAL mode is set once at initialization; the remaining pragmas are applied
/// on every connection.
pub const SCHEMA_VERSION: u32 = 1;

pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    priority TEXT DEFAULT 'Medium',
    category TEXT,
    due_date DATE,
    status TEXT DEFAULT 'pending',
    order_index INTEGER DEFAULT 0,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_tasks_order ON tasks(order_index, created_at);
CREATE INDEX IF NOT EXISTS idx_tasks_status_due ON tasks(status, due_date);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

pub const SEED_CATEGORY: &str = "INSERT OR IGNORE INTO categories (name) VALUES (?1)";

pub const INIT_PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
"#;

pub const CONNECTION_PRAGMAS: &str = r#"
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;
