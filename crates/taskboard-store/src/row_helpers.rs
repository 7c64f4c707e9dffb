use rusqlite::types::{FromSql, Value};

use crate::error::StoreError;

/// Get a required column value by name, returning CorruptRow on failure.
pub fn get<T: FromSql>(
    row: &rusqlite::Row<'_>,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    row.get(column).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: e.to_string(),
    })
}

/// Get an optional column value by name.
pub fn get_opt<T: FromSql>(
    row: &rusqlite::Row<'_>,
    table: &'static str,
    column: &'static str,
) -> Result<Option<T>, StoreError> {
    get(row, table, column)
}

/// Read a DATE/TIMESTAMP column as text.
///
/// Those columns have NUMERIC affinity, so SQLite may hand back an integer or
/// real for values that look numeric. Anything but a blob is rendered as a
/// string.
pub fn get_text_opt(
    row: &rusqlite::Row<'_>,
    table: &'static str,
    column: &'static str,
) -> Result<Option<String>, StoreError> {
    match get::<Value>(row, table, column)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        Value::Integer(n) => Ok(Some(n.to_string())),
        Value::Real(f) => Ok(Some(f.to_string())),
        Value::Blob(_) => Err(StoreError::CorruptRow {
            table,
            column,
            detail: "unexpected blob".to_string(),
        }),
    }
}

/// Run a `SELECT COUNT(*)`-style query returning a single integer.
pub fn count<P: rusqlite::Params>(
    conn: &rusqlite::Connection,
    sql: &str,
    params: P,
) -> Result<i64, StoreError> {
    Ok(conn.query_row(sql, params, |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (d DATE, n TEXT);
             INSERT INTO t (d, n) VALUES ('2024-03-01', 'a');
             INSERT INTO t (d, n) VALUES (2024, NULL);
             INSERT INTO t (d, n) VALUES (NULL, 'c');",
        )
        .unwrap();
        conn
    }

    fn column_values(conn: &Connection) -> Vec<Option<String>> {
        let mut stmt = conn.prepare("SELECT d, n FROM t ORDER BY rowid").unwrap();
        let mut rows = stmt.query([]).unwrap();
        let mut out = Vec::new();
        while let Some(row) = rows.next().unwrap() {
            out.push(get_text_opt(row, "t", "d").unwrap());
        }
        out
    }

    #[test]
    fn text_opt_renders_numeric_affinity_values() {
        let values = column_values(&conn());
        assert_eq!(
            values,
            vec![Some("2024-03-01".to_string()), Some("2024".to_string()), None]
        );
    }

    #[test]
    fn get_required_on_null_is_corrupt_row() {
        let conn = conn();
        let mut stmt = conn.prepare("SELECT d, n FROM t WHERE n IS NULL").unwrap();
        let mut rows = stmt.query([]).unwrap();
        let row = rows.next().unwrap().unwrap();
        let result: Result<String, _> = get(row, "t", "n");
        assert!(matches!(
            result,
            Err(StoreError::CorruptRow { table: "t", column: "n", .. })
        ));
        let opt: Option<String> = get_opt(row, "t", "n").unwrap();
        assert_eq!(opt, None);
    }

    #[test]
    fn count_returns_integer() {
        let conn = conn();
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM t", []).unwrap(), 3);
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM t WHERE n = ?1", ["a"]).unwrap(),
            1
        );
    }
}
