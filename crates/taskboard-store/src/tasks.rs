use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info, instrument};

use taskboard_core::task::{STATUS_COMPLETED, STATUS_PENDING};
use taskboard_core::{DashboardStats, Task, TaskDraft, TaskId};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

const TABLE: &str = "tasks";

const SELECT_ALL: &str = "SELECT id, title, description, priority, category, due_date, status,
        order_index, created_at
 FROM tasks
 ORDER BY order_index ASC, created_at DESC, id DESC";

pub struct TaskRepo {
    db: Database,
}

impl TaskRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All tasks in display order.
    #[instrument(skip(self))]
    pub fn list_all(&self) -> Result<Vec<Task>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(SELECT_ALL)?;
            let mut rows = stmt.query([])?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(task_from_row(row)?);
            }
            Ok(tasks)
        })
    }

    /// Insert a task at the end of the manual ordering and return its id.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub fn create(&self, draft: &TaskDraft) -> Result<TaskId, StoreError> {
        self.db.with_conn(|conn| {
            let tx = immediate(conn)?;

            let next_order: i64 = tx.query_row(
                "SELECT COALESCE(MAX(order_index), 0) + 1 FROM tasks",
                [],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO tasks (title, description, priority, category, due_date, status, order_index)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    draft.title,
                    draft.description,
                    draft.priority,
                    draft.category,
                    draft.due_date,
                    draft.status,
                    next_order,
                ],
            )?;
            let id = TaskId::new(tx.last_insert_rowid());
            tx.commit()?;

            info!(task_id = %id, order_index = next_order, "task created");
            Ok(id)
        })
    }

    /// Replace every editable field of a task.
    ///
    /// Succeeds even when no task has this id.
    #[instrument(skip(self, draft), fields(task_id = %id))]
    pub fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET title = ?1, description = ?2, priority = ?3,
                        category = ?4, due_date = ?5, status = ?6
                 WHERE id = ?7",
                rusqlite::params![
                    draft.title,
                    draft.description,
                    draft.priority,
                    draft.category,
                    draft.due_date,
                    draft.status,
                    id.get(),
                ],
            )?;
            debug!(rows = changed, "task updated");
            Ok(())
        })
    }

    /// Hard delete. Succeeds even when no task has this id.
    #[instrument(skip(self), fields(task_id = %id))]
    pub fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", [id.get()])?;
            debug!(rows = changed, "task deleted");
            Ok(())
        })
    }

    /// Apply new order indexes in one transaction: all of them or none.
    #[instrument(skip(self, orders), fields(count = orders.len()))]
    pub fn reorder(&self, orders: &BTreeMap<TaskId, i64>) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let tx = immediate(conn)?;
            {
                let mut stmt = tx.prepare("UPDATE tasks SET order_index = ?1 WHERE id = ?2")?;
                for (id, order_index) in orders {
                    stmt.execute(rusqlite::params![order_index, id.get()])?;
                }
            }
            tx.commit()?;

            info!(count = orders.len(), "tasks reordered");
            Ok(())
        })
    }

    /// Dashboard counts relative to the server's local date.
    pub fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        self.dashboard_stats_on(Local::now().date_naive())
    }

    #[instrument(skip(self))]
    pub fn dashboard_stats_on(&self, today: NaiveDate) -> Result<DashboardStats, StoreError> {
        let today = today.format("%Y-%m-%d").to_string();
        self.db.with_conn(|conn| {
            Ok(DashboardStats {
                due_today: row_helpers::count(
                    conn,
                    "SELECT COUNT(*) FROM tasks WHERE due_date = ?1 AND status = ?2",
                    rusqlite::params![today, STATUS_PENDING],
                )?,
                overdue: row_helpers::count(
                    conn,
                    "SELECT COUNT(*) FROM tasks WHERE due_date < ?1 AND status = ?2",
                    rusqlite::params![today, STATUS_PENDING],
                )?,
                completed: row_helpers::count(
                    conn,
                    "SELECT COUNT(*) FROM tasks WHERE status = ?1",
                    [STATUS_COMPLETED],
                )?,
                pending: row_helpers::count(
                    conn,
                    "SELECT COUNT(*) FROM tasks WHERE status = ?1",
                    [STATUS_PENDING],
                )?,
            })
        })
    }
}

/// Writer transaction taken up front, so the `MAX(order_index)` read and the
/// insert that depends on it see the same snapshot.
fn immediate(conn: &Connection) -> Result<Transaction<'_>, StoreError> {
    Ok(Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?)
}

fn task_from_row(row: &rusqlite::Row<'_>) -> Result<Task, StoreError> {
    Ok(Task {
        id: TaskId::new(row_helpers::get(row, TABLE, "id")?),
        title: row_helpers::get(row, TABLE, "title")?,
        description: row_helpers::get_opt(row, TABLE, "description")?.unwrap_or_default(),
        priority: row_helpers::get_opt(row, TABLE, "priority")?.unwrap_or_default(),
        category: row_helpers::get_opt(row, TABLE, "category")?,
        due_date: row_helpers::get_text_opt(row, TABLE, "due_date")?,
        status: row_helpers::get_opt(row, TABLE, "status")?.unwrap_or_default(),
        order_index: row_helpers::get_opt(row, TABLE, "order_index")?.unwrap_or_default(),
        created_at: row_helpers::get_text_opt(row, TABLE, "created_at")?.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_repo() -> (TempDir, TaskRepo) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("tasks.db")).unwrap();
        (dir, TaskRepo::new(db))
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id.get()).collect()
    }

    #[test]
    fn create_title_only_applies_defaults() {
        let (_dir, repo) = test_repo();
        let id = repo.create(&TaskDraft::titled("Write report")).unwrap();

        let tasks = repo.list_all().unwrap();
        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.id, id);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description, "");
        assert_eq!(task.priority, "Medium");
        assert_eq!(task.status, "pending");
        assert_eq!(task.category, None);
        assert_eq!(task.due_date, None);
        assert_eq!(task.order_index, 1);
        assert!(!task.created_at.is_empty());
    }

    #[test]
    fn create_appends_after_max_order_index() {
        let (_dir, repo) = test_repo();
        let first = repo.create(&TaskDraft::titled("a")).unwrap();
        repo.create(&TaskDraft::titled("b")).unwrap();

        repo.reorder(&BTreeMap::from([(first, 10)])).unwrap();
        let third = repo.create(&TaskDraft::titled("c")).unwrap();

        let tasks = repo.list_all().unwrap();
        let created = tasks.iter().find(|t| t.id == third).unwrap();
        assert_eq!(created.order_index, 11);
    }

    #[test]
    fn list_orders_by_index_then_newest_first() {
        let (_dir, repo) = test_repo();
        let a = repo.create(&TaskDraft::titled("a")).unwrap();
        let b = repo.create(&TaskDraft::titled("b")).unwrap();
        let c = repo.create(&TaskDraft::titled("c")).unwrap();

        assert_eq!(ids(&repo.list_all().unwrap()), vec![a.get(), b.get(), c.get()]);

        // Same index: the newer task comes first.
        repo.reorder(&BTreeMap::from([(a, 5), (b, 5), (c, 1)])).unwrap();
        assert_eq!(ids(&repo.list_all().unwrap()), vec![c.get(), b.get(), a.get()]);
    }

    #[test]
    fn created_at_tiebreak_is_descending() {
        let (_dir, repo) = test_repo();
        repo.db
            .with_conn(|conn| {
                conn.execute_batch(
                    "INSERT INTO tasks (id, title, order_index, created_at)
                         VALUES (1, 'older', 1, '2024-01-01 08:00:00');
                     INSERT INTO tasks (id, title, order_index, created_at)
                         VALUES (2, 'newer', 1, '2024-01-02 08:00:00');
                     INSERT INTO tasks (id, title, order_index, created_at)
                         VALUES (3, 'first', 0, '2023-01-01 08:00:00');",
                )?;
                Ok(())
            })
            .unwrap();

        assert_eq!(ids(&repo.list_all().unwrap()), vec![3, 2, 1]);
    }

    #[test]
    fn due_date_round_trips_and_empty_normalizes() {
        let (_dir, repo) = test_repo();
        let dated = repo
            .create(&TaskDraft::titled("dated").with_due_date("2024-03-01"))
            .unwrap();
        let undated = repo
            .create(&TaskDraft::titled("undated").with_due_date(""))
            .unwrap();

        let tasks = repo.list_all().unwrap();
        let find = |id: TaskId| tasks.iter().find(|t| t.id == id).unwrap().clone();
        assert_eq!(find(dated).due_date.as_deref(), Some("2024-03-01"));
        assert_eq!(find(undated).due_date, None);
    }

    #[test]
    fn update_replaces_all_fields() {
        let (_dir, repo) = test_repo();
        let id = repo
            .create(
                &TaskDraft::titled("old")
                    .with_category("Work")
                    .with_due_date("2024-05-05"),
            )
            .unwrap();

        let replacement = TaskDraft {
            description: "details".into(),
            priority: "High".into(),
            ..TaskDraft::titled("new")
        }
        .with_status("completed");
        repo.update(id, &replacement).unwrap();

        let task = repo.list_all().unwrap().remove(0);
        assert_eq!(task.title, "new");
        assert_eq!(task.description, "details");
        assert_eq!(task.priority, "High");
        assert_eq!(task.status, "completed");
        // Omitted fields are overwritten with null.
        assert_eq!(task.category, None);
        assert_eq!(task.due_date, None);
        assert_eq!(task.order_index, 1);
    }

    #[test]
    fn update_missing_id_is_ok() {
        let (_dir, repo) = test_repo();
        repo.update(TaskId::new(999), &TaskDraft::titled("ghost")).unwrap();
        assert!(repo.list_all().unwrap().is_empty());
    }

    #[test]
    fn delete_removes_row_and_missing_id_is_ok() {
        let (_dir, repo) = test_repo();
        let id = repo.create(&TaskDraft::titled("doomed")).unwrap();
        repo.delete(id).unwrap();
        assert!(repo.list_all().unwrap().is_empty());

        repo.delete(TaskId::new(12345)).unwrap();
    }

    #[test]
    fn reorder_touches_only_listed_tasks() {
        let (_dir, repo) = test_repo();
        for n in 1..=8 {
            repo.create(&TaskDraft::titled(format!("task {n}"))).unwrap();
        }

        repo.reorder(&BTreeMap::from([(TaskId::new(5), 3), (TaskId::new(7), 1)]))
            .unwrap();

        let tasks = repo.list_all().unwrap();
        for task in &tasks {
            let expected = match task.id.get() {
                5 => 3,
                7 => 1,
                other => other,
            };
            assert_eq!(task.order_index, expected, "task {}", task.id);
        }
        assert_eq!(tasks[0].id.get(), 7);
        assert_eq!(tasks[1].id.get(), 1);
    }

    #[test]
    fn reorder_unknown_ids_are_ignored() {
        let (_dir, repo) = test_repo();
        let id = repo.create(&TaskDraft::titled("only")).unwrap();
        repo.reorder(&BTreeMap::from([(TaskId::new(404), 9)])).unwrap();
        assert_eq!(repo.list_all().unwrap()[0].id, id);
        assert_eq!(repo.list_all().unwrap()[0].order_index, 1);
    }

    #[test]
    fn reorder_failure_rolls_back_whole_batch() {
        let (_dir, repo) = test_repo();
        for n in 1..=3 {
            repo.create(&TaskDraft::titled(format!("task {n}"))).unwrap();
        }
        repo.db
            .with_conn(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER block_task_three BEFORE UPDATE OF order_index ON tasks
                     WHEN NEW.id = 3
                     BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
                )?;
                Ok(())
            })
            .unwrap();

        let result = repo.reorder(&BTreeMap::from([(TaskId::new(1), 10), (TaskId::new(3), 11)]));
        assert!(matches!(result, Err(StoreError::Database(_))));

        let tasks = repo.list_all().unwrap();
        assert_eq!(
            tasks.iter().map(|t| t.order_index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn dashboard_counts_by_due_date_and_status() {
        let (_dir, repo) = test_repo();
        let today = date("2024-06-15");
        repo.create(&TaskDraft::titled("today").with_due_date("2024-06-15"))
            .unwrap();
        repo.create(&TaskDraft::titled("late").with_due_date("2024-06-01"))
            .unwrap();
        repo.create(
            &TaskDraft::titled("done")
                .with_due_date("2024-06-01")
                .with_status("completed"),
        )
        .unwrap();
        repo.create(&TaskDraft::titled("later").with_due_date("2024-07-01"))
            .unwrap();

        let stats = repo.dashboard_stats_on(today).unwrap();
        assert_eq!(
            stats,
            DashboardStats {
                due_today: 1,
                overdue: 1,
                completed: 1,
                pending: 3,
            }
        );
    }

    #[test]
    fn dashboard_empty_table_is_zero() {
        let (_dir, repo) = test_repo();
        assert_eq!(repo.dashboard_stats().unwrap(), DashboardStats::default());
    }

    #[test]
    fn undated_pending_task_counts_only_as_pending() {
        let (_dir, repo) = test_repo();
        repo.create(&TaskDraft::titled("someday")).unwrap();
        let stats = repo.dashboard_stats_on(date("2024-06-15")).unwrap();
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.due_today, 0);
        assert_eq!(stats.overdue, 0);
    }

    #[test]
    fn operations_fail_when_storage_unavailable() {
        let (dir, repo) = test_repo();
        drop(dir);

        assert!(matches!(repo.list_all(), Err(StoreError::Unavailable(_))));
        assert!(matches!(
            repo.create(&TaskDraft::titled("x")),
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            repo.update(TaskId::new(1), &TaskDraft::titled("x")),
            Err(StoreError::Unavailable(_))
        ));
        assert!(repo.dashboard_stats().is_err());
    }
}
