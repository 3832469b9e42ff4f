use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

use crate::error::Result;
use crate::models::MergedDataset;
use crate::storage::{PersistReport, Storage};

pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn migrate(&self) -> Result<()> {
        let conn = self.lock();

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS students (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_key TEXT NOT NULL UNIQUE,
                name TEXT,
                email TEXT,
                age INTEGER
            );
            CREATE TABLE IF NOT EXISTS classes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                teacher_name TEXT,
                schedule TEXT
            );
            CREATE TABLE IF NOT EXISTS class_students (
                class_id INTEGER,
                student_id INTEGER,
                PRIMARY KEY (class_id, student_id),
                FOREIGN KEY (class_id) REFERENCES classes(id),
                FOREIGN KEY (student_id) REFERENCES students(id)
            );
            CREATE TABLE IF NOT EXISTS grades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id INTEGER,
                class_id INTEGER,
                score REAL,
                feedback TEXT,
                FOREIGN KEY (student_id) REFERENCES students(id),
                FOREIGN KEY (class_id) REFERENCES classes(id)
            );
            CREATE TABLE IF NOT EXISTS ingest_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_url TEXT NOT NULL,
                started_at TEXT NOT NULL,
                students INTEGER NOT NULL,
                classes INTEGER NOT NULL,
                grades INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_grades_student ON grades(student_id);",
        )?;

        info!("Database migration completed");
        Ok(())
    }

    async fn persist(&self, source_url: &str, dataset: &MergedDataset) -> Result<PersistReport> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let mut report = PersistReport::default();

        let mut class_ids: HashMap<u32, i64> = HashMap::new();
        for class in &dataset.classes {
            let stored: i64 = tx.query_row(
                "INSERT INTO classes (title) VALUES (?1)
                 ON CONFLICT(title) DO UPDATE SET title = excluded.title
                 RETURNING id",
                params![class.title],
                |row| row.get(0),
            )?;
            class_ids.insert(class.id, stored);
            report.classes += 1;
        }

        let mut student_ids: HashMap<u32, i64> = HashMap::new();
        for student in &dataset.students {
            let stored: i64 = tx.query_row(
                "INSERT INTO students (source_key, name, email, age) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(source_key) DO UPDATE SET age = COALESCE(students.age, excluded.age)
                 RETURNING id",
                params![student.key().fingerprint(), student.name, student.email, student.age],
                |row| row.get(0),
            )?;
            student_ids.insert(student.id, stored);
            report.students += 1;

            for class_id in &student.enrolled_classes {
                if let Some(stored_class) = class_ids.get(class_id) {
                    report.enrollments += tx.execute(
                        "INSERT OR IGNORE INTO class_students (class_id, student_id) VALUES (?1, ?2)",
                        params![stored_class, stored],
                    )?;
                }
            }
        }

        for grade in &dataset.grades {
            let (Some(student_id), Some(class_id)) =
                (student_ids.get(&grade.student_id), class_ids.get(&grade.class_id))
            else {
                continue;
            };

            tx.execute(
                "INSERT INTO grades (student_id, class_id, score, feedback) VALUES (?1, ?2, ?3, ?4)",
                params![student_id, class_id, grade.score, grade.feedback],
            )?;
            report.grades += 1;
        }

        tx.execute(
            "INSERT INTO ingest_runs (source_url, started_at, students, classes, grades)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                source_url,
                Utc::now().to_rfc3339(),
                report.students as i64,
                report.classes as i64,
                report.grades as i64
            ],
        )?;

        tx.commit()?;
        info!(
            "Persisted {} students, {} classes, {} enrollments, {} grades",
            report.students, report.classes, report.enrollments, report.grades
        );
        Ok(report)
    }
}
