use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct GradeStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, sqlx::FromRow)]
pub struct GradeRecord {
    pub id: i64,
    pub exam_name: String,
    pub score: f64,
    pub grade: String,
    pub student_id: i64,
}

impl GradeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Assign a grade, or update score and grade if the student already has one
    /// for this exam. Returns true if a new record was created.
    pub async fn upsert(
        &self,
        student_id: i64,
        exam_name: &str,
        score: f64,
        grade: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE grades SET score = ?, grade = ? WHERE student_id = ? AND exam_name = ?",
        )
        .bind(score)
        .bind(grade)
        .bind(student_id)
        .bind(exam_name)
        .execute(&mut *tx)
        .await?;

        let created = if updated.rows_affected() == 0 {
            sqlx::query(
                "INSERT INTO grades (student_id, exam_name, score, grade) VALUES (?, ?, ?, ?)",
            )
            .bind(student_id)
            .bind(exam_name)
            .bind(score)
            .bind(grade)
            .execute(&mut *tx)
            .await?;
            true
        } else {
            false
        };

        tx.commit().await?;
        Ok(created)
    }

    /// All grades of a student, in the order they were first assigned.
    pub async fn list_for_student(&self, student_id: i64) -> Result<Vec<GradeRecord>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, exam_name, score, grade, student_id FROM grades WHERE student_id = ? ORDER BY id",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
    }
}
