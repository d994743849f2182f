use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct AttendanceStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AttendanceStatus {
    #[serde(alias = "present")]
    Present,
    #[serde(alias = "absent")]
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Present" => Some(AttendanceStatus::Present),
            "Absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub date: String,
    pub status: AttendanceStatus,
    pub student_id: i64,
}

#[derive(sqlx::FromRow)]
struct AttendanceRow {
    id: i64,
    date: String,
    status: String,
    student_id: i64,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = sqlx::Error;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::parse(&row.status).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown attendance status: {}", row.status).into())
        })?;
        Ok(Self {
            id: row.id,
            date: row.date,
            status,
            student_id: row.student_id,
        })
    }
}

impl AttendanceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record attendance for a student, dated today (UTC). Returns the record ID.
    pub async fn mark(&self, student_id: i64, status: AttendanceStatus) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO attendance (student_id, status) VALUES (?, ?)")
            .bind(student_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// All attendance records of a student, oldest first.
    pub async fn list_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        let rows: Vec<AttendanceRow> = sqlx::query_as(
            "SELECT id, date, status, student_id FROM attendance WHERE student_id = ? ORDER BY date, id",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AttendanceRecord::try_from).collect()
    }
}
