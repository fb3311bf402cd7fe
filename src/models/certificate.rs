// src/models/certificate.rs

use serde::Serialize;
use sqlx::FromRow;

/// A certificate joined with the title of the course it was issued for.
#[derive(Debug, Serialize, FromRow)]
pub struct CertificateView {
    pub id: i64,
    pub course_id: i64,
    pub course_title: String,
    pub issued_at: chrono::DateTime<chrono::Utc>,
}
