// src/models/payment.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

static TRANSACTION_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-]{4,64}$").expect("transaction id pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Paypal,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Represents the 'payments' table.
///
/// No payment processor is involved: amount, method and transaction id are
/// stored as the caller supplied them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub amount: f64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Unique across all payments.
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/payments`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordPaymentRequest {
    pub course_id: i64,
    #[validate(range(min = 0.0, message = "Amount cannot be negative."))]
    pub amount: f64,
    pub method: PaymentMethod,
    #[validate(custom(function = validate_transaction_id))]
    pub transaction_id: String,
}

fn validate_transaction_id(id: &str) -> Result<(), validator::ValidationError> {
    if !TRANSACTION_ID.is_match(id) {
        return Err(validator::ValidationError::new("invalid_transaction_id")
            .with_message("Transaction id must be 4-64 letters, digits, '-' or '_'.".into()));
    }
    Ok(())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentCheckResponse {
    pub is_paid: bool,
    pub message: String,
}
