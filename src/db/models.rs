use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{PaymentPurpose, PaymentStatus, SessionStatus, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Test {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) price: Decimal,
    pub(crate) duration_minutes: i32,
    pub(crate) is_active: bool,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Answer-key row. Never serialized into a student-facing response as is.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) test_id: String,
    pub(crate) position: i32,
    pub(crate) question_text: String,
    pub(crate) options: Json<Vec<String>>,
    pub(crate) correct_answer: i16,
    pub(crate) explanation: Option<String>,
}

/// Catalog listing row: a test with its question count.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct TestSummary {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) price: Decimal,
    pub(crate) duration_minutes: i32,
    pub(crate) questions_count: i64,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct CartLine {
    pub(crate) test_id: String,
    pub(crate) title: String,
    pub(crate) price: Decimal,
    pub(crate) duration_minutes: i32,
    pub(crate) added_at: PrimitiveDateTime,
}

/// One paid line of an order, persisted as JSON on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct OrderLine {
    pub(crate) test_id: String,
    pub(crate) price: Decimal,
    pub(crate) price_paid: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct PaymentOrder {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) purpose: PaymentPurpose,
    pub(crate) items: Json<Vec<OrderLine>>,
    pub(crate) subtotal: Decimal,
    pub(crate) discount: Decimal,
    pub(crate) amount: Decimal,
    pub(crate) currency: String,
    pub(crate) status: PaymentStatus,
    pub(crate) payment_id: Option<String>,
    pub(crate) refund_amount: Decimal,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
    pub(crate) verified_at: Option<PrimitiveDateTime>,
}

/// Lookups are always keyed by (student, test), so only the timing state is loaded.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct TestSession {
    pub(crate) id: String,
    pub(crate) status: SessionStatus,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) deadline_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct TestResult {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) test_id: String,
    pub(crate) answers: Json<Vec<i32>>,
    pub(crate) score: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: i32,
    pub(crate) time_taken_minutes: Option<i32>,
    pub(crate) elapsed_seconds: i64,
    pub(crate) is_late: bool,
    pub(crate) completed_at: PrimitiveDateTime,
}

/// Result joined with its test title for the history listing.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ResultSummary {
    pub(crate) test_id: String,
    pub(crate) test_title: String,
    pub(crate) score: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: i32,
    pub(crate) time_taken_minutes: Option<i32>,
    pub(crate) is_late: bool,
    pub(crate) completed_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct PasswordResetToken {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) token_hash: String,
    pub(crate) expires_at: PrimitiveDateTime,
    pub(crate) used_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
}
