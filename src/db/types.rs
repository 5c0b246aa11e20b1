use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Admin,
    Student,
}

impl UserRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Student => "student",
        }
    }
}

/// `RefundPending` marks a captured payment that covered tests the student already owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "paymentstatus", rename_all = "snake_case")]
pub(crate) enum PaymentStatus {
    Created,
    Verified,
    Failed,
    RefundPending,
}

impl PaymentStatus {
    /// The gateway captured the payment for this order.
    pub(crate) fn is_paid(self) -> bool {
        matches!(self, PaymentStatus::Verified | PaymentStatus::RefundPending)
    }
}

/// What a verified order pays for; a cart order also empties the paid cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "paymentpurpose", rename_all = "lowercase")]
pub(crate) enum PaymentPurpose {
    Single,
    Cart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "sessionstatus", rename_all = "snake_case")]
pub(crate) enum SessionStatus {
    InProgress,
    Submitted,
}
