//! Payment states, status transitions, and the installment plan generator.

use chrono::Months;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Cents, Date};

/// Upper bound on the number of installments in one plan (ten years monthly).
pub const MAX_INSTALLMENTS: u32 = 120;

/// Upper bound on the spacing between installments.
pub const MAX_INTERVAL_MONTHS: u32 = 12;

define_text_enum! {
    /// Settlement state of a single payment row.
    PaymentStatus("payment status") {
        Pending => "PENDING",
        Paid => "PAID",
        Partial => "PARTIAL",
        Overdue => "OVERDUE",
        Cancelled => "CANCELLED",
        Refunded => "REFUNDED",
    }
}

define_text_enum! {
    /// How money was received.
    PaymentMethod("payment method") {
        Cash => "CASH",
        Card => "CARD",
        BankTransfer => "BANK_TRANSFER",
        Insurance => "INSURANCE",
        Other => "OTHER",
    }
}

impl PaymentStatus {
    /// Whether a payment may move from `self` to `next`.
    ///
    /// Open rows may stay `PARTIAL` across several recordings, and an
    /// `OVERDUE` row stays overdue when the overdue sweep runs again.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        match self {
            Pending | Partial | Overdue => matches!(next, Paid | Partial | Overdue | Cancelled),
            Paid => next == Refunded,
            Cancelled | Refunded => false,
        }
    }

    /// Whether money is still owed on a row in this state.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            PaymentStatus::Pending | PaymentStatus::Partial | PaymentStatus::Overdue
        )
    }

    /// Refunds and cancellations need an administrator.
    pub fn requires_admin(self) -> bool {
        matches!(self, PaymentStatus::Refunded | PaymentStatus::Cancelled)
    }
}

/// Validate a manual status change.
pub fn validate_status_transition(from: PaymentStatus, to: PaymentStatus) -> Result<(), CoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Cannot change payment status from {from} to {to}"
        )))
    }
}

/// Result of applying a received amount to a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedPayment {
    pub paid_cents: Cents,
    pub status: PaymentStatus,
}

/// Apply `received_cents` to a payment of `amount_cents` that already has
/// `paid_cents` recorded against it.
///
/// The payment becomes `PAID` once fully covered and `PARTIAL` otherwise.
/// Overpayment is rejected so that the outstanding balance never goes
/// negative.
pub fn apply_payment(
    status: PaymentStatus,
    amount_cents: Cents,
    paid_cents: Cents,
    received_cents: Cents,
) -> Result<AppliedPayment, CoreError> {
    if !status.is_open() {
        return Err(CoreError::Conflict(format!(
            "Cannot record money against a {status} payment"
        )));
    }
    if received_cents <= 0 {
        return Err(CoreError::Validation(
            "Received amount must be greater than zero".into(),
        ));
    }
    let outstanding = amount_cents - paid_cents;
    if received_cents > outstanding {
        return Err(CoreError::Validation(format!(
            "Received amount {received_cents} exceeds outstanding balance {outstanding}"
        )));
    }
    let new_paid = paid_cents + received_cents;
    let status = if new_paid == amount_cents {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    };
    Ok(AppliedPayment {
        paid_cents: new_paid,
        status,
    })
}

/// Whether an open payment is past its due date.
pub fn is_overdue(status: PaymentStatus, due_date: Date, today: Date) -> bool {
    matches!(status, PaymentStatus::Pending | PaymentStatus::Partial) && due_date < today
}

// ---------------------------------------------------------------------------
// Installment generator
// ---------------------------------------------------------------------------

/// Parameters for splitting a treatment fee into scheduled payments.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallmentPlanInput {
    pub total_cents: Cents,
    #[serde(default)]
    pub down_payment_cents: Cents,
    pub installment_count: u32,
    pub first_due_date: Date,
    #[serde(default = "default_interval_months")]
    pub interval_months: u32,
}

fn default_interval_months() -> u32 {
    1
}

/// One scheduled payment produced by [`generate_installments`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Installment {
    /// 1-based position in the schedule.
    pub sequence: i32,
    pub amount_cents: Cents,
    pub due_date: Date,
    pub is_down_payment: bool,
}

/// Split a fee into a down payment plus evenly sized installments.
///
/// The financed balance is divided by `installment_count`; leftover cents
/// go one each to the earliest installments so the schedule always sums to
/// `total_cents` exactly. Without a down payment the first installment is
/// due on `first_due_date`; with one, the down payment takes that date and
/// installments start one interval later.
pub fn generate_installments(input: &InstallmentPlanInput) -> Result<Vec<Installment>, CoreError> {
    validate_plan_input(input)?;

    let financed = input.total_cents - input.down_payment_cents;
    let count = i64::from(input.installment_count);
    let base = financed / count;
    let remainder = financed % count;

    if base == 0 {
        return Err(CoreError::Validation(format!(
            "Cannot split {financed} cents into {count} non-zero installments"
        )));
    }

    let mut schedule = Vec::with_capacity(input.installment_count as usize + 1);
    let has_down_payment = input.down_payment_cents > 0;

    if has_down_payment {
        schedule.push(Installment {
            sequence: 1,
            amount_cents: input.down_payment_cents,
            due_date: input.first_due_date,
            is_down_payment: true,
        });
    }

    for i in 0..input.installment_count {
        let step = if has_down_payment { i + 1 } else { i };
        let due_date = input
            .first_due_date
            .checked_add_months(Months::new(step * input.interval_months))
            .ok_or_else(|| CoreError::Validation("Installment due date out of range".into()))?;
        let extra = if i64::from(i) < remainder { 1 } else { 0 };
        schedule.push(Installment {
            sequence: schedule.len() as i32 + 1,
            amount_cents: base + extra,
            due_date,
            is_down_payment: false,
        });
    }

    Ok(schedule)
}

fn validate_plan_input(input: &InstallmentPlanInput) -> Result<(), CoreError> {
    if input.total_cents <= 0 {
        return Err(CoreError::Validation(
            "Total amount must be greater than zero".into(),
        ));
    }
    if input.down_payment_cents < 0 || input.down_payment_cents >= input.total_cents {
        return Err(CoreError::Validation(
            "Down payment must be at least zero and less than the total".into(),
        ));
    }
    if input.installment_count == 0 || input.installment_count > MAX_INSTALLMENTS {
        return Err(CoreError::Validation(format!(
            "Installment count must be between 1 and {MAX_INSTALLMENTS}"
        )));
    }
    if input.interval_months == 0 || input.interval_months > MAX_INTERVAL_MONTHS {
        return Err(CoreError::Validation(format!(
            "Interval must be between 1 and {MAX_INTERVAL_MONTHS} months"
        )));
    }
    Ok(())
}
