use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::payment::{Payment, PaymentMethod, PaymentStatus};

pub const TRAILING_MONTHS: i32 = 12;
pub const RECENT_TRANSACTIONS: usize = 10;
pub const AVERAGE_RATE_SCALE: u32 = 4;
pub const DEFAULT_SERVICE_NAME: &str = "Event booking";

/// Dashboard aggregates over completed payments. Every numeric field is zero,
/// never absent, when nothing has been paid yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_transactions: i64,
    pub total_commission: Decimal,
    pub total_revenue: Decimal,
    pub average_rate: Decimal,
    pub monthly_breakdown: Vec<MonthlyBreakdown>,
    pub recent_transactions: Vec<RecentTransaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBreakdown {
    /// `YYYY-MM`
    pub month: String,
    pub transactions: i64,
    pub revenue: Decimal,
    pub commission: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTransaction {
    pub id: i64,
    pub transaction_id: String,
    pub booking_id: i64,
    pub amount: Decimal,
    pub commission_amount: Decimal,
    pub provider_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub service_name: String,
    pub customer_name: String,
    pub provider_name: String,
}

/// A payment joined with the display names the dashboard shows next to it.
#[derive(Debug, Clone)]
pub struct LabelledPayment {
    pub payment: Payment,
    pub service_name: Option<String>,
    pub customer_name: String,
    pub provider_name: String,
}

fn month_index(at: &DateTime<Utc>) -> i32 {
    at.year() * 12 + at.month0() as i32
}

/// Builds [`AdminStats`] from raw rows. Stores that cannot push the
/// aggregation down into a query use this directly.
pub fn aggregate(rows: Vec<LabelledPayment>, now: DateTime<Utc>) -> AdminStats {
    let mut completed: Vec<LabelledPayment> = rows
        .into_iter()
        .filter(|r| r.payment.status == PaymentStatus::Completed)
        .collect();

    let total_transactions = completed.len() as i64;
    let total_revenue: Decimal = completed.iter().map(|r| r.payment.amount).sum();
    let total_commission: Decimal = completed.iter().map(|r| r.payment.commission_amount).sum();
    let average_rate = if completed.is_empty() {
        Decimal::ZERO
    } else {
        let rates: Decimal = completed.iter().map(|r| r.payment.commission_rate).sum();
        (rates / Decimal::from(total_transactions)).round_dp(AVERAGE_RATE_SCALE)
    };

    let current = month_index(&now);
    let mut months: BTreeMap<i32, MonthlyBreakdown> = BTreeMap::new();
    for row in &completed {
        let idx = month_index(&row.payment.created_at);
        if !(0..TRAILING_MONTHS).contains(&(current - idx)) {
            continue;
        }
        let entry = months.entry(idx).or_insert_with(|| MonthlyBreakdown {
            month: row.payment.created_at.format("%Y-%m").to_string(),
            transactions: 0,
            revenue: Decimal::ZERO,
            commission: Decimal::ZERO,
        });
        entry.transactions += 1;
        entry.revenue += row.payment.amount;
        entry.commission += row.payment.commission_amount;
    }
    let monthly_breakdown = months.into_values().rev().collect();

    completed.sort_by(|a, b| {
        b.payment
            .created_at
            .cmp(&a.payment.created_at)
            .then(b.payment.id.cmp(&a.payment.id))
    });
    let recent_transactions = completed
        .into_iter()
        .take(RECENT_TRANSACTIONS)
        .map(|r| RecentTransaction {
            id: r.payment.id,
            transaction_id: r.payment.transaction_id,
            booking_id: r.payment.booking_id,
            amount: r.payment.amount,
            commission_amount: r.payment.commission_amount,
            provider_amount: r.payment.provider_amount,
            payment_method: r.payment.payment_method,
            created_at: r.payment.created_at,
            service_name: r.service_name.unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            customer_name: r.customer_name,
            provider_name: r.provider_name,
        })
        .collect();

    AdminStats {
        total_transactions,
        total_commission,
        total_revenue,
        average_rate,
        monthly_breakdown,
        recent_transactions,
    }
}
