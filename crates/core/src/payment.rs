//! Payment records from the external ledger and their parsed facts.

use crate::error::{Error, Result};
use crate::paydate::PayDate;
use serde::{Deserialize, Serialize};

/// Payment entry status reported by the ledger.
pub const PAYMENT_STATUS_SUCCESS: &str = "SUCCESS";

/// A single scheduled-payment entry in a ledger response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEntry {
    /// `"SUCCESS"` for a completed deposit; anything else counts as failed.
    pub status: String,
    /// Fixed 8-digit `YYYYMMDD` date of the payment.
    #[serde(rename = "paymentDate")]
    pub payment_date: String,
}

/// Raw payment history for one account, as reported by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Payment entries; may be absent or empty for a fresh account.
    #[serde(rename = "paymentInfo", default)]
    pub payments: Vec<PaymentEntry>,
    /// Schedule expiry date in fixed 8-digit form.
    #[serde(rename = "accountExpiryDate")]
    pub account_expiry_date: String,
    /// Total balance as a decimal string; absent means zero.
    #[serde(rename = "totalBalance", default)]
    pub total_balance: Option<String>,
}

/// Normalized facts derived from a [`PaymentRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFacts {
    pub success_count: u32,
    pub fail_count: u32,
    /// Most recent payment date across all entries; `None` when the
    /// entry list is empty.
    pub last_payment_date: Option<PayDate>,
    pub total_balance: i64,
    pub expiry_date: PayDate,
    /// `today` strictly after the expiry date.
    pub is_expired: bool,
}

impl PaymentFacts {
    /// Parse a raw ledger record into normalized facts.
    ///
    /// Pure function of its inputs; the caller supplies `today` so that
    /// expiry checks are deterministic and testable.
    pub fn from_record(record: &PaymentRecord, today: PayDate) -> Result<Self> {
        let mut success_count = 0u32;
        let mut fail_count = 0u32;
        let mut last_payment_date: Option<PayDate> = None;

        for entry in &record.payments {
            if entry.status == PAYMENT_STATUS_SUCCESS {
                success_count += 1;
            } else {
                fail_count += 1;
            }
            let date = PayDate::parse(&entry.payment_date)?;
            if last_payment_date.is_none_or(|latest| date > latest) {
                last_payment_date = Some(date);
            }
        }

        let expiry_date = PayDate::parse(&record.account_expiry_date)?;
        let total_balance = match record.total_balance.as_deref() {
            None | Some("") => 0,
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::InvalidPaymentRecord(format!("totalBalance: {raw}")))?,
        };

        Ok(Self {
            success_count,
            fail_count,
            last_payment_date,
            total_balance,
            expiry_date,
            is_expired: today > expiry_date,
        })
    }
}
