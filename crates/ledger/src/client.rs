//! Ledger HTTP client.

use crate::error::{LedgerError, LedgerResult};
use async_trait::async_trait;
use moneypot_core::config::LedgerConfig;
use moneypot_core::payment::PaymentRecord;
use rand::Rng;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

/// Path of the payment-history inquiry endpoint.
const INQUIRE_PAYMENT_PATH: &str = "/edu/savings/inquirePayment";

/// Port for fetching payment history, so the engine and tests can inject
/// the ledger dependency.
#[async_trait]
pub trait LedgerPort: Send + Sync {
    /// Fetch the payment history for one account.
    async fn fetch_payment_history(
        &self,
        user_key: &str,
        account_ref: &str,
    ) -> LedgerResult<PaymentRecord>;
}

/// Institution header carried on every ledger request.
#[derive(Debug, Serialize)]
struct RequestHeader {
    #[serde(rename = "apiName")]
    api_name: String,
    #[serde(rename = "transmissionDate")]
    transmission_date: String,
    #[serde(rename = "transmissionTime")]
    transmission_time: String,
    #[serde(rename = "institutionCode")]
    institution_code: String,
    #[serde(rename = "fintechAppNo")]
    fintech_app_no: String,
    #[serde(rename = "apiServiceCode")]
    api_service_code: String,
    #[serde(rename = "institutionTransactionUniqueNo")]
    institution_transaction_unique_no: String,
    #[serde(rename = "apiKey")]
    api_key: String,
    #[serde(rename = "userKey")]
    user_key: String,
}

#[derive(Debug, Serialize)]
struct InquirePaymentRequest {
    #[serde(rename = "Header")]
    header: RequestHeader,
    #[serde(rename = "accountNo")]
    account_no: String,
}

/// Response envelope: the ledger wraps every record list in `REC`.
#[derive(Debug, Deserialize)]
struct PaymentHistoryResponse {
    #[serde(rename = "REC", default)]
    rec: Vec<PaymentRecord>,
}

/// Timeout-bounded HTTP client for the external ledger.
pub struct LedgerClient {
    http: reqwest::Client,
    base_url: Url,
    config: LedgerConfig,
}

impl LedgerClient {
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| LedgerError::Config(format!("invalid base_url: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LedgerError::Config(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    fn build_header(&self, user_key: &str) -> RequestHeader {
        let api_name = INQUIRE_PAYMENT_PATH
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let (date, time) = transmission_stamp(self.config.utc_offset_hours);
        // HHMMSS + YYYYMMDD + 6 random digits: 20 characters.
        let unique_no = format!(
            "{time}{date}{:06}",
            rand::thread_rng().gen_range(0..1_000_000)
        );
        RequestHeader {
            api_service_code: api_name.clone(),
            api_name,
            transmission_date: date,
            transmission_time: time,
            institution_code: self.config.institution_code.clone(),
            fintech_app_no: self.config.fintech_app_no.clone(),
            institution_transaction_unique_no: unique_no,
            api_key: self.config.api_key.clone(),
            user_key: user_key.to_string(),
        }
    }
}

#[async_trait]
impl LedgerPort for LedgerClient {
    async fn fetch_payment_history(
        &self,
        user_key: &str,
        account_ref: &str,
    ) -> LedgerResult<PaymentRecord> {
        let url = self
            .base_url
            .join(INQUIRE_PAYMENT_PATH)
            .map_err(|e| LedgerError::Config(format!("invalid request URL: {e}")))?;
        let request = InquirePaymentRequest {
            header: self.build_header(user_key),
            account_no: account_ref.to_string(),
        };

        tracing::debug!(account_ref, "fetching payment history");
        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LedgerError::Transient(format!("reading response body: {e}")))?;

        if !status.is_success() {
            return Err(classify_status(status, body));
        }

        let envelope: PaymentHistoryResponse = serde_json::from_str(&body)
            .map_err(|e| LedgerError::InvalidResponse(format!("decoding payment history: {e}")))?;
        envelope
            .rec
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::InvalidResponse("empty REC list".to_string()))
    }
}

/// Map a failed send (timeout, connect, protocol) to a transient error.
/// Timeouts abort the request; the retry mechanism is simply the next
/// scheduled cycle.
fn classify_send_error(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Transient("request timed out".to_string())
    } else {
        LedgerError::Transient(e.to_string())
    }
}

/// Classify a non-2xx status: 400/404 mean the record is gone or the
/// account is malformed (terminal); everything else is transient.
fn classify_status(status: StatusCode, body: String) -> LedgerError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => LedgerError::Access {
            status: status.as_u16(),
            body: truncate(&body, 300),
        },
        _ => LedgerError::Transient(format!(
            "HTTP {status}: {}",
            truncate(&body, 300)
        )),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// `YYYYMMDD` and `HHMMSS` stamps in the ledger's business timezone.
fn transmission_stamp(utc_offset_hours: i8) -> (String, String) {
    let offset =
        UtcOffset::from_hms(utc_offset_hours, 0, 0).unwrap_or(UtcOffset::UTC);
    let now = OffsetDateTime::now_utc().to_offset(offset);
    let date = format!(
        "{:04}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day()
    );
    let time = format!("{:02}{:02}{:02}", now.hour(), now.minute(), now.second());
    (date, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use moneypot_core::config::AppConfig;

    #[test]
    fn status_400_and_404_are_terminal() {
        assert!(classify_status(StatusCode::BAD_REQUEST, String::new()).is_terminal());
        assert!(classify_status(StatusCode::NOT_FOUND, String::new()).is_terminal());
    }

    #[test]
    fn other_statuses_are_transient() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::UNAUTHORIZED,
        ] {
            assert!(!classify_status(status, String::new()).is_terminal());
        }
    }

    #[test]
    fn access_error_preserves_status_and_truncates_body() {
        let body = "x".repeat(1000);
        match classify_status(StatusCode::NOT_FOUND, body) {
            LedgerError::Access { status, body } => {
                assert_eq!(status, 404);
                assert!(body.len() <= 303);
            }
            other => panic!("expected Access, got {other:?}"),
        }
    }

    #[test]
    fn header_stamps_are_fixed_width() {
        let client = LedgerClient::new(AppConfig::for_testing().ledger).unwrap();
        let header = client.build_header("user-key");
        assert_eq!(header.transmission_date.len(), 8);
        assert_eq!(header.transmission_time.len(), 6);
        assert_eq!(header.institution_transaction_unique_no.len(), 20);
        assert_eq!(header.api_name, "inquirePayment");
        assert_eq!(header.api_service_code, "inquirePayment");
    }

    #[test]
    fn envelope_takes_first_record() {
        let raw = r#"{
            "REC": [{
                "paymentInfo": [
                    {"status": "SUCCESS", "paymentDate": "20250501"},
                    {"status": "FAIL", "paymentDate": "20250508"}
                ],
                "accountExpiryDate": "20251011",
                "totalBalance": "100000"
            }]
        }"#;
        let envelope: PaymentHistoryResponse = serde_json::from_str(raw).unwrap();
        let record = envelope.rec.into_iter().next().unwrap();
        assert_eq!(record.payments.len(), 2);
        assert_eq!(record.account_expiry_date, "20251011");
    }

    #[test]
    fn empty_envelope_is_invalid() {
        let envelope: PaymentHistoryResponse = serde_json::from_str(r#"{"REC": []}"#).unwrap();
        assert!(envelope.rec.is_empty());
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let mut config = AppConfig::for_testing().ledger;
        config.base_url = "not a url".to_string();
        assert!(matches!(
            LedgerClient::new(config),
            Err(LedgerError::Config(_))
        ));
    }
}
