use bookindoor_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{CoreError, CoreResult};

/// Payment progress of a booking. Ordered: a status only ever moves forward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    #[serde(alias = "advance_paid")]
    AdvancedPaid,
    FullPaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::AdvancedPaid => "advanced_paid",
            PaymentStatus::FullPaid => "full_paid",
        }
    }

    fn rank(self) -> u8 {
        match self {
            PaymentStatus::Pending => 0,
            PaymentStatus::AdvancedPaid => 1,
            PaymentStatus::FullPaid => 2,
        }
    }

    pub fn can_advance_to(self, target: PaymentStatus) -> bool {
        self.rank() < target.rank()
    }

    /// Statuses from which `target` is a forward move.
    pub fn predecessors(target: PaymentStatus) -> Vec<PaymentStatus> {
        [PaymentStatus::Pending, PaymentStatus::AdvancedPaid, PaymentStatus::FullPaid]
            .into_iter()
            .filter(|s| s.can_advance_to(target))
            .collect()
    }

    /// Counts toward revenue.
    pub fn is_paid(self) -> bool {
        matches!(self, PaymentStatus::AdvancedPaid | PaymentStatus::FullPaid)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "advanced_paid" | "advance_paid" => Ok(PaymentStatus::AdvancedPaid),
            "full_paid" => Ok(PaymentStatus::FullPaid),
            other => Err(CoreError::validation(format!("Unknown payment status: {}", other))),
        }
    }
}

/// What the customer chose to pay up front.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    #[default]
    Full,
    Advance,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Full => "full",
            PaymentMode::Advance => "advance",
        }
    }

    /// Payment status a verified successful payment moves the booking to.
    pub fn settled_status(self) -> PaymentStatus {
        match self {
            PaymentMode::Full => PaymentStatus::FullPaid,
            PaymentMode::Advance => PaymentStatus::AdvancedPaid,
        }
    }
}

impl FromStr for PaymentMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(PaymentMode::Full),
            "advance" => Ok(PaymentMode::Advance),
            other => Err(CoreError::validation(format!("Unknown payment mode: {}", other))),
        }
    }
}

/// Gateway status codes carried in `status_code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayStatus {
    Success,
    Pending,
    Canceled,
    Failed,
    ChargedBack,
    Unknown(String),
}

impl GatewayStatus {
    pub fn from_code(code: &str) -> Self {
        match code.trim().parse::<i32>() {
            Ok(2) => GatewayStatus::Success,
            Ok(0) => GatewayStatus::Pending,
            Ok(-1) => GatewayStatus::Canceled,
            Ok(-2) => GatewayStatus::Failed,
            Ok(-3) => GatewayStatus::ChargedBack,
            _ => GatewayStatus::Unknown(code.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        *self == GatewayStatus::Success
    }
}

/// Form fields the gateway posts to the notify URL. Extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayNotification {
    pub merchant_id: String,
    pub order_id: String,
    pub payhere_amount: String,
    pub payhere_currency: String,
    pub status_code: String,
    pub md5sig: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
}

/// Merchant id + shared secret, loaded from trusted server configuration.
#[derive(Debug, Clone)]
pub struct MerchantCredentials {
    pub merchant_id: String,
    pub merchant_secret: Masked<String>,
}

impl MerchantCredentials {
    pub fn new(merchant_id: impl Into<String>, merchant_secret: impl Into<String>) -> CoreResult<Self> {
        let merchant_id = merchant_id.into();
        let merchant_secret = merchant_secret.into();

        if merchant_id.trim().is_empty() {
            return Err(CoreError::ConfigurationError("Missing PayHere merchant id".to_string()));
        }
        if merchant_secret.trim().is_empty() {
            return Err(CoreError::ConfigurationError("Missing PayHere merchant secret".to_string()));
        }

        Ok(Self {
            merchant_id,
            merchant_secret: Masked::new(merchant_secret),
        })
    }
}

/// Payload handed to the gateway's checkout (redirect or JS SDK).
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub sandbox: bool,
    pub merchant_id: String,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
    pub notify_url: Option<String>,
    pub order_id: String,
    pub items: String,
    pub amount: String,
    pub currency: String,
    pub hash: String,
    pub first_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub advance: bool,
}

/// Render minor units with exactly two decimal places, as the gateway hashes them.
pub fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// `percent` of `cents`, rounded half-up to the cent. `None` on overflow.
pub fn percent_of(cents: i64, percent: u32) -> Option<i64> {
    cents
        .checked_mul(i64::from(percent))?
        .checked_add(50)
        .map(|scaled| scaled.div_euclid(100))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_two_decimals() {
        assert_eq!(format_amount(150000), "1500.00");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(123456), "1234.56");
        assert_eq!(format_amount(0), "0.00");
        assert_eq!(format_amount(-250), "-2.50");
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        assert_eq!(percent_of(300000, 50), Some(150000));
        assert_eq!(percent_of(101, 50), Some(51));
        assert_eq!(percent_of(100, 100), Some(100));
        assert_eq!(percent_of(i64::MAX / 10, 50), None);
    }

    #[test]
    fn test_payment_status_only_moves_forward() {
        assert!(PaymentStatus::Pending.can_advance_to(PaymentStatus::AdvancedPaid));
        assert!(PaymentStatus::AdvancedPaid.can_advance_to(PaymentStatus::FullPaid));
        assert!(!PaymentStatus::FullPaid.can_advance_to(PaymentStatus::AdvancedPaid));
        assert!(!PaymentStatus::FullPaid.can_advance_to(PaymentStatus::FullPaid));
        assert_eq!(
            PaymentStatus::predecessors(PaymentStatus::FullPaid),
            vec![PaymentStatus::Pending, PaymentStatus::AdvancedPaid]
        );
        assert!(PaymentStatus::predecessors(PaymentStatus::Pending).is_empty());
    }

    #[test]
    fn test_payment_status_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentStatus::AdvancedPaid).unwrap(), "\"advanced_paid\"");
        let legacy: PaymentStatus = serde_json::from_str("\"advance_paid\"").unwrap();
        assert_eq!(legacy, PaymentStatus::AdvancedPaid);
        assert_eq!("full_paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::FullPaid);
    }

    #[test]
    fn test_gateway_status_codes() {
        assert!(GatewayStatus::from_code("2").is_success());
        assert!(GatewayStatus::from_code(" 2 ").is_success());
        assert_eq!(GatewayStatus::from_code("-2"), GatewayStatus::Failed);
        assert_eq!(GatewayStatus::from_code("0"), GatewayStatus::Pending);
        assert_eq!(GatewayStatus::from_code("abc"), GatewayStatus::Unknown("abc".to_string()));
    }

    #[test]
    fn test_missing_credentials_are_configuration_errors() {
        assert!(matches!(
            MerchantCredentials::new("", "secret"),
            Err(CoreError::ConfigurationError(_))
        ));
        assert!(matches!(
            MerchantCredentials::new("1211149", "  "),
            Err(CoreError::ConfigurationError(_))
        ));
        assert!(MerchantCredentials::new("1211149", "secret").is_ok());
    }
}
