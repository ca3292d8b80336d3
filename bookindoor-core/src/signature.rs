//! PayHere request hashing and notification signature checks.
//!
//! Both digests are `UPPER(MD5(fields || UPPER(MD5(merchant_secret))))`. The
//! request hash covers `merchant_id, order_id, amount(2dp), currency`; the
//! notification signature additionally covers `status_code` and uses the
//! amount/currency strings exactly as the gateway sent them.

use constant_time_eq::constant_time_eq;
use md5::{Digest, Md5};

use crate::payment::format_amount;
use crate::{CoreError, CoreResult};

fn md5_upper(input: &str) -> String {
    hex::encode_upper(Md5::digest(input.as_bytes()))
}

fn ensure_configured(merchant_id: &str, merchant_secret: &str) -> CoreResult<()> {
    if merchant_id.trim().is_empty() {
        return Err(CoreError::ConfigurationError("Missing PayHere merchant id".to_string()));
    }
    if merchant_secret.is_empty() {
        return Err(CoreError::ConfigurationError("Missing PayHere merchant secret".to_string()));
    }
    Ok(())
}

pub fn compute_request_hash(
    merchant_id: &str,
    order_id: &str,
    amount_cents: i64,
    currency: &str,
    merchant_secret: &str,
) -> CoreResult<String> {
    ensure_configured(merchant_id, merchant_secret)?;

    let data = format!(
        "{}{}{}{}{}",
        merchant_id,
        order_id,
        format_amount(amount_cents),
        currency,
        md5_upper(merchant_secret)
    );
    Ok(md5_upper(&data))
}

/// Signature the gateway is expected to send for a notification.
pub fn notification_signature(
    merchant_id: &str,
    order_id: &str,
    gateway_amount: &str,
    gateway_currency: &str,
    status_code: &str,
    merchant_secret: &str,
) -> CoreResult<String> {
    ensure_configured(merchant_id, merchant_secret)?;

    let data = format!(
        "{}{}{}{}{}{}",
        merchant_id,
        order_id,
        gateway_amount,
        gateway_currency,
        status_code,
        md5_upper(merchant_secret)
    );
    Ok(md5_upper(&data))
}

/// `Ok(false)` on any mismatch; `Err` only when credentials are missing.
pub fn verify_notification_signature(
    merchant_id: &str,
    order_id: &str,
    gateway_amount: &str,
    gateway_currency: &str,
    status_code: &str,
    provided_signature: &str,
    merchant_secret: &str,
) -> CoreResult<bool> {
    let expected = notification_signature(
        merchant_id,
        order_id,
        gateway_amount,
        gateway_currency,
        status_code,
        merchant_secret,
    )?;
    let provided = provided_signature.trim().to_ascii_uppercase();

    Ok(constant_time_eq(expected.as_bytes(), provided.as_bytes()))
}
