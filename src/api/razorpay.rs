use std::time::Duration;

use anyhow::Context;
use bigdecimal::{BigDecimal, ToPrimitive, rounding::RoundingMode};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{config::RazorpayConfig, error::AppError};

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Debug)]
struct CreateOrderReq<'a> {
    amount: i64,
    currency: &'a str,
    payment_capture: u8,
}

/// The gateway's order object, reduced to the fields this service stores.
#[derive(Deserialize, Debug)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// Create a payment intent on the gateway. Amount is in minor units and
/// capture is forced on. The round trip is bounded by the configured timeout;
/// an unreachable gateway is a retryable server-side failure, not a client
/// error.
pub async fn create_order(
    client: &Client,
    config: &RazorpayConfig,
    amount_minor: i64,
    currency: &str,
) -> Result<GatewayOrder, AppError> {
    let res = client
        .post(format!("{}/orders", config.api_base))
        .basic_auth(&config.key_id, Some(&config.key_secret))
        .timeout(Duration::from_secs(config.timeout_secs))
        .json(&CreateOrderReq {
            amount: amount_minor,
            currency,
            payment_capture: 1,
        })
        .send()
        .await
        .map_err(|_| AppError::ServiceUnreachable("Razorpay".into()))?;

    if !res.status().is_success() {
        return Err(AppError::Other(anyhow::anyhow!(
            "Razorpay order creation failed with status {}",
            res.status()
        )));
    }

    let order: GatewayOrder = res.json().await.context("Failed to parse JSON")?;
    Ok(order)
}

/// Verify a payment callback signature: constant-time HMAC-SHA256 over
/// `"{order_id}|{payment_id}"` with the key secret, hex encoded.
pub fn verify_signature(
    key_secret: &str,
    razorpay_order_id: &str,
    razorpay_payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(key_secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{razorpay_order_id}|{razorpay_payment_id}").as_bytes());

    mac.verify_slice(&expected).is_ok()
}

/// Convert a decimal amount to gateway minor units (e.g. rupees to paise),
/// rounding half-even at the minor unit.
pub fn to_minor_units(amount: &BigDecimal) -> Option<i64> {
    (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfEven)
        .to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_is_accepted() {
        let signature = sign("test_secret", "order_abc", "pay_xyz");
        assert!(verify_signature("test_secret", "order_abc", "pay_xyz", &signature));
    }

    #[test]
    fn signature_from_wrong_secret_is_rejected() {
        let signature = sign("wrong_secret", "order_abc", "pay_xyz");
        assert!(!verify_signature("test_secret", "order_abc", "pay_xyz", &signature));
    }

    #[test]
    fn signature_over_different_ids_is_rejected() {
        let signature = sign("test_secret", "order_abc", "pay_xyz");
        assert!(!verify_signature("test_secret", "order_abc", "pay_other", &signature));
        assert!(!verify_signature("test_secret", "order_other", "pay_xyz", &signature));
    }

    #[test]
    fn non_hex_signature_is_rejected() {
        assert!(!verify_signature("test_secret", "order_abc", "pay_xyz", "zz-not-hex"));
    }

    #[test]
    fn whole_amounts_convert_exactly() {
        let amount = BigDecimal::from(500);
        assert_eq!(to_minor_units(&amount), Some(50000));
    }

    #[test]
    fn sub_cent_amounts_round_half_even() {
        assert_eq!(
            to_minor_units(&BigDecimal::from_str("12.345").unwrap()),
            Some(1234)
        );
        assert_eq!(
            to_minor_units(&BigDecimal::from_str("12.355").unwrap()),
            Some(1236)
        );
        assert_eq!(
            to_minor_units(&BigDecimal::from_str("0.005").unwrap()),
            Some(0)
        );
    }

    #[test]
    fn two_decimal_amounts_are_untouched() {
        assert_eq!(
            to_minor_units(&BigDecimal::from_str("199.99").unwrap()),
            Some(19999)
        );
    }
}
