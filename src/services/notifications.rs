//! Best-effort WhatsApp messages sent through an HTTP webhook when a booking
//! is placed.

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::config::WhatsAppConfig;
use crate::errors::ServiceError;

/// Body accepted by the webhook
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WhatsAppMessage {
    pub to: String,
    pub message: String,
}

/// What a booking notification needs to know about the order
#[derive(Debug, Clone)]
pub struct BookingNotice {
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub total: Decimal,
    pub item_names: Vec<String>,
    pub service_date: Option<String>,
    pub time_slot: Option<String>,
}

impl BookingNotice {
    fn customer_text(&self) -> String {
        let mut text = format!(
            "Hi {}, your City Home Service booking {} is confirmed. Total: Rs. {}.",
            self.customer_name, self.order_number, self.total
        );
        if let Some(date) = &self.service_date {
            text.push_str(&format!(" Scheduled for {date}"));
            if let Some(slot) = &self.time_slot {
                text.push_str(&format!(" ({slot})"));
            }
            text.push('.');
        }
        text
    }

    fn admin_text(&self) -> String {
        format!(
            "New booking {} from {} ({}). Services: {}. Total: Rs. {}.",
            self.order_number,
            self.customer_name,
            self.customer_phone,
            self.item_names.join(", "),
            self.total
        )
    }
}

#[derive(Debug)]
struct Endpoint {
    api_url: String,
    api_key: String,
    admin_recipient: Option<String>,
}

/// WhatsApp delivery with retries. Without configured credentials every send
/// is a logged no-op.
#[derive(Clone, Debug)]
pub struct WhatsAppNotifier {
    client: reqwest::Client,
    endpoint: Option<Arc<Endpoint>>,
    max_retries: u32,
    backoff_base: Duration,
}

impl WhatsAppNotifier {
    pub fn from_config(config: &WhatsAppConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("HTTP client: {e}")))?;

        let endpoint = if config.is_enabled() {
            Some(Arc::new(Endpoint {
                api_url: config.api_url.clone().unwrap_or_default(),
                api_key: config.api_key.clone().unwrap_or_default(),
                admin_recipient: config
                    .recipient
                    .clone()
                    .filter(|r| !r.trim().is_empty()),
            }))
        } else {
            None
        };

        Ok(Self {
            client,
            endpoint,
            max_retries: config.max_retries.max(1),
            backoff_base: Duration::from_secs(1),
        })
    }

    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: None,
            max_retries: 1,
            backoff_base: Duration::from_secs(1),
        }
    }

    /// Overrides the first retry delay; later delays double
    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Queues the customer confirmation and the admin alert on background
    /// tasks. Never fails the caller.
    pub fn booking_placed(&self, notice: BookingNotice) {
        let Some(endpoint) = self.endpoint.as_ref() else {
            debug!(order_number = %notice.order_number, "WhatsApp disabled; skipping notification");
            return;
        };

        if !notice.customer_phone.trim().is_empty() {
            self.send_async(WhatsAppMessage {
                to: notice.customer_phone.clone(),
                message: notice.customer_text(),
            });
        }
        if let Some(admin) = &endpoint.admin_recipient {
            self.send_async(WhatsAppMessage {
                to: admin.clone(),
                message: notice.admin_text(),
            });
        }
    }

    fn send_async(&self, message: WhatsAppMessage) {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&message).await {
                error!(error = %e, to = %message.to, "WhatsApp notification dropped");
            }
        });
    }

    /// Delivers one message, retrying with exponential backoff
    #[instrument(skip(self, message), fields(to = %message.to))]
    pub async fn send(&self, message: &WhatsAppMessage) -> Result<(), ServiceError> {
        let endpoint = self.endpoint.as_ref().ok_or_else(|| {
            ServiceError::ExternalServiceError("WhatsApp notifier is not configured".into())
        })?;

        for attempt in 1..=self.max_retries {
            let result = self
                .client
                .post(&endpoint.api_url)
                .bearer_auth(&endpoint.api_key)
                .json(message)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    info!("WhatsApp message delivered");
                    return Ok(());
                }
                Ok(response) => warn!(
                    "WhatsApp delivery failed with status: {} (attempt {}/{})",
                    response.status(),
                    attempt,
                    self.max_retries
                ),
                Err(e) => warn!(
                    "WhatsApp delivery error: {} (attempt {}/{})",
                    e, attempt, self.max_retries
                ),
            }

            if attempt < self.max_retries {
                tokio::time::sleep(self.backoff_base * 2_u32.pow(attempt - 1)).await;
            }
        }

        Err(ServiceError::ExternalServiceError(format!(
            "Failed to deliver WhatsApp message after {} attempts",
            self.max_retries
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn notice() -> BookingNotice {
        BookingNotice {
            order_number: "CHS-20240501-1A2B3C4D".into(),
            customer_name: "Asha Rao".into(),
            customer_phone: "9876543210".into(),
            total: dec!(1338),
            item_names: vec!["Deep cleaning".into(), "Sofa cleaning".into()],
            service_date: Some("2024-05-04".into()),
            time_slot: Some("10:00-12:00".into()),
        }
    }

    #[test]
    fn messages_mention_order_and_total() {
        let n = notice();
        let customer = n.customer_text();
        assert!(customer.contains("CHS-20240501-1A2B3C4D"));
        assert!(customer.contains("1338"));
        assert!(customer.contains("2024-05-04 (10:00-12:00)"));

        let admin = n.admin_text();
        assert!(admin.contains("Deep cleaning, Sofa cleaning"));
        assert!(admin.contains("9876543210"));
    }

    #[test]
    fn unconfigured_notifier_is_disabled() {
        let notifier = WhatsAppNotifier::from_config(&WhatsAppConfig::default()).unwrap();
        assert!(!notifier.is_enabled());
    }

    #[tokio::test]
    async fn send_without_endpoint_errors() {
        let err = WhatsAppNotifier::disabled()
            .send(&WhatsAppMessage {
                to: "1".into(),
                message: "x".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ExternalServiceError(_)));
    }
}
