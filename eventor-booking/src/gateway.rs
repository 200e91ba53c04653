use async_trait::async_trait;
use eventor_core::payment::{ChargeRequest, GatewayError, GatewayOutcome, PaymentGateway};
use eventor_store::app_config::PaymentsConfig;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Stand-in for a mobile money / card processor.
///
/// Waits a random amount of time inside the configured window, then approves
/// with probability `success_rate`. It never reports itself unavailable.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    success_rate: f64,
    min_latency_ms: u64,
    max_latency_ms: u64,
}

impl SimulatedGateway {
    pub fn new(success_rate: f64, min_latency_ms: u64, max_latency_ms: u64) -> Self {
        let success_rate = if success_rate.is_nan() {
            0.0
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self {
            success_rate,
            min_latency_ms: min_latency_ms.min(max_latency_ms),
            max_latency_ms: max_latency_ms.max(min_latency_ms),
        }
    }

    pub fn from_config(config: &PaymentsConfig) -> Self {
        Self::new(config.success_rate, config.min_latency_ms, config.max_latency_ms)
    }

    /// No delay. `1.0` always approves, `0.0` always declines.
    pub fn instant(success_rate: f64) -> Self {
        Self::new(success_rate, 0, 0)
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<GatewayOutcome, GatewayError> {
        // ThreadRng is !Send; draw everything before the await.
        let (delay_ms, approved) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(self.min_latency_ms..=self.max_latency_ms),
                rng.gen_bool(self.success_rate),
            )
        };

        debug!(
            transaction_id = %request.transaction_id,
            method = %request.method,
            phone = ?request.phone_number,
            delay_ms,
            "Simulating gateway charge"
        );
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if approved {
            Ok(GatewayOutcome::Approved)
        } else {
            Ok(GatewayOutcome::Declined {
                reason: "Payment was declined by the payment provider".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventor_core::payment::PaymentMethod;
    use rust_decimal_macros::dec;

    fn request() -> ChargeRequest {
        ChargeRequest {
            booking_id: 1,
            transaction_id: "TXN-1-deadbeef".to_string(),
            amount: dec!(50),
            currency: "GHS".to_string(),
            method: PaymentMethod::BankTransfer,
            phone_number: None,
            card: None,
        }
    }

    #[test]
    fn test_rate_and_latency_are_sanitised() {
        let gw = SimulatedGateway::new(1.7, 300, 100);
        assert_eq!(gw.success_rate(), 1.0);
        assert_eq!((gw.min_latency_ms, gw.max_latency_ms), (100, 300));
        assert_eq!(SimulatedGateway::new(f64::NAN, 0, 0).success_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_extreme_rates_are_deterministic() {
        let approve = SimulatedGateway::instant(1.0);
        let decline = SimulatedGateway::instant(0.0);
        for _ in 0..20 {
            assert_eq!(approve.charge(&request()).await.unwrap(), GatewayOutcome::Approved);
            assert!(matches!(
                decline.charge(&request()).await.unwrap(),
                GatewayOutcome::Declined { .. }
            ));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_stays_in_window() {
        let gw = SimulatedGateway::new(1.0, 2000, 3000);
        let started = tokio::time::Instant::now();
        gw.charge(&request()).await.unwrap();
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(2000));
        assert!(waited <= Duration::from_millis(3000));
    }
}
