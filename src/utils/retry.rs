use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// Startup Readiness Probing
// ============================================================================
//
// Bounded, fixed-interval retry used while waiting for the database and the
// cache to come up. Exhausting the attempt budget is an error; nothing here
// blocks indefinitely.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Maximum number of probe attempts
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(5),
        }
    }
}

/// The dependency never answered within the attempt budget.
#[derive(Debug, thiserror::Error)]
#[error("{service} not ready after {attempts} attempts")]
pub struct ReadinessError {
    pub service: String,
    pub attempts: u32,
}

/// Probe a dependency until it answers or the attempt budget runs out.
///
/// The probe is re-invoked at a fixed interval; there is no sleep after the
/// final failed attempt.
pub async fn wait_for_ready<F, Fut, T, E>(
    service: &str,
    policy: &RetryPolicy,
    mut probe: F,
) -> Result<T, ReadinessError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    for attempt in 1..=policy.max_attempts {
        match probe().await {
            Ok(value) => {
                tracing::info!(attempt = attempt, "{} is ready", service);
                return Ok(value);
            }
            Err(error) => {
                tracing::warn!(
                    attempt = attempt,
                    max_attempts = policy.max_attempts,
                    error = %error,
                    "{} not ready",
                    service
                );
                if attempt < policy.max_attempts {
                    sleep(policy.interval).await;
                }
            }
        }
    }

    Err(ReadinessError {
        service: service.to_string(),
        attempts: policy.max_attempts,
    })
}
