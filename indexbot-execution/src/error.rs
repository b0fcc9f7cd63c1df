use thiserror::Error;

/// No tradable contract could be resolved for the requested strike/side.
/// Entry is skipped for this cycle and retried on the next eligible candle.
#[derive(Debug, Clone, Error)]
#[error("no option contract resolved: {0}")]
pub struct ResolveError(pub String);

/// Network/timeout class of broker error. Retryable within the caller's
/// deadline; never advances local state on its own.
#[derive(Debug, Clone, Error)]
#[error("transient broker error: {0}")]
pub struct TransientBrokerError(pub String);

/// Non-retryable broker failure (auth, malformed request, vendor outage
/// confirmed non-transient). The caller must not retry the same attempt.
#[derive(Debug, Clone, Error)]
#[error("fatal broker error: {0}")]
pub struct FatalBrokerError(pub String);

/// The broker explicitly rejected a placed order. Terminal for that
/// attempt; surfaced via `lastAction`, never silently retried.
#[derive(Debug, Clone, Error)]
#[error("order rejected: {0}")]
pub struct BrokerRejection(pub String);
