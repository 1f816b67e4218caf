//! The cooperative idle pass, re-entered from every blocking wait
//! (spec §4.7). Under the historical cooperative scheduler this was where
//! `-In` gave up the CPU timeslice; on the tokio runtime every idle method
//! collapses to [`tokio::task::yield_now`] (Design Notes §9).

use hslink_transport::{ErrorCounters, TransportAdapter, MAX_FRAMING, MAX_OVERRUN};

use crate::error::EngineError;

/// What the caller should do after one idle pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleOutcome {
    /// Nothing notable; keep going.
    Continue,
    /// The line-error counters crossed `MAX_OVERRUN`: the caller should
    /// enter a slow-handshake region for the next I/O.
    EnableSlowHandshake,
}

/// Runs one idle pass: yields to the scheduler, drains the adapter's line
/// error counters, and checks carrier state.
///
/// # Errors
/// Returns [`EngineError::CarrierLost`] if carrier was required and is now
/// gone, or [`EngineError::TooManyFramingErrors`] once the framing-error
/// count exceeds [`MAX_FRAMING`].
pub async fn idle_tick<T: TransportAdapter>(
    adapter: &mut T,
    require_carrier: bool,
) -> Result<IdleOutcome, EngineError> {
    tokio::task::yield_now().await;

    if require_carrier && adapter.carrier_lost() {
        return Err(EngineError::CarrierLost);
    }

    let ErrorCounters {
        overrun, framing, ..
    } = adapter.take_error_counters();

    if framing > MAX_FRAMING {
        return Err(EngineError::TooManyFramingErrors);
    }

    if overrun >= MAX_OVERRUN {
        return Ok(IdleOutcome::EnableSlowHandshake);
    }

    Ok(IdleOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hslink_transport::LoopbackTransport;

    #[tokio::test]
    async fn clean_line_continues() {
        let (mut a, _b) = LoopbackTransport::pair();
        assert_eq!(idle_tick(&mut a, false).await.unwrap(), IdleOutcome::Continue);
    }

    #[tokio::test]
    async fn lost_carrier_is_an_error_only_when_required() {
        let (mut a, _b) = LoopbackTransport::pair();
        a.simulate_carrier_lost();
        assert!(idle_tick(&mut a, false).await.is_ok());
        assert!(matches!(
            idle_tick(&mut a, true).await,
            Err(EngineError::CarrierLost)
        ));
    }

    #[tokio::test]
    async fn excess_framing_errors_abort() {
        let (mut a, _b) = LoopbackTransport::pair();
        for _ in 0..=MAX_FRAMING {
            a.inject_framing_error();
        }
        assert!(matches!(
            idle_tick(&mut a, false).await,
            Err(EngineError::TooManyFramingErrors)
        ));
    }
}
