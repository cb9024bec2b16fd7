//! Pacer (§4.4): enforces bus-quiet and inter-frame timing. All three
//! knobs are tunable per the Open Questions note — nothing here is
//! hard-coded at the call site, only defaulted.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacerConfig {
    /// Minimum bus-quiet interval before transmit.
    pub idle_before_tx: Duration,
    /// Gap enforced after the previous transmit completes.
    pub inter_frame_delay: Duration,
    /// Optional per-byte throttling for slow USB-RS485 bridges.
    pub inter_byte_delay: Duration,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            idle_before_tx: Duration::from_millis(40),
            inter_frame_delay: Duration::from_millis(50),
            inter_byte_delay: Duration::ZERO,
        }
    }
}

impl PacerConfig {
    /// Total time a write of `payload_len` bytes takes to clock out at
    /// `inter_byte_delay`, plus the subsequent inter-frame gap. Used to
    /// verify pacing behavior in tests (§8 boundary behavior).
    pub fn transmit_duration(&self, payload_len: usize) -> Duration {
        self.inter_byte_delay * payload_len as u32 + self.inter_frame_delay
    }
}

/// Per-port pacer state: the clock since the last transmit completed.
#[derive(Debug)]
pub struct Pacer {
    config: PacerConfig,
    last_transmit_at: Option<tokio::time::Instant>,
}

impl Pacer {
    pub fn new(config: PacerConfig) -> Self {
        Self {
            config,
            last_transmit_at: None,
        }
    }

    pub fn config(&self) -> PacerConfig {
        self.config
    }

    /// Wait out whatever is left of the inter-frame delay since the
    /// previous transmit. A no-op on the very first transmit.
    pub async fn wait_inter_frame(&self) {
        if let Some(last) = self.last_transmit_at {
            let elapsed = last.elapsed();
            if elapsed < self.config.inter_frame_delay {
                tokio::time::sleep(self.config.inter_frame_delay - elapsed).await;
            }
        }
    }

    /// Record that a transmit just completed, resetting the inter-frame
    /// clock.
    pub fn mark_transmitted(&mut self) {
        self.last_transmit_at = Some(tokio::time::Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transmit_duration_scales_with_payload_and_inter_byte_delay() {
        let config = PacerConfig {
            inter_byte_delay: Duration::from_millis(2),
            inter_frame_delay: Duration::from_millis(50),
            ..Default::default()
        };
        assert_eq!(
            config.transmit_duration(10),
            Duration::from_millis(20) + Duration::from_millis(50)
        );
    }
}
