use std::future;
use tokio::time::{Duration, Instant, Interval, MissedTickBehavior, interval_at};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Owned, cancellable tick subscription.
///
/// Disarming drops the underlying interval, so nothing keeps firing once the
/// timer stops. A disarmed ticker never resolves `tick()`.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    interval: Option<Interval>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// First tick fires one full period from now. No-op if already armed.
    pub fn arm(&mut self) {
        if self.is_armed() {
            return;
        }
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    pub fn disarm(&mut self) {
        self.interval = None;
    }

    /// Arm or disarm to match `running`.
    pub fn follow(&mut self, running: bool) {
        if running {
            self.arm();
        } else {
            self.disarm();
        }
    }

    /// Cancel-safe; suitable as a `tokio::select!` branch.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => future::pending().await,
        }
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(TICK_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn test_armed_ticker_fires_each_period() {
        let mut ticker = Ticker::default();
        ticker.arm();
        let start = Instant::now();
        ticker.tick().await;
        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_ticker_never_fires() {
        let mut ticker = Ticker::default();
        ticker.arm();
        ticker.disarm();
        assert!(!ticker.is_armed());
        let fired = timeout(Duration::from_secs(10), ticker.tick()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_period() {
        let mut ticker = Ticker::default();
        ticker.arm();
        tokio::time::advance(Duration::from_millis(700)).await;
        ticker.follow(false);
        ticker.follow(true);
        let start = Instant::now();
        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }
}
