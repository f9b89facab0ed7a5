use std::time::{Duration, Instant};

/// Spaces outbound requests at least `min_interval` apart.
///
/// Lives on the worker thread, so waiting here never stalls the UI.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// How long a request issued at `now` would have to wait
    pub fn delay_for(&self, now: Instant) -> Duration {
        match self.last_request {
            Some(last) => self
                .min_interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Block until a request is allowed, then record it
    pub fn wait(&mut self) {
        let delay = self.delay_for(Instant::now());
        if !delay.is_zero() {
            log::debug!("Rate limiting geocoding request for {:?}", delay);
            std::thread::sleep(delay);
        }
        self.mark_request(Instant::now());
    }

    fn mark_request(&mut self, at: Instant) {
        self.last_request = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_is_immediate() {
        let throttle = Throttle::new(Duration::from_secs(1));
        assert_eq!(throttle.delay_for(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn test_delay_shrinks_with_elapsed_time() {
        let mut throttle = Throttle::new(Duration::from_secs(1));
        let start = Instant::now();
        throttle.mark_request(start);

        assert_eq!(throttle.delay_for(start), Duration::from_secs(1));
        assert_eq!(
            throttle.delay_for(start + Duration::from_millis(300)),
            Duration::from_millis(700)
        );
        assert_eq!(
            throttle.delay_for(start + Duration::from_secs(2)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_wait_enforces_spacing() {
        let mut throttle = Throttle::new(Duration::from_millis(50));
        let start = Instant::now();
        throttle.wait();
        throttle.wait();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_zero_interval_never_waits() {
        let mut throttle = Throttle::new(Duration::ZERO);
        throttle.wait();
        assert_eq!(throttle.delay_for(Instant::now()), Duration::ZERO);
    }
}
