use std::time::Duration;

/// Converts variable host deltas into a bounded number of fixed steps.
#[derive(Debug)]
pub(crate) struct FixedStep {
    step: Duration,
    max_steps: u32,
    accumulator: Duration,
}

impl FixedStep {
    pub(crate) fn new(step: Duration, max_steps: u32) -> Self {
        Self {
            step: step.max(Duration::from_micros(1)),
            max_steps: max_steps.max(1),
            accumulator: Duration::ZERO,
        }
    }

    pub(crate) fn step(&self) -> Duration {
        self.step
    }

    /// Banks `elapsed` and returns how many steps to simulate now.
    ///
    /// Backlog beyond `max_steps` is dropped so a long stall cannot trigger a
    /// burst of catch-up steps.
    pub(crate) fn accumulate(&mut self, elapsed: Duration) -> u32 {
        self.accumulator = self.accumulator.saturating_add(elapsed);
        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == self.max_steps && self.accumulator >= self.step {
            log::debug!("dropping {:?} of simulation backlog", self.accumulator);
            self.accumulator = Duration::ZERO;
        }
        steps
    }

    pub(crate) fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}
