//! Per-episode reward and value traces.

/// Reward and value traces accumulated over one episode or rollout window.
///
/// The buffer is owned by the training loop: the loop pushes one reward
/// per environment step (and one critic value per step, for actor-critic
/// agents), hands the buffer to a
/// [`ReturnEstimator`](crate::ReturnEstimator) at an update boundary and
/// clears it afterwards. The estimator never mutates the buffer, and no
/// state survives an update beyond the buffer itself.
#[derive(Debug, Default, Clone)]
pub struct EpisodeBuffer {
    rewards: Vec<f32>,
    values: Vec<f32>,
}

impl EpisodeBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the reward of one environment step.
    pub fn push_reward(&mut self, reward: f32) {
        self.rewards.push(reward);
    }

    /// Appends a critic value estimate for one environment step.
    pub fn push_value(&mut self, value: f32) {
        self.values.push(value);
    }

    /// Number of steps recorded so far.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Returns `true` if no step has been recorded.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Recorded rewards, one per step.
    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    /// Recorded value estimates, one per step for actor-critic agents.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Drops the accumulated traces, keeping the allocations.
    pub fn clear(&mut self) {
        self.rewards.clear();
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::EpisodeBuffer;

    #[test]
    fn push_and_clear() {
        let mut buf = EpisodeBuffer::new();
        assert!(buf.is_empty());

        buf.push_reward(1.0);
        buf.push_reward(-1.0);
        buf.push_value(0.5);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.rewards(), &[1.0, -1.0]);
        assert_eq!(buf.values(), &[0.5]);

        buf.clear();
        assert!(buf.is_empty());
        assert!(buf.values().is_empty());
    }
}
