use rand::Rng;

/// Chooses which of `n` candidate apps relays the tunnel.
pub trait RelayPicker: Send + Sync {
    /// Returns an index in `0..n`. `n` is never zero.
    fn pick(&self, n: usize) -> usize;
}

/// Uniform random choice; spreads tunnels across app instances.
pub struct RandomRelayPicker;

impl RelayPicker for RandomRelayPicker {
    fn pick(&self, n: usize) -> usize {
        rand::thread_rng().gen_range(0..n)
    }
}
