//! Reference-counted channel membership registry.
//!
//! Multiple independent screens may request the same channel concurrently
//! (e.g. overlapping views for the same user), so membership is counted
//! rather than kept as a set. The registry itself is transport-agnostic:
//! `join`/`leave` report whether a subscribe/unsubscribe should be emitted,
//! and the caller performs the emission.

/// Tracks which logical channels are currently joined.
///
/// The registry's view is the source of truth; it is replayed onto the
/// transport after every reconnect in insertion order.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    entries: Vec<(String, u32)>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the reference count for a channel.
    ///
    /// Returns true when the count transitioned 0 -> 1, i.e. a subscribe
    /// message should be emitted to the transport.
    pub fn join(&mut self, channel: &str) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|(c, _)| c == channel) {
            entry.1 += 1;
            false
        } else {
            self.entries.push((channel.to_string(), 1));
            true
        }
    }

    /// Decrement the reference count for a channel.
    ///
    /// Returns true when the count transitioned 1 -> 0, i.e. an unsubscribe
    /// message should be emitted. Leaving a channel with count 0 is a no-op,
    /// defending against double-teardown from rapid identity changes.
    pub fn leave(&mut self, channel: &str) -> bool {
        let Some(pos) = self.entries.iter().position(|(c, _)| c == channel) else {
            return false;
        };
        self.entries[pos].1 -= 1;
        if self.entries[pos].1 == 0 {
            self.entries.remove(pos);
            true
        } else {
            false
        }
    }

    /// Current reference count for a channel.
    pub fn ref_count(&self, channel: &str) -> u32 {
        self.entries
            .iter()
            .find(|(c, _)| c == channel)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Whether a channel is currently joined.
    pub fn is_joined(&self, channel: &str) -> bool {
        self.ref_count(channel) > 0
    }

    /// All joined channels in insertion order, for resync after reconnect.
    pub fn active(&self) -> Vec<String> {
        self.entries.iter().map(|(c, _)| c.clone()).collect()
    }

    /// Number of distinct joined channels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_is_reference_counted() {
        let mut reg = ChannelRegistry::new();

        assert!(reg.join("user.1"), "first join should emit subscribe");
        assert!(!reg.join("user.1"), "second join should not re-emit");
        assert!(!reg.join("user.1"));
        assert_eq!(reg.ref_count("user.1"), 3);

        assert!(!reg.leave("user.1"), "count 3 -> 2, still subscribed");
        assert!(reg.is_joined("user.1"));
        assert_eq!(reg.ref_count("user.1"), 2);
    }

    #[test]
    fn test_single_join_single_leave() {
        let mut reg = ChannelRegistry::new();
        assert!(reg.join("company.4"));
        assert!(reg.leave("company.4"), "count 1 -> 0 should emit unsubscribe");
        assert!(!reg.is_joined("company.4"));
    }

    #[test]
    fn test_leave_at_zero_is_noop() {
        let mut reg = ChannelRegistry::new();
        assert!(!reg.leave("user.9"));
        assert_eq!(reg.ref_count("user.9"), 0);

        reg.join("user.9");
        reg.leave("user.9");
        // Double-teardown
        assert!(!reg.leave("user.9"));
    }

    #[test]
    fn test_active_preserves_insertion_order() {
        let mut reg = ChannelRegistry::new();
        reg.join("user.1");
        reg.join("company.4");
        reg.join("user.1");
        assert_eq!(reg.active(), vec!["user.1", "company.4"]);

        reg.leave("user.1");
        reg.leave("user.1");
        assert_eq!(reg.active(), vec!["company.4"]);
    }
}
