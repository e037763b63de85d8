//! Token-based debouncing.
//!
//! Each input event takes a token; a timer that later fires with a token
//! only acts if no newer token has been issued since.

#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    latest: u64,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token, superseding all earlier ones.
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_fires() {
        let mut d = Debouncer::new();
        let a = d.issue();
        let b = d.issue();
        assert!(!d.is_current(a));
        assert!(d.is_current(b));
        assert!(b > a);
    }
}
