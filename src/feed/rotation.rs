//! API-key rotation state

/// What happened to the rotation after a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStep {
    /// Same key stays in use
    Continue,
    /// Moved on to the next key
    Rotated,
    /// Cycled back to the first key; callers cool down before the next call
    Wrapped,
}

/// Which key to use next, switching every `calls_per_key` calls
///
/// A value type: [`KeyRotation::advance`] returns the next state instead of
/// mutating, so a fetch loop threads it through explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRotation {
    key_count: usize,
    calls_per_key: u32,
    index: usize,
    calls: u32,
}

impl KeyRotation {
    /// Start at the first key
    pub fn new(key_count: usize, calls_per_key: u32) -> Self {
        Self {
            key_count: key_count.max(1),
            calls_per_key: calls_per_key.max(1),
            index: 0,
            calls: 0,
        }
    }

    /// Index of the key for the next call
    pub fn index(&self) -> usize {
        self.index
    }

    /// Record one call
    pub fn advance(self) -> (Self, RotationStep) {
        let calls = self.calls + 1;
        if calls < self.calls_per_key {
            return (Self { calls, ..self }, RotationStep::Continue);
        }

        let index = (self.index + 1) % self.key_count;
        let step = if index == 0 {
            RotationStep::Wrapped
        } else {
            RotationStep::Rotated
        };
        (
            Self {
                index,
                calls: 0,
                ..self
            },
            step,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switches_every_n_calls() {
        let rotation = KeyRotation::new(3, 2);
        let (rotation, step) = rotation.advance();
        assert_eq!((rotation.index(), step), (0, RotationStep::Continue));
        let (rotation, step) = rotation.advance();
        assert_eq!((rotation.index(), step), (1, RotationStep::Rotated));
        let (rotation, _) = rotation.advance();
        let (rotation, step) = rotation.advance();
        assert_eq!((rotation.index(), step), (2, RotationStep::Rotated));
    }

    #[test]
    fn test_wraps_to_first_key() {
        let mut rotation = KeyRotation::new(2, 1);
        let mut steps = Vec::new();
        for _ in 0..4 {
            let (next, step) = rotation.advance();
            rotation = next;
            steps.push(step);
        }
        assert_eq!(
            steps,
            vec![
                RotationStep::Rotated,
                RotationStep::Wrapped,
                RotationStep::Rotated,
                RotationStep::Wrapped
            ]
        );
        assert_eq!(rotation.index(), 0);
    }

    #[test]
    fn test_single_key_wraps_after_each_batch() {
        let rotation = KeyRotation::new(1, 3);
        let (rotation, _) = rotation.advance();
        let (rotation, _) = rotation.advance();
        let (rotation, step) = rotation.advance();
        assert_eq!(step, RotationStep::Wrapped);
        assert_eq!(rotation.index(), 0);
    }

    #[test]
    fn test_advance_leaves_original_untouched() {
        let rotation = KeyRotation::new(2, 1);
        let (next, _) = rotation.advance();
        assert_eq!(rotation.index(), 0);
        assert_eq!(next.index(), 1);
    }
}
