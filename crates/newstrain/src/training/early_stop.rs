/// Stops training once validation loss has failed to improve for
/// `patience` consecutive epochs.
///
/// An epoch counts against patience only when its loss exceeds the best
/// loss by more than `min_delta`; losses inside that band leave the counter
/// untouched.
#[derive(Debug, Clone)]
pub struct EarlyStopper {
    patience: usize,
    min_delta: f64,
    counter: usize,
    min_validation_loss: f64,
}

impl EarlyStopper {
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self {
            patience,
            min_delta,
            counter: 0,
            min_validation_loss: f64::INFINITY,
        }
    }

    /// Record one epoch's validation loss; `true` means stop now.
    pub fn early_stop(&mut self, validation_loss: f64) -> bool {
        if validation_loss < self.min_validation_loss {
            self.min_validation_loss = validation_loss;
            self.counter = 0;
        } else if validation_loss > self.min_validation_loss + self.min_delta {
            self.counter += 1;
            if self.counter >= self.patience {
                return true;
            }
        }
        false
    }

    pub fn counter(&self) -> usize {
        self.counter
    }

    pub fn best_loss(&self) -> f64 {
        self.min_validation_loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improvement_resets_counter() {
        let mut s = EarlyStopper::new(2, 0.0);
        assert!(!s.early_stop(1.0));
        assert!(!s.early_stop(1.5));
        assert_eq!(s.counter(), 1);
        assert!(!s.early_stop(0.5));
        assert_eq!(s.counter(), 0);
        assert_eq!(s.best_loss(), 0.5);
    }

    #[test]
    fn test_stops_after_patience() {
        let mut s = EarlyStopper::new(3, 0.001);
        assert!(!s.early_stop(1.0));
        assert!(!s.early_stop(1.1));
        assert!(!s.early_stop(1.2));
        assert!(s.early_stop(1.3));
    }

    #[test]
    fn test_within_delta_does_not_count() {
        let mut s = EarlyStopper::new(1, 0.1);
        assert!(!s.early_stop(1.0));
        // Not an improvement, but inside the tolerance band.
        assert!(!s.early_stop(1.05));
        assert_eq!(s.counter(), 0);
        assert_eq!(s.best_loss(), 1.0);
        assert!(s.early_stop(1.2));
    }
}
