// ReflexPod — Piezo Signal Sampler
//
// Raw readings come from whatever implements `Sampler` (the ADC driver on
// target, a simulated disc on the host). `classify` is the pure decision rule
// the tap detector applies to every reading.

use crate::config::Thresholds;

/// Raw sensor value in ADC counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Reading(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Quiet,
    /// Above the absolute threshold.
    Exceeded,
    /// Jumped more than the spike delta above the baseline.
    Spiked,
}

impl Classification {
    pub fn is_event(self) -> bool {
        !matches!(self, Self::Quiet)
    }
}

pub trait Sampler {
    fn sample(&mut self) -> anyhow::Result<Reading>;
}

/// Classify `reading` against `baseline`. `Exceeded` wins when both rules fire.
pub fn classify(reading: Reading, baseline: Reading, thresholds: &Thresholds) -> Classification {
    if reading.0 > thresholds.absolute {
        Classification::Exceeded
    } else if reading.0.saturating_sub(baseline.0) > thresholds.spike_delta {
        Classification::Spiked
    } else {
        Classification::Quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Thresholds = Thresholds {
        absolute: 800,
        spike_delta: 400,
    };

    #[test]
    fn quiet_within_bounds() {
        assert_eq!(classify(Reading(100), Reading(90), &T), Classification::Quiet);
        assert_eq!(classify(Reading(800), Reading(400), &T), Classification::Quiet);
    }

    #[test]
    fn absolute_threshold_is_strict() {
        assert_eq!(classify(Reading(801), Reading(0), &T), Classification::Exceeded);
    }

    #[test]
    fn spike_measured_from_baseline() {
        assert_eq!(classify(Reading(700), Reading(200), &T), Classification::Spiked);
        assert_eq!(classify(Reading(700), Reading(300), &T), Classification::Quiet);
    }

    #[test]
    fn reading_below_baseline_is_not_a_spike() {
        assert_eq!(classify(Reading(10), Reading(700), &T), Classification::Quiet);
    }

    #[test]
    fn exceeded_takes_precedence() {
        assert_eq!(classify(Reading(2000), Reading(0), &T), Classification::Exceeded);
        assert!(Classification::Spiked.is_event());
        assert!(!Classification::Quiet.is_event());
    }
}
