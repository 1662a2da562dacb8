use chrono::{DateTime, Utc};

use relmem_types::decay::DecayCategory;
use relmem_types::fact::Fact;
use relmem_types::relationship::Relationship;

/// Lowest value decay can produce. Known information is deprioritized,
/// never erased, by decay alone.
pub const DECAY_FLOOR: f64 = 0.1;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Fractional days between `created` and `now`. Future timestamps count as zero.
pub fn age_in_days(created: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = now.signed_duration_since(created).num_milliseconds().max(0);
    millis as f64 / MILLIS_PER_DAY
}

/// Exponential decay with a floor.
///
/// ```text
/// decayed = max(0.1, confidence * exp(-rate * age_days))
/// ```
pub fn decayed_confidence(confidence: f64, rate_per_day: f64, age_days: f64) -> f64 {
    (confidence * (-rate_per_day * age_days).exp()).max(DECAY_FLOOR)
}

/// A record whose confidence decays with age.
pub trait Decayable {
    fn confidence(&self) -> f64;
    fn created(&self) -> DateTime<Utc>;
    fn decay_category(&self) -> DecayCategory;

    /// Raise confidence by `boost` (capped at 1.0) and stamp the confirmation.
    fn confirm(&mut self, boost: f64, now: DateTime<Utc>);

    fn decayed_confidence_at(&self, now: DateTime<Utc>) -> f64 {
        decayed_confidence(
            self.confidence(),
            self.decay_category().rate_per_day(),
            age_in_days(self.created(), now),
        )
    }

    fn is_stale_by_decay(&self, now: DateTime<Utc>, threshold: f64) -> bool {
        self.decayed_confidence_at(now) < threshold
    }
}

impl Decayable for Relationship {
    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn decay_category(&self) -> DecayCategory {
        DecayCategory::for_relationship_type(&self.rel_type)
    }

    fn confirm(&mut self, boost: f64, now: DateTime<Utc>) {
        self.confidence = (self.confidence + boost).min(1.0);
        self.last_confirmed = Some(now);
        self.updated = now;
    }
}

impl Decayable for Fact {
    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn decay_category(&self) -> DecayCategory {
        DecayCategory::Fact
    }

    fn confirm(&mut self, boost: f64, now: DateTime<Utc>) {
        self.confidence = (self.confidence + boost).min(1.0);
        self.last_confirmed = Some(now);
        self.updated = now;
    }
}
