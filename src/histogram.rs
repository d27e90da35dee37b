//! Age distribution over four fixed buckets.
//!
//! Buckets are `< 20`, `20 to 40` (inclusive), `40 to 60` (40 exclusive, 60
//! inclusive) and `> 60`. Together they cover every `i32`.

use serde::Serialize;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBucket {
    Under20,
    From20To40,
    From40To60,
    Over60,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 4] = [
        AgeBucket::Under20,
        AgeBucket::From20To40,
        AgeBucket::From40To60,
        AgeBucket::Over60,
    ];

    #[must_use]
    pub fn for_age(age: i32) -> Self {
        match age {
            ..20 => AgeBucket::Under20,
            20..=40 => AgeBucket::From20To40,
            41..=60 => AgeBucket::From40To60,
            _ => AgeBucket::Over60,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AgeBucket::Under20 => "< 20",
            AgeBucket::From20To40 => "20 to 40",
            AgeBucket::From40To60 => "40 to 60",
            AgeBucket::Over60 => "> 60",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Running counts per bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgeHistogram {
    counts: [u64; 4],
}

impl AgeHistogram {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, age: i32) {
        self.counts[AgeBucket::for_age(age).index()] += 1;
    }

    #[must_use]
    pub fn count(&self, bucket: AgeBucket) -> u64 {
        self.counts[bucket.index()]
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Percentages, each rounded half-up. All zero when nothing was recorded.
    #[must_use]
    pub fn distribution(&self) -> AgeDistribution {
        let total = self.total();
        let pct = |bucket| percent(self.count(bucket), total);
        AgeDistribution {
            under_20: pct(AgeBucket::Under20),
            from_20_to_40: pct(AgeBucket::From20To40),
            from_40_to_60: pct(AgeBucket::From40To60),
            over_60: pct(AgeBucket::Over60),
        }
    }
}

impl FromIterator<i32> for AgeHistogram {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        let mut hist = AgeHistogram::new();
        for age in iter {
            hist.record(age);
        }
        hist
    }
}

impl Extend<i32> for AgeHistogram {
    fn extend<I: IntoIterator<Item = i32>>(&mut self, iter: I) {
        for age in iter {
            self.record(age);
        }
    }
}

/// `round(n * 100 / total)` in integers, halves rounding up.
fn percent(n: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = (u128::from(n) * 200 + u128::from(total)) / (2 * u128::from(total));
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Whole-number percentage per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgeDistribution {
    #[serde(rename = "< 20")]
    pub under_20: u32,
    #[serde(rename = "20 to 40")]
    pub from_20_to_40: u32,
    #[serde(rename = "40 to 60")]
    pub from_40_to_60: u32,
    #[serde(rename = "> 60")]
    pub over_60: u32,
}

impl AgeDistribution {
    #[must_use]
    pub fn get(&self, bucket: AgeBucket) -> u32 {
        match bucket {
            AgeBucket::Under20 => self.under_20,
            AgeBucket::From20To40 => self.from_20_to_40,
            AgeBucket::From40To60 => self.from_40_to_60,
            AgeBucket::Over60 => self.over_60,
        }
    }

    /// Emit the distribution as log events.
    pub fn log(&self) {
        info!("Age-Group % Distribution");
        for bucket in AgeBucket::ALL {
            info!(bucket = bucket.label(), percent = self.get(bucket), "{}: {}", bucket.label(), self.get(bucket));
        }
    }
}

impl fmt::Display for AgeDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Age-Group % Distribution")?;
        for bucket in AgeBucket::ALL {
            writeln!(f, "{}: {}", bucket.label(), self.get(bucket))?;
        }
        Ok(())
    }
}
