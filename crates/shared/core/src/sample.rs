//! Trial and episode data samples
//!
//! Data slices supplied by the external data provider. A [`TrialSample`]
//! travels over the data channel and may be reused across episodes; an
//! [`EpisodeSample`] is a narrower slice freshly derived from it per
//! episode, then converted into the engine's native [`Feed`].

use crate::error::SampleError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLCV bar of market data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Engine-native data feed: the bars an episode runs over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub bars: Vec<Bar>,
}

impl Feed {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Whether a sample is a provider-level trial or an episode slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    Trial,
    Episode,
}

/// Provenance of a sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleMetadata {
    /// Human-readable sample name (source file or slice label).
    pub name: String,
    pub kind: SampleKind,
    /// Ordinal of this sample within its parent, starting at 1.
    pub sample_num: u64,
    /// First row of this sample within its parent.
    pub first_row: usize,
}

/// Descriptive statistics over a sample's bars.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleStats {
    pub rows: u64,
    pub mean_close: Decimal,
    pub min_low: Decimal,
    pub max_high: Decimal,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

fn describe_bars(bars: &[Bar]) -> SampleStats {
    let Some(first) = bars.first() else {
        return SampleStats::default();
    };
    let mut min_low = first.low;
    let mut max_high = first.high;
    let mut close_sum = Decimal::ZERO;
    for bar in bars {
        min_low = min_low.min(bar.low);
        max_high = max_high.max(bar.high);
        close_sum += bar.close;
    }
    SampleStats {
        rows: bars.len() as u64,
        mean_close: close_sum / Decimal::from(bars.len() as u64),
        min_low,
        max_high,
        start: Some(first.time),
        end: bars.last().map(|b| b.time),
    }
}

/// Sampling parameters carried by `reset` and `get_data` requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Force a fresh trial from the data provider instead of reusing the
    /// cached one.
    pub get_new: bool,
    /// First row of the episode window inside the trial; defaults to 0.
    pub start_row: Option<usize>,
    /// Episode length in bars; defaults to the remainder of the trial.
    pub episode_len: Option<usize>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            get_new: true,
            start_row: None,
            episode_len: None,
        }
    }
}

/// `reset` kwargs: per-trial and per-episode sampling parameters, each
/// optional and defaulted by the episode runner when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetConfig {
    pub trial_config: Option<SampleConfig>,
    pub episode_config: Option<SampleConfig>,
}

/// A trial-level data slice obtained from the data provider.
///
/// May yield multiple narrower [`EpisodeSample`]s; the sampling cursor is
/// rewound by [`reset`](TrialSample::reset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSample {
    metadata: SampleMetadata,
    bars: Vec<Bar>,
    sampled: u64,
}

impl TrialSample {
    pub fn new(name: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            metadata: SampleMetadata {
                name: name.into(),
                kind: SampleKind::Trial,
                sample_num: 0,
                first_row: 0,
            },
            bars,
            sampled: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn metadata(&self) -> &SampleMetadata {
        &self.metadata
    }

    pub fn rows(&self) -> usize {
        self.bars.len()
    }

    /// Descriptive statistics over the whole trial.
    pub fn describe(&self) -> SampleStats {
        describe_bars(&self.bars)
    }

    /// Rewind the sampling cursor; called once when the trial is received.
    pub fn reset(&mut self) {
        self.sampled = 0;
    }

    /// Derive an episode slice according to `config`.
    pub fn sample(&mut self, config: &SampleConfig) -> Result<EpisodeSample, SampleError> {
        if self.bars.is_empty() {
            return Err(SampleError::Empty);
        }
        let start = config.start_row.unwrap_or(0);
        if start >= self.bars.len() {
            return Err(SampleError::OutOfRange {
                start,
                len: 0,
                rows: self.bars.len(),
            });
        }
        let len = config.episode_len.unwrap_or(self.bars.len() - start);
        // `start < bars.len()` was checked above; comparing against the
        // remainder avoids overflowing on an absurd requested length.
        if len == 0 || len > self.bars.len() - start {
            return Err(SampleError::OutOfRange {
                start,
                len,
                rows: self.bars.len(),
            });
        }
        self.sampled += 1;
        Ok(EpisodeSample {
            metadata: SampleMetadata {
                name: format!("{}[{}..{}]", self.metadata.name, start, start + len),
                kind: SampleKind::Episode,
                sample_num: self.sampled,
                first_row: start,
            },
            bars: self.bars[start..start + len].to_vec(),
        })
    }
}

/// An episode-level slice of a trial, always freshly derived per episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSample {
    metadata: SampleMetadata,
    bars: Vec<Bar>,
}

impl EpisodeSample {
    pub fn metadata(&self) -> &SampleMetadata {
        &self.metadata
    }

    pub fn rows(&self) -> usize {
        self.bars.len()
    }

    pub fn describe(&self) -> SampleStats {
        describe_bars(&self.bars)
    }

    /// Convert into the engine's native feed.
    pub fn to_feed(&self) -> Feed {
        Feed {
            bars: self.bars.clone(),
        }
    }
}
