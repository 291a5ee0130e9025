use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::{
    cache::{Cache, CacheError},
    shape::Shape,
    source::AddressSource,
    stat::{Histogram, Stat, StatView, Summary},
};

/// largest total capacity exponent. lines must be addressable by 16 bits
/// and occupancy must fit a `u16` sample.
pub const MAX_TOTAL_EXPONENT: u32 = 15;
pub const MAX_ADDRESS_EXPONENT: u32 = 24;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SimError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("total exponent {0} exceeds {}", MAX_TOTAL_EXPONENT)]
    TotalExponentTooLarge(u32),
    #[error("address exponent {0} exceeds {}", MAX_ADDRESS_EXPONENT)]
    AddressExponentTooLarge(u32),
    #[error("split {k} exceeds total exponent {total_exponent}")]
    SplitOutOfRange { k: u32, total_exponent: u32 },
    #[error("cache {0} holds more slots than a sample can count")]
    CapacityTooLarge(Shape),
    #[error("number of trials must be positive")]
    NoTrials,
}

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Clone, Copy, Debug)]
pub struct SimulationOption {
    /// log2 of the slot count shared by every configuration
    pub total_exponent: u32,
    /// trials per configuration
    pub trials: usize,
    /// log2 of the addresses inserted per trial. defaults to `total_exponent`.
    pub address_exponent: Option<u32>,
}

impl Default for SimulationOption {
    fn default() -> Self {
        Self {
            total_exponent: 5,
            trials: 100,
            address_exponent: None,
        }
    }
}

impl SimulationOption {
    pub fn address_exponent(&self) -> u32 {
        self.address_exponent.unwrap_or(self.total_exponent)
    }
    pub fn validate(&self) -> Result<()> {
        if self.total_exponent > MAX_TOTAL_EXPONENT {
            return Err(SimError::TotalExponentTooLarge(self.total_exponent));
        }
        if self.address_exponent() > MAX_ADDRESS_EXPONENT {
            return Err(SimError::AddressExponentTooLarge(self.address_exponent()));
        }
        if self.trials == 0 {
            return Err(SimError::NoTrials);
        }
        Ok(())
    }
}

/// Inserts `2^address_exponent` addresses from `source` into a fresh cache
/// and returns how many slots end up occupied.
pub fn simulate_once<S: AddressSource + ?Sized>(
    shape: Shape,
    address_exponent: u32,
    source: &mut S,
) -> Result<u16> {
    let cache = fill_cache(shape, address_exponent, source)?;
    // occupancy <= capacity, which fits
    Ok(cache.occupancy() as u16)
}

/// Like [`simulate_once`], but hands back the cache itself for inspection.
pub fn fill_cache<S: AddressSource + ?Sized>(
    shape: Shape,
    address_exponent: u32,
    source: &mut S,
) -> Result<Cache<u16>> {
    match shape.capacity() {
        Some(c) if c <= u16::MAX as usize => {}
        _ => return Err(SimError::CapacityTooLarge(shape)),
    }
    if address_exponent > MAX_ADDRESS_EXPONENT {
        return Err(SimError::AddressExponentTooLarge(address_exponent));
    }
    let mut cache = Cache::<u16>::new(shape.lines, shape.ways)?;
    for _ in 0..1u32 << address_exponent {
        cache.insert(source.next_address());
    }
    Ok(cache)
}

#[derive(Clone, Debug, Serialize)]
pub struct TrialReport {
    #[serde(flatten)]
    pub shape: Shape,
    #[serde(flatten)]
    pub summary: Summary,
    pub samples: Vec<u16>,
}

impl TrialReport {
    pub fn from_samples(shape: Shape, samples: Vec<u16>) -> Self {
        Self {
            shape,
            summary: Summary::from_samples(&samples),
            samples,
        }
    }
}

impl fmt::Display for TrialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Cache dimensions: {}, {}",
            self.shape.lines, self.shape.ways
        )?;
        write!(f, "{}", self.summary)
    }
}

impl Stat for TrialReport {
    fn view(&self, max_width: usize) -> Box<dyn StatView + '_> {
        let header = format!(
            "occupancy of {} lines x {} ways",
            self.shape.lines, self.shape.ways
        );
        Box::new(Histogram::new(header, &self.samples, max_width))
    }
}

/// Runs `option.trials` trials of a cache with `2^k` lines and
/// `2^(total_exponent - k)` ways.
pub fn run_trials<S: AddressSource + ?Sized>(
    k: u32,
    total_exponent: u32,
    option: &SimulationOption,
    source: &mut S,
) -> Result<TrialReport> {
    if k > total_exponent {
        return Err(SimError::SplitOutOfRange { k, total_exponent });
    }
    if total_exponent > MAX_TOTAL_EXPONENT {
        return Err(SimError::TotalExponentTooLarge(total_exponent));
    }
    if option.trials == 0 {
        return Err(SimError::NoTrials);
    }
    let shape = Shape::from_split(k, total_exponent);
    let address_exponent = option.address_exponent();
    let mut samples = Vec::with_capacity(option.trials);
    for _ in 0..option.trials {
        samples.push(simulate_once(shape, address_exponent, source)?);
    }
    log::debug!("{shape}: {} trials, samples {samples:?}", samples.len());
    Ok(TrialReport::from_samples(shape, samples))
}

/// One report per split of `2^option.total_exponent` slots, from direct
/// mapped down to fully associative.
pub fn sweep<S: AddressSource + ?Sized>(
    option: &SimulationOption,
    source: &mut S,
) -> Result<Vec<TrialReport>> {
    option.validate()?;
    let d = option.total_exponent;
    let mut reports = Vec::with_capacity(d as usize + 1);
    for k in (0..=d).rev() {
        let report = run_trials(k, d, option, source)?;
        log::info!(
            "{}: mean {:.2}, median {}, stdev {:.4}",
            report.shape,
            report.summary.mean,
            report.summary.median,
            report.summary.stdev
        );
        reports.push(report);
    }
    Ok(reports)
}
