use uom::si::{f64::Power, power::watt};

/// Accumulates radiometric power samples into a running mean.
///
/// Samples are never discarded, so repeated observations refine the same
/// estimate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PowerPipeline {
    count: u64,
    mean: f64,
    m2: f64,
}

impl PowerPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one power sample.
    pub fn add_sample(&mut self, power: Power) {
        // Welford's update.
        let value = power.get::<watt>();
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = Power>) {
        samples.into_iter().for_each(|power| self.add_sample(power));
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns `None` until a sample has been recorded.
    pub fn mean(&self) -> Option<Power> {
        match self.count {
            0 => None,
            _ => Some(Power::new::<watt>(self.mean)),
        }
    }

    /// Sample variance of the recorded power, in W².
    ///
    /// Returns `None` with fewer than two samples.
    pub fn variance(&self) -> Option<f64> {
        match self.count {
            0 | 1 => None,
            n => Some(self.m2 / (n - 1) as f64),
        }
    }
}
