use derive_more::{Display, From};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum_macros::{Display as StrumDisplay, EnumString};

/// Label of a subset of a request batch (an account, a consumer, or the
/// single partition of an unsharded run).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PartitionLabel(String);

impl PartitionLabel {
    pub fn new(label: impl ToString) -> Self {
        Self(label.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PartitionLabel {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// How sequence ids of a batch are spread across partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, StrumDisplay, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Strategy {
    /// Alternate partitions by index.
    #[default]
    RoundRobin,
    /// Contiguous index ranges, first half to the first partition.
    Split,
    /// Uniform random choice per request.
    Random,
}

impl Strategy {
    /// Picks the partition index for the request at 0-based `index` out of
    /// `total`, given `partitions` available partitions.
    pub fn assign<R: Rng + ?Sized>(
        &self,
        index: usize,
        total: usize,
        partitions: usize,
        rng: &mut R,
    ) -> usize {
        if partitions <= 1 {
            return 0;
        }

        match self {
            Strategy::RoundRobin => index % partitions,
            Strategy::Split => {
                let chunk = total / partitions;
                if chunk == 0 {
                    partitions - 1
                } else {
                    (index / chunk).min(partitions - 1)
                }
            }
            Strategy::Random => rng.gen_range(0..partitions),
        }
    }

    /// Assigns a partition label to every request of a batch of `total`.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        total: usize,
        partitions: &[PartitionLabel],
        rng: &mut R,
    ) -> Vec<PartitionLabel> {
        (0..total)
            .map(|index| {
                let slot = self.assign(index, total, partitions.len(), rng);
                partitions[slot].clone()
            })
            .collect()
    }
}
