use chrono::{DateTime, Utc};
use kg_loader_schemas::{ContractRecord, Episode, EpisodeType, RawRecord};
use serde::Deserialize;
use std::path::Path;

use super::{read_records, to_content, SourceAdapter};
use crate::error::SourceError;
use crate::timestamps::parse_date_or_instant;

const SOURCE_DESCRIPTION: &str = "Energy contract data";

/// Which instant a contract episode is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceAnchor {
    /// The moment the contract file was loaded.
    #[default]
    IngestionTime,
    /// The contract's own `start_date`.
    StartDate,
}

/// One episode per contract, grouped by customer.
pub struct ContractAdapter {
    anchor: ReferenceAnchor,
    contracts: Vec<ContractRecord>,
    loaded_at: Option<DateTime<Utc>>,
}

impl Default for ContractAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractAdapter {
    pub fn new() -> Self {
        Self::with_anchor(ReferenceAnchor::default())
    }

    pub fn with_anchor(anchor: ReferenceAnchor) -> Self {
        Self {
            anchor,
            contracts: Vec::new(),
            loaded_at: None,
        }
    }

    /// Replace the loaded state directly, bypassing the file system.
    pub fn from_records(
        anchor: ReferenceAnchor,
        contracts: Vec<ContractRecord>,
        loaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            anchor,
            contracts,
            loaded_at: Some(loaded_at),
        }
    }

    fn reference_time(&self, index: usize, contract: &ContractRecord) -> Result<DateTime<Utc>, SourceError> {
        let label = || format!("contract for {}", contract.customer_id());
        match self.anchor {
            ReferenceAnchor::IngestionTime => self
                .loaded_at
                .ok_or_else(|| SourceError::normalization(index, label(), "source was never loaded")),
            ReferenceAnchor::StartDate => {
                let start = contract.start_date().ok_or_else(|| {
                    SourceError::normalization(index, label(), "missing start_date")
                })?;
                parse_date_or_instant(start)
                    .map_err(|reason| SourceError::normalization(index, label(), reason))
            }
        }
    }
}

impl SourceAdapter for ContractAdapter {
    fn load(&mut self, location: &Path) -> Result<(), SourceError> {
        self.contracts = read_records(location)?;
        self.loaded_at = Some(Utc::now());
        Ok(())
    }

    fn raw_records(&self) -> Vec<RawRecord> {
        self.contracts.iter().cloned().map(RawRecord::Contract).collect()
    }

    fn to_episodes(&self) -> Result<Vec<Episode>, SourceError> {
        self.contracts
            .iter()
            .enumerate()
            .map(|(index, contract)| {
                let name = format!("Contract-{}", contract.customer_id());
                Ok(Episode {
                    content: to_content(index, &name, contract)?,
                    reference_time: self.reference_time(index, contract)?,
                    source_description: SOURCE_DESCRIPTION.to_string(),
                    source: EpisodeType::Json,
                    group_id: Some(contract.customer_id().to_string()),
                    name,
                })
            })
            .collect()
    }
}
