//! Read-only dataset snapshot and the providers that materialise it.
//!
//! The engine never loads data itself: a [`DatasetProvider`] is asked once for
//! a validated [`Dataset`], which is then shared by reference across queries.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{Client, ClientId, FraudRing, Partner, PartnerId};

/// Errors raised while loading or validating a snapshot.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to open dataset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate partner id {0}")]
    DuplicatePartner(PartnerId),

    #[error("duplicate client id {0}")]
    DuplicateClient(ClientId),

    #[error("client {client} is referred by unknown partner {partner}")]
    UnknownReferrer { client: ClientId, partner: PartnerId },
}

/// Source of the snapshot consumed by the engine.
pub trait DatasetProvider {
    fn load(&self) -> Result<Dataset, DatasetError>;
}

/// Wire shape of a snapshot document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub partners: Vec<Partner>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub fraud_rings: Vec<FraudRing>,
}

impl Snapshot {
    pub fn into_dataset(self) -> Result<Dataset, DatasetError> {
        Dataset::new(self.partners, self.clients, self.fraud_rings)
    }
}

/// An in-memory snapshot is its own provider.
impl DatasetProvider for Snapshot {
    fn load(&self) -> Result<Dataset, DatasetError> {
        self.clone().into_dataset()
    }
}

/// Loads a JSON snapshot document from disk.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DatasetProvider for JsonFileProvider {
    fn load(&self) -> Result<Dataset, DatasetError> {
        let file = File::open(&self.path).map_err(|source| DatasetError::Io {
            path: self.path.clone(),
            source,
        })?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
        let dataset = snapshot.into_dataset()?;

        info!(
            path = %self.path.display(),
            partners = dataset.partners().len(),
            clients = dataset.clients().len(),
            rings = dataset.fraud_rings().len(),
            "dataset loaded"
        );
        Ok(dataset)
    }
}

/// Validated, immutable snapshot.
///
/// Partners live in an arena indexed by id. Parent references are kept as
/// plain ids and are never followed, so a cyclic hierarchy in the source data
/// cannot affect any scan.
#[derive(Debug, Default)]
pub struct Dataset {
    partners: Vec<Partner>,
    partner_index: HashMap<PartnerId, usize>,
    clients: Vec<Client>,
    fraud_rings: Vec<FraudRing>,
}

impl Dataset {
    pub fn new(
        partners: Vec<Partner>,
        clients: Vec<Client>,
        fraud_rings: Vec<FraudRing>,
    ) -> Result<Self, DatasetError> {
        let mut partner_index = HashMap::with_capacity(partners.len());
        for (idx, partner) in partners.iter().enumerate() {
            if partner_index.insert(partner.id.clone(), idx).is_some() {
                return Err(DatasetError::DuplicatePartner(partner.id.clone()));
            }
        }

        for partner in &partners {
            let Some(parent) = &partner.parent_id else {
                continue;
            };
            if !partner_index.contains_key(parent) {
                warn!(partner = %partner.id, parent = %parent, "parent partner not in snapshot");
            }
        }

        let mut client_ids = HashSet::with_capacity(clients.len());
        for client in &clients {
            if !client_ids.insert(client.id.as_str()) {
                return Err(DatasetError::DuplicateClient(client.id.clone()));
            }
            if !partner_index.contains_key(&client.referred_by) {
                return Err(DatasetError::UnknownReferrer {
                    client: client.id.clone(),
                    partner: client.referred_by.clone(),
                });
            }
        }

        Ok(Self {
            partners,
            partner_index,
            clients,
            fraud_rings,
        })
    }

    pub fn partners(&self) -> &[Partner] {
        &self.partners
    }

    pub fn partner(&self, id: &str) -> Option<&Partner> {
        self.partner_index.get(id).map(|&idx| &self.partners[idx])
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn fraud_rings(&self) -> &[FraudRing] {
        &self.fraud_rings
    }
}

/// Clients sharing a referring partner.
#[derive(Debug)]
pub struct PartnerGroup<'a> {
    pub partner_id: &'a str,
    pub clients: Vec<&'a Client>,
}

/// Partition clients by referring partner. Groups come out in order of each
/// partner's first appearance, and clients keep their input order.
pub fn group_by_partner<'a>(
    clients: impl IntoIterator<Item = &'a Client>,
) -> Vec<PartnerGroup<'a>> {
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<PartnerGroup<'a>> = Vec::new();

    for client in clients {
        let partner_id = client.referred_by.as_str();
        let idx = *index.entry(partner_id).or_insert_with(|| {
            groups.push(PartnerGroup {
                partner_id,
                clients: Vec::new(),
            });
            groups.len() - 1
        });
        groups[idx].clients.push(client);
    }

    groups
}
