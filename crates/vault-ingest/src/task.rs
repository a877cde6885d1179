//! One ingest run over one deposit directory
//!
//! [`IngestTask::run`] takes a deposit from the inbox through validation,
//! catalog registration, enrichment and archiving, and always ends by recording
//! the outcome in `deposit.properties` and moving the deposit to the outbox.
//! The only exception is cancellation before anything was changed: the deposit
//! then stays in the inbox for the next run.

use crate::client::{BagValidator, VaultCatalog};
use crate::deposit::properties::{BAG_ID, DATAVERSE_NBN, IDENTIFIER_URN};
use crate::deposit::{Deposit, DepositLoader, DepositProperties, DepositState};
use crate::enricher;
use crate::error::{IngestError, Result};
use crate::id_minter::IdMinter;
use crate::mapping::MetadataMapper;
use crate::outbox::Outbox;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const ACCEPTED_MESSAGE: &str = "Deposit accepted";

/// Everything a task needs besides its deposit; shared by all tasks
pub struct TaskContext {
    pub validator: Arc<dyn BagValidator>,
    pub catalog: Arc<dyn VaultCatalog>,
    pub loader: DepositLoader,
    pub id_minter: IdMinter,
    pub mapper: MetadataMapper,
    pub outbox: Outbox,
    /// Directory receiving the bag archives
    pub dve_outbox: PathBuf,
    pub data_suppliers: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Accepted { zip: PathBuf },
    Rejected(String),
    Failed(String),
    /// Stopped before any change; the deposit is still in the inbox
    Cancelled,
}

impl TaskOutcome {
    pub fn state(&self) -> Option<DepositState> {
        match self {
            TaskOutcome::Accepted { .. } => Some(DepositState::Accepted),
            TaskOutcome::Rejected(_) => Some(DepositState::Rejected),
            TaskOutcome::Failed(_) => Some(DepositState::Failed),
            TaskOutcome::Cancelled => None,
        }
    }
}

pub struct IngestTask {
    id: Uuid,
    deposit_dir: PathBuf,
    context: Arc<TaskContext>,
    cancel: CancellationToken,
}

impl IngestTask {
    pub fn new(deposit_dir: impl Into<PathBuf>, context: Arc<TaskContext>, cancel: CancellationToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            deposit_dir: deposit_dir.into(),
            context,
            cancel,
        }
    }

    pub fn deposit_dir(&self) -> &Path {
        &self.deposit_dir
    }

    pub async fn run(self) -> TaskOutcome {
        let deposit_id = self
            .deposit_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let span = info_span!("ingest", deposit_id = %deposit_id, task_id = %self.id);

        async move {
            info!(deposit = %self.deposit_dir.display(), "Starting ingest");
            let outcome = match self.process().await {
                Ok((deposit, zip)) => self.accept(deposit, zip),
                Err(IngestError::Cancelled) => {
                    info!("Ingest cancelled; deposit left in inbox");
                    TaskOutcome::Cancelled
                },
                Err(e) => self.reject_or_fail(e),
            };
            info!(outcome = ?outcome.state(), "Ingest finished");
            outcome
        }
        .instrument(span)
        .await
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(IngestError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn process(&self) -> Result<(Deposit, PathBuf)> {
        let context = &self.context;

        let bag_dir = DepositLoader::find_bag_dir(&self.deposit_dir)?;

        self.check_cancelled()?;
        context
            .validator
            .validate(&bag_dir, context.loader.kind().package_type())
            .await?;

        let mut deposit = context.loader.load(&self.deposit_dir, &context.data_suppliers)?;
        if deposit.bag_id().is_none() {
            let bag_id = context.id_minter.mint_bag_id();
            info!(%bag_id, "Deposit has no bag id; minted one");
            deposit.properties.set(BAG_ID, bag_id);
        }

        // Once the catalog knows about the deposit the task runs to the end
        self.check_cancelled()?;
        self.sync_catalog(&mut deposit).await?;
        deposit.properties.set(IDENTIFIER_URN, deposit.nbn.clone());
        deposit.properties.set(DATAVERSE_NBN, deposit.nbn.clone());

        let metadata = context.mapper.map(&deposit);
        let bag_id = deposit
            .bag_id()
            .map(str::to_string)
            .ok_or_else(|| IngestError::invalid_deposit("Deposit has no bag id"))?;
        let target = context
            .dve_outbox
            .join(enricher::zip_name(&bag_id, deposit.object_version));

        let (deposit, zip) = tokio::task::spawn_blocking(move || -> Result<(Deposit, PathBuf)> {
            enricher::enrich(&mut deposit.bag, &metadata)?;
            let zip = enricher::zip_bag(&deposit.bag_dir, &target)?;
            Ok((deposit, zip))
        })
        .await??;

        Ok((deposit, zip))
    }

    /// Assign NBN and object version, registering the deposit in the vault catalog
    async fn sync_catalog(&self, deposit: &mut Deposit) -> Result<()> {
        let catalog = &self.context.catalog;

        let Some(key) = deposit.is_version_of().map(str::to_string) else {
            deposit.nbn = self.context.id_minter.mint_urn_nbn();
            deposit.object_version = 1;
            catalog.create_dataset_for(deposit).await?;
            return Ok(());
        };

        let dataset = catalog.find_dataset(&key).await?.ok_or_else(|| {
            IngestError::invalid_deposit(format!("Dataset with sword token {} not found in vault catalog", key))
        })?;

        if dataset.data_supplier != deposit.data_supplier {
            return Err(IngestError::invalid_deposit(format!(
                "Data supplier in deposit '{}' does not match the data supplier '{}' in the dataset to be updated, \
                 as registered in the Vault Catalog",
                deposit.data_supplier, dataset.data_supplier
            )));
        }

        if let Some(latest) = dataset.latest_created_timestamp() {
            if deposit.creation_timestamp < latest {
                return Err(IngestError::invalid_deposit(format!(
                    "Deposit creation timestamp {} is before the latest created timestamp {} in the dataset to be updated",
                    deposit.creation_timestamp.to_rfc3339(),
                    latest.to_rfc3339()
                )));
            }
        }

        deposit.object_version = dataset.next_object_version()?;
        deposit.nbn = dataset.nbn;
        catalog.add_dataset_version_for(deposit).await?;
        Ok(())
    }

    fn accept(&self, mut deposit: Deposit, zip: PathBuf) -> TaskOutcome {
        deposit.properties.set_state(DepositState::Accepted, ACCEPTED_MESSAGE);
        self.finish(Some(deposit.properties), DepositState::Accepted, ACCEPTED_MESSAGE);
        info!(zip = %zip.display(), nbn = %deposit.nbn, version = deposit.object_version, "Deposit accepted");
        TaskOutcome::Accepted { zip }
    }

    fn reject_or_fail(&self, e: IngestError) -> TaskOutcome {
        let state = e.deposit_state();
        let message = e.to_string();
        if e.is_rejection() {
            warn!(error = %message, "Deposit rejected");
        } else {
            error!(error = %message, "Deposit failed");
        }
        self.finish(None, state, &message);
        match state {
            DepositState::Rejected => TaskOutcome::Rejected(message),
            _ => TaskOutcome::Failed(message),
        }
    }

    /// Record the final state and move the deposit; each step is tried on its own
    fn finish(&self, properties: Option<DepositProperties>, state: DepositState, message: &str) {
        let properties = match properties {
            Some(properties) => Ok(properties),
            None => DepositProperties::load(&self.deposit_dir).map(|mut p| {
                p.set_state(state, message);
                p
            }),
        };
        match properties.and_then(|p| p.save()) {
            Ok(()) => {},
            Err(e) => error!(error = %e, %state, "Failed to persist deposit state"),
        }

        if let Err(e) = self.context.outbox.move_deposit(&self.deposit_dir, state) {
            error!(
                error = %e,
                deposit = %self.deposit_dir.display(),
                "Failed to move deposit to outbox; giving up on it"
            );
        }
    }
}
