//! An inbox, its task queue and its outboxes wired together
//!
//! The watcher reports new deposit directories, each one becomes an
//! [`IngestTask`] on the queue, and every task shares one [`TaskContext`].

use crate::client::{BagValidator, CatalogClient, ValidatorClient, VaultCatalog};
use crate::config::Config;
use crate::deposit::DepositLoader;
use crate::id_minter::IdMinter;
use crate::inbox::{DepositListener, InboxWatcher};
use crate::mapping::MetadataMapper;
use crate::outbox::Outbox;
use crate::queue::{SubmitError, TaskQueue};
use crate::task::{IngestTask, TaskContext, TaskOutcome};
use crate::vocabulary::{CountryTerms, LanguageResolver};
use anyhow::{bail, Context};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct IngestArea {
    watcher: InboxWatcher,
    queue: Arc<TaskQueue>,
    context: Arc<TaskContext>,
    cancel: CancellationToken,
    shutdown_timeout: Duration,
}

impl IngestArea {
    /// Build the HTTP clients from the configuration and check the directories
    ///
    /// Must be called inside a tokio runtime; the queue workers are spawned here.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let validator: Arc<dyn BagValidator> =
            Arc::new(ValidatorClient::new(&config.validator).context("Failed to create validator client")?);
        let catalog: Arc<dyn VaultCatalog> =
            Arc::new(CatalogClient::new(&config.catalog).context("Failed to create catalog client")?);
        Self::new(config, validator, catalog)
    }

    /// Like [`from_config`](Self::from_config) with the remote services supplied by the caller
    pub fn new(
        config: &Config,
        validator: Arc<dyn BagValidator>,
        catalog: Arc<dyn VaultCatalog>,
    ) -> anyhow::Result<Self> {
        if !config.inbox.is_dir() {
            bail!("Inbox {} does not exist", config.inbox.display());
        }
        if !config.dve_outbox.is_dir() {
            if !config.create_outbox_if_missing {
                bail!("DVE outbox {} does not exist", config.dve_outbox.display());
            }
            std::fs::create_dir_all(&config.dve_outbox)
                .with_context(|| format!("Failed to create DVE outbox {}", config.dve_outbox.display()))?;
        }
        let outbox = Outbox::init(&config.outbox, config.create_outbox_if_missing)?;

        let languages = LanguageResolver::load(config.languages.iso639_1.as_deref(), config.languages.iso639_2.as_deref())?;
        let countries = CountryTerms::load(config.spatial_coverage_country_terms_path.as_deref())?;

        let context = Arc::new(TaskContext {
            validator,
            catalog,
            loader: DepositLoader::new(config.deposit_kind()),
            id_minter: IdMinter,
            mapper: MetadataMapper::new(languages, countries, config.catalog.datastation.clone()),
            outbox,
            dve_outbox: config.dve_outbox.clone(),
            data_suppliers: config.data_suppliers.clone(),
        });

        let queue = Arc::new(TaskQueue::new(
            config.task_queue.workers,
            config.task_queue.backlog,
            config.task_queue.when_full,
        ));

        info!(
            inbox = %config.inbox.display(),
            outbox = %config.outbox.display(),
            dve_outbox = %config.dve_outbox.display(),
            kind = ?config.deposit_kind(),
            "Ingest area ready"
        );

        Ok(Self {
            watcher: InboxWatcher::new(&config.inbox, config.watcher.poll_interval()),
            queue,
            context,
            cancel: CancellationToken::new(),
            shutdown_timeout: config.shutdown_timeout(),
        })
    }

    pub fn inbox(&self) -> &Path {
        self.watcher.inbox()
    }

    /// Start watching the inbox; every new deposit is queued for ingest
    pub fn start(&self) {
        let submitter = Submitter {
            queue: Arc::clone(&self.queue),
            context: Arc::clone(&self.context),
            cancel: self.cancel.clone(),
        };
        self.watcher.start(Arc::new(submitter));
    }

    /// Run one deposit now, outside the queue
    pub async fn ingest_one(&self, deposit_dir: &Path) -> anyhow::Result<TaskOutcome> {
        let deposit_dir = deposit_dir
            .canonicalize()
            .with_context(|| format!("Deposit {} not found", deposit_dir.display()))?;
        let inbox = self.inbox().canonicalize()?;
        if deposit_dir.parent() != Some(inbox.as_path()) {
            bail!(
                "Deposit {} is not a directory directly inside inbox {}",
                deposit_dir.display(),
                inbox.display()
            );
        }
        Ok(IngestTask::new(deposit_dir, Arc::clone(&self.context), self.cancel.clone())
            .run()
            .await)
    }

    /// Stop watching, cancel tasks that have not started enrichment and drain the queue
    ///
    /// Returns `false` when tasks were still running at the shutdown timeout.
    pub async fn shutdown(&self) -> bool {
        info!("Shutting down ingest area");
        self.watcher.stop().await;
        self.cancel.cancel();
        self.queue.shutdown(self.shutdown_timeout).await
    }
}

struct Submitter {
    queue: Arc<TaskQueue>,
    context: Arc<TaskContext>,
    cancel: CancellationToken,
}

#[async_trait]
impl DepositListener for Submitter {
    async fn on_new_deposit(&self, deposit_dir: PathBuf) {
        let task = IngestTask::new(deposit_dir.clone(), Arc::clone(&self.context), self.cancel.clone());
        let result = self
            .queue
            .submit(async move {
                task.run().await;
            })
            .await;

        match result {
            Ok(()) => info!(deposit = %deposit_dir.display(), "Deposit queued for ingest"),
            Err(SubmitError::Full) => {
                warn!(deposit = %deposit_dir.display(), "Task queue full; deposit left in inbox until restart")
            },
            Err(SubmitError::Closed) => {
                warn!(deposit = %deposit_dir.display(), "Task queue closed; deposit not queued")
            },
        }
    }
}
