use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{Span, debug, error, field, info, instrument, warn};

use stockroom_core::BatchId;
use stockroom_events::{EventBus, Subscription};
use stockroom_inventory::{
    FailureKind, InventoryItem, ItemsRemoved, ItemsRestored, OutcomeTally, ReferenceCategory,
    RemovalEvent, RemovalOutcome, RestoreOutcome, SearchCriteria, SearchPlan, SuggestionRules,
    UndoSession, remove_first_match,
};

use crate::config::RemovalConfig;
use crate::history::{TransactionEntry, TransactionHistory, TransactionKind};
use crate::record_store::{RecordStore, StockCommand};
use crate::reference_data::ReferenceData;

use super::loading::{LoadingGuard, publish_event};
use super::{RefreshOutcome, RemovalError};

/// Orchestrates search, batch removal, undo and suggestions for one session.
///
/// Each instance owns its own result set and undo session; hosts construct one
/// per operator session and share it behind an `Arc` if needed. Items inside a
/// batch are processed strictly in order, one store command at a time.
pub struct RemovalService<S, R, H, B> {
    store: S,
    reference: R,
    history: H,
    bus: B,
    config: RemovalConfig,
    rules: SuggestionRules,
    session: UndoSession,
    results: Mutex<Vec<InventoryItem>>,
    last_criteria: Mutex<Option<SearchCriteria>>,
    loading: AtomicUsize,
}

fn recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<S, R, H, B> RemovalService<S, R, H, B>
where
    S: RecordStore,
    R: ReferenceData,
    H: TransactionHistory,
    B: EventBus<RemovalEvent>,
{
    pub fn new(store: S, reference: R, history: H, bus: B) -> Self {
        Self::with_config(store, reference, history, bus, RemovalConfig::default())
    }

    pub fn with_config(store: S, reference: R, history: H, bus: B, config: RemovalConfig) -> Self {
        Self {
            store,
            reference,
            history,
            bus,
            rules: config.suggestion_rules(),
            session: UndoSession::new(config.undo_policy),
            config,
            results: Mutex::new(Vec::new()),
            last_criteria: Mutex::new(None),
            loading: AtomicUsize::new(0),
        }
    }

    fn begin_loading(&self) -> LoadingGuard<'_, B> {
        LoadingGuard::enter(&self.loading, &self.bus)
    }

    fn publish(&self, event: RemovalEvent) {
        publish_event(&self.bus, event);
    }

    /// Look up inventory and replace the current result set.
    ///
    /// Under-specified criteria (no part and no user) yield an empty result.
    /// On a store failure the current result set is left as it was.
    #[instrument(skip_all, fields(criteria = %criteria))]
    pub async fn search(
        &self,
        criteria: SearchCriteria,
    ) -> Result<Vec<InventoryItem>, RemovalError> {
        let _loading = self.begin_loading();

        let rows = match criteria.plan() {
            SearchPlan::ByPartAndOperation { part_id, operation } => {
                self.store.lookup_by_part_and_operation(&part_id, &operation).await
            }
            SearchPlan::ByPart { part_id } => self.store.lookup_by_part(&part_id).await,
            SearchPlan::ByUser { user } => self.store.lookup_by_user(&user).await,
            SearchPlan::Unindexed => {
                info!("search needs a part or a user; returning no items");
                Ok(Vec::new())
            }
        }
        .map_err(|e| {
            error!(error = %e, "inventory lookup failed");
            RemovalError::Store(e)
        })?;

        let now = Utc::now();
        let items = criteria.post_filter(
            rows.into_iter()
                .map(|row| InventoryItem::from_row(row, now))
                .collect(),
        );

        *recover(&self.results) = items.clone();
        *recover(&self.last_criteria) = Some(criteria);

        info!(count = items.len(), "inventory search complete");
        Ok(items)
    }

    /// Remove a batch of items, accounting for every item individually.
    ///
    /// Successes move from the result set into the undo session and are
    /// announced with one `ItemsRemoved` event; failures never stop the batch.
    #[instrument(
        skip(self, items, note),
        fields(batch_id = field::Empty, item_count = items.len())
    )]
    pub async fn remove_items(
        &self,
        items: &[InventoryItem],
        user: &str,
        note: Option<&str>,
    ) -> Result<RemovalOutcome, RemovalError> {
        if items.is_empty() {
            warn!("removal requested without any items");
            return Err(RemovalError::EmptyBatch);
        }

        let batch_id = BatchId::new();
        Span::current().record("batch_id", field::display(batch_id));

        let _loading = self.begin_loading();
        let notes = self.config.removal_note(note);
        let mut tally = OutcomeTally::new();

        info!("removal batch started");
        for item in items {
            if let Err(e) = item.validate_for_removal() {
                debug!(item = %item.short_description(), error = %e, "item failed validation");
                tally.failure(item.clone(), e.message(), FailureKind::Validation);
                continue;
            }

            let command = StockCommand::for_item(item, user, notes.clone());
            match self.store.remove(&command).await {
                Ok(reply) if reply.is_success() => {
                    debug!(item = %item.short_description(), "item removed");
                    self.notify_history(item, user).await;
                    tally.success(item.clone());
                }
                Ok(reply) => {
                    let message = if reply.message.trim().is_empty() {
                        format!("Failed to remove {}", item.short_description())
                    } else {
                        reply.message
                    };
                    warn!(
                        item = %item.short_description(),
                        status = reply.status,
                        reason = %message,
                        "store rejected removal"
                    );
                    tally.failure(item.clone(), message, FailureKind::Store);
                }
                Err(e) => {
                    error!(item = %item.short_description(), error = %e, "removal command failed");
                    tally.failure(item.clone(), e.to_string(), FailureKind::Unexpected);
                }
            }
        }

        let outcome = tally.finish();
        if outcome.has_successes() {
            self.session.record(outcome.succeeded());
            {
                let mut results = recover(&self.results);
                for item in outcome.succeeded() {
                    remove_first_match(&mut results, item);
                }
            }
            self.publish(RemovalEvent::ItemsRemoved(ItemsRemoved::new(
                batch_id,
                outcome.succeeded().to_vec(),
                user,
                Utc::now(),
            )));
        }

        info!(
            succeeded = outcome.success_count(),
            failed = outcome.failure_count(),
            "{}",
            outcome.summary()
        );
        Ok(outcome)
    }

    /// Remove a single item; same semantics as a one-element batch.
    pub async fn remove_item(
        &self,
        item: &InventoryItem,
        user: &str,
        note: Option<&str>,
    ) -> Result<RemovalOutcome, RemovalError> {
        self.remove_items(std::slice::from_ref(item), user, note).await
    }

    async fn notify_history(&self, item: &InventoryItem, user: &str) {
        let entry = TransactionEntry {
            user: user.to_string(),
            part_id: item.part_id.clone(),
            operation: item.operation_or_empty().to_string(),
            quantity: item.quantity,
            kind: TransactionKind::Out,
        };
        if let Err(e) = self.history.record(entry).await {
            warn!(part_id = %item.part_id, error = %e, "failed to record transaction history");
        }
    }

    /// Re-insert every item held by the undo session.
    ///
    /// Only the items that were restored leave the session; the rest stay
    /// available for another attempt.
    #[instrument(skip(self), fields(batch_id = field::Empty))]
    pub async fn undo_last_removal(&self, user: &str) -> Result<RestoreOutcome, RemovalError> {
        let pending = self.session.snapshot();
        if pending.is_empty() {
            info!("nothing to undo");
            return Err(RemovalError::NothingToUndo);
        }

        let batch_id = BatchId::new();
        Span::current().record("batch_id", field::display(batch_id));

        let _loading = self.begin_loading();
        let mut tally = OutcomeTally::new();

        info!(item_count = pending.len(), "undo started");
        for item in pending {
            let command = StockCommand::for_item(&item, user, self.config.restore_note.clone());
            match self.store.insert(&command).await {
                Ok(reply) if reply.is_success() => {
                    debug!(item = %item.short_description(), "item restored");
                    tally.success(item);
                }
                Ok(reply) => {
                    let message = if reply.message.trim().is_empty() {
                        format!("Failed to restore {}", item.short_description())
                    } else {
                        reply.message
                    };
                    warn!(
                        item = %item.short_description(),
                        status = reply.status,
                        reason = %message,
                        "store rejected restore"
                    );
                    tally.failure(item, message, FailureKind::Store);
                }
                Err(e) => {
                    error!(item = %item.short_description(), error = %e, "insert command failed");
                    tally.failure(item, e.to_string(), FailureKind::Unexpected);
                }
            }
        }

        let outcome = tally.finish();
        if outcome.has_successes() {
            self.session.remove_restored(outcome.succeeded());
            recover(&self.results).extend_from_slice(outcome.succeeded());
            self.publish(RemovalEvent::ItemsRestored(ItemsRestored {
                batch_id,
                items: outcome.succeeded().to_vec(),
                restored_at: Utc::now(),
                user: user.to_string(),
            }));
        }

        info!(
            restored = outcome.success_count(),
            failed = outcome.failure_count(),
            remaining = self.session.len(),
            "undo finished"
        );
        Ok(outcome)
    }

    /// Forget every removed item without touching the store.
    pub fn clear_undo_session(&self) -> usize {
        let discarded = self.session.clear();
        info!(discarded, "undo session cleared");
        self.publish(RemovalEvent::UndoSessionCleared {
            discarded,
            cleared_at: Utc::now(),
        });
        discarded
    }

    /// Re-run the last search, or empty the result set if none has run.
    pub async fn refresh_inventory(&self) -> Result<RefreshOutcome, RemovalError> {
        let criteria = recover(&self.last_criteria).clone();
        match criteria {
            Some(criteria) => self.search(criteria).await.map(RefreshOutcome::Reloaded),
            None => {
                recover(&self.results).clear();
                debug!("no previous search; result set cleared");
                Ok(RefreshOutcome::Cleared)
            }
        }
    }

    /// Up to `suggestion_limit` values of `category` containing `input`.
    ///
    /// Short input and provider failures both yield an empty list.
    pub async fn suggestions(&self, category: ReferenceCategory, input: &str) -> Vec<String> {
        if !self.rules.accepts(input, category) {
            return Vec::new();
        }
        match self.reference.values(category).await {
            Ok(values) => self.rules.select(&values, input),
            Err(e) => {
                warn!(%category, error = %e, "reference data lookup failed");
                Vec::new()
            }
        }
    }

    pub async fn part_suggestions(&self, input: &str) -> Vec<String> {
        self.suggestions(ReferenceCategory::Part, input).await
    }

    pub async fn operation_suggestions(&self, input: &str) -> Vec<String> {
        self.suggestions(ReferenceCategory::Operation, input).await
    }

    pub async fn location_suggestions(&self, input: &str) -> Vec<String> {
        self.suggestions(ReferenceCategory::Location, input).await
    }

    pub async fn user_suggestions(&self, input: &str) -> Vec<String> {
        self.suggestions(ReferenceCategory::User, input).await
    }

    /// Reload every reference set from its source.
    pub async fn refresh_reference_data(&self) -> Result<(), RemovalError> {
        let _loading = self.begin_loading();
        self.reference.refresh().await.map_err(|e| {
            error!(error = %e, "reference data refresh failed");
            RemovalError::from(e)
        })
    }

    /// Items of the last search still present (removals taken out, restores appended).
    pub fn current_items(&self) -> Vec<InventoryItem> {
        recover(&self.results).clone()
    }

    /// Items currently eligible for undo, in removal order.
    pub fn undo_items(&self) -> Vec<InventoryItem> {
        self.session.snapshot()
    }

    pub fn has_undo_items(&self) -> bool {
        !self.session.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub fn subscribe(&self) -> Subscription<RemovalEvent> {
        self.bus.subscribe()
    }
}
