use cb_core::metrics;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Instant;

use crate::backfill::ProfileLookup;
use crate::merge::{sort_contacts, AggregatedContact, ContactMerge};
use crate::signal::{normalize_address, ContactFilter, ContactPoint, ContactSelection};
use crate::source::{ContactSourceRegistry, SourceError};
use crate::timestamp::EpochMillis;
use crate::SERVICE_NAME;

/// Watermark reported when nothing was aggregated.
pub const NO_WATERMARK: i64 = -1;

#[derive(Debug, thiserror::Error)]
pub enum ContactsError {
    #[error("contact source {source_name} failed")]
    Source {
        source_name: ContactPoint,
        #[source]
        source: SourceError,
    },
    #[error("profile lookup failed")]
    Profile(#[source] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationResult {
    watermark: Option<EpochMillis>,
    contacts: Vec<AggregatedContact>,
}

impl AggregationResult {
    pub fn watermark(&self) -> Option<EpochMillis> {
        self.watermark
    }

    /// Epoch millis of the newest folded signal, or [`NO_WATERMARK`].
    pub fn last_updated_at(&self) -> i64 {
        self.watermark
            .map(EpochMillis::as_i64)
            .unwrap_or(NO_WATERMARK)
    }

    pub fn contacts(&self) -> &[AggregatedContact] {
        &self.contacts
    }
}

pub struct ContactAggregator {
    registry: ContactSourceRegistry,
    profiles: Arc<dyn ProfileLookup>,
}

impl ContactAggregator {
    pub fn new(registry: ContactSourceRegistry, profiles: Arc<dyn ProfileLookup>) -> Self {
        Self { registry, profiles }
    }

    pub fn registry(&self) -> &ContactSourceRegistry {
        &self.registry
    }

    pub async fn aggregate(
        &self,
        subject: &str,
        selection: &ContactSelection,
        filter: &ContactFilter,
    ) -> Result<AggregationResult, ContactsError> {
        self.aggregate_at(subject, selection, filter, EpochMillis::now())
            .await
    }

    /// Same as [`aggregate`](Self::aggregate) with an explicit time for search placeholders.
    pub async fn aggregate_at(
        &self,
        subject: &str,
        selection: &ContactSelection,
        filter: &ContactFilter,
        now: EpochMillis,
    ) -> Result<AggregationResult, ContactsError> {
        let result = self.run(subject, selection, filter, now).await;
        let outcome = match &result {
            Ok(_) => metrics::AGGREGATION_RESULT_SUCCESS,
            Err(_) => metrics::AGGREGATION_RESULT_ERROR,
        };
        metrics::inc_contact_aggregation(SERVICE_NAME, outcome);
        result
    }

    async fn run(
        &self,
        subject: &str,
        selection: &ContactSelection,
        filter: &ContactFilter,
        now: EpochMillis,
    ) -> Result<AggregationResult, ContactsError> {
        let subject = normalize_address(subject);
        let sources = self.registry.select(selection);

        let calls = sources.iter().map(|source| {
            let subject = subject.as_str();
            async move {
                let started = Instant::now();
                let result = source.fetch(subject, filter).await;
                metrics::observe_contact_source_duration(
                    SERVICE_NAME,
                    source.name().as_str(),
                    started.elapsed(),
                );
                result.map_err(|err| {
                    tracing::warn!(
                        subject = %subject,
                        source = %source.name(),
                        error = %err,
                        "contact source failed"
                    );
                    ContactsError::Source {
                        source_name: source.name(),
                        source: err,
                    }
                })
            }
        });

        // results come back in registry order whatever order the queries finish in
        let batches = try_join_all(calls).await?;

        let mut merge = ContactMerge::restricted_to(filter.clone());
        merge.extend(batches.into_iter().flatten());
        let watermark = merge.watermark();

        let contacts = if merge.is_empty() && filter.is_restricted() {
            self.backfill(filter, now).await?
        } else {
            merge.into_contacts()
        };

        tracing::debug!(
            subject = %subject,
            sources = sources.len(),
            contacts = contacts.len(),
            watermark = watermark.map(EpochMillis::as_i64).unwrap_or(NO_WATERMARK),
            "contacts aggregated"
        );

        Ok(AggregationResult {
            watermark,
            contacts,
        })
    }

    async fn backfill(
        &self,
        filter: &ContactFilter,
        now: EpochMillis,
    ) -> Result<Vec<AggregatedContact>, ContactsError> {
        let addresses: Vec<String> = filter.iter().map(str::to_string).collect();
        let mut profiles = self
            .profiles
            .find_profiles(&addresses)
            .await
            .map_err(ContactsError::Profile)?;

        let placeholders = addresses
            .iter()
            .filter_map(|address| profiles.remove(address))
            .map(|profile| AggregatedContact::search_placeholder(profile, now))
            .collect();
        Ok(sort_contacts(placeholders))
    }
}
