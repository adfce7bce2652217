use std::cmp::Reverse;
use std::collections::HashMap;

use crate::backfill::ProfileSummary;
use crate::signal::{ContactFilter, ContactSignal};
use crate::timestamp::EpochMillis;

/// All signals observed for one counterparty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedContact {
    counterparty: String,
    signals: Vec<ContactSignal>,
    last_interaction_at: EpochMillis,
    profile: Option<ProfileSummary>,
}

impl AggregatedContact {
    fn from_signal(signal: ContactSignal) -> Self {
        Self {
            counterparty: signal.counterparty().to_string(),
            last_interaction_at: signal_time(&signal),
            signals: vec![signal],
            profile: None,
        }
    }

    /// A contact that only exists because a profile matched a search.
    pub fn search_placeholder(profile: ProfileSummary, at: EpochMillis) -> Self {
        Self {
            counterparty: profile.address.clone(),
            signals: vec![ContactSignal::search_marker(&profile.address, at)],
            last_interaction_at: at,
            profile: Some(profile),
        }
    }

    fn absorb(&mut self, signal: ContactSignal) {
        self.last_interaction_at = self.last_interaction_at.max(signal_time(&signal));
        self.signals.push(signal);
    }

    pub fn counterparty(&self) -> &str {
        &self.counterparty
    }

    pub fn signals(&self) -> &[ContactSignal] {
        &self.signals
    }

    pub fn last_interaction_at(&self) -> EpochMillis {
        self.last_interaction_at
    }

    pub fn profile(&self) -> Option<&ProfileSummary> {
        self.profile.as_ref()
    }
}

fn signal_time(signal: &ContactSignal) -> EpochMillis {
    signal.latest_timestamp().unwrap_or(EpochMillis::MIN_VALID)
}

/// Folds signals into one entry per counterparty and tracks the watermark.
///
/// Signals for counterparties outside the filter are skipped before they can
/// touch either the contacts or the watermark.
#[derive(Debug, Default)]
pub struct ContactMerge {
    filter: ContactFilter,
    contacts: HashMap<String, AggregatedContact>,
    watermark: Option<EpochMillis>,
}

impl ContactMerge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restricted_to(filter: ContactFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn push(&mut self, signal: ContactSignal) {
        if !self.filter.allows(signal.counterparty()) {
            tracing::debug!(
                counterparty = %signal.counterparty(),
                source = %signal.name(),
                "dropping signal outside filter"
            );
            return;
        }

        let time = signal_time(&signal);
        self.watermark = Some(self.watermark.map_or(time, |current| current.max(time)));

        match self.contacts.get_mut(signal.counterparty()) {
            Some(contact) => contact.absorb(signal),
            None => {
                let contact = AggregatedContact::from_signal(signal);
                self.contacts.insert(contact.counterparty.clone(), contact);
            }
        }
    }

    pub fn extend<I>(&mut self, signals: I)
    where
        I: IntoIterator<Item = ContactSignal>,
    {
        for signal in signals {
            self.push(signal);
        }
    }

    /// `None` until at least one signal has been folded.
    pub fn watermark(&self) -> Option<EpochMillis> {
        self.watermark
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn into_contacts(self) -> Vec<AggregatedContact> {
        sort_contacts(self.contacts.into_values().collect())
    }
}

/// Most recent first; ties broken by address.
pub fn sort_contacts(mut contacts: Vec<AggregatedContact>) -> Vec<AggregatedContact> {
    contacts.sort_by(|a, b| {
        Reverse(a.last_interaction_at)
            .cmp(&Reverse(b.last_interaction_at))
            .then_with(|| a.counterparty.cmp(&b.counterparty))
    });
    contacts
}
