//! Postgres-backed contact point sources.
//!
//! Every query selects one row per counterparty with the columns
//! `counterparty`, `directions`, `event_values` and `timestamps`, the last
//! three being text arrays ordered by event time.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use std::sync::Arc;

use crate::signal::{ContactFilter, ContactPoint, ContactSignal, Direction};
use crate::source::{ContactPointSource, ContactSourceRegistry, SourceError};
use crate::timestamp::parse_timestamp;

/// Wraps an `events(counterparty, direction, value, ts, ts_text)` CTE body into
/// the per-counterparty grouping every source shares. `$1` is the subject and
/// `$2` the optional counterparty allow-list.
macro_rules! grouped_query {
    ($events:literal) => {
        concat!(
            "WITH events AS (",
            $events,
            ") SELECT counterparty, \
                    array_agg(direction ORDER BY ts, direction) AS directions, \
                    array_agg(value ORDER BY ts, direction) AS event_values, \
                    array_agg(ts_text ORDER BY ts, direction) AS timestamps \
             FROM events \
             WHERE counterparty <> $1 \
               AND ($2::text[] IS NULL OR counterparty = ANY($2)) \
             GROUP BY counterparty"
        )
    };
}

mod chat;
mod invitations;
mod membership;
mod transfers;
mod trust;

pub struct SqlContactSource {
    name: ContactPoint,
    pool: Pool<Postgres>,
    query: &'static str,
}

impl SqlContactSource {
    fn new(name: ContactPoint, pool: Pool<Postgres>, query: &'static str) -> Self {
        Self { name, pool, query }
    }

    pub fn crc_trust(indexer: Pool<Postgres>) -> Self {
        Self::new(ContactPoint::CrcTrust, indexer, trust::CRC_TRUST)
    }

    pub fn crc_hub_transfer(indexer: Pool<Postgres>) -> Self {
        Self::new(
            ContactPoint::CrcHubTransfer,
            indexer,
            transfers::CRC_HUB_TRANSFER,
        )
    }

    pub fn erc20_transfer(indexer: Pool<Postgres>) -> Self {
        Self::new(ContactPoint::Erc20Transfer, indexer, transfers::ERC20_TRANSFER)
    }

    pub fn chat_message(app: Pool<Postgres>) -> Self {
        Self::new(ContactPoint::ChatMessage, app, chat::CHAT_MESSAGE)
    }

    pub fn invitation_sent(app: Pool<Postgres>) -> Self {
        Self::new(ContactPoint::InvitationSent, app, invitations::INVITATION_SENT)
    }

    pub fn invitation_redeemed(app: Pool<Postgres>) -> Self {
        Self::new(
            ContactPoint::InvitationRedeemed,
            app,
            invitations::INVITATION_REDEEMED,
        )
    }

    pub fn membership_offer(app: Pool<Postgres>) -> Self {
        Self::new(
            ContactPoint::MembershipOffer,
            app,
            membership::MEMBERSHIP_OFFER,
        )
    }
}

#[async_trait]
impl ContactPointSource for SqlContactSource {
    fn name(&self) -> ContactPoint {
        self.name
    }

    async fn fetch(
        &self,
        subject: &str,
        filter: &ContactFilter,
    ) -> Result<Vec<ContactSignal>, SourceError> {
        let rows = sqlx::query(self.query)
            .bind(subject)
            .bind(filter.to_bind())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(|row| decode_row(self.name, row)).collect()
    }
}

/// Every source, indexer-backed ones first.
pub fn default_registry(indexer: Pool<Postgres>, app: Pool<Postgres>) -> ContactSourceRegistry {
    ContactSourceRegistry::new()
        .register(Arc::new(SqlContactSource::crc_trust(indexer.clone())))
        .register(Arc::new(SqlContactSource::crc_hub_transfer(indexer.clone())))
        .register(Arc::new(SqlContactSource::erc20_transfer(indexer)))
        .register(Arc::new(SqlContactSource::chat_message(app.clone())))
        .register(Arc::new(SqlContactSource::invitation_sent(app.clone())))
        .register(Arc::new(SqlContactSource::invitation_redeemed(app.clone())))
        .register(Arc::new(SqlContactSource::membership_offer(app)))
}

fn decode_row(name: ContactPoint, row: &PgRow) -> Result<ContactSignal, SourceError> {
    let counterparty: String = row.try_get("counterparty")?;
    let directions: Vec<String> = row.try_get("directions")?;
    let values: Vec<Option<String>> = row.try_get("event_values")?;
    let timestamps: Vec<String> = row.try_get("timestamps")?;
    build_signal(name, &counterparty, directions, values, timestamps)
}

fn build_signal(
    name: ContactPoint,
    counterparty: &str,
    directions: Vec<String>,
    values: Vec<Option<String>>,
    timestamps: Vec<String>,
) -> Result<ContactSignal, SourceError> {
    if directions.len() != values.len() || directions.len() != timestamps.len() {
        return Err(SourceError::Decode(format!(
            "{name}: misaligned arrays for {counterparty} ({} directions, {} values, {} timestamps)",
            directions.len(),
            values.len(),
            timestamps.len()
        )));
    }

    let mut signal = ContactSignal::new(name, counterparty);
    for ((direction, value), timestamp) in directions.iter().zip(values).zip(timestamps.iter()) {
        let direction = Direction::parse(direction).ok_or_else(|| {
            SourceError::Decode(format!("{name}: unknown direction `{direction}`"))
        })?;
        signal = signal.with_event(
            direction,
            value.unwrap_or_default(),
            parse_timestamp(timestamp),
        );
    }
    Ok(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::EpochMillis;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn build_signal_aligns_arrays() {
        let signal = build_signal(
            ContactPoint::CrcTrust,
            "0xDEF",
            strings(&["Out", "In"]),
            vec![Some("50".into()), Some("100".into())],
            strings(&["1000", "2021-06-01T00:00:00Z"]),
        )
        .unwrap();

        assert_eq!(signal.counterparty(), "0xdef");
        assert_eq!(signal.directions(), &[Direction::Out, Direction::In]);
        assert_eq!(signal.values(), &strings(&["50", "100"])[..]);
        assert_eq!(
            signal.timestamps(),
            &[EpochMillis::new(1000), EpochMillis::new(1_622_505_600_000)]
        );
    }

    #[test]
    fn build_signal_rejects_misaligned_arrays() {
        let err = build_signal(
            ContactPoint::ChatMessage,
            "0xdef",
            strings(&["Out"]),
            vec![],
            strings(&["1000"]),
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[test]
    fn build_signal_rejects_unknown_direction() {
        let err = build_signal(
            ContactPoint::ChatMessage,
            "0xdef",
            strings(&["Sideways"]),
            vec![Some("hi".into())],
            strings(&["1000"]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Sideways"));
    }

    #[test]
    fn null_values_become_empty_strings() {
        let signal = build_signal(
            ContactPoint::InvitationRedeemed,
            "0xdef",
            strings(&["In"]),
            vec![None],
            strings(&["1000"]),
        )
        .unwrap();
        assert_eq!(signal.values(), &[String::new()]);
    }

    #[test]
    fn queries_share_the_grouping_contract() {
        for query in [
            trust::CRC_TRUST,
            transfers::CRC_HUB_TRANSFER,
            transfers::ERC20_TRANSFER,
            chat::CHAT_MESSAGE,
            invitations::INVITATION_SENT,
            invitations::INVITATION_REDEEMED,
            membership::MEMBERSHIP_OFFER,
        ] {
            assert!(query.starts_with("WITH events AS ("));
            assert!(query.contains("AS event_values"));
            assert!(query.contains("$2::text[] IS NULL"));
        }
    }
}
