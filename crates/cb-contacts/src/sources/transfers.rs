pub(super) const CRC_HUB_TRANSFER: &str = grouped_query!(
    "SELECT LOWER(to_address) AS counterparty, 'Out' AS direction, \
            amount::text AS value, block_timestamp AS ts, \
            (EXTRACT(EPOCH FROM block_timestamp) * 1000)::bigint::text AS ts_text \
     FROM cb_indexer.crc_hub_transfer \
     WHERE LOWER(from_address) = $1 \
     UNION ALL \
     SELECT LOWER(from_address), 'In', amount::text, block_timestamp, \
            (EXTRACT(EPOCH FROM block_timestamp) * 1000)::bigint::text \
     FROM cb_indexer.crc_hub_transfer \
     WHERE LOWER(to_address) = $1"
);

pub(super) const ERC20_TRANSFER: &str = grouped_query!(
    "SELECT LOWER(to_address) AS counterparty, 'Out' AS direction, \
            amount::text AS value, block_timestamp AS ts, \
            (EXTRACT(EPOCH FROM block_timestamp) * 1000)::bigint::text AS ts_text \
     FROM cb_indexer.erc20_transfer \
     WHERE LOWER(from_address) = $1 \
     UNION ALL \
     SELECT LOWER(from_address), 'In', amount::text, block_timestamp, \
            (EXTRACT(EPOCH FROM block_timestamp) * 1000)::bigint::text \
     FROM cb_indexer.erc20_transfer \
     WHERE LOWER(to_address) = $1"
);
