// A pair whose latest row has limit 0 is revoked and drops out entirely; live
// pairs keep their non-zero history. Timestamps come out as epoch millis.
pub(super) const CRC_TRUST: &str = grouped_query!(
    "SELECT CASE WHEN truster = $1 THEN trustee ELSE truster END AS counterparty, \
            CASE WHEN truster = $1 THEN 'Out' ELSE 'In' END AS direction, \
            trust_limit::text AS value, block_timestamp AS ts, \
            (EXTRACT(EPOCH FROM block_timestamp) * 1000)::bigint::text AS ts_text \
     FROM ( \
         SELECT LOWER(truster) AS truster, LOWER(trustee) AS trustee, \
                trust_limit, block_timestamp, \
                FIRST_VALUE(trust_limit) OVER ( \
                    PARTITION BY LOWER(truster), LOWER(trustee) \
                    ORDER BY block_timestamp DESC, id DESC \
                ) AS current_limit \
         FROM cb_indexer.crc_trust \
         WHERE LOWER(truster) = $1 OR LOWER(trustee) = $1 \
     ) AS relations \
     WHERE current_limit > 0 AND trust_limit > 0"
);
