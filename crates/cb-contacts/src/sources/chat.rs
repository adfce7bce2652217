// App tables hand out ISO 8601 timestamps.
pub(super) const CHAT_MESSAGE: &str = grouped_query!(
    "SELECT LOWER(to_address) AS counterparty, 'Out' AS direction, \
            text AS value, created_at AS ts, to_json(created_at) #>> '{}' AS ts_text \
     FROM cb_app.chat_messages \
     WHERE LOWER(from_address) = $1 \
     UNION ALL \
     SELECT LOWER(from_address), 'In', text, created_at, to_json(created_at) #>> '{}' \
     FROM cb_app.chat_messages \
     WHERE LOWER(to_address) = $1"
);
