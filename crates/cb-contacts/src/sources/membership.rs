// Rejected offers still count; the value is the group the offer was for.
pub(super) const MEMBERSHIP_OFFER: &str = grouped_query!(
    "SELECT LOWER(member_address) AS counterparty, 'Out' AS direction, \
            LOWER(group_address) AS value, created_at AS ts, \
            to_json(created_at) #>> '{}' AS ts_text \
     FROM cb_app.membership_offers \
     WHERE LOWER(created_by_address) = $1 \
     UNION ALL \
     SELECT LOWER(created_by_address), 'In', LOWER(group_address), created_at, \
            to_json(created_at) #>> '{}' \
     FROM cb_app.membership_offers \
     WHERE LOWER(member_address) = $1"
);
