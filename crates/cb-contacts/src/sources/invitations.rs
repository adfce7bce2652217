// Only redeemed invitations have a counterparty.
pub(super) const INVITATION_SENT: &str = grouped_query!(
    "SELECT LOWER(redeemed_by_address) AS counterparty, 'Out' AS direction, \
            code AS value, COALESCE(redeemed_at, created_at) AS ts, \
            to_json(COALESCE(redeemed_at, created_at)) #>> '{}' AS ts_text \
     FROM cb_app.invitations \
     WHERE LOWER(created_by_address) = $1 AND redeemed_by_address IS NOT NULL"
);

pub(super) const INVITATION_REDEEMED: &str = grouped_query!(
    "SELECT LOWER(created_by_address) AS counterparty, 'In' AS direction, \
            code AS value, COALESCE(redeemed_at, created_at) AS ts, \
            to_json(COALESCE(redeemed_at, created_at)) #>> '{}' AS ts_text \
     FROM cb_app.invitations \
     WHERE LOWER(redeemed_by_address) = $1"
);
