use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub profile_id: i64,
    pub address: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Looks up profiles by address. Unknown addresses are absent from the result.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn find_profiles(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, ProfileSummary>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgProfileLookup {
    pool: Pool<Postgres>,
}

impl PgProfileLookup {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileLookup for PgProfileLookup {
    async fn find_profiles(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, ProfileSummary>, sqlx::Error> {
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }

        // newest profile wins when an address was registered more than once
        let rows = sqlx::query(
            "SELECT DISTINCT ON (LOWER(circles_address)) \
                    id, LOWER(circles_address) AS address, first_name, last_name, avatar_url \
             FROM cb_app.profiles \
             WHERE LOWER(circles_address) = ANY($1) \
             ORDER BY LOWER(circles_address), created_at DESC, id DESC",
        )
        .bind(addresses.to_vec())
        .fetch_all(&self.pool)
        .await?;

        let mut profiles = HashMap::with_capacity(rows.len());
        for row in rows {
            let first_name: String = row.try_get("first_name")?;
            let last_name: Option<String> = row.try_get("last_name")?;
            let summary = ProfileSummary {
                profile_id: row.try_get("id")?,
                address: row.try_get("address")?,
                display_name: display_name(&first_name, last_name.as_deref()),
                avatar_url: row.try_get("avatar_url")?,
            };
            profiles.insert(summary.address.clone(), summary);
        }
        Ok(profiles)
    }
}

fn display_name(first_name: &str, last_name: Option<&str>) -> String {
    match last_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(last_name) => format!("{} {}", first_name.trim(), last_name),
        None => first_name.trim().to_string(),
    }
}
