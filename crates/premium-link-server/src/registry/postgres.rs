//! PostgreSQL link registry.
//!
//! Writers take transaction-scoped advisory locks on the uniqueness keys
//! they touch before re-reading state, so check-then-insert is serialized per
//! wallet and per profile. The partial unique indexes from the migrations
//! back this up; a violation that still slips through surfaces as
//! [`LinkError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use premium_link_types::{ProfileId, WalletAddress};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::LinkRegistry;
use crate::error::LinkError;
use crate::models::{Binding, DeactivationReason};

const BINDING_COLUMNS: &str =
    "id, wallet_address, profile_id, is_active, linked_at, deactivated_at, deactivation_reason";

/// Raw `premium_bindings` row.
#[derive(Debug, Clone, FromRow)]
struct BindingRow {
    id: Uuid,
    wallet_address: String,
    profile_id: String,
    is_active: bool,
    linked_at: DateTime<Utc>,
    deactivated_at: Option<DateTime<Utc>>,
    deactivation_reason: Option<String>,
}

impl TryFrom<BindingRow> for Binding {
    type Error = LinkError;

    fn try_from(row: BindingRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, detail: String| {
            LinkError::Storage(format!("binding {} has invalid {}: {}", row.id, what, detail))
        };

        let wallet_address = WalletAddress::parse(&row.wallet_address)
            .map_err(|e| corrupt("wallet_address", e.to_string()))?;
        let profile_id =
            ProfileId::parse(&row.profile_id).map_err(|e| corrupt("profile_id", e.to_string()))?;
        let deactivation_reason = row
            .deactivation_reason
            .as_deref()
            .map(str::parse::<DeactivationReason>)
            .transpose()
            .map_err(|e| corrupt("deactivation_reason", e))?;

        Ok(Binding {
            id: row.id,
            wallet_address,
            profile_id,
            is_active: row.is_active,
            linked_at: row.linked_at,
            deactivated_at: row.deactivated_at,
            deactivation_reason,
        })
    }
}

fn into_binding(row: Option<BindingRow>) -> Result<Option<Binding>, LinkError> {
    row.map(Binding::try_from).transpose()
}

fn into_bindings(rows: Vec<BindingRow>) -> Result<Vec<Binding>, LinkError> {
    rows.into_iter().map(Binding::try_from).collect()
}

fn wallet_lock_key(wallet: &WalletAddress) -> String {
    format!("premium_bindings:wallet:{}", wallet)
}

fn profile_lock_key(profile: &ProfileId) -> String {
    format!("premium_bindings:profile:{}", profile)
}

/// Takes a transaction-scoped advisory lock, released on commit or rollback.
async fn lock_key(tx: &mut Transaction<'_, Postgres>, key: &str) -> Result<(), LinkError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(key)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Link registry stored in the `premium_bindings` table.
#[derive(Debug, Clone)]
pub struct PgLinkRegistry {
    pool: PgPool,
}

impl PgLinkRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn deactivate_where(
        &self,
        column: &str,
        value: &str,
        lock: String,
        reason: DeactivationReason,
    ) -> Result<Option<Binding>, LinkError> {
        let mut tx = self.pool.begin().await?;
        lock_key(&mut tx, &lock).await?;

        let row: Option<BindingRow> = sqlx::query_as(&format!(
            r#"
            UPDATE premium_bindings
            SET is_active = FALSE, deactivated_at = $2, deactivation_reason = $3
            WHERE {} = $1 AND is_active
            RETURNING {}
            "#,
            column, BINDING_COLUMNS
        ))
        .bind(value)
        .bind(Utc::now())
        .bind(reason.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        into_binding(row)
    }
}

#[async_trait]
impl LinkRegistry for PgLinkRegistry {
    async fn active_binding_by_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<Binding>, LinkError> {
        let row: Option<BindingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM premium_bindings WHERE wallet_address = $1 AND is_active",
            BINDING_COLUMNS
        ))
        .bind(wallet.as_str())
        .fetch_optional(&self.pool)
        .await?;

        into_binding(row)
    }

    async fn active_binding_by_profile(
        &self,
        profile: &ProfileId,
    ) -> Result<Option<Binding>, LinkError> {
        let row: Option<BindingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM premium_bindings WHERE profile_id = $1 AND is_active",
            BINDING_COLUMNS
        ))
        .bind(profile.as_str())
        .fetch_optional(&self.pool)
        .await?;

        into_binding(row)
    }

    async fn active_bindings_for_profiles(
        &self,
        profiles: &[ProfileId],
    ) -> Result<Vec<Binding>, LinkError> {
        if profiles.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = profiles.iter().map(ProfileId::as_str).collect();
        let rows: Vec<BindingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM premium_bindings WHERE profile_id = ANY($1) AND is_active",
            BINDING_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        into_bindings(rows)
    }

    async fn create_binding(
        &self,
        wallet: &WalletAddress,
        profile: &ProfileId,
    ) -> Result<Binding, LinkError> {
        let mut tx = self.pool.begin().await?;

        // Profile key first, then wallet key. Every writer follows this order.
        lock_key(&mut tx, &profile_lock_key(profile)).await?;
        lock_key(&mut tx, &wallet_lock_key(wallet)).await?;

        let holder: Option<BindingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM premium_bindings WHERE profile_id = $1 AND is_active",
            BINDING_COLUMNS
        ))
        .bind(profile.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(holder) = into_binding(holder)? {
            tx.rollback().await?;
            if holder.links(wallet, profile) {
                return Ok(holder);
            }
            return Err(LinkError::Conflict);
        }

        let now = Utc::now();
        let superseded: Option<BindingRow> = sqlx::query_as(&format!(
            r#"
            UPDATE premium_bindings
            SET is_active = FALSE, deactivated_at = $2, deactivation_reason = $3
            WHERE wallet_address = $1 AND is_active
            RETURNING {}
            "#,
            BINDING_COLUMNS
        ))
        .bind(wallet.as_str())
        .bind(now)
        .bind(DeactivationReason::Relinked.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let inserted: BindingRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO premium_bindings (id, wallet_address, profile_id, is_active, linked_at)
            VALUES ($1, $2, $3, TRUE, $4)
            RETURNING {}
            "#,
            BINDING_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(wallet.as_str())
        .bind(profile.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        if let Some(previous) = superseded {
            tracing::info!(
                wallet = %wallet,
                previous_profile_id = %previous.profile_id,
                binding_id = %previous.id,
                "Superseded previous premium binding"
            );
        }

        Binding::try_from(inserted)
    }

    async fn deactivate_binding(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<Binding>, LinkError> {
        self.deactivate_where(
            "wallet_address",
            wallet.as_str(),
            wallet_lock_key(wallet),
            DeactivationReason::Unlinked,
        )
        .await
    }

    async fn deactivate_binding_for_profile(
        &self,
        profile: &ProfileId,
    ) -> Result<Option<Binding>, LinkError> {
        self.deactivate_where(
            "profile_id",
            profile.as_str(),
            profile_lock_key(profile),
            DeactivationReason::Revoked,
        )
        .await
    }

    async fn binding_history(&self, wallet: &WalletAddress) -> Result<Vec<Binding>, LinkError> {
        let rows: Vec<BindingRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM premium_bindings
            WHERE wallet_address = $1
            ORDER BY linked_at DESC
            "#,
            BINDING_COLUMNS
        ))
        .bind(wallet.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_bindings(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row() -> BindingRow {
        BindingRow {
            id: Uuid::new_v4(),
            wallet_address: "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".to_string(),
            profile_id: "0x01a4".to_string(),
            is_active: false,
            linked_at: Utc::now(),
            deactivated_at: Some(Utc::now()),
            deactivation_reason: Some("relinked".to_string()),
        }
    }

    #[test]
    fn test_row_conversion() {
        let binding = Binding::try_from(make_row()).unwrap();
        assert_eq!(binding.profile_id.as_str(), "0x01a4");
        assert_eq!(binding.deactivation_reason, Some(DeactivationReason::Relinked));
    }

    #[test]
    fn test_row_with_bad_wallet_is_storage_error() {
        let mut row = make_row();
        row.wallet_address = "garbage".to_string();
        let err = Binding::try_from(row).unwrap_err();
        assert!(matches!(err, LinkError::Storage(msg) if msg.contains("wallet_address")));
    }

    #[test]
    fn test_row_with_unknown_reason_is_storage_error() {
        let mut row = make_row();
        row.deactivation_reason = Some("deleted".to_string());
        assert!(matches!(Binding::try_from(row), Err(LinkError::Storage(_))));
    }

    #[test]
    fn test_lock_keys_are_namespaced() {
        let wallet = WalletAddress::parse("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        let profile = ProfileId::parse("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        // Identical strings must not share a lock across key kinds.
        assert_ne!(wallet_lock_key(&wallet), profile_lock_key(&profile));
    }
}
