// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Profiles (read-only; written by the identity provider's signup hook)
//! - Daily check-ins (one document per user and calendar day)

use crate::db::{collections, CheckinStore, ProfileStore};
use crate::error::AppError;
use crate::models::{CheckinInput, DailyCheckin, Profile};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use firestore::errors::FirestoreError;
use firestore::{FirestoreConsistencySelector, FirestoreResult};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator takes an unauthenticated connection
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore emulator");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Client with no connection. Every operation fails with a database error.
    pub fn new_offline() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Create or replace a profile. Used by seeding and integration tests.
    pub async fn set_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PROFILES)
            .document_id(&profile.id)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for FirestoreDb {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROFILES)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl CheckinStore for FirestoreDb {
    /// Upsert inside a transaction. The existing row is read through the
    /// transaction, so a concurrent writer to the same day aborts one commit
    /// and the loser retries against the winner's row.
    async fn upsert_checkin(
        &self,
        user_id: &str,
        checkin_date: NaiveDate,
        input: &CheckinInput,
        now: DateTime<Utc>,
    ) -> Result<DailyCheckin, AppError> {
        let client = self.get_client()?;
        let mut attempt = 1;

        loop {
            match try_upsert_checkin(client, user_id, checkin_date, input, now).await {
                Ok(row) => return Ok(row),
                Err(e) if is_retryable(&e) && attempt < MAX_TRANSACTION_ATTEMPTS => {
                    tracing::warn!(
                        user_id,
                        date = %checkin_date,
                        attempt,
                        error = %e,
                        "Check-in transaction aborted, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => {
                    return Err(AppError::Database(format!(
                        "Check-in transaction failed: {}",
                        e
                    )))
                }
            }
        }
    }

    async fn get_checkin(
        &self,
        user_id: &str,
        checkin_date: NaiveDate,
    ) -> Result<Option<DailyCheckin>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DAILY_CHECKINS)
            .obj()
            .one(&DailyCheckin::document_id(user_id, checkin_date))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_checkins(
        &self,
        user_id: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<DailyCheckin>, AppError> {
        let user_id = user_id.to_string();
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::DAILY_CHECKINS);

        // Dates are stored as YYYY-MM-DD, so string order is date order
        let query = if let Some(date) = since {
            let date = date.format("%Y-%m-%d").to_string();
            query.filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("checkin_date")
                        .greater_than_or_equal(date.clone()),
                ])
            })
        } else {
            query.filter(move |q| q.field("user_id").eq(user_id.clone()))
        };

        query
            .order_by([(
                "checkin_date",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

const MAX_TRANSACTION_ATTEMPTS: u32 = 3;

fn is_retryable(err: &FirestoreError) -> bool {
    matches!(err, FirestoreError::DatabaseError(e) if e.retry_possible)
}

async fn try_upsert_checkin(
    client: &firestore::FirestoreDb,
    user_id: &str,
    checkin_date: NaiveDate,
    input: &CheckinInput,
    now: DateTime<Utc>,
) -> FirestoreResult<DailyCheckin> {
    let doc_id = DailyCheckin::document_id(user_id, checkin_date);
    let mut transaction = client.begin_transaction().await?;

    // Reads bound to the transaction register the document for conflict detection
    let existing: Option<DailyCheckin> = client
        .clone_with_consistency_selector(FirestoreConsistencySelector::Transaction(
            transaction.transaction_id().clone(),
        ))
        .fluent()
        .select()
        .by_id_in(collections::DAILY_CHECKINS)
        .obj()
        .one(&doc_id)
        .await?;

    let row = DailyCheckin::upserted(existing.as_ref(), user_id, checkin_date, input, now);

    client
        .fluent()
        .update()
        .in_col(collections::DAILY_CHECKINS)
        .document_id(&doc_id)
        .object(&row)
        .add_to_transaction(&mut transaction)?;

    transaction.commit().await?;
    Ok(row)
}
