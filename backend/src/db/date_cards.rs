use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool, types::Json};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{DateCardError, Result};
use crate::models::{AppealRequest, DateCard, DateCardPatch, ParticipantResponse};

#[derive(Debug, FromRow)]
struct DateCardRow {
    id: Uuid,
    match_id: String,
    participants: Vec<String>,
    scheduled_time: DateTime<Utc>,
    time_zone: String,
    location: String,
    description: String,
    special_instructions: Option<String>,
    responses: Json<BTreeMap<String, ParticipantResponse>>,
    status: String,
    confirmed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    reveal_at: DateTime<Utc>,
    is_revealed: bool,
    appeal_request: Option<Json<AppealRequest>>,
    previous_card_id: Option<Uuid>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DateCardRow> for DateCard {
    type Error = DateCardError;

    fn try_from(row: DateCardRow) -> Result<Self> {
        let id = row.id;
        let malformed = |what: String| {
            DateCardError::StoreUnavailable(format!("malformed date card row {}: {}", id, what))
        };

        let participants = <[String; 2]>::try_from(row.participants)
            .map_err(|p| malformed(format!("expected 2 participants, found {}", p.len())))?;

        Ok(DateCard {
            id,
            match_id: row.match_id,
            participants,
            scheduled_time: row.scheduled_time,
            time_zone: row.time_zone,
            location: row.location,
            description: row.description,
            special_instructions: row.special_instructions,
            responses: row.responses.0,
            status: row.status.parse().map_err(malformed)?,
            confirmed_at: row.confirmed_at,
            cancelled_at: row.cancelled_at,
            reveal_at: row.reveal_at,
            is_revealed: row.is_revealed,
            appeal_request: row.appeal_request.map(|a| a.0),
            previous_card_id: row.previous_card_id,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const DATE_CARD_COLUMNS: &str = "id, match_id, participants, scheduled_time, time_zone, location, \
     description, special_instructions, responses, status, confirmed_at, cancelled_at, reveal_at, \
     is_revealed, appeal_request, previous_card_id, version, created_at, updated_at";

fn into_cards(rows: Vec<DateCardRow>) -> Result<Vec<DateCard>> {
    rows.into_iter().map(DateCard::try_from).collect()
}

pub async fn insert_date_card<'e>(executor: impl PgExecutor<'e>, card: &DateCard) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO date_cards (
            id, match_id, participants, scheduled_time, time_zone, location, description,
            special_instructions, responses, status, confirmed_at, cancelled_at, reveal_at,
            is_revealed, appeal_request, previous_card_id, version, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        "#,
    )
    .bind(card.id)
    .bind(&card.match_id)
    .bind(card.participants.to_vec())
    .bind(card.scheduled_time)
    .bind(&card.time_zone)
    .bind(&card.location)
    .bind(&card.description)
    .bind(&card.special_instructions)
    .bind(Json(&card.responses))
    .bind(card.status.as_str())
    .bind(card.confirmed_at)
    .bind(card.cancelled_at)
    .bind(card.reveal_at)
    .bind(card.is_revealed)
    .bind(card.appeal_request.as_ref().map(Json))
    .bind(card.previous_card_id)
    .bind(card.version)
    .bind(card.created_at)
    .bind(card.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn get_date_card(pool: &PgPool, id: Uuid) -> Result<Option<DateCard>> {
    let row = sqlx::query_as::<_, DateCardRow>(&format!(
        "SELECT {} FROM date_cards WHERE id = $1",
        DATE_CARD_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(DateCard::try_from).transpose()
}

/// Uses the GIN index on `participants`; no result cap is applied.
pub async fn list_date_cards_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<DateCard>> {
    let rows = sqlx::query_as::<_, DateCardRow>(&format!(
        "SELECT {} FROM date_cards WHERE participants @> ARRAY[$1]::TEXT[] \
         ORDER BY scheduled_time ASC, created_at ASC",
        DATE_CARD_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    into_cards(rows)
}

/// Single-statement field-level update guarded by the card's version.
pub async fn update_date_card(
    pool: &PgPool,
    id: Uuid,
    patch: &DateCardPatch,
    expected_version: Option<i64>,
    now: DateTime<Utc>,
) -> Result<DateCard> {
    let row = sqlx::query_as::<_, DateCardRow>(&format!(
        r#"
        UPDATE date_cards SET
            responses = COALESCE($3, responses),
            status = COALESCE($4, status),
            confirmed_at = COALESCE($5, confirmed_at),
            cancelled_at = COALESCE($6, cancelled_at),
            is_revealed = COALESCE($7, is_revealed),
            appeal_request = COALESCE($8, appeal_request),
            version = version + 1,
            updated_at = $9
        WHERE id = $1 AND ($2::BIGINT IS NULL OR version = $2)
        RETURNING {}
        "#,
        DATE_CARD_COLUMNS
    ))
    .bind(id)
    .bind(expected_version)
    .bind(patch.responses.as_ref().map(Json))
    .bind(patch.status.map(|s| s.as_str()))
    .bind(patch.confirmed_at)
    .bind(patch.cancelled_at)
    .bind(patch.is_revealed)
    .bind(patch.appeal_request.as_ref().map(Json))
    .bind(now)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => DateCard::try_from(row),
        None => {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM date_cards WHERE id = $1)",
            )
            .bind(id)
            .fetch_one(pool)
            .await?;

            if exists {
                Err(DateCardError::Conflict(id.to_string()))
            } else {
                Err(DateCardError::NotFound(format!("Date card {}", id)))
            }
        }
    }
}

pub async fn list_reveal_due(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<DateCard>> {
    let rows = sqlx::query_as::<_, DateCardRow>(&format!(
        "SELECT {} FROM date_cards \
         WHERE status = 'confirmed' AND is_revealed = FALSE AND reveal_at <= $1 \
         ORDER BY reveal_at ASC",
        DATE_CARD_COLUMNS
    ))
    .bind(now)
    .fetch_all(pool)
    .await?;

    into_cards(rows)
}

pub async fn list_scheduled_before(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
    user_id: Option<&str>,
) -> Result<Vec<DateCard>> {
    let rows = sqlx::query_as::<_, DateCardRow>(&format!(
        "SELECT {} FROM date_cards \
         WHERE scheduled_time < $1 AND ($2::TEXT IS NULL OR participants @> ARRAY[$2]::TEXT[]) \
         ORDER BY scheduled_time ASC",
        DATE_CARD_COLUMNS
    ))
    .bind(cutoff)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    into_cards(rows)
}

pub async fn delete_date_card(pool: &PgPool, id: Uuid, expected_version: Option<i64>) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM date_cards
        WHERE id = $1 AND ($2::BIGINT IS NULL OR version = $2)
        "#,
    )
    .bind(id)
    .bind(expected_version)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Deletes the superseded card and inserts its replacement in one transaction.
pub async fn replace_date_card(
    pool: &PgPool,
    previous_id: Uuid,
    expected_version: i64,
    replacement: &DateCard,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM date_cards WHERE id = $1 AND version = $2")
        .bind(previous_id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM date_cards WHERE id = $1)",
        )
        .bind(previous_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.rollback().await?;

        return Err(if exists {
            DateCardError::Conflict(previous_id.to_string())
        } else {
            DateCardError::NotFound(format!("Date card {}", previous_id))
        });
    }

    insert_date_card(&mut *tx, replacement).await?;
    tx.commit().await?;
    Ok(())
}
