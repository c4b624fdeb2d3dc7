use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::{DateCardError, Result};
use crate::models::{Match, MatchStatus};

#[derive(Debug, FromRow)]
struct MatchRow {
    id: String,
    participants: Vec<String>,
    status: String,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MatchRow> for Match {
    type Error = DateCardError;

    fn try_from(row: MatchRow) -> Result<Self> {
        let malformed = |what: String| {
            DateCardError::StoreUnavailable(format!("malformed match row {}: {}", row.id, what))
        };

        let participants = <[String; 2]>::try_from(row.participants)
            .map_err(|p| malformed(format!("expected 2 participants, found {}", p.len())))?;

        Ok(Match {
            participants,
            status: row.status.parse().map_err(malformed)?,
            created_by: row.created_by.parse().map_err(malformed)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            id: row.id,
        })
    }
}

const MATCH_COLUMNS: &str = "id, participants, status, created_by, created_at, updated_at";

/// Inserts the match if its id is free, then returns whatever is stored under that id.
pub async fn insert_match(pool: &PgPool, record: &Match) -> Result<(Match, bool)> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO matches (id, participants, status, created_by, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(&record.id)
    .bind(record.participants.to_vec())
    .bind(record.status.as_str())
    .bind(record.created_by.as_str())
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?
    .rows_affected()
        > 0;

    let stored = get_match(pool, &record.id)
        .await?
        .ok_or_else(|| DateCardError::MatchNotFound(record.id.clone()))?;

    Ok((stored, inserted))
}

pub async fn get_match(pool: &PgPool, id: &str) -> Result<Option<Match>> {
    let row = sqlx::query_as::<_, MatchRow>(&format!(
        "SELECT {} FROM matches WHERE id = $1",
        MATCH_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Match::try_from).transpose()
}

pub async fn set_match_status(
    pool: &PgPool,
    id: &str,
    status: MatchStatus,
    now: DateTime<Utc>,
) -> Result<Match> {
    let row = sqlx::query_as::<_, MatchRow>(&format!(
        "UPDATE matches SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
        MATCH_COLUMNS
    ))
    .bind(id)
    .bind(status.as_str())
    .bind(now)
    .fetch_optional(pool)
    .await?;

    row.map(Match::try_from)
        .transpose()?
        .ok_or_else(|| DateCardError::MatchNotFound(id.to_string()))
}

pub async fn list_matches_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<Match>> {
    let rows = sqlx::query_as::<_, MatchRow>(&format!(
        "SELECT {} FROM matches WHERE participants @> ARRAY[$1]::TEXT[] ORDER BY created_at DESC",
        MATCH_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Match::try_from).collect()
}
