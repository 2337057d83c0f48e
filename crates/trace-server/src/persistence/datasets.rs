//! Dataset persistence operations.

use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use trace_core::Dataset;

/// Upsert a dataset under its name. The serialized triple is written
/// in one statement, so a dataset is stored either completely or not
/// at all.
pub async fn save_dataset(pool: &SqlitePool, name: &str, dataset: &Dataset) -> Result<()> {
    let data = serde_json::to_string(dataset)?;
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO datasets (name, data, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?3)
        ON CONFLICT(name) DO UPDATE SET
            data = ?2, updated_at = ?3
        "#,
    )
    .bind(name)
    .bind(&data)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a dataset by name.
pub async fn load_dataset(pool: &SqlitePool, name: &str) -> Result<Option<Dataset>> {
    let row: Option<(String,)> = sqlx::query_as("SELECT data FROM datasets WHERE name = ?1")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    match row {
        Some((data,)) => Ok(Some(serde_json::from_str(&data)?)),
        None => Ok(None),
    }
}

/// Delete a dataset by name. Returns false when nothing was stored
/// under it.
pub async fn delete_dataset(pool: &SqlitePool, name: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM datasets WHERE name = ?1")
        .bind(name)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// List all stored dataset names.
pub async fn list_datasets(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM datasets ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}
