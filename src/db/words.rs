//! Store operations for word and progress rows.
//!
//! A word and its progress row are inserted in one transaction so the
//! one-progress-per-word invariant survives a failure between the two
//! inserts. Words are immutable after creation; no update or delete path
//! exists.

use chrono::{NaiveDateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Review state of a word. Only `New` is written today; `Learning` and
/// `Mastered` are anticipated by the schema but unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    New,
    Learning,
    Mastered,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::New => "new",
            ProgressStatus::Learning => "learning",
            ProgressStatus::Mastered => "mastered",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(ProgressStatus::New),
            "learning" => Some(ProgressStatus::Learning),
            "mastered" => Some(ProgressStatus::Mastered),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WordRow {
    pub id: i64,
    pub word: String,
    pub context_sentence: Option<String>,
    pub meaning: Option<String>,
    pub phonetic_us: Option<String>,
    pub phonetic_uk: Option<String>,
    pub image_url: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct ProgressRow {
    pub id: i64,
    pub word_id: i64,
    pub status: String,
    pub last_reviewed: Option<NaiveDateTime>,
    pub next_review: Option<NaiveDateTime>,
}

/// Mutable fields of a word at creation time. `word` is expected to be
/// trimmed and non-empty by the caller; the schema CHECK backstops that.
#[derive(Debug, Clone, Default)]
pub struct NewWord {
    pub word: String,
    pub context_sentence: Option<String>,
    pub meaning: Option<String>,
    pub phonetic_us: Option<String>,
    pub phonetic_uk: Option<String>,
    pub image_url: Option<String>,
}

/// Inserts a word and its initial progress row atomically. Returns the new
/// word id and the creation instant (shared by `created_at` and
/// `next_review`).
pub async fn create_word(
    pool: &SqlitePool,
    new_word: &NewWord,
) -> Result<(i64, NaiveDateTime), sqlx::Error> {
    let now = Utc::now().naive_utc();

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO "words"
          ("word","context_sentence","meaning","phonetic_us","phonetic_uk","image_url","created_at")
        VALUES ($1,$2,$3,$4,$5,$6,$7)
        "#,
    )
    .bind(&new_word.word)
    .bind(&new_word.context_sentence)
    .bind(&new_word.meaning)
    .bind(&new_word.phonetic_us)
    .bind(&new_word.phonetic_uk)
    .bind(&new_word.image_url)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let word_id = result.last_insert_rowid();

    sqlx::query(
        r#"
        INSERT INTO "progress" ("word_id","status","last_reviewed","next_review")
        VALUES ($1,$2,NULL,$3)
        "#,
    )
    .bind(word_id)
    .bind(ProgressStatus::New.as_str())
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((word_id, now))
}

/// All words, newest first. Ties on `created_at` break on id so a word
/// created later always sorts before earlier ones.
pub async fn list_words(pool: &SqlitePool) -> Result<Vec<WordRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT
          "id",
          "word",
          "context_sentence",
          "meaning",
          "phonetic_us",
          "phonetic_uk",
          "image_url",
          "created_at"
        FROM "words"
        ORDER BY "created_at" DESC, "id" DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_word_row).collect()
}

pub async fn count_words(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM "words""#)
        .fetch_one(pool)
        .await
}

pub async fn get_progress(
    pool: &SqlitePool,
    word_id: i64,
) -> Result<Option<ProgressRow>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "id", "word_id", "status", "last_reviewed", "next_review"
        FROM "progress"
        WHERE "word_id" = $1
        LIMIT 1
        "#,
    )
    .bind(word_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(ProgressRow {
        id: row.try_get("id")?,
        word_id: row.try_get("word_id")?,
        status: row.try_get("status")?,
        last_reviewed: row.try_get("last_reviewed")?,
        next_review: row.try_get("next_review")?,
    }))
}

pub async fn count_progress_for_word(
    pool: &SqlitePool,
    word_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM "progress" WHERE "word_id" = $1"#)
        .bind(word_id)
        .fetch_one(pool)
        .await
}

fn map_word_row(row: &SqliteRow) -> Result<WordRow, sqlx::Error> {
    Ok(WordRow {
        id: row.try_get("id")?,
        word: row.try_get("word")?,
        context_sentence: row.try_get("context_sentence")?,
        meaning: row.try_get("meaning")?,
        phonetic_us: row.try_get("phonetic_us")?,
        phonetic_uk: row.try_get("phonetic_uk")?,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::ProgressStatus;

    #[test]
    fn status_round_trip() {
        for status in [
            ProgressStatus::New,
            ProgressStatus::Learning,
            ProgressStatus::Mastered,
        ] {
            assert_eq!(ProgressStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProgressStatus::parse("reviewing"), None);
    }
}
