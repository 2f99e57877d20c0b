//! Embedded SQLite schema for the word store.
//!
//! Two domain tables: `words` (one row per captured vocabulary item) and
//! `progress` (exactly one review-state row per word). Surface text must be
//! non-empty at the schema level so the constraint holds even for callers
//! that bypass route validation.

pub const SCHEMA_VERSION: &str = "1.0.0";

pub const SCHEMA_SQL: &str = r#"
-- metadata table gating migrations
CREATE TABLE IF NOT EXISTS "_db_metadata" (
    "key" TEXT PRIMARY KEY,
    "value" TEXT NOT NULL
);

-- captured vocabulary items
CREATE TABLE IF NOT EXISTS "words" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "word" TEXT NOT NULL CHECK (length(trim("word")) > 0),
    "context_sentence" TEXT,
    "meaning" TEXT,
    "phonetic_us" TEXT,
    "phonetic_uk" TEXT,
    "image_url" TEXT,
    "created_at" TEXT NOT NULL
);

-- per-word review state, created in the same transaction as the word
CREATE TABLE IF NOT EXISTS "progress" (
    "id" INTEGER PRIMARY KEY AUTOINCREMENT,
    "word_id" INTEGER NOT NULL,
    "status" TEXT NOT NULL DEFAULT 'new',
    "last_reviewed" TEXT,
    "next_review" TEXT,
    FOREIGN KEY ("word_id") REFERENCES "words" ("id")
);

CREATE INDEX IF NOT EXISTS "idx_words_created_at" ON "words" ("created_at");

CREATE INDEX IF NOT EXISTS "idx_progress_word_id" ON "progress" ("word_id");
"#;

/// Splits a SQL blob into executable statements, respecting string literals
/// and quoted identifiers.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut prev = '\0';

    for ch in sql.chars() {
        match ch {
            '\'' if !in_double_quote && prev != '\\' => {
                in_single_quote = !in_single_quote;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
            }
            ';' if !in_single_quote && !in_double_quote => {
                let stmt = current.trim();
                if !stmt.is_empty() {
                    statements.push(stmt.to_string());
                }
                current.clear();
                prev = ch;
                continue;
            }
            _ => {}
        }

        current.push(ch);
        prev = ch;
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

/// Strips leading `--` comment lines from a single statement.
pub fn strip_sql_comments(stmt: &str) -> String {
    stmt.lines()
        .filter(|line| !line.trim().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn splits_schema_into_statements() {
        let statements = split_sql_statements(SCHEMA_SQL);
        assert_eq!(statements.len(), 5);
        assert!(statements[0].contains("_db_metadata"));
        assert!(statements[1].contains(r#""words""#));
        assert!(statements[2].contains(r#""progress""#));
    }

    #[test]
    fn semicolon_inside_string_literal_does_not_split() {
        let statements =
            split_sql_statements(r#"INSERT INTO "t" ("v") VALUES ('a;b'); SELECT 1"#);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("a;b"));
    }

    #[test]
    fn strips_comment_lines_only() {
        let stmt = "-- comment\nSELECT 1\n-- trailing\n";
        assert_eq!(strip_sql_comments(stmt), "SELECT 1");
    }

    proptest! {
        #[test]
        fn rejoined_statements_preserve_sql_content(
            parts in proptest::collection::vec("[a-zA-Z0-9_ ]{1,20}", 1..8)
        ) {
            let sql = parts.join(";\n");
            let statements = split_sql_statements(&sql);
            prop_assert!(statements.len() <= parts.len());
            for stmt in &statements {
                prop_assert!(!stmt.trim().is_empty());
                prop_assert!(!stmt.contains(';'));
            }
        }
    }
}
