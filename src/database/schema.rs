use sqlx::PgPool;

use super::manager::DatabaseError;

/// Tenant database tables, applied idempotently on first use
const TENANT_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS businesses (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS trades (
        id              TEXT PRIMARY KEY,
        trade_date      DATE NOT NULL,
        profit_or_loss  BIGINT NOT NULL,
        business_id     TEXT NULL REFERENCES businesses(id),
        created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS trades_business_id_idx ON trades (business_id)",
];

pub async fn install(pool: &PgPool) -> Result<(), DatabaseError> {
    for statement in TENANT_SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
