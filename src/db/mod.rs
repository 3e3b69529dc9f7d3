pub mod models;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use models::UserState;

#[derive(Debug, Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        // Postgres doesn't allow multiple commands in a single prepared statement.

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY,
                username TEXT,
                access BOOLEAN NOT NULL DEFAULT TRUE,
                admin BOOLEAN NOT NULL DEFAULT FALSE,
                state TEXT NOT NULL DEFAULT 'main',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS readings (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id BIGINT NOT NULL REFERENCES users(id),
                cards TEXT[] NOT NULL,
                request TEXT NOT NULL,
                response TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_readings_user ON readings(user_id, created_at DESC)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ── User Operations ────────────────────────────────────────────

    pub async fn get_or_create_user(
        &self,
        user_id: i64,
        username: Option<&str>,
    ) -> anyhow::Result<models::User> {
        let user = sqlx::query_as::<_, models::User>(
            r#"
            INSERT INTO users (id, username)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET username = COALESCE($2, users.username)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_state(&self, user_id: i64, state: UserState) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET state = $2 WHERE id = $1")
            .bind(user_id)
            .bind(state.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ── Reading Operations ─────────────────────────────────────────

    pub async fn save_reading(
        &self,
        user_id: i64,
        cards: &[String],
        request: &str,
        response: &str,
    ) -> anyhow::Result<models::Reading> {
        let reading = sqlx::query_as::<_, models::Reading>(
            r#"
            INSERT INTO readings (user_id, cards, request, response)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(cards)
        .bind(request)
        .bind(response)
        .fetch_one(&self.pool)
        .await?;
        Ok(reading)
    }
}
