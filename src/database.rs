use crate::config::DatabaseConfig;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database pool ready"
    );

    Ok(pool)
}

/// Brings the patients/doctors/appointments schema up to date.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    tracing::info!(migrations = MIGRATOR.iter().count(), "Database schema is current");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a PostgreSQL server"]
    async fn test_database_connection(pool: PgPool) {
        let result = sqlx::query("SELECT 1 as test").fetch_one(&pool).await;

        assert!(result.is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a PostgreSQL server"]
    async fn test_only_real_doctor_emails_are_unique(pool: PgPool) {
        let insert = "INSERT INTO doctors (first_name, last_name, email) VALUES ($1, $2, $3)";

        for name in ["Chase", "Foreman"] {
            sqlx::query(insert)
                .bind("Robert")
                .bind(name)
                .bind("")
                .execute(&pool)
                .await
                .expect("empty emails may repeat");
        }

        sqlx::query(insert)
            .bind("James")
            .bind("Wilson")
            .bind("wilson@clinic.test")
            .execute(&pool)
            .await
            .unwrap();
        let err = sqlx::query(insert)
            .bind("Jim")
            .bind("Wilson")
            .bind("wilson@clinic.test")
            .execute(&pool)
            .await
            .unwrap_err();

        assert!(err.as_database_error().unwrap().is_unique_violation());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL pointing at a PostgreSQL server"]
    async fn test_appointments_reference_existing_rows(pool: PgPool) {
        let err = sqlx::query("INSERT INTO appointments (patient_id, doctor_id) VALUES ($1, $2)")
            .bind(41_i64)
            .bind(42_i64)
            .execute(&pool)
            .await
            .unwrap_err();

        assert!(err.as_database_error().unwrap().is_foreign_key_violation());
    }
}
