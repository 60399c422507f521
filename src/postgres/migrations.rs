use sqlx::PgPool;

/// Creates the `submissions` table and its indexes.
///
/// # Example
///
/// ```rust,ignore
/// use makerspace_admin::postgres::migrations;
///
/// async fn setup(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
///     migrations::run(pool).await
/// }
/// ```
pub async fn run(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
