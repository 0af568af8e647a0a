// todo_api/src/db.rs
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use once_cell::sync::Lazy;
use rocket::fairing::AdHoc;
use std::env;

// an R2D2 connection pool
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConn = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

// DATABASE_URL static variable using once_cell
static DATABASE_URL: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

/// Initialize the database pool.
pub fn init_pool() -> PgPool {
    let manager = ConnectionManager::<PgConnection>::new(DATABASE_URL.as_str());
    r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create database pool")
}

// Fairing for attaching the pool to Rocket's managed state. Pending
// migrations run here, before the first request is served.
pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Diesel PostgreSQL Pool", |rocket| async {
        let pool = init_pool();
        {
            let mut conn = pool
                .get()
                .expect("Failed to get DB connection for migrations");
            conn.run_pending_migrations(MIGRATIONS)
                .expect("Failed to run database migrations");
        }
        rocket.manage(pool)
    })
}
