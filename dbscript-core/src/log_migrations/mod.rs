//! Event log database migrations - embedded SQL files
//!
//! Each migration is a tuple of (name, sql_content), applied in order and
//! recorded in sys_migrations.

/// All event log migrations, embedded at compile time.
///
/// When adding a migration, create `NNN_description.sql` and append it here.
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];
