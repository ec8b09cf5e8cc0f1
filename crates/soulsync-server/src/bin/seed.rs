//! Resets the database and fills it with sample data. Development only.

use tracing::error;

use soulsync_db::{Database, seed};
use soulsync_server::config;

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soulsync_db=info".into()),
        )
        .init();

    let url = config::database_url();
    println!("Initializing SoulSync database at {}...", url);

    let db = Database::connect(&url)?;

    match seed::run(&db) {
        Ok(report) => {
            println!("✅ Database initialization completed successfully!");
            println!(
                "Inserted {} users, {} mood entries, {} posts, {} achievements, {} support groups.",
                report.users_created.len(),
                report.mood_entries,
                report.posts,
                report.achievements,
                report.support_groups
            );
            println!("\nSample login credentials:");
            for cred in &report.credentials {
                println!("Email: {} | Password: {}", cred.email, cred.password);
            }
            Ok(())
        }
        Err(e) => {
            error!("Seed failed: {}", e);
            eprintln!("❌ Error during database initialization: {e}");
            eprintln!("All changes were rolled back.");
            Err(e.into())
        }
    }
}
