use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::sync::{Arc, Mutex};

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use bytebank::{
    AuthQueries, LocalBackend, TransactionQueries, initialize_db,
    models::{NewTransaction, SignUpCredentials, TransactionType},
};

/// A utility for creating a test database for the local backend of the bytebank API server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The email of the demo user.
    #[arg(long, default_value = "test@example.com")]
    email: String,

    /// The password of the demo user.
    #[arg(long, default_value = "correct horse battery staple")]
    password: String,
}

/// Create and populate a database for manual testing.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let backend = LocalBackend::new(Arc::new(Mutex::new(conn)));

    println!("Creating test user {}...", args.email);

    let outcome = backend
        .sign_up(&SignUpCredentials {
            name: "Test User".to_owned(),
            email: args.email,
            password: args.password,
        })
        .await?;
    let session = outcome
        .session
        .ok_or("the local backend did not sign the test user in")?;

    println!("Creating sample transactions...");

    let today = OffsetDateTime::now_utc().date();
    let samples = [
        (TransactionType::Credit, "Salary", 5200.0, 45),
        (TransactionType::Debit, "Rent", 1800.0, 40),
        (TransactionType::Debit, "Groceries", 412.35, 33),
        (TransactionType::Credit, "Salary", 5200.0, 15),
        (TransactionType::Debit, "Rent", 1800.0, 10),
        (TransactionType::Debit, "Coffee", 12.5, 2),
        (TransactionType::Credit, "Refund", 89.9, 1),
    ];

    for (kind, description, value, days_ago) in samples {
        backend
            .create(
                &session.access_token,
                NewTransaction {
                    kind,
                    description: description.to_owned(),
                    value,
                    date: today - Duration::days(days_ago),
                },
            )
            .await?;
    }

    println!("Success!");

    Ok(())
}
