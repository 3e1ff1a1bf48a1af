use anyhow::Result;
use validiz::{AsyncClient, PollOptions, PollOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    // Example program that calls the async API.
    // Configure authentication via env vars or a `.validizrc` file.
    let client = AsyncClient::from_env()?;

    // Two batches polled concurrently on one runtime; the polls interleave
    // while they wait.
    let first = client.upload_file("emails.csv").await?;
    let second = client.upload_file("more_emails.csv").await?;
    println!("Uploaded jobs {} and {}", first.file_id, second.file_id);

    let options = PollOptions::new().with_interval(5).with_max_attempts(60);
    let (a, b) = tokio::join!(
        client.poll_file_until_complete(&first.file_id, &options),
        client.poll_file_until_complete(&second.file_id, &options),
    );

    for outcome in [a?, b?] {
        match outcome {
            PollOutcome::Table(table) => println!("Validated {} addresses", table.len()),
            PollOutcome::Saved(path) => println!("Results saved to {}", path.display()),
            PollOutcome::Content(bytes) => println!("Received {} result bytes", bytes.len()),
        }
    }

    client.close();
    Ok(())
}
