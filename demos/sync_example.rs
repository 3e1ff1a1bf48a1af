use anyhow::Result;
use validiz::{Client, PollOptions, PollOutcome};

fn main() -> Result<()> {
    // Example program that calls the blocking API.
    // Configure authentication via env vars or a `.validizrc` file.
    let client = Client::from_env()?;

    // Ad-hoc validation of a couple of addresses.
    let results = client.validate_email(["valid@example.com", "invalid@example.com"])?;
    for outcome in &results {
        println!(
            "{}: valid={} status={}",
            outcome.email,
            outcome.is_valid,
            outcome.status.as_deref().unwrap_or("-"),
        );
    }

    // Batch validation: upload a file, poll until done, print the table.
    let upload = client.upload_file("emails.csv")?;
    println!("Uploaded, job id: {}", upload.file_id);

    let outcome = client.poll_file_until_complete(
        &upload.file_id,
        &PollOptions::new().with_interval(5).with_max_attempts(60),
    )?;

    match outcome {
        PollOutcome::Table(table) => {
            println!("Validated {} addresses:", table.len());
            for row in table.rows() {
                println!("  {}", row.join(", "));
            }
        }
        PollOutcome::Saved(path) => println!("Results saved to {}", path.display()),
        PollOutcome::Content(bytes) => println!("Received {} result bytes", bytes.len()),
    }

    Ok(())
}
