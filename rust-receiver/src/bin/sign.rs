//! Squarehook Sign - compute a notification signature.
//!
//! Reads a notification body from stdin and prints the `X-Square-Signature`
//! value Square would send for it, using `WEBHOOK_SIGNATURE_KEY`,
//! `WEBHOOK_URL` and `WEBHOOK_SIGNATURE_ALGORITHM` from the environment:
//!
//! ```text
//! squarehook-sign < body.json
//! ```

use std::io::{self, Read};

use anyhow::{anyhow, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use squarehook::config::signer_from_env;

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the signature
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(io::stderr))
        .init();

    let signer = signer_from_env().context("Failed to load signing configuration")?;

    let mut body = Vec::new();
    io::stdin()
        .read_to_end(&mut body)
        .context("Failed to read body from stdin")?;

    let signature = signer
        .sign(&body)
        .ok_or_else(|| anyhow!("WEBHOOK_SIGNATURE_KEY is empty"))?;

    info!(
        algorithm = %signer.algorithm(),
        body_length = body.len(),
        "signature_computed"
    );

    println!("{}", signature);

    Ok(())
}
