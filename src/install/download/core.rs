//! HTTP file download

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use crate::error::{InstallerError, Result};
use crate::logging::Logger;

const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Download `url` into `destination`, following redirects
///
/// `timeout` bounds the whole transfer. Non-success HTTP statuses are errors.
pub fn download_file(
    url: &str,
    destination: &Path,
    logger: &Logger,
    timeout: Duration,
) -> Result<()> {
    logger.info(format!("Downloading {url} to {}", destination.display()));

    let failed = |reason: String| InstallerError::Download {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .connect_timeout(DOWNLOAD_CONNECT_TIMEOUT)
        .timeout(timeout)
        .user_agent(concat!("get-cloudify/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(|e| failed(e.to_string()))?;

    if response.url().as_str().trim_end_matches('/') != url.trim_end_matches('/') {
        logger.debug(format!("Redirected to {}", response.url()));
    }

    let mut file = File::create(destination)?;
    response
        .copy_to(&mut file)
        .map_err(|e| failed(e.to_string()))?;
    Ok(())
}
