use std::{fs::File, path::Path, time::Duration};

use anyhow::{Context, Result};

pub mod nist;

pub(crate) fn download_to_file(url: &str, file_name: &Path) -> Result<()> {
    log::info!("downloading {} to {} ...", url, file_name.display());

    let client = reqwest::blocking::Client::builder()
        .timeout(Some(Duration::from_secs(300)))
        .build()
        .context("could not create http client")?;

    let mut res = client
        .get(url)
        .send()
        .and_then(|res| res.error_for_status())
        .with_context(|| format!("error downloading {}", url))?;

    let mut file = File::create(file_name)
        .with_context(|| format!("could not create {}", file_name.display()))?;

    res.copy_to(&mut file)
        .with_context(|| format!("could not download {}", file_name.display()))?;

    Ok(())
}
