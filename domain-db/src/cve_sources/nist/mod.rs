use std::{
    fs::{self, File},
    io::{BufReader, Read},
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::Value;

use crate::cve_sources::download_to_file;

pub mod cve;

pub const VERSION: &str = "1.1";

#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("could not open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse feed from {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected an array of entries or an object with CVE_Items in {}", .path.display())]
    Shape { path: PathBuf },
    #[error("malformed feed entry #{index}")]
    Entry {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Downloads the yearly NVD feed into `data_path`, keeping it gzipped.
///
/// An already downloaded file is reused unless `refresh` is set.
pub fn download(year: u16, data_path: &Path, refresh: bool) -> Result<PathBuf> {
    let mut gzip_file_name = data_path.to_path_buf();
    gzip_file_name.push(format!("nvdcve-{}-{}.json.gz", VERSION, year));

    if refresh && gzip_file_name.exists() {
        log::info!("removing {}", gzip_file_name.display());
        fs::remove_file(&gzip_file_name)
            .with_context(|| format!("could not remove {}", gzip_file_name.display()))?;
    }

    if gzip_file_name.exists() {
        log::info!("found {}", gzip_file_name.display());
        return Ok(gzip_file_name);
    }

    let url = format!(
        "https://nvd.nist.gov/feeds/json/cve/{}/nvdcve-{}-{}.json.gz",
        VERSION, VERSION, year
    );

    if let Err(err) = download_to_file(&url, &gzip_file_name) {
        // a partial archive would be reused by the next run
        let _ = fs::remove_file(&gzip_file_name);
        return Err(err);
    }

    Ok(gzip_file_name)
}

/// Reads every entry of a feed document. Files ending in `.gz` are decompressed on the fly.
pub fn read_cves_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<cve::CVE>, FeedError> {
    let path = path.as_ref();

    let file = File::open(path).map_err(|source| FeedError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let start = Instant::now();
    let cves = read_cves(BufReader::new(reader), path)?;

    log::info!(
        "loaded {} CVEs from {} in {:?}",
        cves.len(),
        path.display(),
        start.elapsed()
    );

    Ok(cves)
}

fn read_cves<R: Read>(reader: R, path: &Path) -> Result<Vec<cve::CVE>, FeedError> {
    let document: Value = serde_json::from_reader(reader).map_err(|source| FeedError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let items = match document {
        Value::Array(items) => items,
        Value::Object(_) => {
            serde_json::from_value::<CVEContainer>(document)
                .map_err(|source| FeedError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
                .CVE_Items
        }
        _ => {
            return Err(FeedError::Shape {
                path: path.to_path_buf(),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|source| FeedError::Entry { index, source })
        })
        .collect()
}

/// The NVD 1.1 yearly feed wrapper. Entries are kept raw so that a malformed
/// one can be reported by position.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct CVEContainer {
    CVE_Items: Vec<Value>,
}
