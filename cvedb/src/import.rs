use std::{
    borrow::Cow,
    fs,
    io::{self, BufRead, Write},
    path::Path,
};

use anyhow::{Context, Result};
use domain_db::{
    cve_sources::nist,
    db::{models::ImportReport, SqliteRepository},
};

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Imported(ImportReport),
    /// The store already existed and overwriting it was refused.
    Kept,
}

/// Rebuilds the store at `database_path` from the feed at `feed_path`.
///
/// An existing store is only replaced when `force` is set or `confirm`
/// accepts it. The feed is read before anything is deleted.
pub fn run<F>(feed_path: &Path, database_path: &Path, force: bool, confirm: F) -> Result<Outcome>
where
    F: FnOnce(&Path) -> Result<bool>,
{
    let exists = database_path.exists();

    if exists && !force && !confirm(database_path)? {
        log::info!("keeping {}", database_path.display());
        return Ok(Outcome::Kept);
    }

    let cve_list = nist::read_cves_from_path(feed_path)?;

    if exists {
        log::info!("removing {}", database_path.display());
        fs::remove_file(database_path)
            .with_context(|| format!("could not remove {}", database_path.display()))?;
    }

    let repository = {
        let path = database_path
            .to_str()
            .with_context(|| format!("{} is not a valid path", database_path.display()))?;
        SqliteRepository::new(path).context("Cannot open database")?
    };
    repository.setup_database()?;

    let report = repository.import(&cve_list)?;

    Ok(Outcome::Imported(report))
}

/// Asks on the terminal whether an existing store may be overwritten.
pub fn confirm_on_stdin(database_path: &Path) -> Result<bool> {
    let mut stdout = io::stdout();
    write!(
        stdout,
        "{} already exists, should I overwrite? y/N ",
        database_path.display()
    )?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;

    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y")
}

pub fn report_message(report: &ImportReport) -> Cow<'static, str> {
    if report.cves == 0 {
        Cow::Borrowed("No new records created")
    } else {
        Cow::Owned(format!(
            "{} CVE and {} CPE records created",
            report.cves, report.cpes
        ))
    }
}
