use std::collections::HashSet;
use std::ops::DerefMut;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sqlite::SqliteConnection;
use diesel::{insert_into, insert_or_ignore_into};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub mod models;
pub mod schema;

use crate::cve_sources::nist;
use models::{Cpe, Cve, CveDetail, ImportReport, Link};
use schema::{cpe_table, cve_table, link};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

type Pool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

#[derive(thiserror::Error, Debug)]
#[error("Database error.")]
pub struct DatabaseError {
    #[from]
    source: r2d2::PoolError,
}

#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(r2d2::Error::QueryError)
    }
}

pub struct SqliteRepository {
    pool: Pool,
}

impl SqliteRepository {
    /// Opens (and creates if missing) the SQLite store at `database_path`.
    pub fn new(database_path: &str) -> Result<Self, DatabaseError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_path);
        let pool = r2d2::Pool::builder()
            .connection_customizer(Box::new(ConnectionOptions))
            .build(manager)?;
        Ok(Self { pool })
    }
}

impl SqliteRepository {
    /// Creates the tables if absent. Returns the number of applied migrations.
    pub fn setup_database(&self) -> Result<usize> {
        let mut conn = self.pool.get()?;
        let applied = conn
            .deref_mut()
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!(e))
            .context("database setup failed")?;
        Ok(applied.len())
    }

    /// Ingests a whole feed in a single transaction, committed once at the end.
    ///
    /// Any failing entry rolls back every record of the batch.
    pub fn import(&self, cve_list: &[nist::cve::CVE]) -> Result<ImportReport> {
        log::info!("connected to database, importing records ...");

        let mut conn = self.pool.get()?;
        let start = Instant::now();

        let report = conn.deref_mut().transaction::<_, anyhow::Error, _>(|conn| {
            let mut report = ImportReport::default();

            for (index, item) in cve_list.iter().enumerate() {
                let added = add(conn, item)?;

                report.cves += 1;
                report.cpes += added.cpes;
                report.links += added.links;

                if (index + 1) % 100 == 0 {
                    log::info!("{} / {} entries processed ...", index + 1, cve_list.len());
                }
            }

            Ok(report)
        })?;

        log::info!(
            "imported {} CVEs and {} CPEs in {:?}",
            report.cves,
            report.cpes,
            start.elapsed()
        );

        Ok(report)
    }

    /// Space separated ids of the CVEs linked to the CPEs matching `vendor`/`product`.
    ///
    /// With both filters the fields are compared with `LIKE`, with only one of
    /// them the comparison is exact. Empty strings count as absent.
    pub fn query_cpe(&self, vendor: Option<&str>, product: Option<&str>) -> Result<String> {
        log::debug!("searching cpes by vendor={:?} product={:?}", vendor, product);

        let vendor = vendor.filter(|v| !v.is_empty());
        let product = product.filter(|p| !p.is_empty());

        let mut conn = self.pool.get()?;

        let mut seen = HashSet::new();
        let mut cve_ids = vec![];

        for cpe_id in matching_cpes(conn.deref_mut(), vendor, product)? {
            for cve_id in cves_for_cpe(conn.deref_mut(), &cpe_id)? {
                if seen.insert(cve_id.clone()) {
                    cve_ids.push(cve_id);
                }
            }
        }

        Ok(cve_ids.join(" "))
    }

    /// Detail of a single CVE, `None` if the id is unknown.
    pub fn query_cve(&self, cve_id: &str) -> Result<Option<CveDetail>> {
        log::debug!("fetching {}", cve_id);

        let mut conn = self.pool.get()?;

        let found = cve_table::table
            .find(cve_id)
            .select(Cve::as_select())
            .first(conn.deref_mut())
            .optional()
            .context("error fetching cve")?;

        let Some(cve) = found else {
            return Ok(None);
        };

        let cpe_ids = cpes_for_cve(conn.deref_mut(), &cve.id)?;

        Ok(Some(CveDetail::with(cve, &cpe_ids)))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Added {
    pub cpes: usize,
    pub links: usize,
}

/// Stages one feed entry: its CVE record, any CPE record not yet stored and
/// the links between them.
pub fn add(conn: &mut SqliteConnection, item: &nist::cve::CVE) -> Result<Added> {
    let cve = Cve::from(item);

    insert_into(cve_table::table)
        .values(&cve)
        .execute(conn)
        .with_context(|| format!("error inserting {}", cve.id))?;

    let mut added = Added::default();

    for uri in item.cpe_matches() {
        let existing = cpe_table::table
            .find(uri)
            .select(cpe_table::id)
            .first::<String>(conn)
            .optional()
            .context("error fetching cpe")?;

        if existing.is_none() {
            let cpe = Cpe::parse(uri)
                .map_err(|e| anyhow!("{} has an invalid cpe {}: {}", cve.id, uri, e))?;

            insert_into(cpe_table::table)
                .values(&cpe)
                .execute(conn)
                .with_context(|| format!("error inserting {}", uri))?;

            added.cpes += 1;
        }

        // the same uri can be listed more than once by a single entry
        added.links += insert_or_ignore_into(link::table)
            .values(&Link {
                cve_id: cve.id.clone(),
                cpe_match: uri.to_string(),
            })
            .execute(conn)
            .with_context(|| format!("error linking {} to {}", cve.id, uri))?;
    }

    Ok(added)
}

fn matching_cpes(
    conn: &mut SqliteConnection,
    by_vendor: Option<&str>,
    by_product: Option<&str>,
) -> Result<Vec<String>> {
    let query = cpe_table::table.select(cpe_table::id).into_boxed();

    let query = match (by_vendor, by_product) {
        (Some(v), Some(p)) => {
            query.filter(cpe_table::product.like(p).and(cpe_table::vendor.like(v)))
        }
        (Some(v), None) => query.filter(cpe_table::vendor.eq(v)),
        (None, Some(p)) => query.filter(cpe_table::product.eq(p)),
        (None, None) => return Ok(vec![]),
    };

    query.load(conn).context("error searching cpes")
}

fn cves_for_cpe(conn: &mut SqliteConnection, cpe_id: &str) -> Result<Vec<String>> {
    link::table
        .inner_join(cve_table::table)
        .filter(link::cpe_match.eq(cpe_id))
        .select(cve_table::id)
        .load(conn)
        .with_context(|| format!("error fetching cves linked to {}", cpe_id))
}

fn cpes_for_cve(conn: &mut SqliteConnection, cve_id: &str) -> Result<Vec<String>> {
    link::table
        .inner_join(cpe_table::table)
        .filter(link::cve_id.eq(cve_id))
        .select(cpe_table::id)
        .load(conn)
        .with_context(|| format!("error fetching cpes linked to {}", cve_id))
}

// cargo test -p domain-db --lib -- --nocapture
#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;
    use test_case::test_case;

    use super::*;

    const ARRAY_FIXTURE: &str = "src/db/fixtures/feed_array.json";
    const CONTAINER_FIXTURE: &str = "src/db/fixtures/nvdcve-1.1-sample.json";

    fn repository() -> (TempDir, SqliteRepository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.db");
        let repository = SqliteRepository::new(path.to_str().unwrap()).unwrap();
        repository.setup_database().unwrap();
        (dir, repository)
    }

    fn entry(id: &str, cpes: &[&str]) -> nist::cve::CVE {
        let cpe_match = cpes
            .iter()
            .map(|uri| json!({ "vulnerable": true, "cpe23Uri": uri }))
            .collect::<Vec<_>>();

        serde_json::from_value(json!({
            "cve": { "CVE_data_meta": { "ID": id }, "description": format!("{id} summary") },
            "configurations": { "nodes": [{ "operator": "OR", "cpe_match": cpe_match }] },
            "publishedDate": "2019-01-01T00:00Z",
            "lastModifiedDate": "2019-01-02T00:00Z"
        }))
        .unwrap()
    }

    fn counts(repository: &SqliteRepository) -> (i64, i64, i64) {
        let mut conn = repository.pool.get().unwrap();
        let conn = conn.deref_mut();
        (
            cve_table::table.count().get_result(conn).unwrap(),
            cpe_table::table.count().get_result(conn).unwrap(),
            link::table.count().get_result(conn).unwrap(),
        )
    }

    #[test]
    fn setup_is_idempotent() {
        let (_dir, repository) = repository();
        assert_eq!(repository.setup_database().unwrap(), 0);
    }

    #[test]
    fn imports_the_reference_entry() {
        let (_dir, repository) = repository();
        let cves = nist::read_cves_from_path(ARRAY_FIXTURE).unwrap();

        let report = repository.import(&cves[..1]).unwrap();
        assert_eq!(
            report,
            ImportReport {
                cves: 1,
                cpes: 1,
                links: 1
            }
        );

        let detail = repository.query_cve("CVE-2019-0001").unwrap().unwrap();
        assert_eq!(
            detail,
            CveDetail {
                cpe: "cpe:2.3:a:jenkins:openid:*:*:*:*:*:jenkins:*:*".to_string(),
                cvss3: None,
                desc: "test".to_string(),
                publication_date: "2019-01-01T00:00Z".to_string(),
                last_updated: "2019-01-02T00:00Z".to_string(),
            }
        );
        assert_eq!(
            repository.query_cpe(Some("jenkins"), None).unwrap(),
            "CVE-2019-0001"
        );
    }

    #[test]
    fn every_imported_cve_keeps_its_source_fields() {
        let (_dir, repository) = repository();
        let cves = nist::read_cves_from_path(CONTAINER_FIXTURE).unwrap();
        repository.import(&cves).unwrap();

        for item in &cves {
            let detail = repository.query_cve(item.id()).unwrap().unwrap();
            assert_eq!(detail.desc, item.summary());
            assert_eq!(detail.publication_date, item.published_date);
            assert_eq!(detail.last_updated, item.last_modified_date);
            assert_eq!(detail.cvss3, item.score());
        }
    }

    #[test]
    fn shared_cpe_is_stored_once_and_linked_to_both() {
        let (_dir, repository) = repository();
        let shared = "cpe:2.3:a:jenkins:openid:*:*:*:*:*:jenkins:*:*";

        let report = repository
            .import(&[
                entry("CVE-2019-0001", &[shared]),
                entry("CVE-2019-0002", &[shared]),
            ])
            .unwrap();

        assert_eq!(report.cpes, 1);
        assert_eq!(report.links, 2);
        assert_eq!(counts(&repository), (2, 1, 2));
        assert_eq!(
            repository.query_cpe(Some("jenkins"), Some("openid")).unwrap(),
            "CVE-2019-0001 CVE-2019-0002"
        );
    }

    #[test]
    fn repeated_uri_in_one_entry_links_once() {
        let (_dir, repository) = repository();
        let uri = "cpe:2.3:a:jenkins:openid:*:*:*:*:*:jenkins:*:*";

        let report = repository
            .import(&[entry("CVE-2019-0001", &[uri, uri])])
            .unwrap();

        assert_eq!(report.links, 1);
        assert_eq!(counts(&repository), (1, 1, 1));
    }

    #[test]
    fn query_cpe_deduplicates_in_first_seen_order() {
        let (_dir, repository) = repository();
        let alpha = "cpe:2.3:a:acme:alpha:1.0:*:*:*:*:*:*:*";
        let beta = "cpe:2.3:a:acme:beta:2.0:*:*:*:*:*:*:*";

        repository
            .import(&[
                entry("CVE-2019-0001", &[alpha]),
                entry("CVE-2019-0002", &[alpha, beta]),
                entry("CVE-2019-0003", &[beta]),
            ])
            .unwrap();

        assert_eq!(
            repository.query_cpe(Some("acme"), None).unwrap(),
            "CVE-2019-0001 CVE-2019-0002 CVE-2019-0003"
        );
        assert_eq!(
            repository.query_cpe(None, Some("beta")).unwrap(),
            "CVE-2019-0002 CVE-2019-0003"
        );
    }

    #[test_case(Some("acme"), Some("al%"), "CVE-2019-0001" ; "like pattern on product")]
    #[test_case(Some("ac_e"), Some("alpha"), "CVE-2019-0001" ; "like pattern on vendor")]
    #[test_case(Some("%"), Some("%"), "CVE-2019-0001 CVE-2019-0002" ; "wildcards on both")]
    #[test_case(Some("ac%"), None, "" ; "vendor alone is exact")]
    #[test_case(None, Some("al%"), "" ; "product alone is exact")]
    #[test_case(Some("acme"), Some("gamma"), "" ; "no match")]
    #[test_case(None, None, "" ; "no filters")]
    #[test_case(Some(""), Some("beta"), "CVE-2019-0002" ; "empty vendor is ignored")]
    fn query_cpe_filters(vendor: Option<&str>, product: Option<&str>, expected: &str) {
        let (_dir, repository) = repository();
        repository
            .import(&[
                entry("CVE-2019-0001", &["cpe:2.3:a:acme:alpha:1.0:*:*:*:*:*:*:*"]),
                entry("CVE-2019-0002", &["cpe:2.3:a:acme:beta:2.0:*:*:*:*:*:*:*"]),
            ])
            .unwrap();

        assert_eq!(repository.query_cpe(vendor, product).unwrap(), expected);
    }

    #[test]
    fn query_cve_lists_every_linked_cpe() {
        let (_dir, repository) = repository();
        repository
            .import(&[entry(
                "CVE-2019-0001",
                &[
                    "cpe:2.3:a:acme:alpha:1.0:*:*:*:*:*:*:*",
                    "cpe:2.3:a:acme:beta:2.0:*:*:*:*:*:*:*",
                ],
            )])
            .unwrap();

        let detail = repository.query_cve("CVE-2019-0001").unwrap().unwrap();
        assert_eq!(
            detail.cpe,
            "cpe:2.3:a:acme:alpha:1.0:*:*:*:*:*:*:* cpe:2.3:a:acme:beta:2.0:*:*:*:*:*:*:*"
        );
    }

    #[test]
    fn query_cve_unknown_id_is_none() {
        let (_dir, repository) = repository();
        assert!(repository.query_cve("CVE-1999-9999").unwrap().is_none());
    }

    #[test]
    fn duplicate_cve_rolls_back_the_whole_batch() {
        let (_dir, repository) = repository();
        let uri = "cpe:2.3:a:acme:alpha:1.0:*:*:*:*:*:*:*";

        let res = repository.import(&[
            entry("CVE-2019-0001", &[uri]),
            entry("CVE-2019-0002", &[uri]),
            entry("CVE-2019-0001", &[uri]),
        ]);

        assert!(res.is_err());
        assert_eq!(counts(&repository), (0, 0, 0));
    }

    #[test]
    fn invalid_cpe_uri_aborts_the_batch() {
        let (_dir, repository) = repository();

        let res = repository.import(&[
            entry("CVE-2019-0001", &["cpe:2.3:a:acme:alpha:1.0:*:*:*:*:*:*:*"]),
            entry("CVE-2019-0002", &["not-a-cpe"]),
        ]);

        let err = res.unwrap_err();
        assert!(err.to_string().contains("not-a-cpe"), "{err}");
        assert_eq!(counts(&repository), (0, 0, 0));
    }

    #[test]
    fn detail_json_uses_two_space_indent() {
        let (_dir, repository) = repository();
        let cves = nist::read_cves_from_path(ARRAY_FIXTURE).unwrap();
        repository.import(&cves[..1]).unwrap();

        let json = repository
            .query_cve("CVE-2019-0001")
            .unwrap()
            .unwrap()
            .to_json()
            .unwrap();

        assert_eq!(
            json,
            r#"{
  "cpe": "cpe:2.3:a:jenkins:openid:*:*:*:*:*:jenkins:*:*",
  "cvss3": null,
  "desc": "test",
  "publication date": "2019-01-01T00:00Z",
  "last updated": "2019-01-02T00:00Z"
}"#
        );
    }
}
