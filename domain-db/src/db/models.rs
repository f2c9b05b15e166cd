use diesel::prelude::*;
use serde::Serialize;

use super::schema::{cpe_table, cve_table, link};
use crate::cve_sources::nist;

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = cve_table)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Cve {
    pub id: String,
    pub description: String,
    pub pub_date: String,
    pub last_mod_date: String,
    pub score: Option<f64>,
}

impl From<&nist::cve::CVE> for Cve {
    fn from(item: &nist::cve::CVE) -> Self {
        Self {
            id: item.id().to_string(),
            description: item.summary(),
            pub_date: item.published_date.clone(),
            last_mod_date: item.last_modified_date.clone(),
            score: item.score(),
        }
    }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = cpe_table)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Cpe {
    pub id: String,
    pub product: String,
    pub vendor: String,
}

impl Cpe {
    /// Builds the record for a raw `cpe23Uri`, deriving vendor and product from it.
    pub fn parse(uri: &str) -> Result<Self, String> {
        let cpe::Product { vendor, product } = uri.parse::<cpe::Cpe23>()?.product();
        Ok(Self {
            id: uri.to_string(),
            product,
            vendor,
        })
    }
}

#[derive(Queryable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = link)]
pub struct Link {
    pub cve_id: String,
    pub cpe_match: String,
}

/// Detail view of a single CVE as returned by the `/cve` endpoint.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CveDetail {
    pub cpe: String,
    pub cvss3: Option<f64>,
    pub desc: String,
    #[serde(rename = "publication date")]
    pub publication_date: String,
    #[serde(rename = "last updated")]
    pub last_updated: String,
}

impl CveDetail {
    pub fn with(cve: Cve, cpe_ids: &[String]) -> Self {
        Self {
            cpe: cpe_ids.join(" "),
            cvss3: cve.score,
            desc: cve.description,
            publication_date: cve.pub_date,
            last_updated: cve.last_mod_date,
        }
    }

    /// Pretty printed JSON with a two space indent.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub cves: usize,
    pub cpes: usize,
    pub links: usize,
}
