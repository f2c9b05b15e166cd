use serde::{Deserialize, Serialize};

pub mod node;

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct Meta {
    #[serde(rename = "ID")]
    pub id: String,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct DescriptionData {
    pub lang: String,
    pub value: String,
}

/// Feeds carry either a plain text description or the NVD `description_data` list.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum Description {
    Text(String),
    Data {
        description_data: Vec<DescriptionData>,
    },
}

impl Description {
    /// English text of the description, falling back to every language when
    /// no English entry exists.
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Data { description_data } => {
                let english = description_data
                    .iter()
                    .filter(|desc| desc.lang == "en")
                    .map(|desc| desc.value.as_str())
                    .collect::<Vec<_>>();

                if english.is_empty() {
                    description_data
                        .iter()
                        .map(|desc| desc.value.as_str())
                        .collect::<Vec<_>>()
                        .join("\n")
                } else {
                    english.join("\n")
                }
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Info {
    #[serde(rename = "CVE_data_meta")]
    pub meta: Meta,
    pub description: Description,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct ImpactMetricV3 {
    #[serde(rename = "impactScore")]
    pub impact_score: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct Impact {
    #[serde(rename = "baseMetricV3")]
    pub metric_v3: Option<ImpactMetricV3>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct Configurations {
    pub nodes: Vec<node::Node>,
}

/// A single entry of the vulnerability feed.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[allow(clippy::upper_case_acronyms)]
pub struct CVE {
    pub cve: Info,
    pub impact: Option<Impact>,
    pub configurations: Configurations,
    #[serde(rename = "publishedDate")]
    pub published_date: String,
    #[serde(rename = "lastModifiedDate")]
    pub last_modified_date: String,
}

impl CVE {
    pub fn id(&self) -> &str {
        &self.cve.meta.id
    }

    pub fn summary(&self) -> String {
        self.cve.description.text()
    }

    /// `impact.baseMetricV3.impactScore`, `None` when any segment of the path is absent.
    pub fn score(&self) -> Option<f64> {
        self.impact.as_ref()?.metric_v3.as_ref()?.impact_score
    }

    pub fn cpe_matches(&self) -> Vec<&str> {
        self.configurations
            .nodes
            .iter()
            .flat_map(|node| node.cpe_matches())
            .collect()
    }
}
