use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct Match {
    #[serde(rename = "cpe23Uri")]
    pub cpe23_uri: String,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct Node {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub cpe_match: Vec<Match>,
}

impl Node {
    /// CPE URIs configured by this node.
    ///
    /// A node with children contributes the matches of its direct children
    /// only; grandchildren are not walked. An empty `children` list counts as
    /// absent, so leaf nodes carrying `"children": []` keep their own matches.
    pub fn cpe_matches(&self) -> Vec<&str> {
        if self.children.is_empty() {
            collect_uris(&self.cpe_match)
        } else {
            self.children
                .iter()
                .flat_map(|child| collect_uris(&child.cpe_match))
                .collect()
        }
    }
}

fn collect_uris(matches: &[Match]) -> Vec<&str> {
    matches.iter().map(|m| m.cpe23_uri.as_str()).collect()
}
