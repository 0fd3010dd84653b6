//! SharePoint navigation menu wire format (`_api/navigation/SaveMenuState`).

use serde::{Deserialize, Serialize};

/// `NodeType` value for a regular navigation link or heading.
pub const NODE_TYPE_DEFAULT: u32 = 0;

/// Request body for `SaveMenuState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMenuStateRequest {
    #[serde(rename = "menuState")]
    pub menu_state: MenuState,
}

/// The full quick-launch menu of a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MenuState {
    pub starting_node_title: String,
    #[serde(rename = "SPSitePrefix")]
    pub sp_site_prefix: String,
    #[serde(rename = "SPWebPrefix")]
    pub sp_web_prefix: String,
    pub friendly_url_prefix: String,
    pub simple_url: String,
    pub nodes: Vec<MenuNode>,
}

impl MenuState {
    /// A menu rooted at the site path (e.g. `/sites/training`) holding `nodes`.
    pub fn for_site(web_prefix: &str, nodes: Vec<MenuNode>) -> Self {
        Self {
            starting_node_title: String::new(),
            sp_site_prefix: "/".into(),
            sp_web_prefix: web_prefix.to_string(),
            friendly_url_prefix: String::new(),
            simple_url: String::new(),
            nodes,
        }
    }
}

/// One entry of the menu; children are nested in `nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MenuNode {
    pub node_type: u32,
    /// Synthetic identifier, sent as a decimal string.
    #[serde(with = "key_string")]
    pub key: u32,
    pub title: String,
    pub simple_url: String,
    pub friendly_url_segment: String,
    pub is_deleted: bool,
    pub is_hidden: bool,
    #[serde(default)]
    pub nodes: Vec<MenuNode>,
}

impl MenuNode {
    /// A visible node with the given key, title and URL.
    pub fn new(key: u32, title: impl Into<String>, simple_url: impl Into<String>) -> Self {
        Self {
            node_type: NODE_TYPE_DEFAULT,
            key,
            title: title.into(),
            simple_url: simple_url.into(),
            friendly_url_segment: String::new(),
            is_deleted: false,
            is_hidden: false,
            nodes: Vec::new(),
        }
    }
}

mod key_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(key: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&key.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_node_uses_sharepoint_field_names() {
        let mut week = MenuNode::new(1002, "Week 1", "");
        week.nodes.push(MenuNode::new(1003, "Day 1", "https://x/SitePages/Week-1-Day-01.aspx"));
        let request = SaveMenuStateRequest {
            menu_state: MenuState::for_site("/sites/training", vec![week]),
        };

        let json = serde_json::to_value(&request).expect("serialize");
        let state = &json["menuState"];
        assert_eq!(state["SPWebPrefix"], "/sites/training");
        assert_eq!(state["Nodes"][0]["Key"], "1002");
        assert_eq!(state["Nodes"][0]["IsHidden"], false);
        assert_eq!(state["Nodes"][0]["Nodes"][0]["Title"], "Day 1");

        let back: SaveMenuStateRequest = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.menu_state.nodes[0].nodes[0].key, 1003);
    }
}
