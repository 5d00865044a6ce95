use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub deleted: bool,
    /// Row is open for editing in an admin view. Never sent to the server.
    #[serde(default, skip_serializing)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub editing: bool,
    /// Not yet saved on the server. Never sent to the server.
    #[serde(default, skip_serializing)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub is_new: bool,
}

fn default_visible() -> bool {
    true
}

impl Default for Category {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            url: String::new(),
            visible: default_visible(),
            deleted: false,
            editing: false,
            is_new: false,
        }
    }
}

impl Category {
    /// A blank category ready to be filled in and saved.
    pub fn new_blank() -> Self {
        Self {
            editing: true,
            is_new: true,
            ..Self::default()
        }
    }
}
