use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub color: String,
}
