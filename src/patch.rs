//! Saved rack documents.
//!
//! A patch records which module sits in which column and the settings each
//! module chose to persist. Chain buffers are never saved; a loaded rack
//! starts silent and settles again.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RackConfig;
use crate::error::RackError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    #[serde(default)]
    pub config: RackConfig,
    pub modules: Vec<PatchModule>,
}

/// One module in a [`Patch`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchModule {
    /// Model name as given by [`Model::name`](crate::Model::name)
    pub model: String,
    pub column: i32,
    /// Whatever the module's `save_state` returned
    #[serde(default)]
    pub data: Value,
}

impl Patch {
    pub fn to_json(&self) -> Result<String, RackError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, RackError> {
        Ok(serde_json::from_str(json)?)
    }
}
