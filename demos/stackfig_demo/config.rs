//! Configuration tree for the stackfig demo application.
//!
//! Two levels of nesting under four top-level keys. Every leaf is a string
//! whose default names its position in the tree.
//!
//! # Name mapping
//!
//! With the namespace `app_name` (derived from the builder's `app_name`):
//!
//! | Dotted path | CLI flag | Lowercase env | Uppercase env |
//! |---|---|---|---|
//! | `key_00` | `--key_00` | `app_name.key_00` | `APP_NAME_KEY_00` |
//! | `key_02.subkey_01` | `--key_02.subkey_01` | `app_name.key_02.subkey_01` | `APP_NAME_KEY_02_SUBKEY_01` |
//! | `key_03.subkey_01.subsubkey_00` | `--key_03.subkey_01.subsubkey_00` | `app_name.key_03.subkey_01.subsubkey_00` | `APP_NAME_KEY_03_SUBKEY_01_SUBSUBKEY_00` |

use confique::Config;
use serde::{Deserialize, Serialize};

/// Root configuration for the demo application.
#[derive(Config, Serialize, Deserialize, Debug)]
pub struct DemoConfig {
    /// First top-level value.
    #[config(default = "layer_01_value_00")]
    pub key_00: String,

    /// Second top-level value.
    #[config(default = "layer_01_value_01")]
    pub key_01: String,

    /// One level of nesting.
    #[config(nested)]
    pub key_02: Key02,

    /// Two levels of nesting.
    #[config(nested)]
    pub key_03: Key03,
}

#[derive(Config, Serialize, Deserialize, Debug)]
pub struct Key02 {
    #[config(default = "layer_01_value_02_01")]
    pub subkey_01: String,

    #[config(default = "layer_01_value_02_02")]
    pub subkey_02: String,

    #[config(default = "layer_01_value_02_03")]
    pub subkey_03: String,
}

#[derive(Config, Serialize, Deserialize, Debug)]
pub struct Key03 {
    #[config(nested)]
    pub subkey_00: Key03Subkey00,

    #[config(nested)]
    pub subkey_01: Key03Subkey01,
}

#[derive(Config, Serialize, Deserialize, Debug)]
pub struct Key03Subkey00 {
    #[config(default = "layer_01_value_03_00_00")]
    pub subsubkey_00: String,
}

#[derive(Config, Serialize, Deserialize, Debug)]
pub struct Key03Subkey01 {
    #[config(default = "layer_01_value_03_01_00")]
    pub subsubkey_00: String,

    #[config(default = "layer_01_value_03_01_01")]
    pub subsubkey_01: String,
}
