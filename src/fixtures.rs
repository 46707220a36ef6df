#[cfg(test)]
pub mod test {
    use confique::Config;
    use serde::{Deserialize, Serialize};

    use crate::flatten::{FieldPath, flatten_schema};
    use crate::schema::Schema;

    /// Two-level sample tree used across the resolution tests.
    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct SampleConfig {
        #[config(default = "layer_01_value_00")]
        pub key_00: String,

        #[config(default = "layer_01_value_01")]
        pub key_01: String,

        #[config(nested)]
        pub key_02: SampleKey02,

        #[config(nested)]
        pub key_03: SampleKey03,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct SampleKey02 {
        #[config(default = "layer_01_value_02_01")]
        pub subkey_01: String,

        #[config(default = "layer_01_value_02_02")]
        pub subkey_02: String,

        #[config(default = "layer_01_value_02_03")]
        pub subkey_03: String,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct SampleKey03 {
        #[config(nested)]
        pub subkey_00: SampleSubkey00,

        #[config(nested)]
        pub subkey_01: SampleSubkey01,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct SampleSubkey00 {
        #[config(default = "layer_01_value_03_00_00")]
        pub subsubkey_00: String,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct SampleSubkey01 {
        #[config(default = "layer_01_value_03_01_00")]
        pub subsubkey_00: String,

        #[config(default = "layer_01_value_03_01_01")]
        pub subsubkey_01: String,
    }

    /// The same tree as [`SampleConfig`], declared by hand.
    pub fn sample_schema() -> Schema {
        Schema::builder()
            .string("key_00", "layer_01_value_00")
            .string("key_01", "layer_01_value_01")
            .group("key_02", |g| {
                g.string("subkey_01", "layer_01_value_02_01")
                    .string("subkey_02", "layer_01_value_02_02")
                    .string("subkey_03", "layer_01_value_02_03")
            })
            .group("key_03", |g| {
                g.group("subkey_00", |g| {
                    g.string("subsubkey_00", "layer_01_value_03_00_00")
                })
                .group("subkey_01", |g| {
                    g.string("subsubkey_00", "layer_01_value_03_01_00")
                        .string("subsubkey_01", "layer_01_value_03_01_01")
                })
            })
            .build()
            .unwrap()
    }

    pub fn sample_fields() -> Vec<FieldPath> {
        flatten_schema(&sample_schema())
    }

    /// Mixed leaf types.
    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct ServerConfig {
        /// The application host.
        #[config(default = "localhost")]
        pub host: String,

        /// The port number.
        #[config(default = 8080)]
        pub port: u16,

        /// Enable debug mode.
        #[config(default = false)]
        pub debug: bool,

        /// Requests per second.
        #[config(default = 0.5)]
        pub rate: f64,

        /// Database settings.
        #[config(nested)]
        pub database: ServerDbConfig,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct ServerDbConfig {
        /// Database host.
        #[config(default = "db.local")]
        pub host: String,

        /// Connection pool size.
        #[config(default = 5)]
        pub pool_size: u32,
    }

    /// A leaf without a default, which the engine cannot resolve.
    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct UnsetConfig {
        #[config(default = "x")]
        pub name: String,

        #[config(nested)]
        pub database: UnsetDbConfig,
    }

    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct UnsetDbConfig {
        pub url: Option<String>,
    }

    #[test]
    fn sample_config_matches_hand_schema() {
        assert_eq!(
            Schema::from_config::<SampleConfig>().unwrap(),
            sample_schema()
        );
    }

    #[test]
    fn sample_config_loads_defaults() {
        let config = SampleConfig::builder().load().unwrap();
        assert_eq!(config.key_00, "layer_01_value_00");
        assert_eq!(config.key_03.subkey_01.subsubkey_01, "layer_01_value_03_01_01");
    }
}
