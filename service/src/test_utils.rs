use std::{ops::Deref, path::Path};

use abi::Config;
use rand::Rng;

pub struct TestConfig {
    config: Config,
}

impl TestConfig {
    /// Load a config and move the server to a random port so tests can run side by side.
    pub fn new(filename: impl AsRef<Path>) -> Self {
        let mut config = Config::load(filename).unwrap();
        config.server.port = rand::thread_rng().gen_range(20000..40000);
        Self { config }
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self::new("fixtures/config.yml")
    }
}

impl Deref for TestConfig {
    type Target = Config;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}
