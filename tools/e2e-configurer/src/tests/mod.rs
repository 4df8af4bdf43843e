/*!
   Scenario-level tests, driving configurers against [`MockRuntime`]
   instead of a container engine.
*/

pub mod mock_runtime;

use core::time::Duration;

use crate::types::config::TestConfig;

pub use mock_runtime::MockRuntime;

/// A config polling without delay, storing data under the temp directory.
pub fn test_config() -> TestConfig {
    TestConfig {
        chain_store_dir: std::env::temp_dir().join("babylon-e2e-configurer"),
        readiness_attempts: 3,
        readiness_interval: Duration::ZERO,
        ..TestConfig::default()
    }
}
