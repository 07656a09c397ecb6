//! Shared utilities for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

pub const CREDENTIALS: &str = r##"
[[users]]
name = "user1"
password = "pass1"
roles = ["role1"]

[[users]]
name = "admin"
password = "admin"
roles = ["role1", "superuser"]

[[roles]]
id = "role1"
[[roles.permissions]]
topic = "data/${{clientid}}/personal"
[[roles.permissions]]
topic = "data/shared"
activity = "SUBSCRIBE"
qos = "ZERO_ONE"

[[roles]]
id = "superuser"
[[roles.permissions]]
topic = "#"
"##;

pub const CREDENTIALS_V2: &str = r#"
[[users]]
name = "user2"
password = "pass2"
roles = ["role2"]

[[roles]]
id = "role2"
[[roles.permissions]]
topic = "${{username}}/#"
retain = "NOT_RETAINED"
"#;

pub const PLAIN_CONFIG: &str = r#"
credentials-reload-interval = 1
password-type = "PLAIN"
"#;

/// A scratch extension home folder with a `conf/` directory.
pub fn home() -> TempDir {
    let home = tempfile::tempdir().unwrap();
    fs::create_dir_all(home.path().join("conf")).unwrap();
    home
}

pub fn write_extension_config(home: &Path, content: &str) {
    fs::write(home.join("conf/config.toml"), content).unwrap();
}

/// Write the credentials file with a modification time `offset_secs` in the future.
#[allow(dead_code)]
pub fn write_credentials(home: &Path, content: &str, offset_secs: u64) -> PathBuf {
    let path = home.join("conf/credentials.toml");
    fs::write(&path, content).unwrap();
    let file = fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
        .unwrap();
    path
}

/// Poll `condition` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
