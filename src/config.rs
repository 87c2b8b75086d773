// SPDX-License-Identifier: Apache-2.0 OR MIT
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings shared by every archive opened through an
/// [`AsarContext`](crate::AsarContext).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
	/// Extension (without the dot) that marks an archive file. Matched
	/// case-insensitively.
	pub extension: String,
	/// How many symbolic links a single lookup may follow.
	pub max_link_hops: usize,
	/// Require and verify integrity metadata on every packed file that is
	/// read or copied out.
	pub validate_integrity: bool,
	/// Where copied-out files are created. Defaults to the system temporary
	/// directory.
	pub temp_dir: Option<PathBuf>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			extension: "asar".to_string(),
			max_link_hops: 40,
			validate_integrity: false,
			temp_dir: None,
		}
	}
}

#[cfg(test)]
mod test {
	use super::Config;

	#[test]
	pub fn test_partial_config() {
		let config: Config = serde_json::from_str(r#"{"maxLinkHops":3,"tempDir":"/var/tmp"}"#)
			.expect("failed to decode config");
		assert_eq!(config.extension, "asar");
		assert_eq!(config.max_link_hops, 3);
		assert_eq!(config.temp_dir.as_deref(), Some(std::path::Path::new("/var/tmp")));
	}
}
