#[derive(serde::Deserialize)]
/// Top-level configuration of this application.
pub struct Config
{
	/// The socket address the webhook listener binds to (optional, default: 127.0.0.1:2342).
	#[serde(default = "default_listen_address")]
	pub listen_address: std::net::SocketAddr,
	/// Configuration options specific to the GitHub API and authentication.
	pub github_api: crate::github_api::Config,
	/// Configuration options for the checklist comment itself.
	pub checklist: crate::checklist::Config,
}

#[doc(hidden)]
fn default_listen_address() -> std::net::SocketAddr
{
	std::net::SocketAddr::from(([127, 0, 0, 1], 2342))
}

impl Config
{
	/// Attempt to read and parse the configuration from a YAML file.
	///
	/// # Arguments
	/// `path`: Path to the configuration file in YAML format.
	pub fn from_file<P>(path: P) -> Result<Self, crate::Error>
	where
		P: AsRef<std::path::Path>
	{
		let file = std::fs::File::open(&path).map_err(crate::Error::ReadConfigFile)?;
		serde_yaml::from_reader(&file).map_err(crate::Error::ParseConfigFile)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	// YAML forbids tab indentation, so the test fixture can’t follow this file’s indentation
	const MINIMAL_CONFIG: &str = "\
github_api:
  token: ghp_0123456789abcdef
checklist:
  protected_branch: master
  community_url: https://example.chat/community
";

	#[test]
	fn minimal_config_fills_in_defaults()
	{
		let config: Config = serde_yaml::from_str(MINIMAL_CONFIG).unwrap();

		assert_eq!(config.listen_address, std::net::SocketAddr::from(([127, 0, 0, 1], 2342)));
		assert_eq!(config.checklist.protected_branch, "master");
		assert!(config.checklist.extra_items.is_empty());
		assert!(config.checklist.suppress_duplicates);
	}

	#[test]
	fn listen_address_can_be_overridden()
	{
		let config = format!("listen_address: 0.0.0.0:8080\n{MINIMAL_CONFIG}");
		let config: Config = serde_yaml::from_str(&config).unwrap();

		assert_eq!(config.listen_address, std::net::SocketAddr::from(([0, 0, 0, 0], 8080)));
	}
}
