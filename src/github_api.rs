/// Configuration of the GitHub API client.
#[derive(serde::Deserialize)]
pub struct Config
{
	/// The base URL of the GitHub API server with a trailing slash (optional, default:
	/// <https://api.github.com/>).
	#[serde(default = "github_com_api_base_url")]
	base_url: url::Url,
	/// API token with permission to comment on pull requests (optional, falls back to the
	/// `GITHUB_TOKEN` environment variable). Make sure the token carries comment-write scope, as
	/// this is the only capability this service needs.
	token: Option<String>,
	/// To verify that incoming webhook payloads actually come from GitHub.com, provide the
	/// webhook secret configured for the webhook (optional, but recommended for production use).
	webhook_secret: Option<String>,
	/// Whether to retry failed API requests with exponential backoff for up to five minutes
	/// (optional, default: false). Without retries, a transient network failure means the
	/// checklist comment for that event is simply never posted.
	#[serde(default)]
	retry_requests: bool,
}

#[doc(hidden)]
fn github_com_api_base_url() -> url::Url
{
	url::Url::parse("https://api.github.com/")
		.expect("this call is infallible because we know the URL to be well-formed")
}

/// A GitHub API client that authenticates with a pre-provisioned API token.
///
/// The token is supplied through the configuration file or the `GITHUB_TOKEN` environment
/// variable and needs permission to write comments on pull requests. Optionally, the client
/// retries API requests that failed for reasons such as network issues multiple times for a total
/// of up to five minutes.
///
/// The client can safely be shared between threads, which is achieved by internally using
/// thread-safe handles to the underlying data structures. This allows the client to be used in
/// request handlers asynchronously and concurrently.
#[derive(Clone)]
pub struct Client
{
	#[doc(hidden)]
	config: std::sync::Arc<Config>,
	#[doc(hidden)]
	reqwest_client: reqwest_middleware::ClientWithMiddleware,
	#[doc(hidden)]
	// Wrapped in a secure string so the token never ends up in debug or log output
	token: std::sync::Arc<secstr::SecUtf8>,
}

impl Client
{
	/// Initialize a new GitHub API client with a given configuration.
	pub fn from_config(config: Config) -> Result<Self, crate::Error>
	{
		let config = std::sync::Arc::new(config);

		// Take the API token from the config file and fall back to the environment variable the
		// platform injects
		let token = match &config.token
		{
			Some(token) => token.clone(),
			None => std::env::var("GITHUB_TOKEN").map_err(|_| crate::Error::MissingApiToken)?,
		};
		let token = std::sync::Arc::new(secstr::SecUtf8::from(token));

		// Initialize a new HTTP client
		let reqwest_client = reqwest::ClientBuilder::new()
			// Set a recognizable user agent to get meaningful debugging information from GitHub
			.user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
			.build().map_err(crate::Error::CreateHttpClient)?;

		let mut reqwest_client_builder = reqwest_middleware::ClientBuilder::new(reqwest_client);

		if config.retry_requests
		{
			// Wrap the HTTP client in middleware that retries requests for up to 5 minutes in
			// case of network failures
			let retry_policy = reqwest_retry::policies::ExponentialBackoff::builder()
				.backoff_exponent(2)
				.retry_bounds(std::time::Duration::from_secs(1), std::time::Duration::from_secs(60))
				.build_with_total_retry_duration(std::time::Duration::from_secs(5 * 60));
			let retry_transient_middleware =
				reqwest_retry::RetryTransientMiddleware::new_with_policy(retry_policy);

			reqwest_client_builder = reqwest_client_builder.with(retry_transient_middleware);
		}

		let reqwest_client = reqwest_client_builder.build();

		Ok(Self
		{
			config,
			reqwest_client,
			token,
		})
	}

	/// Make an HTTP request to the GitHub API.
	///
	/// # Arguments
	/// - `method`: The HTTP method to use (example: [reqwest::Method::POST]).
	/// - `endpoint`: The API endpoint (without host and leading slash, example:
	///   `repos/example_organization`).
	/// - `body`: A serializable type containing the request body.
	pub async fn request<S, B, R>(&self, method: reqwest::Method, endpoint: S, body: Option<&B>)
		-> Result<R, crate::Error>
	where
		S: AsRef<str>,
		B: serde::Serialize,
		R: serde::de::DeserializeOwned,
	{
		// Build the API endpoint URL from the base URL and the endpoint path
		let url = self.config.base_url.join(endpoint.as_ref()).map_err(crate::Error::ParseUrl)?;
		let mut request = self.reqwest_client.request(method, url);

		if let Some(body) = body
		{
			// Append the request body if provided
			request = request.json(&body);
		}

		let map_reqwest_error =
			|error| crate::Error::MakeGitHubApiRequest(reqwest_middleware::Error::Reqwest(error));

		let response = request
			// Provide the API token using the Authentication header
			.bearer_auth(self.token.unsecure())
			// Request the v3 REST API, as recommended by GitHub’s documentation
			.header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
			// Send the request
			.send().await.map_err(crate::Error::MakeGitHubApiRequest)?;

		// Return an error if there was a client error according to the response’s HTTP status
		if response.status().is_client_error()
		{
			let status_code = response.status();
			let url = response.url().to_owned();

			// Decode the body for debugging purposes
			let response_body = response.text().await.map_err(map_reqwest_error)?;

			return Err(crate::Error::ReceivedGitHubApiClientError{status_code, url, response_body});
		}

		let mut response_body = response
			// Return an error if there was a server error according to the response’s HTTP status
			.error_for_status().map_err(map_reqwest_error)?
			// Read the full response if there was no server error
			.bytes().await.map_err(map_reqwest_error)?;

		// Allow deserializing empty responses as empty dictionaries instead, as empty strings are
		// invalid JSON
		if response_body.is_empty()
		{
			response_body = "{}".as_bytes().into();
		}

		serde_json::from_slice(&response_body).map_err(crate::Error::DecodeGitHubApiResponseBody)
	}

	/// Make an HTTP GET request to the GitHub API (for arguments, see [Client::request]).
	pub async fn get<S, R>(&self, endpoint: S) -> Result<R, crate::Error>
	where
		S: AsRef<str>,
		R: serde::de::DeserializeOwned,
	{
		self.request(reqwest::Method::GET, endpoint, NO_BODY).await
	}

	/// Make an HTTP POST request to the GitHub API (for arguments, see [Client::request]).
	pub async fn post<S, B, R>(&self, endpoint: S, body: &B) -> Result<R, crate::Error>
	where
		S: AsRef<str>,
		B: serde::Serialize,
		R: serde::de::DeserializeOwned,
	{
		self.request(reqwest::Method::POST, endpoint, Some(body)).await
	}
}

/// When making requests without a request body, we don’t care which type is used to represent it.
/// However, the compiler needs to know some type at compile time. This alias is used in order not
/// to have to spell out the dummy type.
pub const NO_BODY: Option<&()> = None;

/// Verify a webhook event payload by checking the provided signature.
#[doc(hidden)]
fn verify_payload_signature(
	provided_signature: Option<String>,
	payload: &[u8],
	secret: Option<&str>)
	-> Result<(), crate::Error>
{
	let secret = match secret
	{
		Some(secret) => secret,
		// If no secret was configured, accept all payloads
		None =>
		{
			log::warn!("no webhook secret configured, ignoring payload signature (this should be \
				configured for production use)");
			return Ok(());
		}
	};

	// Otherwise, require a valid payload signature. If none is provided, reject the request
	let provided_signature = provided_signature.ok_or(crate::Error::MissingPayloadSignature)?;

	// Only SHA-256 signatures are supported, reject anything else
	let provided_signature = provided_signature.strip_prefix("sha256=")
		.ok_or(crate::Error::InvalidPayloadSignature)?;

	use hmac::Mac as _;

	// Compute the expected signature
	let mut mac = hmac::Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes())
		.expect("this call is infallible because HMAC supports keys of arbitrary size");

	mac.update(payload);

	let expected_signature = mac.finalize().into_bytes();
	let expected_signature = hex::encode(&expected_signature);

	// Compare the provided signature with what we expect it to be. Use a secure string wrapper
	// that provides a constant-time equality comparator to prevent timing attacks
	let provided_signature = secstr::SecStr::from(provided_signature);
	let expected_signature = secstr::SecStr::from(expected_signature);

	if provided_signature == expected_signature
	{
		log::debug!("successfully verified payload signature");
		Ok(())
	}
	else
	{
		log::warn!("received payload with invalid signature");
		Err(crate::Error::InvalidPayloadSignature)
	}
}

/// [1]: <https://github.com/seanmonstar/warp/blob/3ff2eaf41eb5ac9321620e5a6434d5b5ec6f313f/examples/todos.rs#L99-L101>
/// [2]: <https://github.com/seanmonstar/warp/blob/3ff2eaf41eb5ac9321620e5a6434d5b5ec6f313f/src/filters/body.rs#L228-L237>
/// [warp] filter allowing us to extract the payload, verify its signature if configured, and
/// decode it from JSON into a struct of the desired type. Returns the decoded payload and a
/// handle to the GitHub API client for further usage as arguments to subsequent handlers in that
/// order. Inspired by the [to-do example][1] and [JSON decode implementation][2] provided by
/// [warp].
///
/// # Arguments
/// - `client`: The handle to the GitHub API client.
pub fn with_validated_payload_and_client<T>(client: Client)
	-> impl warp::Filter<Extract = (T, Client), Error = warp::Rejection> + Clone
where
	T: serde::de::DeserializeOwned + Send,
{
	use warp::Filter as _;

	warp::any()
		// Relay a handle to the client
		.map(move || {client.clone()})
		// Relay the body as raw bytes for payload signature validation and JSON decoding
		.and(warp::body::bytes())
		// Relay the payload signature header if present
		.and(warp::header::optional::<String>("x-hub-signature-256"))
		// Validate the payload signature if configured and decode the body into JSON
		.and_then(
			|client: Client,
				mut bytes: warp::hyper::body::Bytes,
				provided_signature: Option<String>|
			async move
			{
				use warp::Buf as _;

				// Resize the payload buffer view to the size that was actually written
				let bytes = bytes.copy_to_bytes(bytes.remaining());

				// If configured, require a valid payload signature
				verify_payload_signature(provided_signature, &bytes,
					client.config.webhook_secret.as_deref())
						.map_err(warp::reject::custom)?;

				// Decode the payload from JSON
				let payload = serde_json::from_slice(&bytes)
					.map_err(crate::Error::DecodePayloadBody)
					.map_err(warp::reject::custom)?;

				Ok::<_, warp::Rejection>((payload, client))
			})
		// The last call returned the payload and client as a tuple, but we’d like subsequent
		// calls in the filter chain to receive them as top-level arguments and not nested within
		// a single tuple
		.untuple_one()
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn sign(payload: &[u8], secret: &str) -> String
	{
		use hmac::Mac as _;

		let mut mac = hmac::Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes()).unwrap();
		mac.update(payload);

		format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
	}

	#[test]
	fn valid_signatures_are_accepted()
	{
		let payload = br#"{"action": "opened"}"#;
		let signature = sign(payload, "it's a secret to everybody");

		assert!(verify_payload_signature(Some(signature), payload,
			Some("it's a secret to everybody")).is_ok());
	}

	#[test]
	fn tampered_payloads_are_rejected()
	{
		let signature = sign(br#"{"action": "opened"}"#, "it's a secret to everybody");
		let tampered_payload = br#"{"action": "closed"}"#;

		assert!(matches!(
			verify_payload_signature(Some(signature), tampered_payload,
				Some("it's a secret to everybody")),
			Err(crate::Error::InvalidPayloadSignature)));
	}

	#[test]
	fn missing_signatures_are_rejected_when_a_secret_is_configured()
	{
		assert!(matches!(
			verify_payload_signature(None, b"{}", Some("it's a secret to everybody")),
			Err(crate::Error::MissingPayloadSignature)));
	}

	#[test]
	fn non_sha256_signatures_are_rejected()
	{
		assert!(matches!(
			verify_payload_signature(Some("sha1=da39a3ee".to_string()), b"{}",
				Some("it's a secret to everybody")),
			Err(crate::Error::InvalidPayloadSignature)));
	}

	#[test]
	fn all_payloads_are_accepted_without_a_configured_secret()
	{
		assert!(verify_payload_signature(None, b"{}", None).is_ok());
	}

	#[tokio::test]
	async fn client_errors_capture_status_code_and_response_body()
	{
		use warp::Filter as _;

		// Stand-in for a GitHub API server whose token lacks comment-write permission
		let route = warp::any().map(
			||
			{
				warp::reply::with_status(r#"{"message": "Forbidden"}"#,
					warp::http::StatusCode::FORBIDDEN)
			});
		let (address, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
		tokio::spawn(server);

		let config = Config
		{
			base_url: url::Url::parse(&format!("http://{address}/")).unwrap(),
			token: Some("ghp_0123456789abcdef".to_string()),
			webhook_secret: None,
			retry_requests: false,
		};
		let client = Client::from_config(config).unwrap();

		let result: Result<crate::CreateCommentResponse, _> = client.post(
			"repos/example-organization/example-repository/issues/7/comments",
			&crate::CreateCommentRequest{body: "checklist"}).await;

		match result
		{
			Err(crate::Error::ReceivedGitHubApiClientError{status_code, response_body, ..}) =>
			{
				assert_eq!(status_code, reqwest::StatusCode::FORBIDDEN);
				assert!(response_body.contains("Forbidden"));
			},
			other => panic!("expected a GitHub API client error, got {other:?}"),
		}
	}
}
