pub mod checklist;
#[doc(hidden)]
mod config;
#[doc(hidden)]
mod error;
pub mod github_api;
#[doc(hidden)]
mod models;

pub use config::Config;
pub use error::Error;
pub use models::*;

#[tokio::main]
async fn main() -> anyhow::Result<()>
{
	pretty_env_logger::init();

	// Read the config file
	let config = Config::from_file("config.yaml")?;

	// Initialize a new GitHub API client using the token provisioned for this service
	let github_api_client = github_api::Client::from_config(config.github_api)?;

	// The checklist configuration is shared with every request handler invocation
	let checklist_config = std::sync::Arc::new(config.checklist);

	use warp::Filter as _;

	let pull_request_event_route =
		// Only listen for requests to the root path
		warp::path::end()
		// Only listen for POST requests
		.and(warp::post())
		// Only listen for pull request events
		.and(warp::header::exact_ignore_case("x-github-event", "pull_request"))
		// Reject payloads larger than 256 kB, which should be enough for all valid requests
		.and(warp::body::content_length_limit(256 * 1024))
		// Retrieve and validate the payload and pass it on along with the GitHub API client
		.and(github_api::with_validated_payload_and_client(github_api_client))
		// Relay a handle to the checklist configuration
		.and(warp::any().map(move || {checklist_config.clone()}))
		// Forward request to request handler
		.and_then(handle_pull_request_event);

	let routes = pull_request_event_route
		.recover(handle_rejection);

	log::info!("listening for incoming webhook events on {}", config.listen_address);
	warp::serve(routes).run(config.listen_address).await;

	Ok(())
}

/// Request handler for valid pull request events.
///
/// # Arguments
/// - `payload`: The decoded webhook event payload.
/// - `github_api_client`: A handle to the GitHub API client.
/// - `checklist_config`: The checklist configuration shared across handler invocations.
async fn handle_pull_request_event(
	payload: PullRequestEventPayload,
	github_api_client: github_api::Client,
	checklist_config: std::sync::Arc<checklist::Config>)
	-> Result<impl warp::Reply, std::convert::Infallible>
{
	// Only freshly opened pull requests against the protected branch receive a checklist comment.
	// Everything else (other actions, other target branches) gets a successful HTTP response and
	// no further processing
	if !checklist::applies_to(&checklist_config, &payload)
	{
		log::debug!("unrelated pull request event, ignoring");

		let message = "not listening to this pull request event";
		let response = warp::reply::json(&InfoResponse{info: message});

		return Ok(warp::reply::with_status(response, warp::http::StatusCode::OK));
	}

	let pull_request_number = payload.pull_request.number;
	let organization_name = payload.repository.owner.login.clone();
	let repository_name = payload.repository.name.clone();

	log::info!("pull request #{pull_request_number} (“{}” → “{}”) was opened by “{}” in \
		repository “{repository_name}”",
		payload.pull_request.head.ref_, payload.pull_request.base.ref_,
		payload.pull_request.user.login);

	// Render and post the checklist comment in a separate task so as to immediately acknowledge
	// the webhook event without blocking
	tokio::spawn(
		async move
		{
			// If configured, check whether this pull request already carries a checklist comment.
			// GitHub redelivers webhook events on request, and without this check every
			// redelivery would produce a duplicate comment. The check and the post are not
			// atomic, so concurrent deliveries of the same event can still both post
			if checklist_config.suppress_duplicates
			{
				let existing_comments: Result<Vec<IssueComment>, _> = github_api_client.get(
					format!("repos/{organization_name}/{repository_name}/issues\
						/{pull_request_number}/comments?per_page=100")).await;

				match existing_comments
				{
					Ok(existing_comments) =>
					{
						let already_posted = existing_comments.iter()
							.filter_map(|comment| comment.body.as_deref())
							.any(|body| body.contains(checklist::COMMENT_MARKER));

						if already_posted
						{
							log::info!("pull request #{pull_request_number} in repository \
								“{repository_name}” already has a checklist comment, skipping");
							return;
						}
					},
					Err(error) =>
					{
						log::error!("could not list existing comments on pull request \
							#{pull_request_number} in repository “{repository_name}”");
						log::error!("{:?}", anyhow::Error::from(error));
						return;
					}
				}
			}

			let comment_body = checklist::render(&checklist_config, &payload);

			let create_comment_request_body = CreateCommentRequest
			{
				body: &comment_body,
			};

			let created_comment: CreateCommentResponse = match github_api_client.post(
				format!("repos/{organization_name}/{repository_name}/issues\
					/{pull_request_number}/comments"),
				&create_comment_request_body).await
			{
				Ok(created_comment) => created_comment,
				Err(error) =>
				{
					log::error!("could not post checklist comment on pull request \
						#{pull_request_number} in repository “{repository_name}”");
					log::error!("{:?}", anyhow::Error::from(error));
					return;
				}
			};

			log::info!("posted checklist comment: {}", created_comment.html_url);
		});

	// Acknowledge the successful receipt of this webhook event as quickly as possible
	let message = "posting checklist comment on the new pull request";
	let response = warp::reply::json(&InfoResponse{info: message});

	Ok(warp::reply::with_status(response, warp::http::StatusCode::OK))
}

/// Request handler for all requests that were rejected previously.
///
/// # Arguments
/// - `error`: Reasons for why this request was rejected by all routes.
async fn handle_rejection(error: warp::Rejection)
	-> Result<impl warp::Reply, std::convert::Infallible>
{
	let status_code;
	let message;

	if error.is_not_found()
	{
		status_code = warp::http::StatusCode::NOT_FOUND;
		message = "not found";
	}
	else if let Some(_) = error.find::<warp::reject::MethodNotAllowed>()
	{
		status_code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
		message = "method not allowed";
	}
	else if let Some(_) = error.find::<warp::reject::PayloadTooLarge>()
	{
		status_code = warp::http::StatusCode::BAD_REQUEST;
		message = "payload too large";
	}
	else if let Some(_) = error.find::<warp::reject::MissingHeader>()
	{
		status_code = warp::http::StatusCode::BAD_REQUEST;
		message = "missing webhook event header";
	}
	// Don’t treat events that we don’t react to as errors and report a 200 OK instead
	else if let Some(_) = error.find::<warp::reject::InvalidHeader>()
	{
		status_code = warp::http::StatusCode::OK;
		message = "not listening to this webhook event";
	}
	else if let Some(crate::Error::DecodePayloadBody(_)) = error.find()
	{
		status_code = warp::http::StatusCode::BAD_REQUEST;
		message = "malformed payload body";
	}
	else if let Some(crate::Error::MissingPayloadSignature) = error.find()
	{
		status_code = warp::http::StatusCode::BAD_REQUEST;
		message = "missing payload signature";
	}
	else if let Some(crate::Error::InvalidPayloadSignature) = error.find()
	{
		status_code = warp::http::StatusCode::BAD_REQUEST;
		message = "invalid payload signature";
	}
	// If users are able to trigger errors we did not anticipate, log the error chain so we can
	// inspect this more closely later
	else
	{
		status_code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
		message = "internal server error";

		log::error!("unhandled error: {:#?}", error);
	}

	let response = match status_code.is_success()
	{
		true => warp::reply::json(&InfoResponse{info: message}),
		false => warp::reply::json(&ErrorResponse{error: message}),
	};

	Ok(warp::reply::with_status(response, status_code))
}

/// Response type acknowledging successfully handled webhook events (serialized to JSON).
#[derive(serde::Serialize)]
struct InfoResponse<'a>
{
	/// Info message with human-readable information about how this request was handled.
	info: &'a str,
}

/// Response type informing about errors while handling webhook events (serialized to JSON).
#[derive(serde::Serialize)]
struct ErrorResponse<'a>
{
	/// Error message with a human-readable explanation as to why this request failed.
	error: &'a str,
}
