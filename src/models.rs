/// Partial user data model as returned in responses from the GitHub API.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User
{
	/// The user’s handle.
	pub login: String,
	// We don’t need the other fields, so ignore them
}

/// Partial repository data model as returned in responses from the GitHub API.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Repository
{
	/// The name of the repository.
	pub name: String,
	/// Handle of the user or organization owning the repository.
	pub owner: User,
	// We don’t need the other fields, so ignore them
}

/// Action reported by a pull request event.
#[derive(Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction
{
	Opened,
	// GitHub reports many more actions (synchronize, closed, labeled, …), none of which we react
	// to, so collect them all in a single variant instead of spelling them out
	#[serde(other)]
	Other,
}

/// How the author of a pull request is associated with the repository, as determined by GitHub.
#[derive(Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorAssociation
{
	Collaborator,
	Contributor,
	FirstTimer,
	FirstTimeContributor,
	Mannequin,
	Member,
	None,
	Owner,
}

impl AuthorAssociation
{
	/// Whether GitHub considers the author a first-time contributor to this repository.
	pub fn is_first_contribution(&self) -> bool
	{
		matches!(self, Self::FirstTimer | Self::FirstTimeContributor)
	}
}

/// Partial data model of a Git ref as embedded in pull request payloads.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BranchRef
{
	/// The branch name (without the `refs/heads/` prefix).
	#[serde(rename = "ref")]
	pub ref_: String,
	// We don’t need the other fields, so ignore them
}

/// Partial pull request data model as embedded in webhook event payloads.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PullRequest
{
	/// The pull request number within its repository.
	pub number: u64,
	/// The branch the pull request wants to merge into (the target branch).
	pub base: BranchRef,
	/// The branch the pull request’s changes live on (the source branch).
	pub head: BranchRef,
	/// The user who opened the pull request.
	pub user: User,
	/// GitHub’s record of how the author relates to the repository. This is where the
	/// first-contribution flag comes from
	pub author_association: AuthorAssociation,
	// We don’t need the other fields, so ignore them
}

/// Webhook event payload for pull request events as provided by the GitHub server.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PullRequestEventPayload
{
	/// What happened to the pull request.
	pub action: PullRequestAction,
	/// The pull request this event is reported for.
	pub pull_request: PullRequest,
	/// The repository for which this event is reported.
	pub repository: Repository,
	// We don’t need the other fields, so ignore them
}

/// Partial data model for the parameters needed to make a GitHub API request to create a comment
/// on an issue or pull request.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateCommentRequest<'a>
{
	/// The contents of the comment.
	pub body: &'a str,
}

/// Partial data model for the response of the GitHub API to a request to create a comment.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateCommentResponse
{
	/// User-facing URL of the created comment.
	pub html_url: url::Url,
	// We don’t need the other fields, so ignore them
}

/// Partial data model of an existing issue comment, used to check for earlier checklist comments.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IssueComment
{
	/// The contents of the comment.
	pub body: Option<String>,
	// We don’t need the other fields, so ignore them
}

#[cfg(test)]
mod tests
{
	use super::*;

	// Trimmed-down version of a real webhook delivery for a newly opened pull request
	const OPENED_PAYLOAD: &str = r#"
		{
			"action": "opened",
			"number": 7,
			"pull_request":
			{
				"number": 7,
				"base": {"ref": "master", "sha": "aa218f56b14c9653891f9e74264a383fa43fefbd"},
				"head": {"ref": "fix-typo", "sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e"},
				"user": {"login": "newuser", "id": 583231},
				"author_association": "FIRST_TIME_CONTRIBUTOR",
				"state": "open"
			},
			"repository":
			{
				"name": "example-repository",
				"owner": {"login": "example-organization", "id": 6811672}
			},
			"sender": {"login": "newuser", "id": 583231}
		}"#;

	#[test]
	fn decode_opened_pull_request_payload()
	{
		let payload: PullRequestEventPayload = serde_json::from_str(OPENED_PAYLOAD).unwrap();

		assert_eq!(payload.action, PullRequestAction::Opened);
		assert_eq!(payload.pull_request.number, 7);
		assert_eq!(payload.pull_request.base.ref_, "master");
		assert_eq!(payload.pull_request.head.ref_, "fix-typo");
		assert_eq!(payload.pull_request.user.login, "newuser");
		assert!(payload.pull_request.author_association.is_first_contribution());
		assert_eq!(payload.repository.name, "example-repository");
		assert_eq!(payload.repository.owner.login, "example-organization");
	}

	#[test]
	fn unknown_actions_decode_to_other()
	{
		let payload = OPENED_PAYLOAD.replace("\"opened\"", "\"synchronize\"");
		let payload: PullRequestEventPayload = serde_json::from_str(&payload).unwrap();

		assert_eq!(payload.action, PullRequestAction::Other);
	}

	#[test]
	fn regular_contributors_are_not_first_timers()
	{
		assert!(!AuthorAssociation::Contributor.is_first_contribution());
		assert!(!AuthorAssociation::Member.is_first_contribution());
		assert!(!AuthorAssociation::Owner.is_first_contribution());
		assert!(AuthorAssociation::FirstTimer.is_first_contribution());
	}
}
