//! Process configuration loaded once at startup and passed explicitly to the broker.

// std
use std::{
	net::{IpAddr, SocketAddr},
	path::PathBuf,
};
// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};

/// Authorization (token) endpoint address.
pub const OAUTH_API_URL: &str = "OAUTH_API_URL";
/// Data endpoint address.
pub const DATA_ENDPOINT_URL: &str = "DATA_ENDPOINT_URL";
/// OAuth client identifier.
pub const CLIENT_ID: &str = "CLIENT_ID";
/// OAuth client secret.
pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
/// Listen port.
pub const PORT: &str = "PORT";
/// Listen address.
pub const HOST: &str = "HOST";
/// Email forwarded in the vote payload.
pub const VOTE_EMAIL: &str = "VOTE_EMAIL";
/// Event identifier forwarded in the vote payload.
pub const VOTE_EVENT_ID: &str = "VOTE_EVENT_ID";
/// Per-hop outbound timeout in milliseconds.
pub const UPSTREAM_TIMEOUT_MS: &str = "UPSTREAM_TIMEOUT_MS";
/// `*` or a comma-separated origin list.
pub const CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_VOTE_EMAIL: &str = "maham@govotr.com";
const DEFAULT_VOTE_EVENT_ID: &str = "68d123b4b40f3ddbee731a36";
const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Loads `.env` from the working directory (or its ancestors) into the process environment.
///
/// Returns the file that was read, if any. Variables already set in the environment win. A missing
/// file is not an error; an unreadable or malformed one is.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
	dotenv_outcome(dotenvy::dotenv())
}

fn dotenv_outcome(result: dotenvy::Result<PathBuf>) -> Result<Option<PathBuf>, ConfigError> {
	match result {
		Ok(path) => Ok(Some(path)),
		Err(e) if e.not_found() => Ok(None),
		Err(source) => Err(ConfigError::Dotenv { source }),
	}
}

/// Client credentials presented to the authorization provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: Secret,
}
impl Credentials {
	/// Creates credentials after rejecting blank values.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let client_id = client_id.into();
		let client_secret = Secret::new(client_secret);

		if client_id.trim().is_empty() {
			return Err(ConfigError::Missing { key: CLIENT_ID });
		}
		if client_secret.is_blank() {
			return Err(ConfigError::Missing { key: CLIENT_SECRET });
		}

		Ok(Self { client_id, client_secret })
	}
}

/// Vote event forwarded to the data endpoint.
///
/// The payload is fixed per deployment rather than derived from the inbound request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VotePayload {
	/// Voter email.
	pub email: String,
	/// Event identifier.
	#[serde(rename = "eventId")]
	pub event_id: String,
}
impl VotePayload {
	/// Creates a payload after checking both fields are well formed.
	pub fn new(email: impl Into<String>, event_id: impl Into<String>) -> Result<Self, ConfigError> {
		let email = email.into();
		let event_id = event_id.into();

		if !is_plausible_email(&email) {
			return Err(ConfigError::InvalidEmail(email));
		}
		if event_id.trim().is_empty() {
			return Err(ConfigError::Missing { key: VOTE_EVENT_ID });
		}

		Ok(Self { email, event_id })
	}
}
impl Default for VotePayload {
	fn default() -> Self {
		Self { email: DEFAULT_VOTE_EMAIL.into(), event_id: DEFAULT_VOTE_EVENT_ID.into() }
	}
}

/// Origins allowed by the CORS layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CorsOrigins {
	/// Any origin.
	#[default]
	Any,
	/// Explicit origin list.
	List(Vec<String>),
}
impl FromStr for CorsOrigins {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		let trimmed = s.trim();

		if trimmed.is_empty() || trimmed == "*" {
			return Ok(Self::Any);
		}

		Ok(Self::List(
			trimmed.split(',').map(str::trim).filter(|o| !o.is_empty()).map(Into::into).collect(),
		))
	}
}

/// Immutable service configuration.
#[derive(Clone, Debug)]
pub struct Config {
	/// Authorization provider token endpoint.
	pub token_endpoint: Url,
	/// Data endpoint returning the vote URL.
	pub data_endpoint: Url,
	/// Client credentials for the token hop.
	pub credentials: Credentials,
	/// Payload for the vote hop.
	pub payload: VotePayload,
	/// Address the HTTP server binds.
	pub listen_addr: SocketAddr,
	/// Deadline applied to each outbound hop.
	pub upstream_timeout: Duration,
	/// CORS allow-list.
	pub cors_origins: CorsOrigins,
}
impl Config {
	/// Creates a configuration with defaults for everything but the endpoints and credentials.
	pub fn new(token_endpoint: Url, data_endpoint: Url, credentials: Credentials) -> Self {
		Self {
			token_endpoint,
			data_endpoint,
			credentials,
			payload: VotePayload::default(),
			listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
			upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
			cors_origins: CorsOrigins::Any,
		}
	}

	/// Overrides the vote payload.
	pub fn with_payload(mut self, payload: VotePayload) -> Self {
		self.payload = payload;

		self
	}

	/// Overrides the per-hop timeout.
	pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
		self.upstream_timeout = timeout;

		self
	}

	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through an arbitrary key lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &'static str| lookup(key).filter(|value| !value.trim().is_empty());
		let require = |key: &'static str| get(key).ok_or(ConfigError::Missing { key });
		let token_endpoint = parse_endpoint(OAUTH_API_URL, &require(OAUTH_API_URL)?)?;
		let data_endpoint = parse_endpoint(DATA_ENDPOINT_URL, &require(DATA_ENDPOINT_URL)?)?;
		let credentials = Credentials::new(require(CLIENT_ID)?, require(CLIENT_SECRET)?)?;
		let payload = VotePayload::new(
			get(VOTE_EMAIL).unwrap_or_else(|| DEFAULT_VOTE_EMAIL.into()),
			get(VOTE_EVENT_ID).unwrap_or_else(|| DEFAULT_VOTE_EVENT_ID.into()),
		)?;
		let port = match get(PORT) {
			Some(raw) => raw
				.trim()
				.parse::<u16>()
				.map_err(|source| ConfigError::InvalidNumber { key: PORT, source })?,
			None => DEFAULT_PORT,
		};
		let host = get(HOST).unwrap_or_else(|| DEFAULT_HOST.into());
		let ip = host.trim().parse::<IpAddr>().map_err(|_| ConfigError::InvalidListenAddr(host))?;
		let upstream_timeout = match get(UPSTREAM_TIMEOUT_MS) {
			Some(raw) => {
				let millis = raw
					.trim()
					.parse::<u64>()
					.map_err(|source| ConfigError::InvalidNumber { key: UPSTREAM_TIMEOUT_MS, source })?;

				if millis == 0 {
					return Err(ConfigError::NonPositiveTimeout);
				}

				Duration::from_millis(millis)
			},
			None => DEFAULT_UPSTREAM_TIMEOUT,
		};
		let cors_origins = get(CORS_ALLOWED_ORIGINS)
			.map(|raw| raw.parse::<CorsOrigins>().unwrap_or_default())
			.unwrap_or_default();

		Ok(Self {
			token_endpoint,
			data_endpoint,
			credentials,
			payload,
			listen_addr: SocketAddr::new(ip, port),
			upstream_timeout,
			cors_origins,
		})
	}
}

fn parse_endpoint(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { key, source })?;

	match url.scheme() {
		"http" | "https" => Ok(url),
		scheme => Err(ConfigError::UnsupportedScheme { key, scheme: scheme.into() }),
	}
}

fn is_plausible_email(email: &str) -> bool {
	let Some((local, domain)) = email.trim().split_once('@') else {
		return false;
	};

	!local.is_empty() && !domain.is_empty() && !domain.contains('@')
}
