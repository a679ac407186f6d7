//! Token Acquirer: exchanges client credentials for a bearer token.

// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	config::{Config, Credentials},
	flows::common,
	http::{UpstreamHttpClient, UpstreamRequest},
	obs::{self, Hop, HopOutcome, HopSpan},
};

#[derive(Serialize)]
struct TokenRequestBody<'a> {
	client_id: &'a str,
	client_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenData {
	access_token: String,
}

/// Performs the first hop against the authorization provider.
pub struct TokenAcquirer<C>
where
	C: UpstreamHttpClient,
{
	http_client: Arc<C>,
	endpoint: Url,
	timeout: Duration,
}
impl<C> TokenAcquirer<C>
where
	C: UpstreamHttpClient,
{
	/// Creates an acquirer targeting the configured token endpoint.
	pub fn new(config: &Config, http_client: impl Into<Arc<C>>) -> Self {
		Self {
			http_client: http_client.into(),
			endpoint: config.token_endpoint.clone(),
			timeout: config.upstream_timeout,
		}
	}

	/// Exchanges `credentials` for a fresh access token.
	///
	/// Makes exactly one outbound call; never retries or caches.
	pub async fn acquire_token(&self, credentials: &Credentials) -> Result<AccessToken> {
		const HOP: Hop = Hop::Token;

		let span = HopSpan::new(HOP, "acquire_token");

		obs::record_hop_outcome(HOP, HopOutcome::Attempt);

		let result = span
			.instrument(async {
				let request = UpstreamRequest::json(
					self.endpoint.clone(),
					&TokenRequestBody {
						client_id: &credentials.client_id,
						client_secret: credentials.client_secret.expose(),
					},
				)?;
				let data: TokenData =
					common::send_hop(self.http_client.as_ref(), HOP, self.timeout, request).await?;

				common::require_non_empty(HOP, "data.access_token", &data.access_token)?;

				Ok::<_, Error>(AccessToken::new(data.access_token))
			})
			.await;

		match &result {
			Ok(_) => obs::record_hop_outcome(HOP, HopOutcome::Success),
			Err(_) => obs::record_hop_outcome(HOP, HopOutcome::Failure),
		}

		result
	}
}
impl<C> Debug for TokenAcquirer<C>
where
	C: UpstreamHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenAcquirer")
			.field("endpoint", &self.endpoint.as_str())
			.field("timeout", &self.timeout)
			.finish()
	}
}
