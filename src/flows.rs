//! Pipeline orchestration: the token broker and the stage clients it drives.

pub mod credentials;
pub mod lifecycle;
pub mod token_exchange;

mod common;

pub use credentials::*;
pub use lifecycle::*;
pub use token_exchange::*;

// std
#[cfg(feature = "reqwest")] use std::sync::OnceLock;
// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	config::PipelineConfig,
	flows::common::StageTransport,
	http::{PipelineHttpClient, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::{
	error::ConfigError,
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenBroker = TokenBroker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

#[cfg(feature = "reqwest")]
static SHARED: OnceLock<ReqwestTokenBroker> = OnceLock::new();

/// Returns the process-wide broker built from the fixed configuration.
///
/// The instance starts [`Empty`](crate::auth::TokenStatus::Empty) and lives for the rest of the
/// process; [`TokenBroker::invalidate`] is its teardown. Construction failures are returned and
/// retried on the next call.
#[cfg(feature = "reqwest")]
pub fn shared() -> Result<&'static ReqwestTokenBroker> {
	if let Some(broker) = SHARED.get() {
		return Ok(broker);
	}

	let broker = ReqwestTokenBroker::fixed()?;

	Ok(SHARED.get_or_init(|| broker))
}

/// Produces and caches the bearer token for protected API calls.
///
/// The broker owns the pipeline configuration, both stage clients, the clock, and the only
/// mutable state in the crate: the cached [`TokenState`]. Clones share that state, the metrics,
/// and the single-flight guard, so every clone observes the same token.
pub struct TokenBroker<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Configuration shared by every stage.
	pub config: Arc<PipelineConfig>,
	/// Counters for pipeline runs, cache hits, and invalidations.
	pub metrics: Arc<PipelineMetrics>,
	credential_client: CredentialExchangeClient<C, M>,
	token_client: TokenExchangeClient<C, M>,
	clock: Arc<dyn Clock>,
	state: Arc<Mutex<TokenState>>,
	flow_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> TokenBroker<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: PipelineConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let config = Arc::new(config);
		let clock: Arc<dyn Clock> = Arc::new(SystemClock);
		let transport =
			StageTransport::new(http_client.into(), mapper.into(), config.request_timeout);

		Self {
			credential_client: CredentialExchangeClient::new(transport.clone(), config.clone()),
			token_client: TokenExchangeClient::new(transport, config.clone(), clock.clone()),
			config,
			metrics: Default::default(),
			clock,
			state: Default::default(),
			flow_guard: Default::default(),
		}
	}

	/// Replaces the clock used for expiry checks and request signing.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.token_client = self.token_client.with_clock(clock.clone());
		self.clock = clock;

		self
	}

	/// Client for discovery, identity, and credential acquisition.
	pub fn credential_client(&self) -> &CredentialExchangeClient<C, M> {
		&self.credential_client
	}

	/// Client for the signed token exchange.
	pub fn token_client(&self) -> &TokenExchangeClient<C, M> {
		&self.token_client
	}
}
#[cfg(feature = "reqwest")]
impl TokenBroker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a broker for `config` that provisions its own reqwest transport.
	pub fn new(config: PipelineConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}

	/// Creates a broker for the fixed production configuration.
	pub fn fixed() -> Result<Self> {
		let config = PipelineConfig::fixed()?;
		let client = ReqwestClient::builder().build().map_err(ConfigError::from)?;

		Ok(Self::with_http_client(
			config,
			ReqwestHttpClient::with_client(client),
			ReqwestTransportErrorMapper,
		))
	}
}
impl<C, M> Clone for TokenBroker<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			metrics: self.metrics.clone(),
			credential_client: self.credential_client.clone(),
			token_client: self.token_client.clone(),
			clock: self.clock.clone(),
			state: self.state.clone(),
			flow_guard: self.flow_guard.clone(),
		}
	}
}
impl<C, M> Debug for TokenBroker<C, M>
where
	C: ?Sized + PipelineHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenBroker")
			.field("config", &self.config)
			.field("state", &*self.state.lock())
			.field("metrics", &self.metrics)
			.finish()
	}
}
