use crate::auth::{Authenticator, RemoteUserAuthenticator};
use crate::error::ViewError;
use crate::request::Request;
use crate::response::Response;
use crate::router::{self, Route, RouteMatch};
use crate::service::RecordService;
use crate::views;
use async_trait::async_trait;
use chronicle_conf::Settings;
use chronicle_db::{User, users};
use chronicle_storage::{MediaStorage, ThumbnailSpec};
use hyper::StatusCode;
use hyper::header::ALLOW;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Something that turns a request into a response
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> Response;
}

/// The chronicle application: routing, authentication and views
///
/// # Examples
///
/// ```no_run
/// use chronicle_conf::Settings;
/// use chronicle_db::{pool, schema};
/// use chronicle_server::App;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = Settings::default();
/// let pool = pool::connect(&settings.database).await?;
/// schema::create_schema(&pool).await?;
/// let app = App::new(&settings, pool);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct App {
	pool: SqlitePool,
	records: RecordService,
	authenticator: Arc<dyn Authenticator>,
	login_url: String,
}

impl App {
	pub fn new(settings: &Settings, pool: SqlitePool) -> Self {
		let storage = MediaStorage::from_settings(&settings.media);
		let records = RecordService::new(
			pool.clone(),
			storage,
			ThumbnailSpec::from(&settings.thumbnails),
		);
		Self {
			pool,
			records,
			authenticator: Arc::new(RemoteUserAuthenticator::from_settings(&settings.auth)),
			login_url: settings.auth.login_url.clone(),
		}
	}

	/// Replace the default remote-user authenticator
	pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
		self.authenticator = Arc::new(authenticator);
		self
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	pub fn records(&self) -> &RecordService {
		&self.records
	}

	/// Route a request and render the outcome
	pub async fn dispatch(&self, request: Request) -> Response {
		let route = match router::resolve(&request.method, request.path()) {
			RouteMatch::Found(route) => route,
			RouteMatch::MethodNotAllowed(allowed) => {
				return Response::new(StatusCode::METHOD_NOT_ALLOWED)
					.with_header(ALLOW.as_str(), allowed.as_str());
			}
			RouteMatch::NotFound => {
				return Response::error(&ViewError::NotFound(request.path().to_string()));
			}
		};

		match self.run(&route, &request).await {
			Ok(response) => response,
			Err(ViewError::Unauthenticated) => self.unauthenticated(&request),
			Err(error) => {
				if error.status().is_server_error() {
					if let ViewError::Internal(detail) = &error {
						tracing::error!(path = %request.path(), detail = %detail, "request failed");
					}
				} else {
					tracing::warn!(path = %request.path(), status = %error.status(), error = %error, "request rejected");
				}
				Response::error(&error)
			}
		}
	}

	async fn run(&self, route: &Route, request: &Request) -> Result<Response, ViewError> {
		let user = if route.requires_auth() {
			Some(self.current_user(request).await?)
		} else {
			None
		};

		match (route, user.as_ref()) {
			(Route::Home, _) => views::list_records(self, request).await,
			(Route::RecordDetail { slug }, _) => views::record_detail(self, slug).await,
			(Route::CreateRecord, Some(user)) => views::create_record(self, request, user).await,
			(Route::UpdateRecord { slug }, Some(user)) => {
				views::update_record(self, request, user, slug).await
			}
			(Route::CreateComment { record_id }, Some(user)) => {
				views::create_comment(self, request, user, *record_id).await
			}
			(_, None) => Err(ViewError::Unauthenticated),
		}
	}

	async fn current_user(&self, request: &Request) -> Result<User, ViewError> {
		let identity = self
			.authenticator
			.authenticate(request)
			.await
			.ok_or(ViewError::Unauthenticated)?;
		Ok(users::get_or_create_user(&self.pool, &identity.username).await?)
	}

	/// 401 for scripts, a login redirect for pages
	fn unauthenticated(&self, request: &Request) -> Response {
		if request.is_ajax() {
			return Response::error(&ViewError::Unauthenticated);
		}

		let next = serde_urlencoded::to_string([("next", request.full_path())]).unwrap_or_default();
		let separator = if self.login_url.contains('?') { '&' } else { '?' };
		Response::found(&format!("{}{}{}", self.login_url, separator, next))
	}
}

#[async_trait]
impl Handler for App {
	async fn handle(&self, request: Request) -> Response {
		self.dispatch(request).await
	}
}
