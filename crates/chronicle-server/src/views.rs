//! Views of the JSON API
//!
//! Each view returns a [`Response`] or a [`ViewError`]; the application maps
//! errors to responses in one place.

use crate::app::App;
use crate::error::ViewError;
use crate::payload::{CommentPayload, CommentView, RecordPayload, RecordView};
use crate::request::Request;
use crate::response::Response;
use chronicle_db::{User, comments, query, records};
use serde_json::json;

/// `GET /`: published records filtered by the query string
pub async fn list_records(app: &App, request: &Request) -> Result<Response, ViewError> {
	let found = query::select_records_from_query(app.pool(), request.query()).await?;
	let storage = app.records().storage();
	let records: Vec<RecordView> = found
		.into_iter()
		.map(|record| RecordView::new(record, storage))
		.collect();
	Response::ok().with_json(&json!({ "records": records }))
}

/// `GET /records/{slug}/`: a published record with its comment tree
pub async fn record_detail(app: &App, slug: &str) -> Result<Response, ViewError> {
	let record = records::get_published_by_slug(app.pool(), slug).await?;
	let comments: Vec<CommentView> = comments::list_for_record(app.pool(), record.id)
		.await?
		.into_iter()
		.map(CommentView::from)
		.collect();
	let record = RecordView::new(record, app.records().storage());
	Response::ok().with_json(&json!({ "record": record, "comments": comments }))
}

/// `POST /records/create/`
pub async fn create_record(app: &App, request: &Request, user: &User) -> Result<Response, ViewError> {
	let payload: RecordPayload = request.json()?;
	let record = app.records().create(user, payload).await?;
	let view = RecordView::new(record, app.records().storage());
	Response::created()
		.with_location(&view.url)
		.with_json(&view)
}

/// `POST /records/{slug}/update/`
pub async fn update_record(
	app: &App,
	request: &Request,
	user: &User,
	slug: &str,
) -> Result<Response, ViewError> {
	let payload: RecordPayload = request.json()?;
	let record = app.records().update(user, slug, payload).await?;
	Response::ok().with_json(&RecordView::new(record, app.records().storage()))
}

/// `POST /records/{id}/comments/create/`
pub async fn create_comment(
	app: &App,
	request: &Request,
	user: &User,
	record_id: i64,
) -> Result<Response, ViewError> {
	let payload: CommentPayload = request.payload()?;
	let comment = comments::create_comment(app.pool(), record_id, user, payload.into()).await?;
	Response::created().with_json(&CommentView::from(comment))
}
