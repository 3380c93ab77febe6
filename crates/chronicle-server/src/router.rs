//! URL routing
//!
//! | Method | Path                              | Route            |
//! |--------|-----------------------------------|------------------|
//! | GET    | `/`                               | `Home`           |
//! | POST   | `/records/create/`                | `CreateRecord`   |
//! | GET    | `/records/{slug}/`                | `RecordDetail`   |
//! | POST   | `/records/{slug}/update/`         | `UpdateRecord`   |
//! | POST   | `/records/{id}/comments/create/`  | `CreateComment`  |

use hyper::Method;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
	Home,
	CreateRecord,
	RecordDetail { slug: String },
	UpdateRecord { slug: String },
	CreateComment { record_id: i64 },
}

impl Route {
	pub fn method(&self) -> Method {
		match self {
			Route::Home | Route::RecordDetail { .. } => Method::GET,
			Route::CreateRecord | Route::UpdateRecord { .. } | Route::CreateComment { .. } => {
				Method::POST
			}
		}
	}

	/// Whether the route acts on behalf of a signed-in user
	pub fn requires_auth(&self) -> bool {
		self.method() == Method::POST
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
	Found(Route),
	/// Path exists but not for this method; carries the allowed method
	MethodNotAllowed(Method),
	NotFound,
}

fn match_path(path: &str) -> Option<Route> {
	let segments: Vec<&str> = path
		.strip_prefix('/')?
		.strip_suffix('/')
		.unwrap_or(path.trim_start_matches('/'))
		.split('/')
		.collect();

	match segments.as_slice() {
		[""] => Some(Route::Home),
		["records", "create"] => Some(Route::CreateRecord),
		["records", slug] if !slug.is_empty() => Some(Route::RecordDetail {
			slug: slug.to_string(),
		}),
		["records", slug, "update"] if !slug.is_empty() => Some(Route::UpdateRecord {
			slug: slug.to_string(),
		}),
		["records", id, "comments", "create"] => id
			.parse()
			.ok()
			.map(|record_id| Route::CreateComment { record_id }),
		_ => None,
	}
}

/// Match a request line against the route table
pub fn resolve(method: &Method, path: &str) -> RouteMatch {
	match match_path(path) {
		Some(route) if route.method() == *method => RouteMatch::Found(route),
		// HEAD is served like GET without a body on the wire
		Some(route) if *method == Method::HEAD && route.method() == Method::GET => {
			RouteMatch::Found(route)
		}
		Some(route) => RouteMatch::MethodNotAllowed(route.method()),
		None => RouteMatch::NotFound,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Method::GET, "/", RouteMatch::Found(Route::Home))]
	#[case(Method::POST, "/records/create/", RouteMatch::Found(Route::CreateRecord))]
	#[case(Method::GET, "/records/create/", RouteMatch::MethodNotAllowed(Method::POST))]
	#[case(Method::GET, "/records/first-day/", RouteMatch::Found(Route::RecordDetail { slug: "first-day".into() }))]
	#[case(Method::GET, "/records/first-day", RouteMatch::Found(Route::RecordDetail { slug: "first-day".into() }))]
	#[case(Method::POST, "/records/first-day/update/", RouteMatch::Found(Route::UpdateRecord { slug: "first-day".into() }))]
	#[case(Method::POST, "/records/12/comments/create/", RouteMatch::Found(Route::CreateComment { record_id: 12 }))]
	#[case(Method::GET, "/records/12/comments/create/", RouteMatch::MethodNotAllowed(Method::POST))]
	#[case(Method::POST, "/records/twelve/comments/create/", RouteMatch::NotFound)]
	#[case(Method::POST, "/records/first-day/", RouteMatch::MethodNotAllowed(Method::GET))]
	#[case(Method::GET, "/records//", RouteMatch::NotFound)]
	#[case(Method::GET, "/admin/", RouteMatch::NotFound)]
	fn test_resolve(#[case] method: Method, #[case] path: &str, #[case] expected: RouteMatch) {
		assert_eq!(resolve(&method, path), expected);
	}

	#[test]
	fn test_only_writes_require_auth() {
		assert!(!Route::Home.requires_auth());
		assert!(Route::CreateComment { record_id: 1 }.requires_auth());
	}
}
