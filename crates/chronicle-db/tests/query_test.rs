//! Record listing against a seeded database

use chrono::NaiveDate;
use chronicle_db::query::{known_people_tags, resolve, select_records, select_records_from_query};
use chronicle_db::{
	DbError, FilterError, FilterRequest, NewRecord, Record, Status, pool, records, schema, users,
};
use sqlx::SqlitePool;

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
	NaiveDate::from_ymd_opt(y, m, d)
}

struct Seeded {
	pool: SqlitePool,
	all: Vec<Record>,
}

impl Seeded {
	fn slugs(records: &[Record]) -> Vec<&str> {
		records.iter().map(|r| r.slug.as_str()).collect()
	}
}

async fn seed() -> Seeded {
	let pool = pool::connect_in_memory().await.unwrap();
	schema::create_schema(&pool).await.unwrap();
	let author = users::get_or_create_user(&pool, "ann").await.unwrap();

	let fixtures = [
		("alpha", date(2023, 12, 1), vec!["Paris"], vec![], Status::Published),
		("bravo", date(2024, 3, 1), vec!["Paris"], vec!["Lyon"], Status::Published),
		("charlie", date(2024, 9, 1), vec!["Rome"], vec![], Status::Published),
		("delta", date(2024, 3, 1), vec![], vec![], Status::Published),
		("echo", date(2024, 3, 1), vec!["Paris"], vec![], Status::Draft),
		("foxtrot", None, vec!["Paris"], vec![], Status::Published),
	];

	let mut all = Vec::new();
	for (slug, happened, people, places, status) in fixtures {
		let new = NewRecord {
			title: slug.to_uppercase(),
			slug: Some(slug.to_string()),
			status,
			date_happened: happened,
			tags_people: people.into_iter().map(String::from).collect(),
			tags_places: places.into_iter().map(String::from).collect(),
			..Default::default()
		};
		all.push(records::create_record(&pool, &author, new).await.unwrap());
	}

	Seeded { pool, all }
}

#[tokio::test]
async fn test_empty_request_lists_published_newest_first() {
	// Arrange
	let seeded = seed().await;

	// Act
	let records = select_records(&seeded.pool, &FilterRequest::new()).await.unwrap();

	// Assert
	assert_eq!(
		Seeded::slugs(&records),
		vec!["foxtrot", "delta", "charlie", "bravo", "alpha"]
	);
}

#[tokio::test]
async fn test_unrecognized_keys_equal_unfiltered_listing() {
	// Arrange
	let seeded = seed().await;
	let unfiltered = select_records(&seeded.pool, &FilterRequest::new()).await.unwrap();

	// Act
	// Lyon exists only as a place, which never selects records
	let records = select_records_from_query(&seeded.pool, "page=3&Lyon=on&paris=on")
		.await
		.unwrap();

	// Assert
	assert_eq!(records, unfiltered);
}

#[tokio::test]
async fn test_both_dates_without_tags_apply_only_the_lower_bound() {
	// Arrange
	let seeded = seed().await;

	// Act
	let records = select_records_from_query(
		&seeded.pool,
		"start_date=2024-01-01&finish_date=2024-06-01",
	)
	.await
	.unwrap();

	// Assert
	assert_eq!(Seeded::slugs(&records), vec!["delta", "charlie", "bravo"]);
}

#[tokio::test]
async fn test_both_dates_with_tag_apply_both_bounds() {
	// Arrange
	let seeded = seed().await;

	// Act
	let records = select_records_from_query(
		&seeded.pool,
		"start_date=2024-01-01&finish_date=2024-06-01&Paris=on",
	)
	.await
	.unwrap();

	// Assert
	assert_eq!(Seeded::slugs(&records), vec!["bravo"]);
}

#[tokio::test]
async fn test_tag_only_excludes_drafts() {
	let seeded = seed().await;

	let records = select_records_from_query(&seeded.pool, "Paris=on").await.unwrap();

	assert_eq!(Seeded::slugs(&records), vec!["foxtrot", "bravo", "alpha"]);
	assert!(records.iter().all(|r| r.status == Status::Published));
}

#[tokio::test]
async fn test_finish_only_excludes_undated_records() {
	let seeded = seed().await;

	let records = select_records_from_query(&seeded.pool, "finish_date=20240301").await.unwrap();

	assert_eq!(Seeded::slugs(&records), vec!["delta", "bravo", "alpha"]);
}

#[tokio::test]
async fn test_malformed_date_is_a_client_error() {
	let seeded = seed().await;

	let result = select_records_from_query(&seeded.pool, "start_date=2024-99-99").await;

	assert!(matches!(
		result,
		Err(DbError::Filter(FilterError::InvalidDate { .. }))
	));
}

#[tokio::test]
async fn test_sql_agrees_with_in_memory_predicates() {
	// Arrange
	let seeded = seed().await;
	let people = known_people_tags(&seeded.pool).await.unwrap();
	let requests = [
		"",
		"Paris=on",
		"Paris=on&Rome=on",
		"start_date=2024-01-01",
		"finish_date=2024-03-01",
		"start_date=2024-01-01&finish_date=2024-06-01",
		"start_date=2024-01-01&Rome=on",
		"finish_date=2024-06-01&Paris=on",
		"start_date=2023-01-01&finish_date=2024-06-01&Paris=on",
	];

	for raw in requests {
		// Act
		let request = FilterRequest::from_query_string(raw).unwrap();
		let query = resolve(&request, &people).unwrap();
		let from_sql = select_records(&seeded.pool, &request).await.unwrap();

		// Assert
		let mut expected: Vec<&Record> = seeded.all.iter().filter(|r| query.matches(r)).collect();
		expected.reverse();
		assert_eq!(
			Seeded::slugs(&from_sql),
			expected.iter().map(|r| r.slug.as_str()).collect::<Vec<_>>(),
			"request '{}'",
			raw
		);
	}
}

#[tokio::test]
async fn test_known_people_tags_ignore_places() {
	let seeded = seed().await;

	let people = known_people_tags(&seeded.pool).await.unwrap();

	assert!(people.contains("Paris"));
	assert!(people.contains("Rome"));
	assert!(!people.contains("Lyon"));
}

fn assert_send<T: Send>(_: &T) {}

/// Test the listing future can be driven from a multi-threaded server
#[tokio::test]
async fn test_select_records_future_is_send() {
	let seeded = seed().await;
	let request = FilterRequest::from_query_string("Paris=on&start_date=2024-01-01").unwrap();

	let listing = select_records(&seeded.pool, &request);
	assert_send(&listing);

	assert_eq!(Seeded::slugs(&listing.await.unwrap()), vec!["bravo"]);
}
