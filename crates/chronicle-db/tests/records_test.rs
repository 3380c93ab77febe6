//! Record creation, slug assignment and updates

use chrono::NaiveDate;
use chronicle_db::{
	DbError, NewRecord, RecordChanges, Status, User, pool, records, schema, slug, users,
};
use rstest::rstest;
use sqlx::SqlitePool;

async fn setup() -> (SqlitePool, User) {
	let pool = pool::connect_in_memory().await.unwrap();
	schema::create_schema(&pool).await.unwrap();
	let author = users::get_or_create_user(&pool, "ann").await.unwrap();
	(pool, author)
}

fn titled(title: &str) -> NewRecord {
	NewRecord {
		title: title.to_string(),
		..Default::default()
	}
}

#[tokio::test]
async fn test_identical_titles_get_distinct_slugs() {
	// Arrange
	let (pool, author) = setup().await;

	// Act
	let first = records::create_record(&pool, &author, titled("Summer Fair"))
		.await
		.unwrap();
	let second = records::create_record(&pool, &author, titled("Summer Fair"))
		.await
		.unwrap();

	// Assert
	assert_eq!(first.slug, "summer-fair");
	assert_ne!(first.slug, second.slug);
	let suffix = second.slug.strip_prefix("summer-fair-").unwrap();
	assert_eq!(suffix.len(), slug::SUFFIX_LENGTH);
	assert!(suffix.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
}

#[tokio::test]
async fn test_created_record_defaults() {
	// Arrange
	let (pool, author) = setup().await;
	let new = NewRecord {
		title: "  Harbour opening ".into(),
		date_happened: NaiveDate::from_ymd_opt(1910, 5, 14),
		tags_places: vec!["Odessa".into(), "Odessa".into(), " ".into()],
		tags_people: vec!["Mayor".into()],
		..Default::default()
	};

	// Act
	let record = records::create_record(&pool, &author, new).await.unwrap();

	// Assert
	assert_eq!(record.title, "Harbour opening");
	assert_eq!(record.status, Status::Published);
	assert_eq!(record.author, author);
	assert_eq!(record.tags_places, vec!["Odessa"]);
	assert_eq!(record.tags_people, vec!["Mayor"]);
	assert!(record.updaters.is_empty());
	assert_eq!(record.time_create, record.time_update);
}

#[tokio::test]
async fn test_explicit_slug_collision_is_a_conflict() {
	let (pool, author) = setup().await;
	let mut new = titled("One");
	new.slug = Some("shared".into());
	records::create_record(&pool, &author, new.clone()).await.unwrap();

	let result = records::create_record(&pool, &author, new).await;

	assert!(matches!(result, Err(DbError::Conflict(_))));
}

#[rstest]
#[case("")]
#[case("   ")]
#[tokio::test]
async fn test_blank_title_is_rejected(#[case] title: &str) {
	let (pool, author) = setup().await;

	let result = records::create_record(&pool, &author, titled(title)).await;

	assert!(matches!(result, Err(DbError::Validation(_))));
}

#[tokio::test]
async fn test_overlong_short_description_is_rejected() {
	let (pool, author) = setup().await;
	let mut new = titled("Long");
	new.short_description = "x".repeat(chronicle_db::MAX_SHORT_DESCRIPTION_LENGTH + 1);

	let result = records::create_record(&pool, &author, new).await;

	assert!(matches!(result, Err(DbError::Validation(_))));
}

#[tokio::test]
async fn test_drafts_are_hidden_from_published_lookup() {
	// Arrange
	let (pool, author) = setup().await;
	let mut new = titled("Draft");
	new.status = Status::Draft;
	let draft = records::create_record(&pool, &author, new).await.unwrap();

	// Act
	let published = records::get_published_by_slug(&pool, &draft.slug).await;
	let any = records::get_by_slug(&pool, &draft.slug).await.unwrap();

	// Assert
	assert!(matches!(published, Err(DbError::NotFound(_))));
	assert_eq!(any.id, draft.id);
}

#[tokio::test]
async fn test_update_appends_updater_once() {
	// Arrange
	let (pool, author) = setup().await;
	let editor = users::get_or_create_user(&pool, "bob").await.unwrap();
	let record = records::create_record(&pool, &author, titled("Edited"))
		.await
		.unwrap();
	let changes = RecordChanges {
		title: Some("Edited twice".into()),
		tags_people: Some(vec!["Bob".into()]),
		..Default::default()
	};

	// Act
	records::update_record(&pool, &editor, &record.slug, changes.clone())
		.await
		.unwrap();
	let updated = records::update_record(&pool, &editor, &record.slug, changes)
		.await
		.unwrap();

	// Assert
	assert_eq!(updated.title, "Edited twice");
	assert_eq!(updated.slug, record.slug);
	assert_eq!(updated.updaters, vec![editor]);
	assert_eq!(updated.tags_people, vec!["Bob"]);
	assert!(updated.time_update >= record.time_update);
	assert_eq!(updated.time_create, record.time_create);
}

#[tokio::test]
async fn test_update_keeps_other_namespace_tags() {
	let (pool, author) = setup().await;
	let mut new = titled("Tagged");
	new.tags_places = vec!["Kyiv".into()];
	new.tags_people = vec!["Ada".into()];
	let record = records::create_record(&pool, &author, new).await.unwrap();

	let changes = RecordChanges {
		tags_people: Some(vec![]),
		..Default::default()
	};
	let updated = records::update_record(&pool, &author, &record.slug, changes)
		.await
		.unwrap();

	assert_eq!(updated.tags_places, vec!["Kyiv"]);
	assert!(updated.tags_people.is_empty());
}

#[tokio::test]
async fn test_update_to_taken_slug_conflicts() {
	let (pool, author) = setup().await;
	records::create_record(&pool, &author, titled("First")).await.unwrap();
	let second = records::create_record(&pool, &author, titled("Second"))
		.await
		.unwrap();

	let changes = RecordChanges {
		slug: Some("first".into()),
		..Default::default()
	};
	let result = records::update_record(&pool, &author, &second.slug, changes).await;

	assert!(matches!(result, Err(DbError::Conflict(_))));
}

#[tokio::test]
async fn test_update_of_missing_record_is_not_found() {
	let (pool, author) = setup().await;

	let result = records::update_record(&pool, &author, "nope", RecordChanges::default()).await;

	assert!(matches!(result, Err(DbError::NotFound(_))));
}

#[tokio::test]
async fn test_set_thumbnail() {
	let (pool, author) = setup().await;
	let record = records::create_record(&pool, &author, titled("Pic")).await.unwrap();

	records::set_thumbnail(&pool, record.id, Some("images/thumbnails/2024/01/01/pic.jpg"))
		.await
		.unwrap();

	let reloaded = records::get_by_id(&pool, record.id).await.unwrap();
	assert_eq!(
		reloaded.thumbnail.as_deref(),
		Some("images/thumbnails/2024/01/01/pic.jpg")
	);
	assert!(matches!(
		records::set_thumbnail(&pool, 999, None).await,
		Err(DbError::NotFound(_))
	));
}
