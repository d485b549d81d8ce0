use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use quill_orm::prelude::*;
use quill_orm::sqlx::Sqlite;
use quill_orm::test_utils::{file_pool, memory_pool};

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id() -> String {
    format!("{:015}", SEQUENCE.fetch_add(1, Ordering::SeqCst))
}

#[derive(Model, Debug, Clone, PartialEq)]
#[quill(table = "posts")]
struct Post {
    #[quill(primary_key, column_type = "varchar(50)", default = "next_id")]
    id: Option<String>,
    title: String,
    #[quill(kind = "text")]
    body: Option<String>,
    views: i64,
    published: bool,
    score: f64,
}

#[derive(Model, Debug)]
struct TwoKeys {
    #[quill(primary_key)]
    a: i64,
    #[quill(primary_key)]
    b: i64,
}

fn post(title: &str) -> Post {
    Post {
        id: None,
        title: title.to_owned(),
        body: None,
        views: 0,
        published: false,
        score: 0.0,
    }
}

async fn setup() -> Pool<Sqlite> {
    let pool = memory_pool().await.expect("pool");
    Quill::sync::<Sqlite, Post>(&pool).await.expect("sync");
    pool
}

#[tokio::test]
async fn save_then_find_returns_saved_values() {
    let pool = setup().await;
    let mut first = post("hello");
    first.body = Some("world".into());
    first.score = 4.5;
    assert_eq!(first.save(&pool).await.unwrap(), WriteOutcome::Success);

    let id = first.id.clone().expect("default id written back");
    assert!(!id.is_empty());
    let loaded = Post::find(&pool, id.as_str()).await.unwrap().unwrap();
    assert_eq!(loaded, first);
}

#[tokio::test]
async fn producer_ids_are_distinct_across_saves() {
    let pool = setup().await;
    let mut a = post("a");
    let mut b = post("b");
    a.save(&pool).await.unwrap();
    b.save(&pool).await.unwrap();
    assert_ne!(a.id, b.id);

    let count = Post::find_number(&pool, "count(id)", None, vec![]).await.unwrap();
    assert_eq!(count, Some(Value::Int(2)));
}

#[tokio::test]
async fn find_missing_key_is_none() {
    let pool = setup().await;
    assert!(Post::find(&pool, "nope").await.unwrap().is_none());
}

#[tokio::test]
async fn update_changes_only_the_target_row() {
    let pool = setup().await;
    let mut target = post("target");
    let mut other = post("other");
    target.save(&pool).await.unwrap();
    other.save(&pool).await.unwrap();

    target.title = "edited".into();
    target.published = true;
    assert!(target.update(&pool).await.unwrap().is_success());

    let reloaded_target = Post::find(&pool, target.id.clone()).await.unwrap().unwrap();
    let reloaded_other = Post::find(&pool, other.id.clone()).await.unwrap().unwrap();
    assert_eq!(reloaded_target.title, "edited");
    assert!(reloaded_target.published);
    assert_eq!(reloaded_other, other);
}

#[tokio::test]
async fn update_of_missing_row_is_not_found() {
    let pool = setup().await;
    let mut ghost = post("ghost");
    ghost.id = Some("missing".into());
    let outcome = ghost.update(&pool).await.unwrap();
    assert_eq!(outcome, WriteOutcome::NotFound);
    assert!(matches!(
        outcome.ensure_applied("update", "posts"),
        Err(OrmError::RowCount { actual: 0, .. })
    ));
}

#[tokio::test]
async fn update_and_remove_require_a_primary_key() {
    let pool = setup().await;
    let mut unsaved = post("unsaved");
    assert!(matches!(
        unsaved.update(&pool).await,
        Err(OrmError::PrimaryKeyUnset { .. })
    ));
    assert!(matches!(
        unsaved.remove(&pool).await,
        Err(OrmError::PrimaryKeyUnset { .. })
    ));
}

#[tokio::test]
async fn remove_then_find_is_none() {
    let pool = setup().await;
    let mut doomed = post("doomed");
    doomed.save(&pool).await.unwrap();
    let id = doomed.id.clone();

    assert!(doomed.remove(&pool).await.unwrap().is_success());
    assert!(Post::find(&pool, id).await.unwrap().is_none());
}

#[tokio::test]
async fn find_all_pages_are_contiguous_slices() {
    let pool = setup().await;
    for views in 0..7 {
        let mut p = post(&format!("p{views}"));
        p.views = views;
        p.save(&pool).await.unwrap();
    }

    let page = Post::find_all(&pool, FindOptions::new().order_by("`views` desc").page(2, 3))
        .await
        .unwrap();
    let views: Vec<i64> = page.iter().map(|p| p.views).collect();
    assert_eq!(views, vec![4, 3, 2]);

    let tail = Post::find_all(&pool, FindOptions::new().order_by("`views`").page(5, 10))
        .await
        .unwrap();
    assert_eq!(tail.len(), 2);

    let first_two = Post::find_all(&pool, FindOptions::new().order_by("`views`").limit(2))
        .await
        .unwrap();
    assert_eq!(first_two.iter().map(|p| p.views).collect::<Vec<_>>(), vec![0, 1]);
}

#[tokio::test]
async fn find_all_and_find_number_bind_filter_arguments() {
    let pool = setup().await;
    for (title, published) in [("a", true), ("b", false), ("c", true)] {
        let mut p = post(title);
        p.published = published;
        p.save(&pool).await.unwrap();
    }

    let published = Post::find_all(
        &pool,
        FindOptions::new()
            .filter("`published`=?")
            .bind(true)
            .order_by("`title`"),
    )
    .await
    .unwrap();
    assert_eq!(
        published.iter().map(|p| p.title.as_str()).collect::<Vec<_>>(),
        vec!["a", "c"]
    );

    let drafts = Post::find_number(&pool, "count(id)", Some("`published`=?"), vec![Value::Bool(false)])
        .await
        .unwrap();
    assert_eq!(drafts.and_then(|v| v.as_i64()), Some(1));
}

#[tokio::test]
async fn registration_rejects_two_primary_keys() {
    let err = Quill::register::<Sqlite, TwoKeys>().unwrap_err();
    assert!(err.to_string().contains("more than one primary key"));

    let pool = memory_pool().await.unwrap();
    assert!(matches!(
        TwoKeys::find(&pool, 1).await,
        Err(OrmError::Schema(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_saves_with_distinct_keys_do_not_interfere() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(&dir.path().join("quill.db"), 4).await.unwrap();
    Quill::sync::<Sqlite, Post>(&pool).await.unwrap();

    let tasks = (0..16).map(|i| {
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut p = post(&format!("concurrent-{i}"));
            p.views = i;
            p.save(&pool).await.map(|outcome| (outcome, p))
        })
    });

    let mut saved = Vec::new();
    for joined in join_all(tasks).await {
        let (outcome, p) = joined.unwrap().unwrap();
        assert!(outcome.is_success());
        saved.push(p);
    }
    assert!(pool.size() <= 4);

    for p in &saved {
        let loaded = Post::find(&pool, p.id.clone()).await.unwrap().unwrap();
        assert_eq!(&loaded, p);
    }
    let total = Post::find_number(&pool, "count(id)", None, vec![]).await.unwrap();
    assert_eq!(total, Some(Value::Int(16)));

    pool.close().await;
}

#[derive(Clone)]
struct TestWriter(Arc<Mutex<Vec<u8>>>);

impl Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn statements_are_logged_without_argument_values() {
    let pool = setup().await;

    let buffer = Arc::new(Mutex::new(Vec::new()));
    let make_writer = {
        let buffer = buffer.clone();
        move || TestWriter(buffer.clone())
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(make_writer)
        .without_time()
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut secret = post("top-secret-title");
    secret.save(&pool).await.unwrap();

    let logs = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("INSERT INTO `posts`"));
    assert!(logs.contains("args=6"));
    assert!(!logs.contains("top-secret-title"));
}
