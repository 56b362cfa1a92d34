// tests/support/mod.rs

#![allow(dead_code)]

use tempfile::TempDir;
use threadline::store::CommentStore;

/// A migrated store on a temporary SQLite file, removed on drop.
pub struct TestDb {
    pub store: CommentStore,
    _dir: TempDir,
}

pub async fn open_store() -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("comments.db").display());

    let store = CommentStore::connect(&url, 5)
        .await
        .expect("Failed to open test database");
    store.migrate().await.expect("Failed to migrate database");

    TestDb { store, _dir: dir }
}

async fn exec(store: &CommentStore, sql: &str) {
    sqlx::query(sql)
        .execute(store.pool())
        .await
        .unwrap_or_else(|e| panic!("fixture statement failed: {e}\n{sql}"));
}

/// Page `apples` with one root comment "pie" posted at epoch 0.
pub async fn single_comment() -> TestDb {
    let db = open_store().await;
    exec(&db.store, "INSERT INTO Users (email, provider, name) VALUES ('a@z.com', 'github', 'A Z')").await;
    exec(&db.store, "INSERT INTO Pages (url) VALUES ('apples')").await;
    exec(&db.store, "INSERT INTO Comments (userId, pageId, postedTime, content) VALUES (1, 1, 0, 'pie')").await;
    exec(&db.store, "INSERT INTO Relations (parentId, childId, depth) VALUES (NULL, 1, 0)").await;
    db
}

/// `single_comment`, hidden at epoch 1.
pub async fn hidden_comment() -> TestDb {
    let db = single_comment().await;
    exec(&db.store, "UPDATE Comments SET hiddenTime = 1").await;
    db
}

/// `single_comment`, deleted at epoch 2.
pub async fn deleted_comment() -> TestDb {
    let db = single_comment().await;
    exec(&db.store, "UPDATE Comments SET deletedTime = 2, content = '' WHERE id = 1").await;
    db
}

/// Page `peaches`: 1 -> 2 -> 3 at depths 0, 1, 2.
pub async fn nested_chain() -> TestDb {
    let db = open_store().await;
    exec(
        &db.store,
        "INSERT INTO Users (email, provider, name) VALUES ('a@z.com', 'github', 'A Z'), ('b@y.org', 'google', 'B Y')",
    )
    .await;
    exec(&db.store, "INSERT INTO Pages (url) VALUES ('peaches')").await;
    exec(
        &db.store,
        "INSERT INTO Comments (userId, pageId, postedTime, content) VALUES (1, 1, 0, 'cobbler'), (2, 1, 1, 'with'), (1, 1, 2, 'icecream')",
    )
    .await;
    exec(
        &db.store,
        "INSERT INTO Relations (parentId, childId, depth) VALUES (NULL, 1, 0), (1, 2, 1), (2, 3, 2)",
    )
    .await;
    db
}

pub const FOREST: [(i64, i64, &str); 13] = [
    (1, 0, "first"),
    (2, 1, "second"),
    (3, 2, "last"),
    (2, 3, "letter"),
    (3, 3, "animal"),
    (1, 4, "ammendment"),
    (3, 5, "of the US constitution is the right to bear arms"),
    (1, 5, "of the english alphabet descends from proto-sinatic script"),
    (3, 5, "is an inverted bull"),
    (2, 7, "christmas"),
    (1, 8, "I gave you my heart"),
    (3, 9, "but then the very next day"),
    (1, 10, "you gave it away"),
];

/// Page `the` with three trees:
///
/// ```text
/// 1 first        2 second          3 last
/// |- 4 letter    |- 6 ammendment   |- 10, 11, 12, 13
/// |  |- 8, 9     |  |- 7
/// |- 5 animal
/// ```
pub async fn comment_forest() -> TestDb {
    let db = open_store().await;
    exec(
        &db.store,
        "INSERT INTO Users (email, provider, name) VALUES ('a@z.com', 'github', 'A Z'), ('b@y.org', 'google', 'B Y'), ('c@x.net', 'twitter', 'C X')",
    )
    .await;
    exec(&db.store, "INSERT INTO Pages (url) VALUES ('the')").await;

    for (user, posted, content) in FOREST {
        sqlx::query("INSERT INTO Comments (userId, pageId, postedTime, content) VALUES (?, 1, ?, ?)")
            .bind(user)
            .bind(posted)
            .bind(content)
            .execute(db.store.pool())
            .await
            .expect("insert forest comment");
    }

    let relations: [(Option<i64>, i64, i64); 13] = [
        (None, 1, 0),
        (None, 2, 0),
        (None, 3, 0),
        (Some(1), 4, 1),
        (Some(1), 5, 1),
        (Some(4), 8, 2),
        (Some(4), 9, 2),
        (Some(2), 6, 1),
        (Some(6), 7, 2),
        (Some(3), 10, 1),
        (Some(3), 11, 1),
        (Some(3), 12, 1),
        (Some(3), 13, 1),
    ];
    for (parent, child, depth) in relations {
        sqlx::query("INSERT INTO Relations (parentId, childId, depth) VALUES (?, ?, ?)")
            .bind(parent)
            .bind(child)
            .bind(depth)
            .execute(db.store.pool())
            .await
            .expect("insert forest relation");
    }
    db
}

pub async fn count_rows(store: &CommentStore, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(store.pool())
        .await
        .expect("count rows")
}

/// Adds page `url` holding one reply chain of `len` comments, each replying
/// to the previous one.
pub async fn reply_chain(store: &CommentStore, url: &str, len: i64) {
    let page_id = store.create_page(url, None).await.expect("create chain page");
    let first = sqlx::query_scalar::<_, i64>("SELECT COALESCE(MAX(id), 0) + 1 FROM Comments")
        .fetch_one(store.pool())
        .await
        .expect("next comment id");

    sqlx::query(
        r#"
        WITH RECURSIVE n (i) AS (SELECT 0 UNION ALL SELECT i + 1 FROM n WHERE i + 1 < ?)
        INSERT INTO Comments (userId, pageId, postedTime, content)
        SELECT 1, ?, i, 'link ' || i FROM n
        "#,
    )
    .bind(len)
    .bind(page_id)
    .execute(store.pool())
    .await
    .expect("insert chain comments");

    sqlx::query(
        r#"
        INSERT INTO Relations (parentId, childId, depth)
        SELECT CASE WHEN id = ? THEN NULL ELSE id - 1 END, id, id - ?
        FROM Comments WHERE pageId = ? ORDER BY id
        "#,
    )
    .bind(first)
    .bind(first)
    .bind(page_id)
    .execute(store.pool())
    .await
    .expect("insert chain relations");
}
