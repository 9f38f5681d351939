#![cfg(feature = "sqlite")]

use std::sync::OnceLock;

use futures_util::TryStreamExt;
use ymate_query_core::prelude::*;
use ymate_query_core::test_utils::{MockDatabase, with_test_transaction};

const SCHEMA: &str = "
-- accounts used by the execution tests
CREATE TABLE account (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(32) NOT NULL,
    score BIGINT NOT NULL DEFAULT 0
);
INSERT INTO account (name, score) VALUES ('ann', 10);
INSERT INTO account (name, score) VALUES ('bob', 20);
INSERT INTO account (name, score) VALUES ('cid', 30);
";

#[derive(Debug, sqlx::FromRow, PartialEq)]
struct Account {
    id: Option<i64>,
    name: String,
    score: i64,
}

impl Entity for Account {
    fn entity_meta() -> &'static EntityMeta {
        static META: OnceLock<EntityMeta> = OnceLock::new();
        META.get_or_init(|| {
            EntityMeta::new("account")
                .primary_key("id")
                .property(PropertyMeta::new("id", FieldType::Long).autoincrement(true))
                .property(PropertyMeta::new("name", FieldType::Varchar).length(32))
                .property(PropertyMeta::new("score", FieldType::Long))
        })
    }

    fn field_value(&self, name: &str) -> Option<BindValue> {
        match name {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.as_str().into()),
            "score" => Some(self.score.into()),
            _ => None,
        }
    }
}

fn sqlite() -> QueryContext {
    QueryContext::for_database(DatabaseType::Sqlite)
}

async fn setup() -> MockDatabase<sqlx::Sqlite> {
    MockDatabase::with_schema(SCHEMA).await.expect("schema")
}

#[tokio::test]
async fn select_find_all_and_first() {
    let db = setup().await;
    let select = sqlite().select_from("account").where_(
        Cond::new()
            .gt_eq("score")
            .param(20)
            .build_where()
            .order_by_asc("name"),
    );
    let rows: Vec<Account> = select.to_sql().on(db.pool()).find_all().await.unwrap();
    let names: Vec<&str> = rows.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["bob", "cid"]);

    let first: Option<Account> = select.to_sql().on(db.pool()).find_first().await.unwrap();
    assert_eq!(first.map(|a| a.name), Some("bob".to_owned()));
}

#[tokio::test]
async fn find_page_counts_then_pages() {
    let db = setup().await;
    let sql = sqlite()
        .select_from("account")
        .where_(Where::new().order_by_desc("score"))
        .to_sql();

    let page: PageResult<Account> = sql
        .clone()
        .on(db.pool())
        .find_page(Page::new(2).page_size(2))
        .await
        .unwrap();
    assert_eq!(page.record_count, Some(3));
    assert_eq!(page.page_count, Some(2));
    assert_eq!(page.rows.len(), 1);
    assert_eq!(page.rows[0].name, "ann");

    assert_eq!(sql.on(db.pool()).count().await.unwrap(), 3);
}

#[tokio::test]
async fn empty_count_skips_row_query() {
    let db = setup().await;
    let sql = sqlite()
        .select_from("account")
        .where_(Cond::new().eq("name").param("nobody").build_where())
        .to_sql();
    let page: PageResult<Account> = sql.on(db.pool()).find_page(Page::new(1)).await.unwrap();
    assert!(page.is_empty());
    assert_eq!(page.record_count, Some(0));
}

#[tokio::test]
async fn update_and_delete_report_affected_rows() {
    let db = setup().await;
    let ctx = sqlite();
    let updated = ctx
        .update("account")
        .set("score", 99)
        .where_(Cond::new().lt("score").param(25).build_where())
        .to_sql()
        .on(db.pool())
        .execute()
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let deleted = ctx
        .delete("account")
        .where_(Cond::new().in_params("name", params!["ann", "cid"]).build_where())
        .to_sql()
        .on(db.pool())
        .execute()
        .await
        .unwrap();
    assert_eq!(deleted, 2);
}

#[tokio::test]
async fn stream_yields_every_row() {
    let db = setup().await;
    let rows: Vec<Account> = sqlite()
        .select_from("account")
        .to_sql()
        .on(db.pool())
        .fetch_stream()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn entity_statements_round_trip() {
    let db = setup().await;
    let entity_sql = EntitySql::<Account>::new(sqlite());
    let mut account = Account {
        id: None,
        name: "dee".to_owned(),
        score: 5,
    };
    let id = entity_sql
        .insert(&account)
        .unwrap()
        .on(db.pool())
        .execute_insert_id()
        .await
        .unwrap();
    assert_eq!(id, 4);
    account.id = Some(id);

    account.score = 50;
    let updated = entity_sql
        .update_by_pk(&account)
        .unwrap()
        .on(db.pool())
        .execute()
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let found: Option<Account> = entity_sql
        .find_by_pk(params![id])
        .unwrap()
        .on(db.pool())
        .find_first()
        .await
        .unwrap();
    assert_eq!(found.as_ref(), Some(&account));

    let deleted = entity_sql
        .delete_by_pk(&account)
        .unwrap()
        .on(db.pool())
        .execute()
        .await
        .unwrap();
    assert_eq!(deleted, 1);
}

#[tokio::test]
async fn batch_runs_template_and_statements_in_order() {
    let db = setup().await;
    let insert = sqlite().insert("account").field("name").field("score");
    let batch = BatchSql::from_insert(&insert)
        .add_parameter(params!["eve", 1])
        .unwrap()
        .add_parameter(params!["fay", 2])
        .unwrap()
        .add_sql("DELETE FROM account WHERE score < 3");
    let counts = batch.execute(db.pool()).await.unwrap();
    assert_eq!(counts, vec![1, 1, 2]);
    assert_eq!(
        sqlite().select_from("account").to_sql().on(db.pool()).count().await.unwrap(),
        3
    );
}

#[tokio::test]
async fn failed_batch_rolls_back() {
    let db = setup().await;
    let batch = BatchSql::new(None)
        .add_sql("DELETE FROM account")
        .add_sql("DELETE FROM missing_table");
    assert!(batch.execute(db.pool()).await.is_err());
    assert_eq!(
        sqlite().select_from("account").to_sql().on(db.pool()).count().await.unwrap(),
        3
    );
}

#[tokio::test]
async fn generated_ddl_runs_on_sqlite() {
    let db = MockDatabase::new_sqlite().await.unwrap();
    let meta = EntityMeta::new("tag")
        .primary_key("id")
        .property(PropertyMeta::new("id", FieldType::Long).nullable(false))
        .property(PropertyMeta::new("label", FieldType::Varchar).length(16))
        .index(IndexMeta::new("uk_label", true, ["label"]));
    let table = sqlite().table(&meta).if_exists_or_not(true);
    let created = BatchSql::exec_sql(db.pool(), &BatchSql::load_sql(&table.to_create_sql()))
        .await
        .unwrap();
    assert_eq!(created, 0);

    let insert = sqlite().insert("tag").field_value("id", 1).field_value("label", "x");
    insert.to_sql().on(db.pool()).execute().await.unwrap();
    let duplicate = sqlite().insert("tag").field_value("id", 2).field_value("label", "x");
    assert!(duplicate.to_sql().on(db.pool()).execute().await.is_err());

    sqlx::query(&table.to_drop_sql()).execute(db.pool()).await.unwrap();
}

#[tokio::test]
async fn transaction_helper_rolls_back() {
    let db = setup().await;
    let deleted = with_test_transaction(db.pool(), |conn| {
        Box::pin(async move {
            sqlx::query("DELETE FROM account")
                .execute(&mut *conn)
                .await
                .map(|r| r.rows_affected())
        })
    })
    .await
    .unwrap();
    assert_eq!(deleted, 3);
    assert_eq!(
        sqlite().select_from("account").to_sql().on(db.pool()).count().await.unwrap(),
        3
    );
}

#[tokio::test]
async fn statements_run_inside_a_transaction() {
    let db = setup().await;
    let mut tx = db.pool().begin().await.unwrap();
    let deleted = sqlite()
        .delete("account")
        .to_sql()
        .on(&mut tx)
        .execute()
        .await
        .unwrap();
    assert_eq!(deleted, 3);
    tx.rollback().await.unwrap();
    assert_eq!(
        sqlite().select_from("account").to_sql().on(db.pool()).count().await.unwrap(),
        3
    );
}
