#![cfg(feature = "postgres")]

use sqlx::PgPool;
use ymate_query::prelude::*;

#[derive(Entity, Debug, Clone, PartialEq, sqlx::FromRow)]
#[entity(name = "ymq_pg_user")]
struct PgUser {
    #[column(primary_key, autoincrement)]
    id: Option<i64>,
    #[column(length = 32)]
    name: String,
}

fn postgres() -> QueryContext {
    QueryContext::for_database(DatabaseType::Postgresql)
}

fn user(name: &str) -> PgUser {
    PgUser {
        id: None,
        name: name.to_owned(),
    }
}

#[tokio::test]
async fn postgres_crud_smoke() {
    let pool = match get_pg_pool().await {
        Some(pool) => pool,
        None => return,
    };
    let table = postgres().table(PgUser::entity_meta()).if_exists_or_not(true);
    sqlx::query(&table.to_drop_sql()).execute(&pool).await.ok();
    sqlx::query(&table.to_create_sql())
        .execute(&pool)
        .await
        .expect("create");

    let sql = EntitySql::<PgUser>::new(postgres());
    for name in ["ann", "bob", "cid"] {
        sql.insert(&user(name)).unwrap().on(&pool).execute().await.expect("insert");
    }

    let found: Option<PgUser> = sql
        .find_by_pk(params![2])
        .unwrap()
        .on(&pool)
        .find_first()
        .await
        .expect("find");
    assert_eq!(found.map(|u| u.name), Some("bob".to_owned()));

    let page: PageResult<PgUser> = postgres()
        .select_from("ymq_pg_user")
        .where_(
            Cond::new()
                .gt("id")
                .param(0)
                .build_where()
                .order_by_asc("id"),
        )
        .to_sql()
        .on(&pool)
        .find_page(Page::new(2).page_size(2))
        .await
        .expect("page");
    assert_eq!(page.record_count, Some(3));
    assert_eq!(page.rows.len(), 1);
    assert_eq!(page.rows[0].id, Some(3));

    let first: Option<(String,)> = Sql::new("SELECT name FROM ymq_pg_user ORDER BY id", Params::new())
        .on(&pool)
        .find_first()
        .await
        .expect("contextless find_first");
    assert_eq!(first, Some(("ann".to_owned(),)));

    let updated = postgres()
        .update("ymq_pg_user")
        .set("name", "bobby")
        .where_(Cond::new().eq("id").param(2).build_where())
        .to_sql()
        .on(&pool)
        .execute()
        .await
        .expect("update");
    assert_eq!(updated, 1);

    let deleted = sql
        .delete_by_pk_values(params![1])
        .unwrap()
        .on(&pool)
        .execute()
        .await
        .expect("delete");
    assert_eq!(deleted, 1);

    sqlx::query(&table.to_drop_sql()).execute(&pool).await.ok();
}

async fn get_pg_pool() -> Option<PgPool> {
    let db_url = std::env::var("DATABASE_URL").ok()?;
    if !db_url.starts_with("postgres://") && !db_url.starts_with("postgresql://") {
        return None;
    }
    sqlx::PgPool::connect(&db_url).await.ok()
}
