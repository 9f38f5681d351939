use std::path::{Path, PathBuf};
#[cfg(feature = "sqlite")]
use std::str::FromStr;
#[cfg(feature = "sqlite")]
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
#[cfg(feature = "mysql")]
use sqlx::mysql::MySqlPoolOptions;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgPoolOptions;
#[cfg(feature = "sqlite")]
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use ymate_query_core::{BatchSql, DatabaseType, Dialect, EntityMeta, QueryContext};

mod scripts;
use scripts::{Script, collect_scripts};

type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const FALLBACK_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Parser)]
#[command(name = "ymate-query")]
#[command(about = "YMate Query CLI - DDL from entity metadata, SQL scripts and paged SQL", long_about = None)]
struct Cli {
    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print DDL for an entity described in a JSON file
    Ddl {
        #[command(subcommand)]
        action: DdlAction,
    },
    /// Execute a .sql file, or every .sql file below a directory
    Exec {
        /// File or directory to run
        path: PathBuf,
        #[arg(short, long)]
        database: Option<String>,
        /// Print the statements without connecting
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the paged rewrite of a query
    Page {
        sql: String,
        #[arg(long, default_value = "mysql")]
        dialect: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },
}

#[derive(Subcommand)]
enum DdlAction {
    /// CREATE TABLE plus any separate CREATE INDEX statements
    Create(DdlOptions),
    /// DROP TABLE
    Drop(DdlOptions),
    /// TRUNCATE TABLE
    Truncate(DdlOptions),
}

#[derive(Args)]
struct DdlOptions {
    /// Entity metadata JSON (`entity_name`, `primary_keys`, `properties`, `indexes`)
    #[arg(short, long)]
    entity: PathBuf,
    #[arg(long, default_value = "mysql")]
    dialect: String,
    /// Table name prefix
    #[arg(long)]
    prefix: Option<String>,
    /// Add IF [NOT] EXISTS where the dialect does not always emit it
    #[arg(long)]
    if_exists: bool,
}

#[tokio::main]
async fn main() -> CliResult<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }
    run_cli(cli).await
}

async fn run_cli(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Ddl { action } => {
            for statement in ddl_statements(&action)? {
                println!("{};", statement);
            }
        }
        Commands::Exec {
            path,
            database,
            dry_run,
        } => run_exec(&path, database, dry_run).await?,
        Commands::Page {
            sql,
            dialect,
            page,
            size,
        } => println!("{}", paged_sql(&sql, &dialect, page, size)?),
    }
    Ok(())
}

fn ddl_statements(action: &DdlAction) -> CliResult<Vec<String>> {
    let options = match action {
        DdlAction::Create(options) | DdlAction::Drop(options) | DdlAction::Truncate(options) => {
            options
        }
    };
    let meta = EntityMeta::from_json_file(&options.entity)?;
    let mut ctx = QueryContext::for_database(options.dialect.parse()?);
    if let Some(prefix) = options.prefix.as_deref() {
        ctx = ctx.table_prefix(prefix);
    }
    let table = ctx.table(&meta).if_exists_or_not(options.if_exists);
    let sql = match action {
        DdlAction::Create(_) => table.to_create_sql(),
        DdlAction::Drop(_) => table.to_drop_sql(),
        DdlAction::Truncate(_) => table.to_truncate_sql(),
    };
    Ok(BatchSql::load_sql(&sql))
}

fn paged_sql(sql: &str, dialect: &str, page: u32, size: u32) -> CliResult<String> {
    let ctx = QueryContext::for_database(dialect.parse()?);
    Ok(ctx.dialect().build_paged_query_sql(sql.trim(), page.max(1), size))
}

async fn run_exec(path: &Path, database: Option<String>, dry_run: bool) -> CliResult<()> {
    let scripts = collect_scripts(path)?;
    if scripts.is_empty() {
        println!("[WARN] No .sql files found under {}.", path.display());
        return Ok(());
    }

    if dry_run {
        for script in &scripts {
            println!("-- {}", script.path.display());
            for statement in &script.statements {
                println!("{};", statement);
            }
        }
        let statements: usize = scripts.iter().map(|s| s.statements.len()).sum();
        println!(
            "[OK] Dry run: {} file(s), {} statement(s).",
            scripts.len(),
            statements
        );
        return Ok(());
    }

    let db_url = resolve_db_url(database);
    println!(">> Connecting to {}...", db_url);
    let counts = execute_scripts(&db_url, &scripts).await?;
    for (script, count) in scripts.iter().zip(counts) {
        println!(
            "[OK] {}: {} statement(s), {} row(s) affected",
            script.path.display(),
            script.statements.len(),
            count
        );
    }
    Ok(())
}

fn resolve_db_url(database: Option<String>) -> String {
    database
        .filter(|url| !url.trim().is_empty())
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| FALLBACK_DATABASE_URL.to_owned())
}

async fn execute_scripts(db_url: &str, scripts: &[Script]) -> CliResult<Vec<u64>> {
    match DatabaseType::from_url(db_url) {
        DatabaseType::Sqlite => exec_sqlite(db_url, scripts).await,
        DatabaseType::Postgresql => exec_postgres(db_url, scripts).await,
        DatabaseType::Mysql => exec_mysql(db_url, scripts).await,
        other => Err(format!("cannot execute scripts against {} ({})", other, db_url).into()),
    }
}

/// One connection, so `sqlite::memory:` keeps its tables across files.
#[cfg(feature = "sqlite")]
async fn exec_sqlite(db_url: &str, scripts: &[Script]) -> CliResult<Vec<u64>> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    let mut counts = Vec::with_capacity(scripts.len());
    for script in scripts {
        tracing::info!(path = %script.path.display(), statements = script.statements.len(), "executing script");
        counts.push(BatchSql::exec_sql(&pool, &script.statements).await?);
    }
    pool.close().await;
    Ok(counts)
}

#[cfg(not(feature = "sqlite"))]
async fn exec_sqlite(_db_url: &str, _scripts: &[Script]) -> CliResult<Vec<u64>> {
    Err(not_enabled("sqlite"))
}

#[cfg(feature = "postgres")]
async fn exec_postgres(db_url: &str, scripts: &[Script]) -> CliResult<Vec<u64>> {
    let pool = PgPoolOptions::new().max_connections(1).connect(db_url).await?;
    let mut counts = Vec::with_capacity(scripts.len());
    for script in scripts {
        tracing::info!(path = %script.path.display(), statements = script.statements.len(), "executing script");
        counts.push(BatchSql::exec_sql(&pool, &script.statements).await?);
    }
    pool.close().await;
    Ok(counts)
}

#[cfg(not(feature = "postgres"))]
async fn exec_postgres(_db_url: &str, _scripts: &[Script]) -> CliResult<Vec<u64>> {
    Err(not_enabled("postgres"))
}

#[cfg(feature = "mysql")]
async fn exec_mysql(db_url: &str, scripts: &[Script]) -> CliResult<Vec<u64>> {
    let pool = MySqlPoolOptions::new().max_connections(1).connect(db_url).await?;
    let mut counts = Vec::with_capacity(scripts.len());
    for script in scripts {
        tracing::info!(path = %script.path.display(), statements = script.statements.len(), "executing script");
        counts.push(BatchSql::exec_sql(&pool, &script.statements).await?);
    }
    pool.close().await;
    Ok(counts)
}

#[cfg(not(feature = "mysql"))]
async fn exec_mysql(_db_url: &str, _scripts: &[Script]) -> CliResult<Vec<u64>> {
    Err(not_enabled("mysql"))
}

#[allow(dead_code)]
fn not_enabled(feature: &str) -> Box<dyn std::error::Error + Send + Sync> {
    format!(
        "{} support is not enabled. Rebuild ymate-query-cli with --features {}.",
        feature, feature
    )
    .into()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    const USER_JSON: &str = r#"{
        "entity_name": "user",
        "primary_keys": ["id"],
        "properties": [
            {"name": "id", "type": "LONG", "nullable": false, "autoincrement": true},
            {"name": "email", "type": "VARCHAR", "length": 64, "nullable": false}
        ],
        "indexes": [
            {"name": "idx_email", "unique": false, "fields": ["email"]}
        ]
    }"#;

    fn write_entity(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("ymq_cli_test_{}_{}", tag, nanos));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("user.json");
        fs::write(&path, USER_JSON).unwrap();
        path
    }

    fn options(entity: PathBuf, dialect: &str) -> DdlOptions {
        DdlOptions {
            entity,
            dialect: dialect.to_owned(),
            prefix: None,
            if_exists: false,
        }
    }

    #[test]
    fn create_splits_trailing_indexes() {
        let entity = write_entity("create");
        let mut opts = options(entity.clone(), "postgresql");
        opts.prefix = Some("ym_".to_owned());
        let statements = ddl_statements(&DdlAction::Create(opts)).unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE \"ym_user\""));
        assert!(statements[1].starts_with("CREATE INDEX \"idx_email\""));
        fs::remove_dir_all(entity.parent().unwrap()).unwrap();
    }

    #[test]
    fn drop_and_truncate_follow_the_dialect() {
        let entity = write_entity("drop");
        let mut opts = options(entity.clone(), "sqlite");
        opts.if_exists = true;
        assert_eq!(
            ddl_statements(&DdlAction::Drop(opts)).unwrap(),
            vec!["DROP TABLE IF EXISTS \"user\""]
        );
        assert_eq!(
            ddl_statements(&DdlAction::Truncate(options(entity.clone(), "mysql"))).unwrap(),
            vec!["TRUNCATE TABLE `user`"]
        );
        fs::remove_dir_all(entity.parent().unwrap()).unwrap();
    }

    #[test]
    fn unknown_dialects_are_rejected() {
        let entity = write_entity("dialect");
        let result = ddl_statements(&DdlAction::Create(options(entity.clone(), "cobol")));
        assert!(result.unwrap_err().to_string().contains("unknown database type"));
        fs::remove_dir_all(entity.parent().unwrap()).unwrap();
    }

    #[test]
    fn page_rewrites_per_dialect() {
        assert_eq!(
            paged_sql("SELECT * FROM t", "mysql", 2, 10).unwrap(),
            "SELECT * FROM t limit 10, 10"
        );
        assert_eq!(
            paged_sql("SELECT * FROM t", "oracle", 2, 10).unwrap(),
            "SELECT * FROM ( SELECT row_.*, rownum rownum_ FROM ( SELECT * FROM t ) row_ ) WHERE rownum_ > 10 AND rownum_ <= 20"
        );
        assert_eq!(
            paged_sql("SELECT * FROM t", "sqlserver", 1, 5).unwrap(),
            "SELECT * FROM t ORDER BY (SELECT NULL) OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY"
        );
    }

    #[test]
    fn explicit_database_url_wins() {
        assert_eq!(
            resolve_db_url(Some("sqlite:app.db".to_owned())),
            "sqlite:app.db"
        );
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "ymate-query",
            "ddl",
            "create",
            "--entity",
            "user.json",
            "--dialect",
            "oracle",
            "--if-exists",
        ])
        .unwrap();
        match cli.command {
            Commands::Ddl {
                action: DdlAction::Create(options),
            } => {
                assert_eq!(options.dialect, "oracle");
                assert!(options.if_exists);
            }
            _ => panic!("expected ddl create"),
        }

        let cli = Cli::try_parse_from(["ymate-query", "exec", "sql/", "--dry-run"]).unwrap();
        assert!(matches!(cli.command, Commands::Exec { dry_run: true, .. }));
        assert!(Cli::try_parse_from(["ymate-query", "page"]).is_err());
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn memory_database_keeps_tables_between_files() {
        let scripts = vec![
            Script {
                path: PathBuf::from("a.sql"),
                statements: vec![
                    "CREATE TABLE t (id INTEGER PRIMARY KEY)".to_owned(),
                    "INSERT INTO t (id) VALUES (1)".to_owned(),
                ],
            },
            Script {
                path: PathBuf::from("b.sql"),
                statements: vec![
                    "INSERT INTO t (id) VALUES (2)".to_owned(),
                    "DELETE FROM t".to_owned(),
                ],
            },
        ];
        let counts = execute_scripts("sqlite::memory:", &scripts).await.unwrap();
        assert_eq!(counts, vec![1, 3]);
    }

    #[tokio::test]
    async fn unsupported_urls_fail_before_connecting() {
        let err = execute_scripts("oracle://db", &[]).await.unwrap_err();
        assert!(err.to_string().contains("cannot execute scripts"));
    }
}
