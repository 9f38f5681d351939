use std::error::Error;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use ymate_query_core::BatchSql;

/// One `.sql` file split into statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub path: PathBuf,
    pub statements: Vec<String>,
}

/// Loads `target` itself when it is a file, otherwise every `.sql` file below it in path order.
pub fn collect_scripts(target: &Path) -> Result<Vec<Script>, Box<dyn Error + Send + Sync>> {
    if !target.exists() {
        return Err(format!("{} does not exist", target.display()).into());
    }
    if target.is_file() {
        return Ok(vec![load_script(target)?]);
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(target).min_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() && is_sql_file(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    paths.iter().map(|path| load_script(path)).collect()
}

fn is_sql_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
}

fn load_script(path: &Path) -> Result<Script, Box<dyn Error + Send + Sync>> {
    Ok(Script {
        path: path.to_path_buf(),
        statements: BatchSql::load_sql_file(path)?,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn make_temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("ymq_scripts_{}_{}", tag, nanos));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn directories_are_walked_in_path_order() {
        let dir = make_temp_dir("walk");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("b_data.sql"), "INSERT INTO t VALUES (1);").unwrap();
        fs::write(dir.join("a_schema.SQL"), "-- schema\nCREATE TABLE t (id INT);\n").unwrap();
        fs::write(dir.join("nested").join("c.sql"), "DELETE FROM t; DELETE FROM u;").unwrap();
        fs::write(dir.join("notes.txt"), "SELECT 1;").unwrap();

        let scripts = collect_scripts(&dir).unwrap();
        let names: Vec<String> = scripts
            .iter()
            .map(|s| s.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_schema.SQL", "b_data.sql", "c.sql"]);
        assert_eq!(scripts[0].statements, vec!["CREATE TABLE t (id INT)"]);
        assert_eq!(scripts[2].statements.len(), 2);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn a_single_file_is_loaded_directly() {
        let dir = make_temp_dir("single");
        let file = dir.join("only.txt");
        fs::write(&file, "UPDATE t SET a = 1;\n\n;").unwrap();

        let scripts = collect_scripts(&file).unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].statements, vec!["UPDATE t SET a = 1"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_targets_are_errors() {
        let dir = make_temp_dir("missing");
        let err = collect_scripts(&dir.join("nope")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        fs::remove_dir_all(&dir).unwrap();
    }
}
