use crate::transpiler::traits::SqlGenerator;

/// MySQL Generator.
pub struct MysqlGenerator;

impl SqlGenerator for MysqlGenerator {
    fn name(&self) -> &'static str {
        "MySQL"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        // MySQL has no OFFSET without LIMIT; the documented idiom is the max row count.
        let mut sql = String::new();
        match (limit, offset) {
            (Some(n), _) => sql.push_str(&format!(" LIMIT {}", n)),
            (None, Some(_)) => sql.push_str(" LIMIT 18446744073709551615"),
            (None, None) => {}
        }
        if let Some(n) = offset {
            sql.push_str(&format!(" OFFSET {}", n));
        }
        sql
    }
}
