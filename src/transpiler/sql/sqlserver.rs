use super::super::traits::SqlGenerator;

pub struct SqlServerGenerator;

impl SqlGenerator for SqlServerGenerator {
    fn name(&self) -> &'static str {
        "SQL Server"
    }

    fn quote_identifier(&self, id: &str) -> String {
        format!("[{}]", id.replace(']', "]]"))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@p{}", index)
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        // OFFSET/FETCH; T-SQL needs an ORDER BY in front of it.
        let mut sql = String::new();
        if limit.is_some() || offset.is_some() {
            sql.push_str(&format!(" OFFSET {} ROWS", offset.unwrap_or(0)));
            if let Some(lim) = limit {
                sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", lim));
            }
        }
        sql
    }

    fn paginates_without_order(&self) -> bool {
        false
    }
}
