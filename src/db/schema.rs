/// Ordered, append-only list of schema migrations. Never edit an entry once
/// it has shipped; add a new one.
pub const MIGRATIONS: &[(&str, &str)] = &[(
    "001_init_schema",
    include_str!("../../sql/001_init_schema.sql"),
)];

pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut prev = '\0';

    for ch in sql.chars() {
        match ch {
            '\'' if !in_double_quote && prev != '\\' => {
                in_single_quote = !in_single_quote;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
            }
            ';' if !in_single_quote && !in_double_quote => {
                push_statement(&mut statements, &current);
                current.clear();
                prev = ch;
                continue;
            }
            _ => {}
        }

        current.push(ch);
        prev = ch;
    }

    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let body = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");
    let body = body.trim();
    if !body.is_empty() {
        statements.push(body.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_top_level_semicolons_only() {
        let sql = "CREATE TABLE a (x TEXT DEFAULT ';');\n-- note here\nINSERT INTO \"b;c\" VALUES (1);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "CREATE TABLE a (x TEXT DEFAULT ';')");
        assert_eq!(statements[1], "INSERT INTO \"b;c\" VALUES (1)");
    }

    #[test]
    fn comment_only_chunks_are_dropped() {
        assert!(split_sql_statements("-- nothing here\n;\n  ;").is_empty());
    }

    #[test]
    fn init_schema_creates_every_table() {
        let statements = split_sql_statements(MIGRATIONS[0].1);
        for table in ["users", "progress_events", "statistics_summary", "video_views"] {
            let needle = format!("CREATE TABLE IF NOT EXISTS \"{table}\"");
            assert!(
                statements.iter().any(|s| s.starts_with(&needle)),
                "missing {table}"
            );
        }
    }
}
