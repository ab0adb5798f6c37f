use asksql::sanitize::{sanitize, CandidateQuery, Rule, MUTATING_KEYWORDS};

fn verdict(sql: &str) -> Result<String, Rule> {
    sanitize(CandidateQuery::new(sql))
        .map(|q| q.as_str().to_string())
        .map_err(|r| r.rule)
}

#[test]
fn test_accepts_single_retrieval_statements_unchanged() {
    let accepted = [
        "SELECT * FROM sales",
        "select region, SUM(quantity * unit_price) AS revenue FROM sales GROUP BY region",
        "WITH t AS (SELECT 1 AS x) SELECT x FROM t",
        "SELECT strftime('%Y-%m', order_date) AS month FROM sales",
        "\n  SELECT product\n  FROM sales\n  ORDER BY product\n",
    ];

    for sql in accepted {
        assert_eq!(verdict(sql), Ok(sql.to_string()), "expected accept: {sql}");
    }
}

#[test]
fn test_keywords_inside_identifiers_do_not_trigger() {
    for sql in [
        "SELECT updated_at, created_by FROM audit_log",
        "SELECT deleted FROM flags",
        "SELECT dropoff_region FROM trips",
    ] {
        assert!(verdict(sql).is_ok(), "expected accept: {sql}");
    }
}

#[test]
fn test_string_literals_and_quoted_identifiers_are_exempt() {
    for sql in [
        "SELECT * FROM sales WHERE product = 'DROP TABLE sales; -- gone'",
        "SELECT \"delete\" FROM odd_names",
        "SELECT REPLACE(product, 'Widget', 'W') AS short_name FROM sales",
    ] {
        assert!(verdict(sql).is_ok(), "expected accept: {sql}");
    }
}

#[test]
fn test_every_mutating_keyword_is_rejected() {
    for keyword in MUTATING_KEYWORDS {
        let sql = format!("SELECT * FROM sales WHERE {} IS NULL", keyword.to_lowercase());
        assert_eq!(
            verdict(&sql),
            Err(Rule::MutatingKeyword(keyword.to_string())),
            "expected reject: {sql}"
        );
    }
}

#[test]
fn test_injection_attempts() {
    let cases = [
        ("SELECT * FROM sales; DROP TABLE sales", Rule::MultipleStatements),
        (
            "SELECT * FROM sales WHERE product = 'Widget A'; DELETE FROM sales",
            Rule::MultipleStatements,
        ),
        ("SELECT 1;", Rule::MultipleStatements),
        ("SELECT * FROM sales -- WHERE region = 'North'", Rule::Comment),
        ("SELECT /* hidden */ * FROM sales", Rule::Comment),
        (
            "WITH d AS (DELETE FROM sales RETURNING *) SELECT * FROM d",
            Rule::MutatingKeyword("DELETE".into()),
        ),
        ("insert into sales (product) values ('x')", Rule::MutatingKeyword("INSERT".into())),
        ("PRAGMA table_info(sales)", Rule::MutatingKeyword("PRAGMA".into())),
        ("ATTACH DATABASE 'other.db' AS other", Rule::MutatingKeyword("ATTACH".into())),
    ];

    for (sql, rule) in cases {
        assert_eq!(verdict(sql), Err(rule), "for: {sql}");
    }
}

#[test]
fn test_non_retrieval_statements() {
    assert_eq!(verdict("EXPLAIN SELECT 1"), Err(Rule::NotRetrieval("EXPLAIN".into())));
    assert_eq!(verdict("VALUES (1)"), Err(Rule::NotRetrieval("VALUES".into())));
    assert_eq!(verdict("(SELECT 1)"), Err(Rule::NotRetrieval("(".into())));
}

#[test]
fn test_literal_forms_sqlite_lacks_are_rejected() {
    let cases = [
        "SELECT $$; DROP TABLE sales; $$",
        "SELECT $tag$; DELETE FROM sales; $tag$",
        "SELECT E'a\\'; DROP TABLE t; '",
    ];

    for sql in cases {
        assert!(
            matches!(verdict(sql), Err(Rule::UnsupportedToken(_))),
            "expected unsupported token: {sql} => {:?}",
            verdict(sql)
        );
    }
}

#[test]
fn test_sqlite_literal_and_operator_forms_pass() {
    for sql in [
        "SELECT x'00ff' AS blob_value",
        "SELECT product || ' (' || region || ')' AS label FROM sales",
        "SELECT quantity % 3, quantity << 1, ~quantity FROM sales WHERE quantity <> 5",
        "SELECT 1.5e3 AS n, -2 AS m",
    ] {
        assert!(verdict(sql).is_ok(), "expected accept: {sql} => {:?}", verdict(sql));
    }
}

#[test]
fn test_bind_parameters_are_rejected() {
    for sql in [
        "SELECT * FROM sales WHERE region = ?",
        "SELECT * FROM sales WHERE region = :region",
    ] {
        assert!(
            matches!(verdict(sql), Err(Rule::UnsupportedToken(_))),
            "expected unsupported token: {sql}"
        );
    }
}

#[test]
fn test_empty_and_untokenizable() {
    assert_eq!(verdict(""), Err(Rule::Empty));
    assert_eq!(verdict("  \n\t "), Err(Rule::Empty));
    assert!(matches!(
        verdict("SELECT 'unterminated FROM sales"),
        Err(Rule::Unparseable(_))
    ));
}

#[test]
fn test_rejection_keeps_original_text() {
    let sql = "SELECT * FROM sales; DROP TABLE sales";
    let rejection = sanitize(CandidateQuery::new(sql)).unwrap_err();
    assert_eq!(rejection.sql, sql);
    assert!(rejection.to_string().contains("multiple_statements"));
}
