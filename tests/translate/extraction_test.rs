use std::sync::Arc;

use async_trait::async_trait;

use asksql::prompt::build_prompt;
use asksql::schema::SchemaDescription;
use asksql::translate::{extract_query, LanguageModel, ModelError, TranslateError, TranslationClient};

#[test]
fn test_extraction_fixtures() {
    let fixtures: &[(&str, Option<&str>)] = &[
        // Fenced with a language tag
        (
            "Sure!\n```sql\nSELECT region FROM sales\n```\n",
            Some("SELECT region FROM sales"),
        ),
        // Fenced without a tag
        ("```\nSELECT 1\n```", Some("SELECT 1")),
        // First of several fences
        ("```sql\nSELECT 1\n```\nor\n```sql\nSELECT 2\n```", Some("SELECT 1")),
        // Fence opened and closed on one line
        ("```SELECT region FROM sales```", Some("SELECT region FROM sales")),
        ("Answer: ```sql SELECT 1```", Some("SELECT 1")),
        ("Try ```sqlite\tSELECT 2;``` instead", Some("SELECT 2")),
        // Unterminated fence runs to the end
        ("```sql\nSELECT product\nFROM sales", Some("SELECT product\nFROM sales")),
        // Bare statement followed by prose
        (
            "SELECT product\nFROM sales\n\nThis lists every product.",
            Some("SELECT product\nFROM sales"),
        ),
        // Prose before a bare statement
        ("Here is the query:\nselect x from y", Some("select x from y")),
        // CTE across lines
        (
            "WITH t AS (SELECT 1 AS x)\nSELECT x FROM t",
            Some("WITH t AS (SELECT 1 AS x)\nSELECT x FROM t"),
        ),
        // One trailing separator is dropped
        ("```sql\nSELECT 1;\n```", Some("SELECT 1")),
        ("SELECT 1;;", Some("SELECT 1;")),
        // Nothing usable
        ("I cannot answer that.", None),
        ("The selection is empty.", None),
        ("```sql\n```", None),
        ("```sql```", None),
        ("", None),
    ];

    for (response, expected) in fixtures {
        let got = extract_query(response);
        assert_eq!(
            got.as_ref().map(|q| q.as_str()),
            *expected,
            "for response: {response:?}"
        );
    }
}

struct Canned(&'static str);

#[async_trait]
impl LanguageModel for Canned {
    async fn complete(&self, _prompt: &str) -> Result<String, ModelError> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn test_client_extracts_from_reply() {
    let client = TranslationClient::new(Arc::new(Canned(
        "```sql\nSELECT region, SUM(quantity) AS units FROM sales GROUP BY region;\n```",
    )));
    let prompt = build_prompt(&SchemaDescription::default(), "Units by region");

    let candidate = client.translate(&prompt).await.unwrap();
    assert_eq!(
        candidate.as_str(),
        "SELECT region, SUM(quantity) AS units FROM sales GROUP BY region"
    );
}

#[tokio::test]
async fn test_client_reports_missing_query() {
    let client = TranslationClient::new(Arc::new(Canned("No idea, sorry.")));
    let prompt = build_prompt(&SchemaDescription::default(), "Anything");

    let err = client.translate(&prompt).await.unwrap_err();
    assert!(matches!(err, TranslateError::NoQueryExtracted));
}
