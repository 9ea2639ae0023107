//! Representation selection and loader option parsing.

use assetdb_client::Document;
use serde_json::Value;
use tracing::warn;

fn context_str<'a>(representation: &'a Document, key: &str) -> Option<&'a str> {
    representation
        .get("context")
        .and_then(|context| context.get(key))
        .and_then(Value::as_str)
}

fn context_version(representation: &Document) -> i64 {
    representation
        .get("context")
        .and_then(|context| context.get("version"))
        .and_then(Value::as_i64)
        .unwrap_or(-1)
}

/// Subset name from the representation context.
pub fn representation_subset(representation: &Document) -> Option<&str> {
    context_str(representation, "subset")
}

/// Asset name from the representation context.
pub fn representation_asset(representation: &Document) -> Option<&str> {
    context_str(representation, "asset")
}

/// Legacy `_id` of a representation document.
pub fn representation_id(representation: &Document) -> Option<&str> {
    representation.get("_id").and_then(Value::as_str)
}

/// Keeps one representation per subset: the one with the highest context
/// version. On equal versions the first one seen wins. Output follows the
/// order in which subsets first appear; representations without a subset
/// in their context are kept as they are.
pub fn latest_representations_by_subset<I>(representations: I) -> Vec<Document>
where
    I: IntoIterator<Item = Document>,
{
    let mut output: Vec<Document> = Vec::new();
    for representation in representations {
        let Some(subset) = representation_subset(&representation) else {
            output.push(representation);
            continue;
        };
        let existing = output
            .iter()
            .position(|current| representation_subset(current) == Some(subset));
        match existing {
            Some(index) => {
                if context_version(&representation) > context_version(&output[index]) {
                    output[index] = representation;
                }
            }
            None => output.push(representation),
        }
    }
    output
}

/// Parses placeholder loader arguments, a JSON object of loader options.
/// Empty input gives no options; anything that is not an object is
/// reported and ignored.
pub fn parse_loader_args(text: &str) -> Document {
    let text = text.trim();
    if text.is_empty() {
        return Document::new();
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(options)) => options,
        Ok(other) => {
            warn!(args = %text, "loader arguments are not an object, got {other}; using defaults");
            Document::new()
        }
        Err(e) => {
            warn!(args = %text, error = %e, "failed to parse loader arguments; using defaults");
            Document::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repre(id: &str, subset: &str, version: i64) -> Document {
        match json!({"_id": id, "context": {"subset": subset, "version": version}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn highest_version_wins_per_subset() {
        let kept = latest_representations_by_subset(vec![
            repre("a1", "modelMain", 1),
            repre("b1", "lookMain", 4),
            repre("a3", "modelMain", 3),
            repre("a2", "modelMain", 2),
        ]);
        let ids: Vec<_> = kept.iter().filter_map(representation_id).collect();
        assert_eq!(ids, vec!["a3", "b1"]);
    }

    #[test]
    fn first_seen_wins_on_equal_versions() {
        let kept = latest_representations_by_subset(vec![
            repre("first", "modelMain", 2),
            repre("second", "modelMain", 2),
        ]);
        assert_eq!(representation_id(&kept[0]), Some("first"));
    }

    #[test]
    fn loader_args_must_be_an_object() {
        assert!(parse_loader_args("").is_empty());
        assert!(parse_loader_args("[1, 2]").is_empty());
        assert!(parse_loader_args("{broken").is_empty());
        assert_eq!(
            parse_loader_args(r#"{"namespace": "char"}"#)["namespace"],
            json!("char")
        );
    }
}
