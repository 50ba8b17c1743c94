pub const DEFAULT_MODEL: &str = "Chat Model";

/// Labels offered in the model picker. The proxy maps labels it does not
/// recognise to its default upstream model.
pub const MODELS: [&str; 4] = [DEFAULT_MODEL, "Reasoning Model", "Think Model", "DeepSearch Model"];

/// Resolves a picker choice: a 1-based index, or a label matched without case.
/// Anything containing `/` is taken as an upstream model id and passed through.
pub fn resolve(choice: &str) -> Option<String> {
    let choice = choice.trim();
    if choice.is_empty() {
        return None;
    }
    if let Ok(n) = choice.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| MODELS.get(i)).map(|m| m.to_string());
    }
    if choice.contains('/') && !choice.contains(char::is_whitespace) {
        return Some(choice.to_string());
    }

    let wanted = choice.to_lowercase();
    MODELS
        .iter()
        .find(|m| {
            let label = m.to_lowercase();
            label == wanted || label.trim_end_matches(" model") == wanted
        })
        .map(|m| m.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_index_label_and_short_name() {
        assert_eq!(resolve("1").as_deref(), Some("Chat Model"));
        assert_eq!(resolve("4").as_deref(), Some("DeepSearch Model"));
        assert_eq!(resolve("think model").as_deref(), Some("Think Model"));
        assert_eq!(resolve("reasoning").as_deref(), Some("Reasoning Model"));
        assert_eq!(resolve("deepsearch").as_deref(), Some("DeepSearch Model"));
    }

    #[test]
    fn passes_upstream_ids_through() {
        assert_eq!(
            resolve("openai/gpt-4o-mini").as_deref(),
            Some("openai/gpt-4o-mini")
        );
    }

    #[test]
    fn rejects_unknown_choices() {
        assert_eq!(resolve("0"), None);
        assert_eq!(resolve("5"), None);
        assert_eq!(resolve("fast"), None);
        assert_eq!(resolve(""), None);
    }
}
