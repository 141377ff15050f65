pub mod search;
pub mod weather;

pub use search::SearchTool;
pub use weather::{WeatherTool, clean_city_input};

/// First non-empty key among the environment variables, then the config value.
pub fn resolve_api_key(env_vars: &[&str], config_key: &str) -> Option<String> {
    env_vars
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|key| !key.trim().is_empty())
        .or_else(|| (!config_key.trim().is_empty()).then(|| config_key.to_string()))
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_key_used_when_env_absent() {
        let key = resolve_api_key(&["TRIPWISE_TEST_UNSET_KEY_VAR"], "from-config");
        assert_eq!(key.as_deref(), Some("from-config"));
        assert_eq!(resolve_api_key(&["TRIPWISE_TEST_UNSET_KEY_VAR"], " "), None);
    }

    #[test]
    fn truncate_on_char_boundary() {
        assert_eq!(truncate_chars("Zürich", 3), "Zür...");
        assert_eq!(truncate_chars("Oslo", 10), "Oslo");
    }
}
