use super::types::Snippet;

/// Inputs that ask a `$auto` slot to use its default payload instead of a literal value.
pub const AUTO_GENERATE_SENTINELS: [&str; 2] = ["自動生成", "auto-generate"];

const KNOWN_PROMPTS: [(&str, &str); 4] = [
    ("app_id", "アプリIDを入力してください。"),
    (
        "db_name",
        "データベース名を入力してください。自動生成する場合は「自動生成」と入力してください。",
    ),
    ("db_id", "データベースIDを入力してください。"),
    ("record_id", "レコードIDを入力してください。"),
];

pub fn is_auto_sentinel(value: &str) -> bool {
    let trimmed = value.trim();
    AUTO_GENERATE_SENTINELS
        .iter()
        .any(|sentinel| sentinel.eq_ignore_ascii_case(trimmed))
}

pub fn fixed_prompt(name: &str) -> Option<&'static str> {
    KNOWN_PROMPTS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, prompt)| *prompt)
}

/// Known identifiers keep their fixed text; otherwise the snippet's own prompt, then a generic one.
pub fn prompt_for(name: &str, snippet: Option<&Snippet>) -> String {
    if let Some(prompt) = fixed_prompt(name) {
        return prompt.to_string();
    }
    snippet
        .and_then(|s| s.params.iter().find(|p| p.name == name))
        .map(|p| p.prompt.clone())
        .filter(|prompt| !prompt.trim().is_empty())
        .unwrap_or_else(|| format!("{} を入力してください。", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snippet::types::ParamPrompt;
    use crate::snippet::templates;

    #[test]
    fn sentinel_matches_both_spellings() {
        assert!(is_auto_sentinel("自動生成"));
        assert!(is_auto_sentinel("  Auto-Generate "));
        assert!(!is_auto_sentinel("members_db"));
    }

    #[test]
    fn known_prompts_win_over_snippet_prompts() {
        let mut snippet = templates::create_database();
        snippet.params.push(ParamPrompt {
            name: "app_id".to_string(),
            prompt: "which app?".to_string(),
        });
        assert_eq!(prompt_for("app_id", Some(&snippet)), "アプリIDを入力してください。");
    }

    #[test]
    fn unknown_names_fall_back() {
        let mut snippet = templates::create_database();
        snippet.params.push(ParamPrompt {
            name: "field_name".to_string(),
            prompt: "フィールド名を入力してください。".to_string(),
        });
        assert_eq!(prompt_for("field_name", Some(&snippet)), "フィールド名を入力してください。");
        assert_eq!(prompt_for("label", None), "label を入力してください。");
    }
}
