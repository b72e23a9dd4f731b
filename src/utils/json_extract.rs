/// Extração tolerante de JSON a partir de respostas de LLM
///
/// Os modelos frequentemente devolvem o JSON cercado de texto, markdown ou
/// blocos ```json. A cascata tenta, em ordem:
/// 1. parse direto do texto inteiro
/// 2. conteúdo de um bloco cercado (```json ... ``` ou ``` ... ```)
/// 3. maior trecho entre `{` e `}`
/// 4. maior trecho entre `[` e `]`
/// 5. primeiro trecho mínimo entre `[` e `]`
///
/// O primeiro candidato que desserializa no tipo pedido vence. Quem chama
/// decide o fallback quando nada funciona.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;

lazy_static! {
    static ref FENCED_BLOCK: Regex = Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").unwrap();
    static ref OBJECT_GREEDY: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
    static ref ARRAY_GREEDY: Regex = Regex::new(r"(?s)\[.*\]").unwrap();
    static ref ARRAY_LAZY: Regex = Regex::new(r"(?s)\[.*?\]").unwrap();
    static ref CONTROL_CHARS: Regex = Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap();
}

/// Tenta extrair um valor `T` de um texto livre
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Option<T> {
    let cleaned = CONTROL_CHARS.replace_all(text.trim(), "");
    let cleaned: &str = &cleaned;

    if let Ok(value) = serde_json::from_str::<T>(cleaned) {
        return Some(value);
    }

    let mut candidates: Vec<&str> = Vec::new();

    if let Some(caps) = FENCED_BLOCK.captures(cleaned) {
        if let Some(inner) = caps.get(1) {
            candidates.push(inner.as_str());
        }
    }
    if let Some(m) = OBJECT_GREEDY.find(cleaned) {
        candidates.push(m.as_str());
    }
    if let Some(m) = ARRAY_GREEDY.find(cleaned) {
        candidates.push(m.as_str());
    }
    if let Some(m) = ARRAY_LAZY.find(cleaned) {
        candidates.push(m.as_str());
    }

    candidates
        .into_iter()
        .find_map(|candidate| serde_json::from_str::<T>(candidate).ok())
}

/// Atalho para arrays JSON arbitrários
pub fn extract_json_array(text: &str) -> Option<Vec<serde_json::Value>> {
    extract_json::<Vec<serde_json::Value>>(text)
}

/// Atalho para objetos JSON arbitrários
pub fn extract_json_object(text: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    extract_json::<serde_json::Map<String, serde_json::Value>>(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_parse() {
        let parsed: Vec<String> = extract_json(r#"["a", "b"]"#).unwrap();
        assert_eq!(parsed, vec!["a", "b"]);
    }

    #[test]
    fn test_fenced_block() {
        let text = "Here you go:\n```json\n{\"score\": 80}\n```\nGood luck!";
        let obj = extract_json_object(text).unwrap();
        assert_eq!(obj.get("score").and_then(|v| v.as_i64()), Some(80));
    }

    #[test]
    fn test_array_inside_prose() {
        let text = "Sure! The skills are [\"communication\", \"teamwork\"] as requested.";
        let skills: Vec<String> = extract_json(text).unwrap();
        assert_eq!(skills, vec!["communication", "teamwork"]);
    }

    #[test]
    fn test_nested_array_prefers_greedy_match() {
        let text = "Result: [{\"title\": \"A\", \"tags\": [\"x\", \"y\"]}] end";
        let arr = extract_json_array(text).unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["tags"][1], "y");
    }

    #[test]
    fn test_lazy_array_when_greedy_spans_two_arrays() {
        let text = "first [\"a\"] and then some prose ] trailing";
        let arr: Vec<String> = extract_json(text).unwrap();
        assert_eq!(arr, vec!["a"]);
    }

    #[test]
    fn test_garbage_returns_none() {
        assert!(extract_json_array("no json here").is_none());
        assert!(extract_json_object("{ broken: ").is_none());
    }

    #[test]
    fn test_control_characters_are_stripped() {
        let text = "{\"coldEmail\": \"Hi\u{0001} there\"}";
        let obj = extract_json_object(text).unwrap();
        assert_eq!(obj["coldEmail"], "Hi there");
    }
}
