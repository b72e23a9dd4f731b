use futures::future::join_all;

use crate::{
    database::MongoDB,
    models::SoftSkillResponse,
    services::{
        llm_service::{self, ChatOptions, GroqModel},
        user_service,
    },
    utils::{error::AppError, json_extract::extract_json_array},
};

pub const DEFAULT_QUESTION_COUNT: usize = 3;
pub const MAX_QUESTION_COUNT: usize = 10;

const QUESTION_SYSTEM: &str = "You are an expert HR interviewer.";
const QUESTION_PROMPT: &str = "Generate one open-ended interview question to assess a candidate's soft skills. \
Randomly focus on one of these: communication, leadership, teamwork, adaptability, or problem-solving. \
Reply with the question only.";
const EVALUATOR_SYSTEM: &str = "You are a professional soft-skills evaluator.";

/// Perguntas usadas quando o modelo falha
const FALLBACK_QUESTIONS: &[&str] = &[
    "Tell me about a time you had to explain a complex idea to someone without a technical background.",
    "Describe a situation where you had to lead a team through a difficult deadline.",
    "Give an example of a conflict within your team and how you helped resolve it.",
    "Tell me about a time your priorities changed suddenly. How did you adapt?",
    "Describe a problem you solved where the obvious solution did not work.",
];

/// `0` ou ausente usa o padrão; acima do máximo é limitado
pub fn normalize_count(count: Option<usize>) -> usize {
    match count {
        None | Some(0) => DEFAULT_QUESTION_COUNT,
        Some(n) => n.min(MAX_QUESTION_COUNT),
    }
}

fn clean_question(text: &str) -> Option<String> {
    let question = text.trim().trim_matches('"').trim();
    if question.is_empty() {
        None
    } else {
        Some(question.to_string())
    }
}

/// Gera `count` perguntas em paralelo
pub async fn generate_questions(count: Option<usize>) -> Vec<String> {
    let count = normalize_count(count);

    let calls = (0..count).map(|_| {
        llm_service::groq_chat(GroqModel::Fast, QUESTION_SYSTEM, QUESTION_PROMPT, ChatOptions::creative(200))
    });
    let results = join_all(calls).await;

    results
        .into_iter()
        .enumerate()
        .map(|(i, result)| match result.ok().as_deref().and_then(clean_question) {
            Some(question) => question,
            None => {
                log::warn!("⚠️  Soft-skill question {} unavailable, using fallback", i + 1);
                FALLBACK_QUESTIONS[i % FALLBACK_QUESTIONS.len()].to_string()
            }
        })
        .collect()
}

fn evaluation_prompt(response: &SoftSkillResponse) -> String {
    format!(
        "You are a soft-skills evaluator. Given a user's response to an interview question, \
identify which soft skills are demonstrated.\n\n\
Question: {}\n\
Answer: {}\n\n\
Return a JSON array of detected soft skills. Example:\n\
[\"communication\", \"adaptability\"]",
        response.question, response.answer
    )
}

/// Skills de uma resposta do modelo, em minúsculas
pub fn parse_skills(text: &str) -> Vec<String> {
    extract_json_array(text)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| v.as_str().map(|s| s.trim().to_lowercase()))
        .filter(|s| !s.is_empty())
        .collect()
}

/// União preservando a ordem da primeira ocorrência
pub fn merge_skills(groups: Vec<Vec<String>>) -> Vec<String> {
    let mut combined: Vec<String> = Vec::new();
    for skill in groups.into_iter().flatten() {
        if !combined.contains(&skill) {
            combined.push(skill);
        }
    }
    combined
}

/// Junta as avaliações do modelo
///
/// Falhas individuais são descartadas; se nenhuma avaliação teve sucesso o
/// resultado é erro, para não sobrescrever as skills salvas com uma lista vazia.
pub fn combine_evaluations(results: Vec<Result<String, String>>) -> Result<Vec<String>, AppError> {
    let total = results.len();
    let groups: Vec<Vec<String>> = results
        .into_iter()
        .filter_map(|result| match result {
            Ok(text) => Some(parse_skills(&text)),
            Err(e) => {
                log::warn!("⚠️  Soft-skill evaluation skipped: {}", e);
                None
            }
        })
        .collect();

    if groups.is_empty() {
        log::error!("❌ All {} soft-skill evaluations failed", total);
        return Err(AppError::ExternalError("Failed to analyze soft skills".to_string()));
    }

    Ok(merge_skills(groups))
}

/// Avalia cada resposta em paralelo e une as skills detectadas
pub async fn evaluate_responses(responses: &[SoftSkillResponse]) -> Result<Vec<String>, AppError> {
    let calls = responses.iter().map(|response| {
        let prompt = evaluation_prompt(response);
        async move { llm_service::groq_chat(GroqModel::Fast, EVALUATOR_SYSTEM, &prompt, ChatOptions::default()).await }
    });

    combine_evaluations(join_all(calls).await)
}

/// Detecta soft skills nas respostas e grava em `resume.softskills`
pub async fn analyze_responses(
    db: &MongoDB,
    uid: Option<&str>,
    responses: &[SoftSkillResponse],
) -> Result<Vec<String>, AppError> {
    if responses.is_empty() {
        return Err(AppError::InvalidRequest("Missing or invalid responses array".to_string()));
    }
    let uid = uid.ok_or_else(|| AppError::Unauthorized("Unauthorized: No user context found".to_string()))?;

    let combined = evaluate_responses(responses).await?;
    user_service::set_soft_skills(db, uid, &combined).await?;
    log::info!("🧠 Soft skills for {}: {:?}", uid, combined);

    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_count() {
        assert_eq!(normalize_count(None), 3);
        assert_eq!(normalize_count(Some(0)), 3);
        assert_eq!(normalize_count(Some(5)), 5);
        assert_eq!(normalize_count(Some(50)), 10);
    }

    #[test]
    fn test_parse_skills_lowercases_and_salvages() {
        assert_eq!(
            parse_skills("Detected skills: [\"Communication\", \"Teamwork\"]."),
            vec!["communication", "teamwork"]
        );
        assert!(parse_skills("none found").is_empty());
        assert_eq!(parse_skills("[\"Leadership\", 3, \"\"]"), vec!["leadership"]);
    }

    #[test]
    fn test_merge_skills_dedups_in_order() {
        let merged = merge_skills(vec![
            vec!["communication".into(), "teamwork".into()],
            vec!["teamwork".into(), "leadership".into()],
        ]);
        assert_eq!(merged, vec!["communication", "teamwork", "leadership"]);
    }

    #[test]
    fn test_combine_skips_failed_evaluations() {
        let combined = combine_evaluations(vec![
            Err("timeout".into()),
            Ok("[\"Teamwork\"]".into()),
            Ok("[\"teamwork\", \"Leadership\"]".into()),
        ])
        .unwrap();
        assert_eq!(combined, vec!["teamwork", "leadership"]);

        // Resposta válida sem skills detectadas continua sendo sucesso
        assert_eq!(combine_evaluations(vec![Ok("[]".into())]).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_combine_fails_when_every_evaluation_fails() {
        let err = combine_evaluations(vec![Err("timeout".into()), Err("rate limited".into())]).unwrap_err();
        assert!(matches!(err, AppError::ExternalError(_)));
    }

    #[tokio::test]
    async fn test_evaluation_without_groq_key_is_an_error() {
        std::env::remove_var("GROQ_API_KEY");
        let responses = vec![SoftSkillResponse {
            question: "Tell me about a conflict.".into(),
            answer: "I listened to both sides and we agreed on a plan.".into(),
        }];

        let result = evaluate_responses(&responses).await;
        assert!(matches!(result, Err(AppError::ExternalError(_))));
    }

    #[test]
    fn test_clean_question() {
        assert_eq!(clean_question("  \"How do you lead?\"  ").as_deref(), Some("How do you lead?"));
        assert!(clean_question("   ").is_none());
    }
}
