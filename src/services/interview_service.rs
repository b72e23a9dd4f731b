use crate::{
    models::{
        FeedbackSection, InterviewFeedback, InterviewQuestionsRequest, InterviewReport, InterviewScore,
        InterviewSubmission, InterviewSummary, MediaAnalysis, QuestionFeedback,
    },
    services::llm_service::{self, ChatOptions, GroqModel},
    utils::{error::AppError, json_extract::extract_json},
};

const QUESTIONS_SYSTEM: &str = "You are an expert HR interviewer.";
const FEEDBACK_SYSTEM: &str =
    "You are an expert HR interviewer providing detailed feedback. Always respond with valid JSON only.";

fn to_json(value: &impl serde::Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn questions_prompt(request: &InterviewQuestionsRequest) -> String {
    format!(
        "You are an expert interviewer. Given the following job description and candidate resume, \
generate 5 interview questions (no follow-ups, just 5 main questions) that test both technical and soft skills.\n\
Respond ONLY with a JSON array of questions, no explanation, no intro, no markdown, no text before or after.\n\
Job: {}\n\
Resume: {}",
        to_json(&request.job),
        to_json(&request.resume)
    )
}

/// Aceita `["..."]` ou `[{"question": "..."}]`
pub fn parse_questions(text: &str) -> Option<Vec<String>> {
    let values = extract_json::<Vec<serde_json::Value>>(text)?;
    let questions: Vec<String> = values
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::String(q) => Some(q),
            serde_json::Value::Object(map) => map
                .get("question")
                .and_then(|q| q.as_str())
                .map(str::to_string),
            _ => None,
        })
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();

    if questions.is_empty() {
        None
    } else {
        Some(questions)
    }
}

/// Gera 5 perguntas de entrevista para a vaga + currículo
pub async fn generate_questions(request: &InterviewQuestionsRequest) -> Result<Vec<String>, AppError> {
    let prompt = questions_prompt(request);

    let reply = llm_service::groq_chat(GroqModel::Default, QUESTIONS_SYSTEM, &prompt, ChatOptions::default())
        .await
        .map_err(|e| {
            log::error!("❌ Interview questions: {}", e);
            AppError::Internal("Failed to generate questions".to_string())
        })?;

    parse_questions(&reply).ok_or_else(|| {
        log::warn!("⚠️  Could not extract questions array from model response");
        AppError::Internal("Failed to generate questions".to_string())
    })
}

fn or_placeholder<'a>(value: &'a Option<String>, placeholder: &'a str) -> &'a str {
    value.as_deref().filter(|v| !v.trim().is_empty()).unwrap_or(placeholder)
}

pub fn feedback_prompt(submission: &InterviewSubmission) -> String {
    let answers = submission
        .answers
        .iter()
        .enumerate()
        .map(|(i, answer)| {
            format!(
                "Question {}: {}\nWritten Answer: {}\nSpoken Response: {}\nTime Taken: {} seconds",
                i + 1,
                answer.question,
                or_placeholder(&answer.text_answer, "No written answer"),
                or_placeholder(&answer.transcript, "No speech transcript"),
                answer.time_taken
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let experience = submission
        .resume
        .experience
        .iter()
        .map(|exp| {
            format!(
                "{} at {}",
                exp.position.as_deref().unwrap_or("Role"),
                exp.company.as_deref().unwrap_or("Company")
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are an expert HR interviewer reviewing a candidate's interview performance. Analyze the following interview data and provide comprehensive feedback.

JOB POSITION: {title} at {company}
JOB REQUIREMENTS: {requirements}

CANDIDATE BACKGROUND:
- Skills: {skills}
- Experience: {experience}

INTERVIEW RESPONSES:
{answers}

TOTAL INTERVIEW TIME: {total} seconds

Please provide a detailed review in the following JSON format (respond ONLY with valid JSON, no markdown, no explanations outside the JSON):

{{
  "overallFeedback": {{ "strengths": "...", "weaknesses": "...", "tipsForImprovement": "..." }},
  "perQuestion": [
    {{ "question": "...", "feedback": {{ "strengths": "...", "weaknesses": "...", "tipsForImprovement": "..." }} }}
  ],
  "score": {{ "overall": 85, "communication": 80, "technical": 90, "confidence": 75 }},
  "recommendations": ["...", "...", "..."]
}}"#,
        title = submission.job.job_title.as_deref().unwrap_or("Unknown role"),
        company = submission.job.company_name.as_deref().unwrap_or("Unknown company"),
        requirements = submission.job.required_skills.join(", "),
        skills = submission.resume.skills.join(", "),
        experience = experience,
        answers = answers,
        total = submission.total_time,
    )
}

/// Feedback genérico usado quando o modelo não devolve JSON aproveitável
pub fn fallback_feedback(submission: &InterviewSubmission) -> InterviewFeedback {
    let per_question = submission
        .questions
        .iter()
        .enumerate()
        .map(|(i, question)| {
            let answered = submission.answers.get(i).map(|a| a.has_response()).unwrap_or(false);
            QuestionFeedback {
                question: question.clone(),
                feedback: FeedbackSection {
                    strengths: if answered {
                        "You provided a response to this question."
                    } else {
                        "You attempted this question."
                    }
                    .to_string(),
                    weaknesses: "Could benefit from more specific examples and details.".to_string(),
                    tips_for_improvement:
                        "Consider using the STAR method (Situation, Task, Action, Result) for better structure."
                            .to_string(),
                },
            }
        })
        .collect();

    InterviewFeedback {
        overall_feedback: FeedbackSection {
            strengths: "You completed the interview and provided responses to the questions.".to_string(),
            weaknesses: "Some responses could be more detailed and specific.".to_string(),
            tips_for_improvement: "Practice providing concrete examples and speaking more confidently.".to_string(),
        },
        per_question,
        score: InterviewScore {
            overall: 70.0,
            communication: 65.0,
            technical: 75.0,
            confidence: 70.0,
        },
        recommendations: vec![
            "Practice common interview questions".to_string(),
            "Prepare specific examples from your experience".to_string(),
            "Work on clear and confident communication".to_string(),
        ],
    }
}

/// Extrai o feedback; objeto vazio ou sem conteúdo conta como falha
pub fn parse_feedback(text: &str) -> Option<InterviewFeedback> {
    extract_json::<InterviewFeedback>(text).filter(|fb| *fb != InterviewFeedback::default())
}

pub fn summarize(submission: &InterviewSubmission) -> InterviewSummary {
    InterviewSummary {
        session_id: uuid::Uuid::new_v4().to_string(),
        job_title: submission.job.job_title.clone(),
        company: submission.job.company_name.clone(),
        questions_answered: submission.answers.len(),
        total_time_minutes: (submission.total_time / 60.0).round() as i64,
        completed_at: submission.completed_at.clone(),
    }
}

/// Avalia a entrevista simulada
///
/// `media_files` é só contado: análise de vídeo não é feita.
pub async fn analyze_submission(submission: &InterviewSubmission, media_files: usize) -> InterviewReport {
    log::info!(
        "🎤 Analyzing interview for '{}' ({} answers, {}s)",
        submission.job.job_title.as_deref().unwrap_or("?"),
        submission.answers.len(),
        submission.total_time
    );

    let prompt = feedback_prompt(submission);
    let feedback = match llm_service::groq_chat(
        GroqModel::Default,
        FEEDBACK_SYSTEM,
        &prompt,
        ChatOptions { temperature: Some(0.7), max_tokens: None },
    )
    .await
    {
        Ok(reply) => parse_feedback(&reply).unwrap_or_else(|| {
            log::warn!("⚠️  Failed to parse interview feedback, using fallback");
            fallback_feedback(submission)
        }),
        Err(e) => {
            log::warn!("⚠️  Interview feedback unavailable ({}), using fallback", e);
            fallback_feedback(submission)
        }
    };

    InterviewReport {
        feedback,
        analysis: MediaAnalysis {
            mock: true,
            message: "Video analysis not implemented yet".to_string(),
            videos_processed: media_files,
        },
        interview_summary: summarize(submission),
    }
}
