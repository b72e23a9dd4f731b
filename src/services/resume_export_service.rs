use chrono::Datelike;

use crate::{
    models::{Education, Experience, User},
    utils::{dates::parse_date_field, error::AppError},
};

/// Modelo do currículo exportado; os marcadores `{{...}}` são substituídos
/// por texto já escapado
const RESUME_TEMPLATE: &str = r"\documentclass[11pt]{article}
\usepackage[margin=0.8in]{geometry}
\usepackage{enumitem}
\setlist[itemize]{leftmargin=*, itemsep=2pt}
\pagestyle{empty}

\begin{document}

\begin{center}
{\LARGE \textbf{{{NAME}}}}\\[4pt]
{{EMAIL}} \quad {{PHONE}}
\end{center}

{{SUMMARY}}
{{SKILLS}}
{{EXPERIENCE}}
{{EDUCATION}}
\end{document}
";

/// Escapa os caracteres especiais do LaTeX
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

fn section(title: &str, body: &str) -> String {
    format!("\\section*{{{}}}\n{}\n", title, body)
}

fn itemize(items: &[String]) -> String {
    let lines: Vec<String> = items.iter().map(|item| format!("  \\item {}", item)).collect();
    format!("\\begin{{itemize}}\n{}\n\\end{{itemize}}", lines.join("\n"))
}

fn year_of(date: Option<&str>) -> Option<i32> {
    date.and_then(parse_date_field).map(|dt| dt.year())
}

fn text_or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    value.as_deref().filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
}

/// "Cargo at Empresa (2020 - Present)"
pub fn experience_line(exp: &Experience) -> String {
    let start = year_of(exp.start_date.as_deref())
        .map(|y| y.to_string())
        .unwrap_or_else(|| "?".to_string());
    let end = year_of(exp.end_date.as_deref())
        .map(|y| y.to_string())
        .unwrap_or_else(|| "Present".to_string());
    escape_latex(&format!(
        "{} at {} ({} - {})",
        text_or(&exp.position, "Role"),
        text_or(&exp.company, "Company"),
        start,
        end
    ))
}

/// "Grau in Área, Instituição (2016 - 2020)"
pub fn education_line(ed: &Education) -> String {
    let years = match (ed.start_year, ed.end_year) {
        (Some(start), Some(end)) => format!(" ({} - {})", start, end),
        (Some(start), None) => format!(" ({} - Present)", start),
        (None, Some(end)) => format!(" ({})", end),
        (None, None) => String::new(),
    };
    let degree = match ed.field_of_study.as_deref().filter(|f| !f.trim().is_empty()) {
        Some(field) => format!("{} in {}", text_or(&ed.degree, "Degree"), field),
        None => text_or(&ed.degree, "Degree").to_string(),
    };
    escape_latex(&format!("{}, {}{}", degree, text_or(&ed.institution, "Institution"), years))
}

/// Renderiza o currículo salvo do usuário como fonte LaTeX
///
/// Seções vazias são omitidas. Sem currículo salvo o resultado é 404.
pub fn render_latex(user: &User) -> Result<String, AppError> {
    let resume = user
        .resume
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;

    let summary = resume
        .summary
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| section("Summary", &escape_latex(s.trim())))
        .unwrap_or_default();

    let skills = if resume.skills.is_empty() {
        String::new()
    } else {
        section("Skills", &escape_latex(&resume.skills.join(", ")))
    };

    let experience = if resume.experience.is_empty() {
        String::new()
    } else {
        let items: Vec<String> = resume.experience.iter().map(experience_line).collect();
        section("Experience", &itemize(&items))
    };

    let education = if resume.education.is_empty() {
        String::new()
    } else {
        let items: Vec<String> = resume.education.iter().map(education_line).collect();
        section("Education", &itemize(&items))
    };

    Ok(RESUME_TEMPLATE
        .replace("{{NAME}}", &escape_latex(&user.full_name()))
        .replace("{{EMAIL}}", &escape_latex(&user.email))
        .replace("{{PHONE}}", &escape_latex(&user.phone_number))
        .replace("{{SUMMARY}}", &summary)
        .replace("{{SKILLS}}", &skills)
        .replace("{{EXPERIENCE}}", &experience)
        .replace("{{EDUCATION}}", &education))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(resume: serde_json::Value) -> User {
        serde_json::from_value(serde_json::json!({
            "firebaseUid": "uid-1",
            "email": "jane_doe@example.com",
            "phoneNumber": "+1 555 0100",
            "profile": { "firstName": "Jane", "lastName": "Doe" },
            "resume": resume,
            "lastLogin": null,
            "createdAt": null,
            "updatedAt": null
        }))
        .unwrap()
    }

    #[test]
    fn test_escape_latex() {
        assert_eq!(escape_latex("R&D 100% #1"), r"R\&D 100\% \#1");
        assert_eq!(escape_latex(r"a_b {c} \ ~^"), r"a\_b \{c\} \textbackslash{} \textasciitilde{}\textasciicircum{}");
    }

    #[test]
    fn test_render_fills_template() {
        let tex = render_latex(&user(serde_json::json!({
            "summary": "Backend engineer",
            "skills": ["Rust", "C#"],
            "experience": [{
                "company": "Acme",
                "position": "Engineer",
                "startDate": "2020-03-01T00:00:00.000Z"
            }],
            "education": [{
                "institution": "State U",
                "degree": "BSc",
                "fieldOfStudy": "CS",
                "startYear": 2016,
                "endYear": 2020
            }]
        })))
        .unwrap();

        assert!(tex.starts_with(r"\documentclass"));
        assert!(tex.contains(r"\textbf{Jane Doe}"));
        assert!(tex.contains(r"jane\_doe@example.com"));
        assert!(tex.contains(r"Rust, C\#"));
        assert!(tex.contains(r"\item Engineer at Acme (2020 - Present)"));
        assert!(tex.contains(r"\item BSc in CS, State U (2016 - 2020)"));
        assert!(!tex.contains("{{"));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let tex = render_latex(&user(serde_json::json!({ "skills": ["Go"] }))).unwrap();
        assert!(tex.contains(r"\section*{Skills}"));
        assert!(!tex.contains(r"\section*{Experience}"));
        assert!(!tex.contains(r"\section*{Summary}"));
    }

    #[test]
    fn test_missing_resume_is_not_found() {
        let mut without = user(serde_json::json!({}));
        without.resume = None;
        assert!(matches!(render_latex(&without), Err(AppError::NotFound(_))));
    }
}
