use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Challenge difficulty as stored by the portal.
///
/// The wire strings carry the pt-BR accents; an unrecognized value maps to
/// `Desconhecida` so a newly authored level never breaks the catalog view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Difficulty {
    #[serde(rename = "fácil")]
    Facil,
    #[serde(rename = "médio")]
    Medio,
    #[serde(rename = "difícil")]
    Dificil,
    #[serde(rename = "desconhecida")]
    Desconhecida,
}

impl From<String> for Difficulty {
    fn from(value: String) -> Self {
        match value.as_str() {
            "fácil" => Self::Facil,
            "médio" => Self::Medio,
            "difícil" => Self::Dificil,
            _ => Self::Desconhecida,
        }
    }
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facil => "fácil",
            Self::Medio => "médio",
            Self::Dificil => "difícil",
            Self::Desconhecida => "desconhecida",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate verdict of a graded submission.
///
/// `Pendente` is the server-side default before grading finishes; this
/// client only ever observes it in history listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    #[serde(rename = "aprovado")]
    Aprovado,
    #[serde(rename = "reprovado")]
    Reprovado,
    #[serde(rename = "pendente")]
    Pendente,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aprovado => "aprovado",
            Self::Reprovado => "reprovado",
            Self::Pendente => "pendente",
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One (input, expected output) pair of a challenge.
/// Order is significant: display order equals grading order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub input: String,
    pub expected_output: String,
}

/// Catalog row: summary fields only, test cases omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub created_by_username: Option<String>,
    pub created_date: Option<NaiveDateTime>,
}

/// Full challenge detail, including the graded test cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    pub difficulty: Difficulty,
    pub created_by_username: Option<String>,
    pub created_date: Option<NaiveDateTime>,
}

/// A persisted, graded attempt at a challenge. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub challenge_id: i64,
    #[serde(default)]
    pub challenge_title: Option<String>,
    #[serde(default, rename = "submitted_code")]
    pub code: String,
    pub status: SubmissionStatus,
    pub submission_date: Option<NaiveDateTime>,
}

/// Per-test-case grading result, one per challenge test case, same order.
/// `test_case` is the 1-based ordinal of the case it grades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub test_case: u32,
    #[serde(default)]
    pub input: String,
    pub expected: String,
    pub actual: Option<String>,
    pub passed: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the grading service for one submission.
///
/// `all_passed` is the single source of truth for the aggregate verdict;
/// the client renders it as-is and never recomputes it from `results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub submission: Submission,
    pub results: Vec<TestResult>,
    pub all_passed: bool,
}

/// Raw outcome of an ungraded, ephemeral execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutput {
    pub success: bool,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_wire_shape() {
        let json = r#"{
            "id": 1,
            "title": "Soma Simples",
            "description": "Some dois números",
            "input_format": "dois inteiros",
            "output_format": null,
            "test_cases": [
                {"input": "", "expected_output": "5"},
                {"input": "2 3", "expected_output": "5"}
            ],
            "difficulty": "fácil",
            "created_by_username": "maria",
            "created_date": "2024-03-01T12:30:00"
        }"#;

        let challenge: Challenge = serde_json::from_str(json).unwrap();
        assert_eq!(challenge.id, 1);
        assert_eq!(challenge.difficulty, Difficulty::Facil);
        assert_eq!(challenge.test_cases.len(), 2);
        assert_eq!(challenge.test_cases[0].input, "");
        assert!(challenge.output_format.is_none());
        assert!(challenge.created_date.is_some());
    }

    #[test]
    fn test_unknown_difficulty_does_not_fail() {
        let json = r#"{
            "id": 2,
            "title": "Enigma",
            "description": "?",
            "difficulty": "impossível",
            "created_by_username": null,
            "created_date": null
        }"#;

        let summary: ChallengeSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.difficulty, Difficulty::Desconhecida);
    }

    #[test]
    fn test_submission_status_strings() {
        let submission: Submission = serde_json::from_str(
            r#"{"id": 9, "challenge_id": 1, "status": "pendente", "submission_date": null}"#,
        )
        .unwrap();
        assert_eq!(submission.status, SubmissionStatus::Pendente);
        assert_eq!(SubmissionStatus::Aprovado.to_string(), "aprovado");
        assert_eq!(SubmissionStatus::Reprovado.to_string(), "reprovado");
    }

    #[test]
    fn test_submission_outcome_wire_shape() {
        let json = r#"{
            "submission": {
                "id": 10,
                "challenge_id": 1,
                "submitted_code": "print(5)",
                "status": "aprovado",
                "submission_date": "2024-03-02T09:00:00"
            },
            "results": [
                {"test_case": 1, "input": "", "expected": "5", "actual": "5", "passed": true, "error": null}
            ],
            "all_passed": true
        }"#;

        let outcome: SubmissionOutcome = serde_json::from_str(json).unwrap();
        assert!(outcome.all_passed);
        assert_eq!(outcome.results[0].test_case, 1);
        assert_eq!(outcome.submission.code, "print(5)");
    }

    #[test]
    fn test_execution_output_defaults() {
        let output: ExecutionOutput =
            serde_json::from_str(r#"{"success": false, "error": "SyntaxError"}"#).unwrap();
        assert!(!output.success);
        assert_eq!(output.output, "");
        assert_eq!(output.error.as_deref(), Some("SyntaxError"));
    }
}
