// Result aggregation and rendering
//
// Pure presentation over already-graded data. The aggregate verdict comes
// from the grading service's `all_passed` flag and per-case verdicts come
// from each result's `passed` flag; nothing here re-derives pass/fail by
// comparing output strings.

use portal_common::types::{
    Challenge, ChallengeSummary, ExecutionOutput, Submission, SubmissionOutcome, TestResult,
};

/// Settled transport failure of the execution gateway
pub const RUN_FAILED: &str = "Erro ao executar código";
/// Settled transport failure of the submission gateway
pub const SUBMIT_FAILED: &str = "Erro ao submeter código";

const EMPTY_INPUT: &str = "(vazio)";
const MISSING_ACTUAL: &str = "Erro";
const MISSING_FORMAT: &str = "Não especificado";
const MISSING_DATE: &str = "-";

/// Transcript of an ungraded run: ephemeral feedback only.
pub fn render_run(output: &ExecutionOutput) -> String {
    if output.success {
        format!("Execução bem-sucedida!\nSaída: {}", output.output)
    } else {
        format!(
            "Erro na execução:\n{}",
            output.error.as_deref().unwrap_or(RUN_FAILED)
        )
    }
}

/// Transcript of a graded submission, in test-case order.
/// The header verdict is taken from `all_passed` as-is.
pub fn render_submission(outcome: &SubmissionOutcome) -> String {
    let verdict = if outcome.all_passed {
        "APROVADA"
    } else {
        "REPROVADA"
    };

    let mut text = format!("Submissão {}!\n\n", verdict);
    for result in &outcome.results {
        text.push_str(&render_test_result(result));
    }
    text
}

fn render_test_result(result: &TestResult) -> String {
    let input = if result.input.is_empty() {
        EMPTY_INPUT
    } else {
        &result.input
    };
    let actual = result.actual.as_deref().unwrap_or(MISSING_ACTUAL);
    let status = if result.passed {
        "✅ PASSOU"
    } else {
        "❌ FALHOU"
    };

    let mut block = format!(
        "Teste {}:\n  Entrada: {}\n  Esperado: {}\n  Obtido: {}\n  Status: {}\n",
        result.test_case, input, result.expected, actual, status
    );
    if let Some(error) = &result.error {
        block.push_str(&format!("  Erro: {}\n", error));
    }
    block.push('\n');
    block
}

/// One catalog line: 1-based position, title, difficulty, author, date.
pub fn catalog_row(index: usize, challenge: &ChallengeSummary) -> String {
    let author = challenge.created_by_username.as_deref().unwrap_or("-");
    let date = challenge
        .created_date
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| MISSING_DATE.to_string());

    format!(
        "[{}] {} ({}) - Por: {} | {}",
        index + 1,
        challenge.title,
        challenge.difficulty,
        author,
        date
    )
}

/// One history line: position, verdict and timestamp.
pub fn history_row(index: usize, submission: &Submission) -> String {
    let date = submission
        .submission_date
        .map(|d| d.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| MISSING_DATE.to_string());

    format!("#{} - {} - {}", index + 1, submission.status, date)
}

/// The challenge panel shown on selection: description, I/O formats and
/// the visible test cases.
pub fn challenge_detail(challenge: &Challenge) -> String {
    let mut text = format!("{} ({})\n\n", challenge.title, challenge.difficulty);
    text.push_str(&format!("Descrição:\n{}\n\n", challenge.description));
    text.push_str(&format!(
        "Formato de Entrada: {}\n",
        challenge.input_format.as_deref().unwrap_or(MISSING_FORMAT)
    ));
    text.push_str(&format!(
        "Formato de Saída: {}\n\n",
        challenge.output_format.as_deref().unwrap_or(MISSING_FORMAT)
    ));

    if challenge.test_cases.is_empty() {
        text.push_str("Nenhum caso de teste disponível\n");
    } else {
        text.push_str("Casos de Teste:\n");
        for case in &challenge.test_cases {
            let input = if case.input.is_empty() {
                EMPTY_INPUT
            } else {
                &case.input
            };
            text.push_str(&format!(
                "  Entrada: {} | Saída Esperada: {}\n",
                input, case.expected_output
            ));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_common::types::{SubmissionStatus, TestCase};

    fn outcome(all_passed: bool, results: Vec<TestResult>) -> SubmissionOutcome {
        SubmissionOutcome {
            submission: Submission {
                id: 1,
                challenge_id: 1,
                challenge_title: None,
                code: "print(5)".to_string(),
                status: if all_passed {
                    SubmissionStatus::Aprovado
                } else {
                    SubmissionStatus::Reprovado
                },
                submission_date: None,
            },
            results,
            all_passed,
        }
    }

    fn passing_result() -> TestResult {
        TestResult {
            test_case: 1,
            input: String::new(),
            expected: "5".to_string(),
            actual: Some("5".to_string()),
            passed: true,
            error: None,
        }
    }

    #[test]
    fn test_approved_header() {
        let text = render_submission(&outcome(true, vec![passing_result()]));
        assert!(text.starts_with("Submissão APROVADA!"));
        assert!(text.contains("Teste 1:"));
        assert!(text.contains("Status: ✅ PASSOU"));
    }

    #[test]
    fn test_rejected_header_with_actual_output() {
        let result = TestResult {
            test_case: 1,
            input: String::new(),
            expected: "5".to_string(),
            actual: Some("4".to_string()),
            passed: false,
            error: None,
        };
        let text = render_submission(&outcome(false, vec![result]));
        assert!(text.starts_with("Submissão REPROVADA!"));
        assert!(text.contains("Obtido: 4"));
        assert!(text.contains("Status: ❌ FALHOU"));
    }

    #[test]
    fn test_header_follows_all_passed_not_per_case_flags() {
        // The grading service owns the aggregate verdict; even a response
        // whose per-case flags disagree renders the server's verdict.
        let result = TestResult {
            passed: false,
            ..passing_result()
        };
        let text = render_submission(&outcome(true, vec![result]));
        assert!(text.starts_with("Submissão APROVADA!"));
    }

    #[test]
    fn test_placeholders_for_empty_input_and_missing_actual() {
        let result = TestResult {
            test_case: 1,
            input: String::new(),
            expected: "5".to_string(),
            actual: None,
            passed: false,
            error: Some("NameError: x".to_string()),
        };
        let text = render_submission(&outcome(false, vec![result]));
        assert!(text.contains("Entrada: (vazio)"));
        assert!(text.contains("Obtido: Erro"));
        assert!(text.contains("Erro: NameError: x"));
    }

    #[test]
    fn test_results_render_in_order() {
        let results = vec![
            TestResult {
                test_case: 1,
                ..passing_result()
            },
            TestResult {
                test_case: 2,
                input: "2 3".to_string(),
                ..passing_result()
            },
        ];
        let text = render_submission(&outcome(true, results));
        let first = text.find("Teste 1:").unwrap();
        let second = text.find("Teste 2:").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_run_transcripts() {
        let ok = ExecutionOutput {
            success: true,
            output: "5".to_string(),
            error: None,
        };
        assert_eq!(render_run(&ok), "Execução bem-sucedida!\nSaída: 5");

        let failed = ExecutionOutput {
            success: false,
            output: String::new(),
            error: Some("SyntaxError".to_string()),
        };
        assert_eq!(render_run(&failed), "Erro na execução:\nSyntaxError");

        let synthetic = ExecutionOutput {
            success: false,
            output: String::new(),
            error: None,
        };
        assert!(render_run(&synthetic).contains(RUN_FAILED));
    }

    #[test]
    fn test_challenge_detail_fallbacks() {
        let challenge = Challenge {
            id: 1,
            title: "Soma".to_string(),
            description: "Some".to_string(),
            input_format: None,
            output_format: None,
            test_cases: vec![TestCase {
                input: String::new(),
                expected_output: "5".to_string(),
            }],
            difficulty: portal_common::types::Difficulty::Facil,
            created_by_username: None,
            created_date: None,
        };
        let text = challenge_detail(&challenge);
        assert!(text.contains("Formato de Entrada: Não especificado"));
        assert!(text.contains("Entrada: (vazio) | Saída Esperada: 5"));
    }
}
