use thiserror::Error;
use uuid::Uuid;

use crate::core::{state::AppState, time::primitive_now_utc};
use crate::db::models::{Question, Test, TestResult, TestSession};
use crate::db::types::SessionStatus;
use crate::repositories;
use crate::services::grading::{self, GradeOutcome};

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("Test not found")]
    TestNotFound,
    #[error("Test not purchased")]
    NotPurchased,
    #[error("Test already completed")]
    AlreadyCompleted,
    #[error("Test is not in progress")]
    NotInProgress,
    #[error("Expected {expected} answers, got {actual}")]
    InvalidAnswerCount { expected: usize, actual: usize },
    #[error("Test not completed yet")]
    NotCompleted,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Question as shown while taking the test: no answer key, no explanation.
#[derive(Debug, Clone)]
pub(crate) struct IssuedQuestion {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct IssuedTest {
    pub(crate) test: Test,
    pub(crate) session: TestSession,
    pub(crate) questions: Vec<IssuedQuestion>,
    pub(crate) remaining_seconds: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct Submission {
    pub(crate) answers: Vec<Option<i64>>,
    pub(crate) time_taken_minutes: Option<i32>,
}

#[derive(Debug, Clone)]
pub(crate) struct SubmittedResult {
    pub(crate) outcome: GradeOutcome,
    pub(crate) is_late: bool,
    pub(crate) elapsed_seconds: i64,
    pub(crate) result: TestResult,
}

#[derive(Debug, Clone)]
pub(crate) struct SolutionItem {
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: i16,
    pub(crate) student_answer: Option<i32>,
    pub(crate) is_correct: bool,
    pub(crate) explanation: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Solutions {
    pub(crate) test: Test,
    pub(crate) result: TestResult,
    pub(crate) items: Vec<SolutionItem>,
}

/// Starts the timed session, or returns the running one with its original clock.
/// The test row is share-locked so a concurrent question upload cannot slip in
/// between opening the session and reading its questions.
pub(crate) async fn issue(
    state: &AppState,
    student_id: &str,
    test_id: &str,
) -> Result<IssuedTest, SessionError> {
    let mut tx = state.db().begin().await?;
    let test = repositories::tests::lock_for_share(&mut *tx, test_id)
        .await?
        .ok_or(SessionError::TestNotFound)?;

    if !repositories::purchases::exists(&mut *tx, student_id, test_id).await? {
        return Err(SessionError::NotPurchased);
    }
    if repositories::results::exists(&mut *tx, student_id, test_id).await? {
        return Err(SessionError::AlreadyCompleted);
    }

    let now = primitive_now_utc();
    let created = repositories::sessions::create(
        &mut *tx,
        repositories::sessions::CreateSession {
            id: &Uuid::new_v4().to_string(),
            student_id,
            test_id,
            started_at: now,
            deadline_at: grading::session_deadline(now, test.duration_minutes),
        },
    )
    .await?;

    let session = repositories::sessions::find(&mut *tx, student_id, test_id)
        .await?
        .ok_or(SessionError::NotInProgress)?;
    if session.status != SessionStatus::InProgress {
        return Err(SessionError::AlreadyCompleted);
    }

    let questions = repositories::questions::list_by_test(&mut *tx, test_id).await?;
    tx.commit().await?;

    if created {
        tracing::info!(student_id, test_id, session_id = %session.id, "Test session started");
    }

    let questions = questions
        .into_iter()
        .map(|question| IssuedQuestion {
            id: question.id,
            question_text: question.question_text,
            options: question.options.0,
        })
        .collect();

    let remaining_seconds = (session.deadline_at - now).whole_seconds().max(0);

    Ok(IssuedTest { test, session, questions, remaining_seconds })
}

/// Grades the answer sheet and stores the single result for (student, test).
pub(crate) async fn submit(
    state: &AppState,
    student_id: &str,
    test_id: &str,
    submission: Submission,
) -> Result<SubmittedResult, SessionError> {
    let mut tx = state.db().begin().await?;

    let Some(session) = repositories::sessions::lock_for_update(&mut *tx, student_id, test_id).await?
    else {
        return Err(SessionError::NotInProgress);
    };
    if session.status == SessionStatus::Submitted {
        return Err(SessionError::AlreadyCompleted);
    }

    let questions = repositories::questions::list_by_test(&mut *tx, test_id).await?;
    if submission.answers.len() != questions.len() {
        return Err(SessionError::InvalidAnswerCount {
            expected: questions.len(),
            actual: submission.answers.len(),
        });
    }

    let answers = grading::normalize_answers(&submission.answers);
    let answer_key: Vec<i16> = questions.iter().map(|question| question.correct_answer).collect();
    let outcome = grading::grade(&answer_key, &answers);

    let now = primitive_now_utc();
    let is_late = grading::is_late(
        session.deadline_at,
        now,
        state.settings().grading().submit_grace_seconds,
    );
    let elapsed_seconds = grading::elapsed_seconds(session.started_at, now);

    let result = repositories::results::create(
        &mut *tx,
        repositories::results::CreateResult {
            student_id,
            test_id,
            answers,
            score: outcome.score,
            total_questions: outcome.total_questions,
            percentage: outcome.percentage,
            time_taken_minutes: submission.time_taken_minutes,
            elapsed_seconds,
            is_late,
            completed_at: now,
        },
    )
    .await?
    .ok_or(SessionError::AlreadyCompleted)?;

    repositories::sessions::submit(&mut *tx, &session.id, now).await?;
    tx.commit().await?;

    metrics::counter!("test_submissions_total", "late" => if is_late { "true" } else { "false" })
        .increment(1);
    tracing::info!(
        student_id,
        test_id,
        score = outcome.score,
        total = outcome.total_questions,
        is_late,
        "Test submitted"
    );

    Ok(SubmittedResult { outcome, is_late, elapsed_seconds, result })
}

pub(crate) async fn solutions(
    state: &AppState,
    student_id: &str,
    test_id: &str,
) -> Result<Solutions, SessionError> {
    let result = repositories::results::find(state.db(), student_id, test_id)
        .await?
        .ok_or(SessionError::NotCompleted)?;
    let test = repositories::tests::find_by_id(state.db(), test_id)
        .await?
        .ok_or(SessionError::TestNotFound)?;
    let questions = repositories::questions::list_by_test(state.db(), test_id).await?;

    let items = solution_items(questions, &result.answers.0);
    Ok(Solutions { test, result, items })
}

fn solution_items(questions: Vec<Question>, answers: &[i32]) -> Vec<SolutionItem> {
    questions
        .into_iter()
        .enumerate()
        .map(|(index, question)| {
            let answer = answers.get(index).copied().unwrap_or(grading::UNANSWERED);
            SolutionItem {
                is_correct: grading::is_correct(answer, question.correct_answer),
                student_answer: (answer != grading::UNANSWERED).then_some(answer),
                question_text: question.question_text,
                options: question.options.0,
                correct_answer: question.correct_answer,
                explanation: question.explanation,
            }
        })
        .collect()
}
