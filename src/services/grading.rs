use time::{Duration, PrimitiveDateTime};

use crate::services::questions::OPTION_COUNT;

/// Stored in place of an answer the student left blank.
pub(crate) const UNANSWERED: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GradeOutcome {
    pub(crate) score: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: i32,
}

/// Maps a submitted answer sheet onto stored option indices. `None`, negative and
/// out-of-range values all become [`UNANSWERED`]; the caller checks the length.
pub(crate) fn normalize_answers(raw: &[Option<i64>]) -> Vec<i32> {
    raw.iter()
        .map(|answer| match answer {
            Some(index) if (0..OPTION_COUNT as i64).contains(index) => *index as i32,
            _ => UNANSWERED,
        })
        .collect()
}

pub(crate) fn is_correct(answer: i32, correct_answer: i16) -> bool {
    answer != UNANSWERED && answer == i32::from(correct_answer)
}

pub(crate) fn grade(answer_key: &[i16], answers: &[i32]) -> GradeOutcome {
    let score = answer_key
        .iter()
        .zip(answers)
        .filter(|(correct, answer)| is_correct(**answer, **correct))
        .count() as i32;
    let total_questions = answer_key.len() as i32;

    GradeOutcome { score, total_questions, percentage: percentage(score, total_questions) }
}

/// `score / total * 100`, rounded half up.
pub(crate) fn percentage(score: i32, total_questions: i32) -> i32 {
    if total_questions <= 0 {
        return 0;
    }
    let scaled = i64::from(score) * 200 + i64::from(total_questions);
    (scaled / (2 * i64::from(total_questions))) as i32
}

pub(crate) fn session_deadline(
    started_at: PrimitiveDateTime,
    duration_minutes: i32,
) -> PrimitiveDateTime {
    started_at + Duration::minutes(i64::from(duration_minutes))
}

pub(crate) fn is_late(
    deadline: PrimitiveDateTime,
    submitted_at: PrimitiveDateTime,
    grace_seconds: i64,
) -> bool {
    submitted_at > deadline + Duration::seconds(grace_seconds)
}

pub(crate) fn elapsed_seconds(started_at: PrimitiveDateTime, now: PrimitiveDateTime) -> i64 {
    (now - started_at).whole_seconds().max(0)
}
