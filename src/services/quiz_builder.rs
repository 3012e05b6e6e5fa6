use rand::{seq::SliceRandom, Rng};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{attempt::AttemptQuestion, question::OPTION_COUNT, Question},
};

/// Draws `count` distinct questions from `pool` without replacement and
/// shuffles each question's options independently. Questions whose answer
/// key is out of range are not drawable.
pub fn draw_questions<R: Rng + ?Sized>(
    pool: &[Question],
    count: u32,
    rng: &mut R,
) -> AppResult<Vec<AttemptQuestion>> {
    let drawable: Vec<&Question> = pool
        .iter()
        .filter(|q| q.is_active && q.has_valid_answer_key())
        .collect();

    let requested = count as usize;
    if drawable.len() < requested {
        return Err(AppError::InsufficientQuestions {
            available: drawable.len(),
            requested,
        });
    }

    let drawn = drawable
        .choose_multiple(rng, requested)
        .map(|question| snapshot(question, rng))
        .collect();
    Ok(drawn)
}

fn snapshot<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> AttemptQuestion {
    let mut option_order: [u8; OPTION_COUNT] = [0, 1, 2, 3];
    option_order.shuffle(rng);

    let correct_position = option_order
        .iter()
        .position(|&index| index == question.correct_option)
        .unwrap_or_default() as u8;

    AttemptQuestion {
        question_id: question.id.clone(),
        option_order,
        correct_position,
    }
}

/// Options of `question` in the order they were presented for `snapshot`.
pub fn presented_options(question: &Question, snapshot: &AttemptQuestion) -> Vec<String> {
    snapshot
        .option_order
        .iter()
        .map(|&index| question.options[index as usize].clone())
        .collect()
}
