//! Interactive terminal round loop.

use std::io::{self, BufRead, Write};

use quiz_core::model::{DifficultyTier, Question};
use services::{QuizSession, RoundState};

/// How a round loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEnd {
    /// Pending and skipped queues both drained.
    Completed,
    /// The learner typed `q` or closed stdin.
    Quit,
}

enum Input {
    Answer(String),
    Skip,
    Quit,
}

fn read_input(input: &mut impl BufRead) -> io::Result<Input> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(Input::Quit);
    }
    let trimmed = line.trim();
    Ok(match trimmed {
        "q" | "Q" => Input::Quit,
        "s" | "S" => Input::Skip,
        other => Input::Answer(other.to_owned()),
    })
}

fn has_option(question: &Question, key: &str) -> bool {
    question
        .options()
        .keys()
        .any(|option| option.eq_ignore_ascii_case(key))
}

fn tier_marker(tier: DifficultyTier) -> &'static str {
    match tier {
        DifficultyTier::Hot => " [hot]",
        DifficultyTier::Warm => " [warm]",
        DifficultyTier::Cool => "",
    }
}

fn show_question(
    session: &QuizSession,
    question: &Question,
    output: &mut impl Write,
) -> io::Result<()> {
    let progress = session.progress();
    let tier = session
        .bank()
        .state(question.id())
        .map_or("", |state| tier_marker(state.tier()));

    writeln!(output)?;
    if progress.state == RoundState::Reviewing {
        writeln!(output, "Review ({} skipped){tier}", progress.deferred)?;
    } else {
        writeln!(
            output,
            "Question {}/{} [{}]{tier}",
            progress.position,
            progress.total,
            question.category()
        )?;
    }
    writeln!(output, "{}", question.text())?;
    for (key, text) in question.options() {
        writeln!(output, "  {key}) {text}")?;
    }
    write!(output, "answer (s = skip, q = quit): ")?;
    output.flush()
}

/// Serve the current round until it completes or the learner quits.
///
/// Pending questions come first; once they run out, skipped questions are
/// served again in the order they were skipped.
///
/// # Errors
///
/// Returns an I/O error if the terminal cannot be read or written, and
/// `io::ErrorKind::Other` wrapping a session error if the bank rejects an answer.
pub fn play_round(
    session: &mut QuizSession,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> io::Result<RoundEnd> {
    while let Some(id) = session.current_question() {
        let Some(question) = session.bank().question(id).cloned() else {
            return Err(io::Error::other(format!("question {id} is missing")));
        };
        show_question(session, &question, output)?;

        match read_input(input)? {
            Input::Quit => {
                writeln!(output)?;
                return Ok(RoundEnd::Quit);
            }
            Input::Skip => {
                session.handle_skip();
                writeln!(output, "skipped")?;
            }
            Input::Answer(key) if has_option(&question, &key) => {
                let correct = question.is_correct(&key);
                session.handle_answer(correct).map_err(io::Error::other)?;
                if correct {
                    writeln!(output, "Correct!")?;
                } else {
                    writeln!(
                        output,
                        "Wrong. The answer is {}) {}",
                        question.correct_answer(),
                        question.correct_text()
                    )?;
                }
            }
            Input::Answer(key) => {
                writeln!(output, "unknown option: {key:?}")?;
            }
        }
    }
    Ok(RoundEnd::Completed)
}

/// Print the end-of-round tally.
///
/// # Errors
///
/// Returns an I/O error if the output cannot be written.
pub fn print_summary(session: &QuizSession, output: &mut impl Write) -> io::Result<()> {
    let summary = session.round_summary();
    writeln!(output)?;
    writeln!(output, "Round finished")?;
    writeln!(
        output,
        "  correct {}  wrong {}  skipped {}",
        summary.correct, summary.wrong, summary.skipped
    )?;
    writeln!(
        output,
        "  accuracy {:.0}%  best streak {}",
        summary.accuracy * 100.0,
        summary.best_streak
    )
}

/// Ask whether to start another round; anything but `y` means no.
///
/// # Errors
///
/// Returns an I/O error if the terminal cannot be read or written.
pub fn ask_another_round(input: &mut impl BufRead, output: &mut impl Write) -> io::Result<bool> {
    write!(output, "Play another round? [y/N] ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::QuestionBank;
    use quiz_core::model::{QuestionId, QuestionSet};
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use services::Clock;
    use std::collections::BTreeMap;
    use std::io::Cursor;

    fn session(count: u64) -> QuizSession {
        let set = QuestionSet::new((1..=count).map(|id| {
            let options = BTreeMap::from([
                ("a".to_owned(), "red".to_owned()),
                ("b".to_owned(), "blue".to_owned()),
            ]);
            Question::new(QuestionId::new(id), "colors", format!("Sky #{id}?"), options, "b")
        }))
        .unwrap();
        let mut session = QuizSession::new(QuestionBank::new(set), Clock::fixed(fixed_now()));
        session.start_round_with(count as usize, &mut StdRng::seed_from_u64(3));
        session
    }

    #[test]
    fn skipped_question_comes_back_for_review() {
        let mut session = session(2);
        let mut input = Cursor::new("s\nb\nb\n");
        let mut output = Vec::new();

        let end = play_round(&mut session, &mut input, &mut output).unwrap();

        assert_eq!(end, RoundEnd::Completed);
        assert_eq!(session.round_summary().correct, 2);
        assert_eq!(session.round_summary().skipped, 1);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Review (1 skipped)"));
    }

    #[test]
    fn wrong_answers_show_the_correct_option() {
        let mut session = session(1);
        let mut input = Cursor::new("a\n");
        let mut output = Vec::new();

        play_round(&mut session, &mut input, &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Wrong. The answer is b) blue"));
        assert!(session.is_round_complete());
    }

    #[test]
    fn unknown_keys_reprompt_and_eof_quits() {
        let mut session = session(2);
        let mut input = Cursor::new("z\n");
        let mut output = Vec::new();

        let end = play_round(&mut session, &mut input, &mut output).unwrap();

        assert_eq!(end, RoundEnd::Quit);
        assert_eq!(session.stats().answered(), 0);
        assert_eq!(session.pending().len(), 2);
        assert!(String::from_utf8(output).unwrap().contains("unknown option"));
    }

    #[test]
    fn only_yes_starts_another_round() {
        let mut output = Vec::new();
        assert!(ask_another_round(&mut Cursor::new("y\n"), &mut output).unwrap());
        assert!(!ask_another_round(&mut Cursor::new("\n"), &mut output).unwrap());
    }
}
