//! Line-oriented terminal front end for a quiz attempt.

use std::sync::Arc;

use quiz_core::model::{Quiz, QuizResult};
use services::{
    Advance, LeaderboardService, LeaderboardView, QuestionState, QuizLoopService, QuizSession,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

/// One parsed line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// 0-based option index.
    Select(usize),
    Check,
    Next,
    Previous,
    /// 0-based question index.
    Jump(usize),
    Restart,
    Map,
    Help,
    Quit,
}

fn parse_action(line: &str) -> Option<Action> {
    let line = line.trim();
    let mut parts = line.split_whitespace();
    let head = parts.next()?;

    let action = match head {
        "c" | "check" => Action::Check,
        "n" | "next" => Action::Next,
        "p" | "prev" => Action::Previous,
        "r" | "restart" => Action::Restart,
        "m" | "map" => Action::Map,
        "?" | "h" | "help" => Action::Help,
        "q" | "quit" => Action::Quit,
        "g" | "go" => {
            let n: usize = parts.next()?.parse().ok()?;
            Action::Jump(n.checked_sub(1)?)
        }
        other => {
            let n: usize = other.parse().ok()?;
            Action::Select(n.checked_sub(1)?)
        }
    };

    if parts.next().is_some() {
        return None;
    }
    Some(action)
}

fn print_help() {
    println!("  <number>  select an option");
    println!("  c         check the selected answer");
    println!("  n         next question (after checking)");
    println!("  p         previous question");
    println!("  g <n>     go to question n");
    println!("  m         show answered questions");
    println!("  r         restart with a new shuffle");
    println!("  q         quit (progress is saved)");
}

async fn prompt(input: &mut Input, label: &str) -> std::io::Result<Option<String>> {
    println!("{label}");
    input.next_line().await
}

/// Run an attempt until it completes or the user quits.
pub async fn take(
    loop_svc: &QuizLoopService,
    leaderboard: &LeaderboardService,
    quiz: Arc<Quiz>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = loop_svc.start(Arc::clone(&quiz)).await;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    println!("{} ({} questions, pass at {}%)", quiz.title(), quiz.len(), quiz.passing_score());
    if !session.answers().is_empty() {
        println!("Resuming your previous attempt.");
    }
    println!("Type ? for commands.");

    let result = loop {
        if let Some(result) = loop_svc.finish_if_expired(&mut session).await {
            println!("Time is up.");
            break result;
        }
        if let Some(result) = session.result() {
            break result.clone();
        }

        render_question(&session, loop_svc);
        let Some(line) = input.next_line().await? else {
            println!("Progress saved.");
            return Ok(());
        };
        let Some(action) = parse_action(&line) else {
            if !line.trim().is_empty() {
                println!("Unrecognized command. Type ? for help.");
            }
            continue;
        };

        let outcome = match action {
            Action::Select(index) => loop_svc.select_option(&mut session, index).await,
            Action::Check => loop_svc.reveal(&mut session).await,
            Action::Next => match loop_svc.next(&mut session).await {
                Ok(Advance::Completed(result)) => break result,
                Ok(Advance::Moved { .. }) => Ok(()),
                Err(err) => Err(err),
            },
            Action::Previous => loop_svc.previous(&mut session).await.map(|_| ()),
            Action::Jump(index) => loop_svc.jump_to(&mut session, index).await,
            Action::Restart => {
                loop_svc.restart(&mut session).await;
                println!("Started over.");
                Ok(())
            }
            Action::Map => {
                print_map(&session);
                Ok(())
            }
            Action::Help => {
                print_help();
                Ok(())
            }
            Action::Quit => {
                println!("Progress saved.");
                return Ok(());
            }
        };
        if let Err(err) = outcome {
            println!("{err}");
        }
    };

    print_result(&quiz, &result);
    submit_score(&mut input, leaderboard, &result).await?;
    let view = leaderboard.view(quiz.id()).await;
    print_leaderboard(&quiz, &view);
    Ok(())
}

fn render_question(session: &QuizSession, loop_svc: &QuizLoopService) {
    let Some(question) = session.current_question() else {
        println!("This quiz has no questions. Press n to finish.");
        return;
    };
    let progress = session.progress();
    let state = session.current_state().unwrap_or(QuestionState::Unanswered);

    println!();
    print!("Question {}/{}", progress.position, progress.total);
    if let Some(remaining) = loop_svc.time_remaining(session) {
        print!("  [{}:{:02} left]", remaining.num_minutes(), remaining.num_seconds() % 60);
    }
    println!();
    if !question.category().is_empty() {
        println!("[{}]", question.category());
    }
    println!("{}", question.prompt());

    for (i, option) in question.options().iter().enumerate() {
        let marker = match state {
            QuestionState::Revealed(_) if i == question.correct_answer() => "+",
            QuestionState::Revealed(selected) if i == selected => "x",
            QuestionState::Answered(selected) if i == selected => ">",
            _ => " ",
        };
        println!(" {marker} {}. {option}", i + 1);
    }

    if let QuestionState::Revealed(selected) = state {
        if question.is_correct(selected) {
            println!("Correct!");
        } else {
            println!("Incorrect. The answer is: {}", question.question().correct_option());
        }
        if let Some(explanation) = question.explanation() {
            println!("{explanation}");
        }
    }
}

fn print_map(session: &QuizSession) {
    let line: Vec<String> = session
        .navigator()
        .iter()
        .map(|item| {
            let n = item.index + 1;
            match (item.current, item.answered) {
                (true, _) => format!("[{n}]"),
                (false, true) => format!("{n}*"),
                (false, false) => n.to_string(),
            }
        })
        .collect();
    println!("{}", line.join(" "));
    let progress = session.progress();
    println!("{} of {} answered", progress.answered, progress.total);
}

fn print_result(quiz: &Quiz, result: &QuizResult) {
    println!();
    println!("{} complete", quiz.title());
    println!(
        "Score: {}/{} ({}%) {}",
        result.correct_answers,
        result.total_questions,
        result.percentage,
        if result.passed { "PASSED" } else { "NOT PASSED" }
    );
    if result.unanswered() > 0 {
        println!("Unanswered: {}", result.unanswered());
    }
    println!("Points: {}", result.points());
}

async fn submit_score(
    input: &mut Input,
    leaderboard: &LeaderboardService,
    result: &QuizResult,
) -> std::io::Result<()> {
    let Some(name) = prompt(input, "Name for the leaderboard (blank to skip):").await? else {
        return Ok(());
    };
    if name.trim().is_empty() {
        return Ok(());
    }
    let email = prompt(input, "Email (optional):").await?.unwrap_or_default();

    match leaderboard.submit(result, &name, Some(&email)).await {
        Ok(entry) => println!("Submitted as {}.", entry.name),
        Err(err) if err.is_validation() => println!("Not submitted: {err}"),
        Err(err) => {
            tracing::warn!(error = %err, "leaderboard submission failed");
            println!("Could not reach the leaderboard; your result is still saved locally.");
        }
    }
    Ok(())
}

pub fn print_leaderboard(quiz: &Quiz, view: &LeaderboardView) {
    println!();
    println!("Leaderboard: {}", quiz.title());
    if view.is_empty() {
        println!("  No entries yet.");
        return;
    }
    for ranked in &view.entries {
        println!(
            "{:>3}. {:<24} {:>3}%  {:>4} pts  {}",
            ranked.rank,
            ranked.entry.name,
            ranked.entry.percentage,
            ranked.entry.points,
            ranked.entry.completed_at.format("%Y-%m-%d"),
        );
    }
    if let (Some(best), Some(avg)) = (view.stats.highest_percentage, view.stats.average_percentage) {
        println!(
            "Best {best}%, average {avg:.1}% over {} attempts",
            view.stats.total_attempts
        );
    }
}

pub fn print_history(results: &[QuizResult]) {
    if results.is_empty() {
        println!("No finished attempts yet.");
        return;
    }
    for result in results {
        println!(
            "{}  {:<20} {:>3}%  {}/{}  {}",
            result.completed_at.format("%Y-%m-%d %H:%M"),
            result.quiz_id,
            result.percentage,
            result.correct_answers,
            result.total_questions,
            if result.passed { "passed" } else { "failed" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_option_numbers_as_zero_based() {
        assert_eq!(parse_action("1"), Some(Action::Select(0)));
        assert_eq!(parse_action(" 3 "), Some(Action::Select(2)));
        assert_eq!(parse_action("0"), None);
    }

    #[test]
    fn parses_jump_with_argument() {
        assert_eq!(parse_action("g 4"), Some(Action::Jump(3)));
        assert_eq!(parse_action("g"), None);
        assert_eq!(parse_action("g x"), None);
    }

    #[test]
    fn parses_single_letter_commands() {
        assert_eq!(parse_action("c"), Some(Action::Check));
        assert_eq!(parse_action("n"), Some(Action::Next));
        assert_eq!(parse_action("p"), Some(Action::Previous));
        assert_eq!(parse_action("r"), Some(Action::Restart));
        assert_eq!(parse_action("q"), Some(Action::Quit));
        assert_eq!(parse_action("n extra"), None);
        assert_eq!(parse_action(""), None);
    }
}
