//! Line-oriented terminal front end: prompts, result rendering, share printer.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use octa_core::model::{PersonalityType, TestResult};
use services::error::ShareError;
use services::session::{QuestionView, SessionSnapshot, SubmissionPreview};
use services::share::{SharePayload, ShareTarget};

/// Prints `message` and reads one line. `None` once stdin is closed.
pub fn prompt(message: &str) -> io::Result<Option<String>> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// `[y/N]` question; anything but y/yes (or a read error) is no.
pub fn ask_yes_no(question: &str) -> bool {
    matches!(
        prompt(&format!("{question} [y/N]: ")),
        Ok(Some(answer)) if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
    )
}

pub fn confirm_submission(preview: &SubmissionPreview) -> bool {
    println!();
    println!(
        "All {} of {} questions answered. Answers cannot be changed after submitting.",
        preview.answered, preview.total
    );
    ask_yes_no("Submit your answers?")
}

pub fn print_page_header(snapshot: &SessionSnapshot) {
    println!();
    println!(
        "── Page {} ── {}/{} answered",
        snapshot.page_label(),
        snapshot.answered,
        snapshot.total_questions
    );
}

pub fn question_prompt(question: &QuestionView) -> String {
    let current = question
        .rating
        .map(|r| format!(", enter keeps {r}"))
        .unwrap_or_default();
    format!(
        "{:>2}. {}\n    rating 1-10 (b = back{current}): ",
        question.number, question.text
    )
}

pub fn print_result(result: &TestResult) {
    println!();
    if result.is_tie() {
        println!(
            "It's a tie: {} types share the top score.",
            result.personality_types().len()
        );
    } else {
        println!("Your type:");
    }

    for personality in result.headline() {
        print_type(result, personality);
    }

    println!();
    println!(
        "{} answers scored, completed {}.",
        result.total_questions_answered(),
        result.completed_at().format("%Y-%m-%d %H:%M UTC")
    );
}

fn print_type(result: &TestResult, personality: &PersonalityType) {
    println!();
    println!(
        "■ {} ({}) {}/{} ({}%)",
        personality.type_name,
        personality.type_code,
        personality.calculated_score,
        result.max_score(),
        result.percent_of_max(personality.calculated_score)
    );
    if !personality.title.is_empty() {
        println!("  {}", personality.title);
    }
    if !personality.theme_sentence.is_empty() {
        println!("  \"{}\"", personality.theme_sentence);
    }
    if !personality.description.is_empty() {
        println!("  {}", personality.description);
    }
    for point in &personality.description_points {
        println!("   • {point}");
    }
    if !personality.strength_keywords.is_empty() {
        println!(
            "  strengths: {}",
            personality.strength_keywords.join(", ")
        );
    }
    if !personality.weakness_keywords.is_empty() {
        println!(
            "  watch out for: {}",
            personality.weakness_keywords.join(", ")
        );
    }
}

/// Share target that prints the card to stdout.
pub struct TerminalShare;

#[async_trait]
impl ShareTarget for TerminalShare {
    fn is_ready(&self) -> bool {
        true
    }

    async fn share(&self, payload: &SharePayload) -> Result<(), ShareError> {
        let mut card = format!(
            "\n{}\n{}\n{}\n",
            payload.title, payload.description, payload.link
        );
        for button in &payload.buttons {
            card.push_str(&format!("  [{}] {}\n", button.title, button.link));
        }
        let mut out = io::stdout();
        out.write_all(card.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|e| ShareError::Failed(e.to_string()))
    }
}
