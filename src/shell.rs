//! Session shell
//!
//! Text rendering of a running interview: header with clock and progress,
//! question list, status line, silence indicator and transcript card. The
//! shell only reads published state; it never drives the controller.

use std::fmt::Write as _;
use std::io::Write;

use tokio::sync::watch;

use crate::session::{EndReason, Phase, SessionSnapshot, TurnPhase};

/// Product name shown in the header
pub const TITLE: &str = "AIRA (Artificial Intelligence Recruitment Assistant)";

/// Loading screen status
pub const LOADING_STATUS: &str = "Analyzing your resume with AI…";

/// Silence countdown is only shown at or below this many seconds
pub const SILENCE_INDICATOR_THRESHOLD: u32 = 10;

/// `mm:ss` for a number of seconds
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Completed share of the interview in percent, from the zero-based current index
#[must_use]
pub fn progress_percent(current_index: usize, total: usize) -> usize {
    if total == 0 {
        0
    } else {
        current_index.min(total) * 100 / total
    }
}

#[must_use]
pub const fn status_line(turn: TurnPhase) -> &'static str {
    match turn {
        TurnPhase::Speaking => "Interviewer is asking…",
        TurnPhase::Listening => "Your turn — speak now",
        TurnPhase::Idle | TurnPhase::Transitioning => "Processing…",
    }
}

/// Countdown notice shown while listening once few seconds remain
#[must_use]
pub fn silence_indicator(turn: TurnPhase, remaining: Option<u32>) -> Option<String> {
    match remaining {
        Some(seconds) if turn == TurnPhase::Listening && seconds <= SILENCE_INDICATOR_THRESHOLD => {
            Some(format!("Moving to next question in {seconds}s…"))
        }
        _ => None,
    }
}

/// Answer text with the interim fragment appended, or a placeholder
#[must_use]
pub fn transcript_text(snapshot: &SessionSnapshot) -> String {
    let mut text = snapshot.answer.clone();
    if !snapshot.interim.is_empty() {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&snapshot.interim);
    }

    if !text.is_empty() {
        text
    } else if snapshot.turn_phase() == TurnPhase::Listening {
        "Listening… speak now".to_string()
    } else {
        "Waiting…".to_string()
    }
}

/// One line per question with a done / current / pending marker
#[must_use]
pub fn question_list(snapshot: &SessionSnapshot) -> String {
    let mut out = String::from("Questions\n");
    for q in &snapshot.questions {
        let marker = if q.completed {
            " ✓".to_string()
        } else if q.is_current {
            format!(">{}", q.id)
        } else {
            format!(" {}", q.id)
        };
        let _ = writeln!(out, "  {marker:>3}  {}", q.label);
    }
    out
}

#[must_use]
pub fn loading_screen() -> String {
    format!("\nPreparing Your Interview\n{LOADING_STATUS}\n")
}

/// Full screen for the current state
#[must_use]
pub fn render(snapshot: &SessionSnapshot, clock: u32, silence: Option<u32>) -> String {
    if snapshot.phase == Phase::Loading {
        return loading_screen();
    }

    if snapshot.phase == Phase::Ended {
        return end_screen(snapshot);
    }

    let total = snapshot.questions.len();
    let mut out = String::new();

    let _ = writeln!(out, "\n{TITLE}");
    let _ = writeln!(
        out,
        "  {}  |  Question {}/{}  |  {}% complete",
        format_clock(clock),
        (snapshot.current_index + 1).min(total),
        total,
        progress_percent(snapshot.current_index, total)
    );
    out.push('\n');
    out.push_str(&question_list(snapshot));
    out.push('\n');

    let _ = writeln!(out, "[{}]", status_line(snapshot.turn_phase()));
    if let Some(notice) = silence_indicator(snapshot.turn_phase(), silence) {
        let _ = writeln!(out, "{notice}");
    }
    if snapshot.stuck {
        let _ = writeln!(out, "The interviewer seems stuck. Type :start to ask the question again.");
    }
    if !snapshot.recognition_supported {
        let _ = writeln!(out, "(speech recognition unavailable on this device)");
    }

    let question = snapshot
        .current_question()
        .map_or("Preparing question...", |q| q.text.as_str());
    let _ = writeln!(out, "\nAI INTERVIEWER\n  \"{question}\"");
    let _ = writeln!(out, "YOU\n  {}", transcript_text(snapshot));
    let _ = writeln!(out, "\n:next skip  |  :start re-ask  |  :end end interview");

    out
}

fn end_screen(snapshot: &SessionSnapshot) -> String {
    let how = match snapshot.end_reason {
        Some(EndReason::Completed) => "All questions answered.",
        Some(EndReason::TimeUp) => "Time is up.",
        Some(EndReason::EndedByUser) => "Interview ended.",
        None => "Session closed.",
    };

    format!(
        "\n{how} {}/{} questions completed. Thank you for your time!\n",
        snapshot.completed_count(),
        snapshot.questions.len()
    )
}

/// Redraw whenever the visible state or the clock changes, until the session ends
///
/// # Errors
///
/// Returns error if writing to `out` fails
pub async fn render_loop<W: Write + Send>(
    mut snapshot: watch::Receiver<SessionSnapshot>,
    mut clock: watch::Receiver<u32>,
    mut silence: watch::Receiver<Option<u32>>,
    mut out: W,
) -> std::io::Result<()> {
    let mut last = String::new();
    // Only a closed snapshot channel ends the loop
    let mut silence_open = true;
    let mut clock_open = true;

    loop {
        let (frame, ended) = {
            let current = snapshot.borrow_and_update();
            let seconds = *silence.borrow_and_update();
            let remaining = *clock.borrow_and_update();
            (render(&current, remaining, seconds), current.phase == Phase::Ended)
        };

        if frame != last {
            out.write_all(frame.as_bytes())?;
            out.flush()?;
            last = frame;
        }
        if ended {
            return Ok(());
        }

        tokio::select! {
            changed = snapshot.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            changed = silence.changed(), if silence_open => {
                silence_open = changed.is_ok();
            }
            changed = clock.changed(), if clock_open => {
                clock_open = changed.is_ok();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::questions::QuestionRecord;

    fn snapshot(phase: Phase) -> SessionSnapshot {
        let mut questions: Vec<QuestionRecord> = (1..=3)
            .map(|id| QuestionRecord::new(id, format!("Topic {id}"), format!("Question {id}?")))
            .collect();
        questions[0].completed = true;
        questions[1].is_current = true;

        SessionSnapshot {
            phase,
            questions,
            current_index: 1,
            ..SessionSnapshot::new(Uuid::nil(), true)
        }
    }

    #[test]
    fn clock_is_minutes_and_seconds() {
        assert_eq!(format_clock(900), "15:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(0), "00:00");
    }

    #[test]
    fn progress_counts_finished_questions() {
        assert_eq!(progress_percent(0, 10), 0);
        assert_eq!(progress_percent(9, 10), 90);
        assert_eq!(progress_percent(0, 0), 0);
    }

    #[test]
    fn status_follows_turn() {
        assert_eq!(status_line(TurnPhase::Speaking), "Interviewer is asking…");
        assert_eq!(status_line(TurnPhase::Listening), "Your turn — speak now");
        assert_eq!(status_line(TurnPhase::Transitioning), "Processing…");
    }

    #[test]
    fn silence_indicator_only_near_timeout_while_listening() {
        assert_eq!(silence_indicator(TurnPhase::Listening, Some(11)), None);
        assert_eq!(
            silence_indicator(TurnPhase::Listening, Some(10)).as_deref(),
            Some("Moving to next question in 10s…")
        );
        assert_eq!(silence_indicator(TurnPhase::Speaking, Some(3)), None);
        assert_eq!(silence_indicator(TurnPhase::Listening, None), None);
    }

    #[test]
    fn transcript_combines_answer_and_interim() {
        let mut listening = snapshot(Phase::Listening);
        assert_eq!(transcript_text(&listening), "Listening… speak now");
        assert_eq!(transcript_text(&snapshot(Phase::Speaking)), "Waiting…");

        listening.interim = "and then".to_string();
        assert_eq!(transcript_text(&listening), "and then");

        listening.answer = "I shipped it".to_string();
        assert_eq!(transcript_text(&listening), "I shipped it and then");
    }

    #[test]
    fn question_list_marks_progress() {
        let list = question_list(&snapshot(Phase::Listening));
        let lines: Vec<&str> = list.lines().collect();

        assert_eq!(lines[0], "Questions");
        assert!(lines[1].contains('✓') && lines[1].ends_with("Topic 1"));
        assert!(lines[2].contains(">2") && lines[2].ends_with("Topic 2"));
        assert!(lines[3].contains(" 3") && lines[3].ends_with("Topic 3"));
    }

    #[test]
    fn frames_per_phase() {
        assert!(render(&snapshot(Phase::Loading), 900, None).contains(LOADING_STATUS));

        let frame = render(&snapshot(Phase::Listening), 125, Some(4));
        assert!(frame.contains("02:05"));
        assert!(frame.contains("Question 2/3"));
        assert!(frame.contains("33% complete"));
        assert!(frame.contains("Moving to next question in 4s…"));
        assert!(frame.contains("\"Question 2?\""));

        let mut ended = snapshot(Phase::Ended);
        ended.end_reason = Some(EndReason::TimeUp);
        assert!(render(&ended, 0, None).contains("Time is up. 1/3 questions completed."));
    }

    #[tokio::test]
    async fn render_loop_stops_at_end() {
        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot(Phase::Speaking));
        let (_clock_tx, clock_rx) = watch::channel(600);
        let (_silence_tx, silence_rx) = watch::channel(None);

        let rendering = tokio::spawn(async move {
            let mut out = Vec::new();
            render_loop(snapshot_rx, clock_rx, silence_rx, &mut out).await.unwrap();
            String::from_utf8(out).unwrap()
        });

        tokio::task::yield_now().await;
        snapshot_tx.send_modify(|s| s.phase = Phase::Ended);

        let output = rendering.await.unwrap();
        assert!(output.contains("Interviewer is asking…"));
        assert!(output.contains("Session closed."));
    }

    #[tokio::test]
    async fn render_loop_redraws_on_clock_tick() {
        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot(Phase::Transitioning));
        let (clock_tx, clock_rx) = watch::channel(600);
        let (_silence_tx, silence_rx) = watch::channel(None);
        let (frames_tx, mut frames_rx) = tokio::sync::mpsc::unbounded_channel();

        let rendering = tokio::spawn(render_loop(
            snapshot_rx,
            clock_rx,
            silence_rx,
            FrameSink(frames_tx),
        ));

        assert!(frames_rx.recv().await.unwrap().contains("10:00"));

        clock_tx.send(599).unwrap();
        assert!(frames_rx.recv().await.unwrap().contains("09:59"));

        snapshot_tx.send_modify(|s| s.phase = Phase::Ended);
        rendering.await.unwrap().unwrap();
    }

    /// Forwards every flushed frame
    struct FrameSink(tokio::sync::mpsc::UnboundedSender<String>);

    impl Write for FrameSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let _ = self.0.send(String::from_utf8_lossy(buf).into_owned());
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
