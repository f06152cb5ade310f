//! Headless exam runner. Drives one attempt against a running server from
//! the terminal; the host shell reports focus-loss events with `v`.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use time::OffsetDateTime;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::session::api::{session_inputs, AttemptClient};
use crate::session::controller::{
    ExamSessionController, SessionPhase, ViolationChannel, ViolationOutcome,
};
use crate::session::draft::FileDraftStore;

pub(crate) async fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(base_url), Some(assignment_id)) = (args.next(), args.next()) else {
        bail!("usage: take-exam <base-url> <assignment-id> (EXAMLY_TOKEN must be set)");
    };
    let token = std::env::var("EXAMLY_TOKEN").context("EXAMLY_TOKEN is not set")?;

    let client = AttemptClient::new(&base_url, token)?;
    let detail = client.fetch_assignment(&assignment_id).await?;
    let (config, questions) = session_inputs(detail);

    let store = FileDraftStore::new(PathBuf::from(".examly_drafts"));
    let mut rng = StdRng::from_entropy();
    let mut session = ExamSessionController::new(config, questions, store, &mut rng);

    println!("{} ({} questions)", session.test_title(), session.questions().len());
    println!("commands: start, show, a <option#>, n, p, v, submit, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(payload) = session.tick(OffsetDateTime::now_utc()) {
                    println!("time is up, submitting");
                    deliver(&client, &mut session, &payload).await;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                handle_command(&client, &mut session, line.trim()).await;
            }
        }

        if session.phase() == SessionPhase::Submitted {
            break;
        }
    }

    Ok(())
}

async fn handle_command(
    client: &AttemptClient,
    session: &mut ExamSessionController<FileDraftStore>,
    line: &str,
) {
    let now = OffsetDateTime::now_utc();
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("start") => match session.start(now) {
            Ok(()) => println!("started, {}s on the clock", session.remaining_seconds()),
            Err(reason) => println!("cannot start: {reason}"),
        },
        Some("show") => show_question(session),
        Some("a") => {
            let choice = parts.next().and_then(|raw| raw.parse::<usize>().ok());
            answer_current(session, choice);
        }
        Some("n") => {
            session.goto_question(session.current_idx() + 1);
            show_question(session);
        }
        Some("p") => {
            session.goto_question(session.current_idx().saturating_sub(1));
            show_question(session);
        }
        Some("v") => match session.record_violation(ViolationChannel::VisibilityLoss, now) {
            ViolationOutcome::Warned => println!("warning: stay on this screen"),
            ViolationOutcome::TimeHalved { remaining_seconds } => {
                println!("time penalty applied, {remaining_seconds}s left")
            }
            ViolationOutcome::ForcedSubmit(payload) => {
                println!("too many violations, submitting");
                deliver(client, session, &payload).await;
            }
            ViolationOutcome::Ignored => {}
        },
        Some("submit") => {
            if let Some(payload) = session.request_submit() {
                deliver(client, session, &payload).await;
            }
        }
        Some("quit") => std::process::exit(0),
        _ => println!("unknown command"),
    }
}

fn show_question(session: &ExamSessionController<FileDraftStore>) {
    let idx = session.current_idx();
    let Some(question) = session.questions().get(idx) else {
        return;
    };
    println!("[{}] {} ({}s left)", idx + 1, question.question_text, session.remaining_seconds());
    let selected = session.selected_option(&question.id);
    for (i, option) in question.options.iter().enumerate() {
        let marker = if selected == Some(option.as_str()) { "*" } else { " " };
        println!("  {marker} {}. {option}", i + 1);
    }
}

fn answer_current(session: &mut ExamSessionController<FileDraftStore>, choice: Option<usize>) {
    let idx = session.current_idx();
    let Some(question) = session.questions().get(idx) else {
        return;
    };
    let Some(option) = choice.and_then(|c| c.checked_sub(1)).and_then(|c| question.options.get(c))
    else {
        println!("pick an option number");
        return;
    };
    let question_id = question.id.clone();
    let option = option.clone();
    if session.select_option(&question_id, &option) {
        println!("saved");
    }
}

async fn deliver(
    client: &AttemptClient,
    session: &mut ExamSessionController<FileDraftStore>,
    payload: &crate::schemas::submission::SubmissionCreate,
) {
    match client.submit(payload).await {
        Ok(accepted) => {
            session.submission_accepted();
            println!("{}: {}", accepted.test_title, accepted.message);
        }
        Err(err) => {
            let terminal = err.is_terminal();
            session.submission_failed(terminal);
            if terminal {
                println!("submission rejected: {err}");
            } else {
                println!("submission failed, you can retry: {err}");
            }
        }
    }
}
