use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dialoguer::Input;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use aira_interview::questions::NO_RESUME_PLACEHOLDER;
use aira_interview::voice::console::DEFAULT_WORDS_PER_MINUTE;
use aira_interview::voice::{ConsoleRecognizer, ConsoleSynthesizer};
use aira_interview::{
    ChatCompletionClient, CompletionBackend, Config, EndReason, InterviewSession, PasscodeGate,
    Phase, QuestionGenerator, QuestionSource, VoiceAdapter, load_resume, resume_text, shell,
};

/// AIRA - Voice-driven mock interviewer
#[derive(Parser)]
#[command(name = "aira", version, about)]
struct Cli {
    /// Resume file to build questions from (overrides config)
    #[arg(short, long, global = true, env = "AIRA_RESUME_PATH")]
    resume: Option<PathBuf>,

    /// Role the candidate is interviewing for
    #[arg(long, global = true, env = "AIRA_ROLE")]
    role: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a mock interview in the terminal (default)
    Interview {
        /// Passcode; prompted for when omitted
        #[arg(long)]
        passcode: Option<String>,

        /// Reading pace of the interviewer in words per minute
        #[arg(long, default_value_t = DEFAULT_WORDS_PER_MINUTE)]
        wpm: u32,
    },
    /// Print the questions generated for a resume
    Questions {
        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn,aira_interview=info",
        1 => "info,aira_interview=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(path) = cli.resume {
        config.resume.path = Some(path);
    }
    if let Some(role) = cli.role {
        config.llm.role = role;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Interview {
        passcode: None,
        wpm: DEFAULT_WORDS_PER_MINUTE,
    }) {
        Command::Interview { passcode, wpm } => interview(config, passcode, wpm).await,
        Command::Questions { json } => questions(&config, json).await,
    }
}

fn question_source(config: &Config) -> Arc<dyn QuestionSource> {
    let backend: Option<Arc<dyn CompletionBackend>> = match ChatCompletionClient::new(&config.llm) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "question generation disabled, using fallback questions");
            None
        }
    };

    Arc::new(QuestionGenerator::new(
        backend,
        config.llm.role.clone(),
        config.session.question_count,
    ))
}

async fn questions(config: &Config, json: bool) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let resume = load_resume(&config.resume, &client).await;
    let analysis = question_source(config)
        .generate(resume_text(resume.as_ref()))
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("Candidate:  {}", analysis.candidate_name);
    println!("Experience: {}", analysis.experience);
    if !analysis.skills.is_empty() {
        println!("Skills:     {}", analysis.skills.join(", "));
    }
    println!();
    for q in &analysis.questions {
        println!("{:>2}. [{}] {}", q.id, q.label, q.text);
    }

    Ok(())
}

fn unlock(expected: &str, provided: Option<String>) -> anyhow::Result<()> {
    let mut gate = PasscodeGate::new(expected);

    if let Some(code) = provided {
        gate.set_entry(&code);
        gate.submit()?;
        return Ok(());
    }

    loop {
        let entry: String = Input::new()
            .with_prompt("Enter your 8-character passcode")
            .interact_text()?;
        gate.set_entry(&entry);

        match gate.submit() {
            Ok(()) => return Ok(()),
            Err(e) => println!("{e}. Please try again."),
        }
    }
}

async fn interview(config: Config, passcode: Option<String>, wpm: u32) -> anyhow::Result<()> {
    unlock(&config.passcode, passcode)?;

    println!("Fetching your resume…");
    let client = reqwest::Client::new();
    let resume = load_resume(&config.resume, &client).await;
    match &resume {
        Some(data) => println!("Resume loaded: {}", data.file_name),
        None => println!("No resume found, continuing with general questions."),
    }

    println!(
        "\nAnswer each question by typing and pressing enter. The interview moves on after {}s of silence.\n",
        config.session.silence_timeout.as_secs()
    );

    let recognizer = ConsoleRecognizer::new();
    let voice = Arc::new(VoiceAdapter::new(
        Arc::new(ConsoleSynthesizer::new(wpm)),
        Some(Arc::new(recognizer.clone())),
        config.voice.clone(),
    ));

    let session = InterviewSession::builder(config.session.clone(), voice, question_source(&config))
        .resume_text(
            resume
                .map_or_else(|| NO_RESUME_PLACEHOLDER.to_string(), |r| r.extracted_text),
        )
        .on_end(|reason: EndReason| tracing::info!(?reason, "interview finished"))
        .start();

    tracing::info!(session = %session.id(), "interview started");

    let renderer = tokio::spawn(shell::render_loop(
        session.subscribe(),
        session.subscribe_clock(),
        session.subscribe_silence(),
        std::io::stdout(),
    ));

    let mut state = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = state.wait_for(|s| s.phase == Phase::Ended) => break,
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("input closed, ending interview");
                    let _ = session.end();
                    break;
                };

                let outcome = match line.trim() {
                    ":next" => session.advance(),
                    ":start" => session.start_current(),
                    ":end" => session.end(),
                    text => {
                        if !recognizer.deliver_line(text) && !text.is_empty() {
                            println!("(not listening yet, hold that thought)");
                        }
                        Ok(())
                    }
                };

                if outcome.is_err() {
                    break;
                }
            }
        }
    }

    let reason = session.wait().await;
    renderer.await??;
    tracing::debug!(?reason, "session closed");

    Ok(())
}
