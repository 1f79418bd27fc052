//! Terminal learner: topic in, course out, quiz, deep dive.

use std::io::Write;

use curio_course::{
    layout, AdvanceOutcome, Curriculum, QuizPhase, QuizProgress, QuizQuestion, SelectOutcome,
};
use curio_gateway::{ActiveView, AppStatus, CourseSource, LearnerSession};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::LearnArgs;

/// Line-oriented stdin reader.
struct Prompter {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompter {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Prints `prompt` and reads one trimmed line. `None` on end of input.
    async fn ask(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }
}

/// What to do after a course menu choice.
enum Next {
    Stay,
    NewTopic,
    Generate(String),
    Quit,
}

/// Runs the interactive session until the learner quits or input ends.
pub async fn run(source: &dyn CourseSource, args: LearnArgs) -> anyhow::Result<()> {
    let mut prompter = Prompter::new();
    let mut session = LearnerSession::new();
    session.set_difficulty(args.difficulty);

    println!("Curio - learn anything ({})", session.difficulty());
    let mut pending_topic = args.topic;

    loop {
        let topic = match pending_topic.take() {
            Some(topic) => topic,
            None => match prompter.ask("\nWhat do you want to learn? ").await? {
                Some(topic) => topic,
                None => return Ok(()),
            },
        };

        println!("Generating a course on \"{topic}\"...");
        match session
            .run_generation(source, &topic, session.difficulty())
            .await
        {
            Ok(AppStatus::Ready) => {}
            Ok(_) => {
                println!("{}", session.error().unwrap_or("Something went wrong."));
                continue;
            }
            Err(e) => {
                println!("{e}");
                continue;
            }
        }

        // Deep-dive selections chain straight into the next course.
        loop {
            match course_menu(&mut prompter, source, &mut session, args.canvas_width).await? {
                Next::Stay => {}
                Next::NewTopic => {
                    session.reset();
                    break;
                }
                Next::Generate(topic) => {
                    let ticket = match session.select_deep_dive(&topic) {
                        Ok(ticket) => ticket,
                        Err(e) => {
                            println!("{e}");
                            continue;
                        }
                    };
                    println!("Generating a course on \"{}\"...", ticket.topic);
                    if session.fulfil(source, &ticket).await != AppStatus::Ready {
                        println!("{}", session.error().unwrap_or("Something went wrong."));
                        break;
                    }
                }
                Next::Quit => return Ok(()),
            }
        }
    }
}

async fn course_menu(
    prompter: &mut Prompter,
    source: &dyn CourseSource,
    session: &mut LearnerSession,
    canvas_width: f64,
) -> anyhow::Result<Next> {
    let Some(curriculum) = session.curriculum() else {
        return Ok(Next::NewTopic);
    };

    match session.view() {
        ActiveView::Concepts => print_concepts(curriculum),
        ActiveView::Flowchart => print_flowchart(curriculum, canvas_width),
        ActiveView::Quiz => return run_quiz(prompter, source, session).await,
    }

    let Some(choice) = prompter
        .ask("\n[c]oncepts  [f]lowchart  [q]uiz  [n]ew topic  e[x]it > ")
        .await?
    else {
        return Ok(Next::Quit);
    };

    match choice.to_lowercase().as_str() {
        "c" => session.set_view(ActiveView::Concepts),
        "f" => session.set_view(ActiveView::Flowchart),
        "q" => session.set_view(ActiveView::Quiz),
        "n" => return Ok(Next::NewTopic),
        "x" => return Ok(Next::Quit),
        _ => println!("Unknown choice '{choice}'"),
    }
    Ok(Next::Stay)
}

fn print_concepts(curriculum: &Curriculum) {
    println!("\n=== {} ({}) ===", curriculum.topic, curriculum.difficulty);
    println!("{}\n", curriculum.introduction);
    for (i, concept) in curriculum.concepts.iter().enumerate() {
        println!("{}. {}", i + 1, concept.title);
        println!("   {}", concept.definition);
        println!("   Analogy: {}", concept.analogy);
        println!("   Key takeaway: {}", concept.key_takeaway);
    }
}

fn print_flowchart(curriculum: &Curriculum, canvas_width: f64) {
    let flow = layout(
        &curriculum.flowchart.nodes,
        &curriculum.flowchart.edges,
        canvas_width,
    );
    println!("\n=== How {} works ===", curriculum.topic);
    if flow.is_empty() {
        println!("(no flowchart for this topic)");
        return;
    }
    print!("{}", flow.render_text());
    println!();
    for node in &flow.nodes {
        tracing::debug!(id = %node.id, x = node.x, y = node.y, "Node position");
        println!("  {}: {}", node.label, node.description);
    }
}

fn print_question(progress: &QuizProgress, question: &QuizQuestion) {
    println!(
        "\nQuestion {} of {} (score {}): {}",
        progress.question_number, progress.total, progress.score, question.question
    );
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
}

async fn run_quiz(
    prompter: &mut Prompter,
    source: &dyn CourseSource,
    session: &mut LearnerSession,
) -> anyhow::Result<Next> {
    loop {
        let Some(quiz) = session.quiz() else {
            return Ok(Next::NewTopic);
        };

        match quiz.phase() {
            QuizPhase::Answering => {
                let Some(question) = quiz.current_question().cloned() else {
                    return Ok(Next::NewTopic);
                };
                print_question(&quiz.progress(), &question);

                let Some(answer) = prompter.ask("Your answer: ").await? else {
                    return Ok(Next::Quit);
                };
                let Some(option) = answer
                    .parse::<usize>()
                    .ok()
                    .filter(|n| (1..=question.options.len()).contains(n))
                else {
                    println!("Pick a number between 1 and {}", question.options.len());
                    continue;
                };

                match session.select_answer(option - 1) {
                    SelectOutcome::Correct => println!("Correct! {}", question.explanation),
                    SelectOutcome::Incorrect => {
                        let right = question
                            .options
                            .get(question.correct_index)
                            .map_or("(none listed)", String::as_str);
                        println!("Not quite. The answer was: {right}");
                        println!("{}", question.explanation);
                    }
                    SelectOutcome::Ignored => {}
                }
            }
            QuizPhase::Revealed => {
                if prompter.ask("Press Enter to continue ").await?.is_none() {
                    return Ok(Next::Quit);
                }
                if let AdvanceOutcome::Summary(Some(_)) = session.advance_quiz() {
                    println!("\nGreat score! Finding topics to explore next...");
                    session.run_deep_dive(source).await;
                }
            }
            QuizPhase::Summary => return quiz_summary(prompter, session).await,
        }
    }
}

async fn quiz_summary(
    prompter: &mut Prompter,
    session: &mut LearnerSession,
) -> anyhow::Result<Next> {
    let Some(quiz) = session.quiz() else {
        return Ok(Next::NewTopic);
    };

    println!(
        "\nQuiz complete: {} of {} ({}%)",
        quiz.score(),
        quiz.total(),
        quiz.percentage()
    );

    let suggestions = quiz.suggestions().to_vec();
    if !suggestions.is_empty() {
        println!("\nDive deeper:");
        for (i, topic) in suggestions.iter().enumerate() {
            println!("  {}) {topic}", i + 1);
        }
    }

    let prompt = if suggestions.is_empty() {
        "\n[r]etry quiz  [b]ack to course  [n]ew topic  e[x]it > "
    } else {
        "\nPick a topic number, or [r]etry quiz  [b]ack to course  [n]ew topic  e[x]it > "
    };
    let Some(choice) = prompter.ask(prompt).await? else {
        return Ok(Next::Quit);
    };

    if let Some(topic) = choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| suggestions.get(i))
    {
        return Ok(Next::Generate(topic.clone()));
    }

    match choice.to_lowercase().as_str() {
        "r" => session.restart_quiz(),
        "b" => session.set_view(ActiveView::Concepts),
        "n" => return Ok(Next::NewTopic),
        "x" => return Ok(Next::Quit),
        _ => println!("Unknown choice '{choice}'"),
    }
    Ok(Next::Stay)
}
