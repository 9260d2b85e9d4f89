use anyhow::{Result, anyhow, bail};
use captutor_core::{
    Answer, CaptionClient, Captions, ChatMessage, CollectionKind, Config, FileStore, HistoryScope,
    ItemStore, Language, LessonSource, QuestionKind, QuizFormat, QuizSession, VideoLookup,
    caption_page, format_answer_feedback, format_history, format_quiz_question,
    format_quiz_result, total_pages, validate_video_url,
};
use console::{Term, style};

use crate::create_spinner;

type Store = ItemStore<FileStore>;

fn pick_language<'a>(lookup: &'a VideoLookup, lang: Option<&str>) -> Result<&'a Language> {
    match lang {
        Some(code) => lookup
            .languages
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(code))
            .ok_or_else(|| {
                let offered: Vec<_> = lookup.languages.iter().map(|l| l.code.as_str()).collect();
                anyhow!("no \"{}\" captions (available: {})", code, offered.join(", "))
            }),
        None => lookup
            .languages
            .first()
            .ok_or_else(|| anyhow!("this video has no captions")),
    }
}

/// A validated video: its id, the service's lookup and the chosen captions.
struct FetchedVideo {
    video_id: String,
    lookup: VideoLookup,
    captions: Captions,
}

async fn fetch_video(client: &CaptionClient, url: &str, lang: Option<&str>) -> Result<FetchedVideo> {
    let video_id = validate_video_url(url)?;

    let spinner = create_spinner("Looking up video...");
    let lookup = client.lookup_video(url).await;
    spinner.finish_and_clear();
    let lookup = lookup?;

    println!(
        "{} {} {}",
        style("✓").green().bold(),
        style(&lookup.video_title).bold(),
        style(format!("by {}", lookup.channel_info.name)).dim()
    );

    let language = pick_language(&lookup, lang)?;
    let spinner = create_spinner(&format!("Fetching {} captions...", language.name));
    let captions = client.fetch_captions(language, &lookup.video_title).await;
    spinner.finish_and_clear();

    Ok(FetchedVideo {
        video_id,
        lookup,
        captions: captions?,
    })
}

fn print_recommended(questions: &[String]) {
    if questions.is_empty() {
        return;
    }
    println!("\n{}", style("Try asking:").cyan());
    for q in questions {
        println!("  • {}", q);
    }
}

pub async fn fetch(config: &Config, url: &str, lang: Option<&str>, page: usize) -> Result<()> {
    let client = CaptionClient::new(config)?;
    let FetchedVideo { captions, .. } = fetch_video(&client, url, lang).await?;

    let pages = total_pages(&captions.captions);
    let text = caption_page(&captions.captions, page);
    if text.is_empty() {
        bail!("page {} is out of range (1-{})", page, pages);
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}", text);
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style(format!("Page {} of {}", page, pages)).dim());
    print_recommended(&captions.recommended_questions);
    Ok(())
}

pub async fn learn(config: &Config, store: &mut Store, url: &str, lang: Option<&str>) -> Result<()> {
    let client = CaptionClient::new(config)?;
    let FetchedVideo {
        video_id,
        lookup,
        captions,
    } = fetch_video(&client, url, lang).await?;

    let existed = store.chat(&lookup.video_title).is_some();
    let chat = store.upsert_chat(
        &lookup.video_title,
        &video_id,
        &captions.captions.join("\n\n"),
    );
    let note = if existed { "(already learned)" } else { "(new chat)" };
    println!(
        "{} Learned {} {}",
        style("✓").green().bold(),
        style(&chat.name).bold(),
        style(note).dim()
    );
    print_recommended(&captions.recommended_questions);
    Ok(())
}

pub async fn ask(config: &Config, store: &Store, folder: Option<&str>, question: &str) -> Result<()> {
    if question.trim().is_empty() {
        bail!("the question is empty");
    }
    let client = CaptionClient::new(config)?;
    let scope = match folder {
        Some(name) => HistoryScope::Folder(name.to_string()),
        None => HistoryScope::Video,
    };

    let spinner = create_spinner("Thinking...");
    let answer = client.ask_question(question).await;
    spinner.finish_and_clear();
    let answer = answer?;

    store.append_history(&scope, [ChatMessage::user(question), ChatMessage::bot(&answer)]);
    println!(
        "{}",
        format_history(&[ChatMessage::user(question), ChatMessage::bot(answer)])
    );
    Ok(())
}

pub async fn learn_folder(config: &Config, store: &Store, name: &str) -> Result<()> {
    let client = CaptionClient::new(config)?;

    let spinner = create_spinner(&format!("Learning folder {}...", name));
    let lesson = captutor_core::learn_folder(store, &client, name).await;
    spinner.finish_and_clear();
    let lesson = lesson?;

    if let Some(notice) = &lesson.notice {
        println!("{} {}", style("!").yellow().bold(), notice);
    }
    let source = match lesson.source {
        LessonSource::Service => "from the service",
        LessonSource::Fallback => "from saved files",
    };
    println!(
        "{} Learned {} {}",
        style("✓").green().bold(),
        style(&lesson.folder_name).bold(),
        style(format!("({} captions {})", lesson.captions.len(), source)).dim()
    );
    println!(
        "{}",
        style(format!(
            "Ask about it with `captutor ask --folder \"{}\" QUESTION`",
            lesson.folder_name
        ))
        .dim()
    );
    Ok(())
}

pub async fn quiz(
    config: &Config,
    video_id: &str,
    num_questions: u32,
    format: QuizFormat,
    interactive: bool,
) -> Result<()> {
    let client = CaptionClient::new(config)?;

    let spinner = create_spinner("Generating quiz...");
    let generated = client.generate_quiz(video_id, num_questions, format).await;
    spinner.finish_and_clear();
    let mut session = QuizSession::new(generated?);

    if !interactive {
        for (i, question) in session.questions().iter().enumerate() {
            println!("{}", format_quiz_question(i + 1, question));
        }
        return Ok(());
    }

    let term = Term::stdout();
    let mut index = 0;
    while index < session.questions().len() {
        println!("{}", format_quiz_question(index + 1, &session.questions()[index]));
        let hint = if session.can_refresh(index) {
            format!("answer, or r to refresh ({} left)", session.refreshes_left(index))
        } else {
            "answer".to_string()
        };
        term.write_str(&format!("{} ", style(format!("{}>", hint)).dim()))?;
        let line = term.read_line()?;
        let line = line.trim();

        if line.eq_ignore_ascii_case("r") && session.can_refresh(index) {
            let spinner = create_spinner("Refreshing question...");
            let refreshed = client
                .refresh_quiz_question(session.session_id(), index)
                .await;
            spinner.finish_and_clear();
            session.apply_refresh(index, refreshed?);
            continue;
        }
        if line.is_empty() {
            continue;
        }

        session.answer(index, parse_answer(&session, index, line));
        if let Some(correct) = session.check(index) {
            let feedback = format_answer_feedback(&session.questions()[index], correct);
            if correct {
                println!("{}\n", style(feedback).green());
            } else {
                println!("{}\n", style(feedback).red());
            }
        }
        index += 1;
    }

    if !session.ready_to_submit() {
        bail!("the quiz has no questions");
    }
    let spinner = create_spinner("Submitting answers...");
    let result = client
        .submit_quiz(session.session_id(), session.answers())
        .await;
    spinner.finish_and_clear();
    println!("\n{}", format_quiz_result(&result?));
    Ok(())
}

pub async fn collections(config: &Config, kind: CollectionKind, urls: &[String]) -> Result<()> {
    let client = CaptionClient::new(config)?;

    let spinner = create_spinner("Fetching collection...");
    let data = client.fetch_collection(kind, urls).await;
    spinner.finish_and_clear();

    println!("{}", serde_json::to_string_pretty(&data?)?);
    Ok(())
}

/// Option letters map to the option text; true/false answers are sent as booleans.
fn parse_answer(session: &QuizSession, index: usize, line: &str) -> Answer {
    let question = &session.questions()[index];
    match question.kind {
        QuestionKind::TrueFalse => {
            Answer::Bool(line.eq_ignore_ascii_case("true") || line.eq_ignore_ascii_case("t"))
        }
        QuestionKind::Mcq => {
            let mut chars = line.chars();
            let letter = match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_lowercase() => Some((c as u8 - b'a') as usize),
                _ => None,
            };
            letter
                .and_then(|i| question.options.get(i))
                .map(|option| Answer::Text(option.clone()))
                .unwrap_or_else(|| Answer::Text(line.to_string()))
        }
    }
}
