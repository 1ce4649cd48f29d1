use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use dotenv::dotenv;
use log::{error, info, warn};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{ChatAction, KeyboardButton, KeyboardMarkup},
    utils::command::BotCommands,
};
use vocab_quiz_bot::{
    config::Config,
    quiz::{
        builder::{self, parse_count},
        guard::{ChatLocks, InFlight},
        session::Advance,
        store::SourceFetcher,
        timer::TimerRegistry,
        weak::{JsonFileStore, WEAK_ITEMS_KEY},
        Answer, ContentKind, DifficultyTier, Grading, IdRange, Phase, QuizSession, RecordStore,
        SessionMode, Summary, WeakTracker,
    },
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type DialogueStorage = Arc<ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type SharedStore = Arc<Mutex<JsonFileStore>>;

#[derive(Clone, Default, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveContentChoice,
    ReceiveModeChoice {
        kind: ContentKind,
    },
    ReceiveRange {
        kind: ContentKind,
    },
    ReceiveDifficulty,
    ReceiveQuestionCount {
        kind: ContentKind,
        mode: SessionMode,
    },
    InQuiz {
        session: QuizSession,
    },
    ConfirmClearWeak,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
enum Command {
    #[command(description = "start over.")]
    Start,
    #[command(description = "show this text.")]
    Help,
    #[command(description = "list the words you keep missing.")]
    Weak,
    #[command(description = "drop a word from the weak list, e.g. /forget 12")]
    Forget(String),
    #[command(description = "empty the weak list.")]
    ClearWeak,
    #[command(description = "reload the word and grammar lists.")]
    Refresh,
    #[command(description = "abandon the running quiz.")]
    Cancel,
}

/// Services shared by every chat.
struct App {
    config: Config,
    records: RecordStore<SourceFetcher>,
    weak_store: SharedStore,
    timers: TimerRegistry<ChatId>,
    loading: InFlight<ChatId>,
    chat_locks: ChatLocks<ChatId>,
    dialogues: DialogueStorage,
}

impl App {
    fn new(config: Config, dialogues: DialogueStorage) -> Self {
        let weak_store = Arc::new(Mutex::new(JsonFileStore::open(config.weak_items_path())));
        let records = RecordStore::new(SourceFetcher::default(), config.refresh_timeout);
        Self {
            config,
            records,
            weak_store,
            timers: TimerRegistry::default(),
            loading: InFlight::default(),
            chat_locks: ChatLocks::default(),
            dialogues,
        }
    }

    fn weak_tracker(&self, chat_id: ChatId) -> WeakTracker<SharedStore> {
        WeakTracker::open(
            self.weak_store.clone(),
            format!("{}:{}", WEAK_ITEMS_KEY, chat_id.0),
        )
    }

    /// Serializes every read-modify-write of a chat's dialogue state, including
    /// the ones made by question timers.
    async fn lock_chat(&self, chat_id: ChatId) -> tokio::sync::OwnedMutexGuard<()> {
        self.chat_locks.lock(chat_id).await
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();
    info!("Starting quiz bot...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };
    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        error!("Cannot create {}: {}", config.data_dir.display(), e);
        return;
    }

    let bot = Bot::from_env();

    info!("Opening the dialogue database...");
    let db_path = config.dialogue_db_path();
    let storage: DialogueStorage = match SqliteStorage::open(&db_path.to_string_lossy(), Json).await {
        Ok(storage) => storage.erase(),
        Err(e) => {
            error!("Cannot open {}: {}", db_path.display(), e);
            return;
        }
    };

    let app = Arc::new(App::new(config, storage.clone()));

    // Warm the cache; a failure here is retried lazily when a quiz starts.
    for kind in [ContentKind::Vocabulary, ContentKind::Grammar] {
        if let Err(e) = app.records.load(app.config.source(kind), false).await {
            warn!("Could not preload the {} list: {}", kind.label(), e);
        }
    }

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::entry().filter_command::<Command>().endpoint(command))
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveContentChoice].endpoint(receive_content_choice))
            .branch(dptree::case![State::ReceiveModeChoice { kind }].endpoint(receive_mode_choice))
            .branch(dptree::case![State::ReceiveRange { kind }].endpoint(receive_range))
            .branch(dptree::case![State::ReceiveDifficulty].endpoint(receive_difficulty))
            .branch(
                dptree::case![State::ReceiveQuestionCount { kind, mode }]
                    .endpoint(receive_question_count),
            )
            .branch(dptree::case![State::InQuiz { session }].endpoint(quiz_step))
            .branch(dptree::case![State::ConfirmClearWeak].endpoint(confirm_clear_weak)),
    )
    .dependencies(dptree::deps![storage, app])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const VOCABULARY_BUTTON: &str = "Vocabulary";
const GRAMMAR_BUTTON: &str = "Grammar";
const RANGE_BUTTON: &str = "By number range";
const WEAK_BUTTON: &str = "Weak words only";
const DIFFICULTY_BUTTON: &str = "By difficulty";
const ANY_TIER_BUTTON: &str = "Any";
const ALL_BUTTON: &str = "all";
const NEXT_BUTTON: &str = "Next ▶";
const CONFIRM_CLEAR_BUTTON: &str = "Yes, clear it";
const KEEP_BUTTON: &str = "No, keep it";

fn keyboard(rows: &[&[&str]]) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|label| KeyboardButton::new(label.to_string()))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>(),
    )
}

fn content_keyboard() -> KeyboardMarkup {
    keyboard(&[&[VOCABULARY_BUTTON, GRAMMAR_BUTTON]])
}

fn next_keyboard() -> KeyboardMarkup {
    keyboard(&[&[NEXT_BUTTON]])
}

const GREETING_TEXT: &str = "Hi! I quiz you on vocabulary and grammar. Wrong answers end up on your weak list so you can practise them later. What would you like to practise?";
async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(content_keyboard())
        .await?;

    dialogue.update(State::ReceiveContentChoice).await?;
    Ok(())
}

async fn back_to_menu(bot: &Bot, dialogue: &QuizDialogue, chat_id: ChatId, text: String) -> HandlerResult {
    bot.send_message(chat_id, text)
        .reply_markup(content_keyboard())
        .await?;
    dialogue.update(State::ReceiveContentChoice).await?;
    Ok(())
}

async fn receive_content_choice(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    let (kind, modes) = match msg.text() {
        Some(VOCABULARY_BUTTON) => (ContentKind::Vocabulary, [RANGE_BUTTON, WEAK_BUTTON]),
        Some(GRAMMAR_BUTTON) => (ContentKind::Grammar, [RANGE_BUTTON, DIFFICULTY_BUTTON]),
        _ => {
            bot.send_message(msg.chat.id, "Please pick one of the options")
                .reply_markup(content_keyboard())
                .await?;
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, "Which questions should I ask?")
        .reply_markup(keyboard(&[&modes]))
        .await?;
    dialogue.update(State::ReceiveModeChoice { kind }).await?;
    Ok(())
}

async fn receive_mode_choice(
    bot: Bot,
    dialogue: QuizDialogue,
    kind: ContentKind,
    msg: Message,
) -> HandlerResult {
    match (msg.text(), kind) {
        (Some(RANGE_BUTTON), _) => {
            bot.send_message(
                msg.chat.id,
                "Send a range of item numbers, e.g. 1-50, or \"all\"",
            )
            .reply_markup(keyboard(&[&[ALL_BUTTON]]))
            .await?;
            dialogue.update(State::ReceiveRange { kind }).await?;
        }
        (Some(WEAK_BUTTON), ContentKind::Vocabulary) => {
            ask_question_count(&bot, &dialogue, msg.chat.id, kind, SessionMode::WeakOnly).await?;
        }
        (Some(DIFFICULTY_BUTTON), ContentKind::Grammar) => {
            bot.send_message(msg.chat.id, "Which difficulty level?")
                .reply_markup(keyboard(&[&["1", "2", "3"], &[ANY_TIER_BUTTON]]))
                .await?;
            dialogue.update(State::ReceiveDifficulty).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please pick one of the options")
                .await?;
        }
    }
    Ok(())
}

async fn receive_range(bot: Bot, dialogue: QuizDialogue, kind: ContentKind, msg: Message) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please send the range as text")
            .await?;
        return Ok(());
    };

    let range = IdRange::parse(text);
    ask_question_count(&bot, &dialogue, msg.chat.id, kind, SessionMode::Range(range)).await
}

async fn receive_difficulty(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    // "Any" and anything unrecognised mean no difficulty filter
    let tier = msg.text().and_then(DifficultyTier::parse);
    ask_question_count(
        &bot,
        &dialogue,
        msg.chat.id,
        ContentKind::Grammar,
        SessionMode::Difficulty(tier),
    )
    .await
}

async fn ask_question_count(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    kind: ContentKind,
    mode: SessionMode,
) -> HandlerResult {
    bot.send_message(chat_id, "How many questions?")
        .reply_markup(keyboard(&[&["5"], &["10"], &["20"]]))
        .await?;
    dialogue
        .update(State::ReceiveQuestionCount { kind, mode })
        .await?;
    Ok(())
}

async fn receive_question_count(
    bot: Bot,
    dialogue: QuizDialogue,
    (kind, mode): (ContentKind, SessionMode),
    msg: Message,
    app: Arc<App>,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let count = parse_count(msg.text());

    let Some(_loading) = app.loading.try_begin(chat_id) else {
        bot.send_message(chat_id, "Still loading the questions, hold on...")
            .await?;
        return Ok(());
    };

    // Not important if it fails, it only shows that something is happening
    let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;

    let records = match app.records.load(app.config.source(kind), false).await {
        Ok(records) => records,
        Err(e) => {
            warn!("Chat {}: loading {} failed: {}", chat_id.0, kind.label(), e);
            let text = format!(
                "I couldn't load the {} list ({}). Try again later or use /refresh.",
                kind.label(),
                e
            );
            return back_to_menu(&bot, &dialogue, chat_id, text).await;
        }
    };

    let _lock = app.lock_chat(chat_id).await;
    // /start or /cancel may have moved the chat on while the list was loading
    let current = dialogue.get().await?;
    if !awaits_question_count(current.as_ref(), kind, &mode) {
        info!("Chat {}: dropped a quiz start that was overtaken", chat_id.0);
        return Ok(());
    }
    app.timers.disarm(&chat_id);

    let weak_ids = app.weak_tracker(chat_id).all().clone();
    let built = builder::build(&records, kind, &mode, &weak_ids, count, &mut rand::thread_rng());
    let mut session = match built {
        Ok(session) => session,
        Err(e) => {
            let text = format!("Can't start a quiz: {}. Try different settings.", e);
            return back_to_menu(&bot, &dialogue, chat_id, text).await;
        }
    };
    session.start(&records, &mut rand::thread_rng())?;
    info!(
        "Chat {}: started a {} quiz with {} questions",
        chat_id.0,
        kind.label(),
        session.items().len()
    );

    bot.send_message(
        chat_id,
        format!("Great! {} questions, let's go!", session.items().len()),
    )
    .await?;
    present_question(&bot, &app, chat_id, &session).await?;
    dialogue.update(State::InQuiz { session }).await?;
    Ok(())
}

/// Between picking a content kind and the first question.
fn is_setting_up(state: &State) -> bool {
    matches!(
        state,
        State::ReceiveModeChoice { .. }
            | State::ReceiveRange { .. }
            | State::ReceiveDifficulty
            | State::ReceiveQuestionCount { .. }
            | State::ConfirmClearWeak
    )
}

fn awaits_question_count(state: Option<&State>, kind: ContentKind, mode: &SessionMode) -> bool {
    matches!(
        state,
        Some(State::ReceiveQuestionCount { kind: k, mode: m }) if *k == kind && m == mode
    )
}

async fn present_question(bot: &Bot, app: &Arc<App>, chat_id: ChatId, session: &QuizSession) -> HandlerResult {
    let Some(view) = session.view() else {
        return Ok(());
    };

    let mut text = format!(
        "Question {}/{}:\n\n{}",
        view.position, view.total, view.prompt
    );
    if let Some(limit) = app.config.question_time_limit {
        text.push_str(&format!("\n\n⏱ {} seconds", limit.as_secs()));
    }
    let answers = view
        .choices
        .iter()
        .map(|choice| vec![KeyboardButton::new(choice.to_string())])
        .collect::<Vec<_>>();

    bot.send_message(chat_id, text)
        .reply_markup(KeyboardMarkup::new(answers))
        .await?;

    arm_timer(app, bot, chat_id, view.position - 1);
    Ok(())
}

fn arm_timer(app: &Arc<App>, bot: &Bot, chat_id: ChatId, index: usize) {
    let Some(limit) = app.config.question_time_limit else {
        return;
    };
    let task_app = app.clone();
    let task_bot = bot.clone();
    app.timers.arm(chat_id, limit, move || async move {
        if let Err(e) = expire_question(task_app, task_bot, chat_id, index).await {
            error!("Chat {}: timer for question {} failed: {}", chat_id.0, index, e);
        }
    });
}

/// Grades question `index` as timed out, unless the chat has moved on meanwhile.
async fn expire_question(app: Arc<App>, bot: Bot, chat_id: ChatId, index: usize) -> HandlerResult {
    let _lock = app.lock_chat(chat_id).await;
    let dialogue = QuizDialogue::new(app.dialogues.clone(), chat_id);
    let Some(State::InQuiz { mut session }) = dialogue.get().await? else {
        return Ok(());
    };
    if session.presenting_index() != Some(index) {
        return Ok(());
    }

    let mut weak = app.weak_tracker(chat_id);
    let Some(grading) = session.submit_answer(Answer::Timeout, &mut weak)? else {
        return Ok(());
    };
    dialogue.update(State::InQuiz { session }).await?;

    bot.send_message(chat_id, feedback_text(&grading))
        .reply_markup(next_keyboard())
        .await?;
    Ok(())
}

async fn quiz_step(bot: Bot, dialogue: QuizDialogue, msg: Message, app: Arc<App>) -> HandlerResult {
    let chat_id = msg.chat.id;
    let _lock = app.lock_chat(chat_id).await;
    // Re-read under the lock: a timer may have graded the question meanwhile
    let Some(State::InQuiz { mut session }) = dialogue.get().await? else {
        return Ok(());
    };
    let text = msg.text().unwrap_or_default();

    if session.presenting_index().is_some() {
        let Some(choice) = session.choice_index(text) else {
            let mut reply = "Please tap one of the answers".to_string();
            let left = time_left(
                app.timers.fraction_remaining(&chat_id),
                app.config.question_time_limit,
            );
            if let Some(left) = left {
                reply.push_str(&format!(" (⏱ {} s left)", left.as_secs()));
            }
            bot.send_message(chat_id, reply).await?;
            return Ok(());
        };
        app.timers.disarm(&chat_id);

        let mut weak = app.weak_tracker(chat_id);
        let grading = session.submit_answer(Answer::Choice(choice), &mut weak)?;
        dialogue.update(State::InQuiz { session }).await?;
        if let Some(grading) = grading {
            bot.send_message(chat_id, feedback_text(&grading))
                .reply_markup(next_keyboard())
                .await?;
        }
        return Ok(());
    }

    if !matches!(session.phase(), Phase::Graded { .. }) {
        return back_to_menu(&bot, &dialogue, chat_id, "What next?".to_string()).await;
    }
    if text != NEXT_BUTTON {
        bot.send_message(chat_id, "Tap \"Next\" to continue")
            .reply_markup(next_keyboard())
            .await?;
        return Ok(());
    }

    app.timers.disarm(&chat_id);
    let pool = app
        .records
        .load(app.config.source(session.kind()), false)
        .await?;
    let step = session.advance(&pool, &mut rand::thread_rng())?;

    match step {
        Advance::Next(_) => {
            present_question(&bot, &app, chat_id, &session).await?;
            dialogue.update(State::InQuiz { session }).await?;
            Ok(())
        }
        Advance::Completed(summary) => {
            info!(
                "Chat {}: finished with {}/{}",
                chat_id.0, summary.score, summary.total
            );
            back_to_menu(&bot, &dialogue, chat_id, summary_text(&summary)).await
        }
    }
}

/// Whole seconds left on the question clock, rounded up.
fn time_left(fraction: Option<f32>, limit: Option<Duration>) -> Option<Duration> {
    let left = limit?.as_secs_f32() * fraction?;
    Some(Duration::from_secs(left.ceil() as u64))
}

fn feedback_text(grading: &Grading) -> String {
    let mut text = if grading.correct {
        "✅ Correct!".to_string()
    } else if grading.selected.is_none() {
        format!("⏰ Time's up! The answer is: {}", grading.correct_answer)
    } else {
        format!("❌ Wrong. The answer is: {}", grading.correct_answer)
    };
    if let Some(explanation) = &grading.explanation {
        text.push_str(&format!("\n\n💡 {}", explanation));
    }
    text
}

fn summary_text(summary: &Summary) -> String {
    let mut text = format!(
        "Quiz finished! You answered {} of {} questions correctly.",
        summary.score, summary.total
    );
    if summary.flawless {
        text.push_str("\n\n🎉 Flawless! Not a single mistake.");
    }
    if !summary.missed.is_empty() {
        text.push_str("\n\nWorth another look:");
        for missed in &summary.missed {
            text.push_str(&format!("\n• {}: {}", missed.prompt, missed.correct_answer));
        }
    }
    text.push_str("\n\nWhat would you like to do next?");
    text
}

async fn command(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    cmd: Command,
    app: Arc<App>,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    match cmd {
        Command::Start => {
            let _lock = app.lock_chat(chat_id).await;
            app.timers.disarm(&chat_id);
            start(bot, dialogue, msg).await?;
        }
        Command::Help => {
            bot.send_message(chat_id, Command::descriptions().to_string())
                .await?;
        }
        Command::Weak => {
            let weak = app.weak_tracker(chat_id);
            if weak.count() == 0 {
                bot.send_message(chat_id, "Your weak list is empty. Nice!")
                    .await?;
                return Ok(());
            }
            let terms: HashMap<u32, String> = app
                .records
                .cached(&app.config.vocabulary_source.name)
                .map(|records| {
                    records
                        .iter()
                        .map(|record| (record.id(), record.prompt_text().to_string()))
                        .collect()
                })
                .unwrap_or_default();
            let mut text = format!("You have {} weak words:", weak.count());
            for id in weak.all() {
                match terms.get(id) {
                    Some(term) => text.push_str(&format!("\n{}. {}", id, term)),
                    None => text.push_str(&format!("\n{}.", id)),
                }
            }
            bot.send_message(chat_id, text).await?;
        }
        Command::Forget(arg) => {
            let reply = match arg.trim().parse::<u32>() {
                Ok(id) => {
                    if app.weak_tracker(chat_id).remove(id)? {
                        format!("Removed {} from your weak list.", id)
                    } else {
                        format!("{} is not on your weak list.", id)
                    }
                }
                Err(_) => "Usage: /forget <number>".to_string(),
            };
            bot.send_message(chat_id, reply).await?;
        }
        Command::ClearWeak => {
            if let Some(State::InQuiz { .. }) = dialogue.get().await? {
                bot.send_message(chat_id, "Finish the quiz or /cancel it first.")
                    .await?;
                return Ok(());
            }
            bot.send_message(chat_id, "Really clear your whole weak list?")
                .reply_markup(keyboard(&[&[CONFIRM_CLEAR_BUTTON, KEEP_BUTTON]]))
                .await?;
            dialogue.update(State::ConfirmClearWeak).await?;
        }
        Command::Refresh => {
            let Some(_loading) = app.loading.try_begin(chat_id) else {
                bot.send_message(chat_id, "Already loading, hold on...")
                    .await?;
                return Ok(());
            };
            let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;

            let mut lines = Vec::new();
            for kind in [ContentKind::Vocabulary, ContentKind::Grammar] {
                let line = match app.records.load(app.config.source(kind), true).await {
                    Ok(records) => format!("{}: {} items", kind.label(), records.len()),
                    Err(e) => format!("{}: failed ({})", kind.label(), e),
                };
                lines.push(line);
            }
            bot.send_message(chat_id, format!("Reloaded:\n{}", lines.join("\n")))
                .await?;
        }
        Command::Cancel => {
            let _lock = app.lock_chat(chat_id).await;
            app.timers.disarm(&chat_id);
            match dialogue.get().await? {
                Some(State::InQuiz { .. }) => {
                    info!("Chat {}: quiz abandoned", chat_id.0);
                    back_to_menu(&bot, &dialogue, chat_id, "Quiz abandoned.".to_string()).await?;
                }
                Some(state) if is_setting_up(&state) => {
                    back_to_menu(&bot, &dialogue, chat_id, "Cancelled.".to_string()).await?;
                }
                _ => {
                    bot.send_message(chat_id, "There is no quiz running.")
                        .await?;
                }
            }
        }
    }
    Ok(())
}

async fn confirm_clear_weak(bot: Bot, dialogue: QuizDialogue, msg: Message, app: Arc<App>) -> HandlerResult {
    let text = match msg.text() {
        Some(CONFIRM_CLEAR_BUTTON) => {
            app.weak_tracker(msg.chat.id).clear()?;
            "Your weak list is now empty."
        }
        _ => "Kept your weak list as it is.",
    };
    back_to_menu(&bot, &dialogue, msg.chat.id, text.to_string()).await
}

#[cfg(test)]
mod tests {
    use vocab_quiz_bot::quiz::IdRange;

    use super::*;

    #[test]
    fn overtaken_quiz_start_is_dropped() {
        let mode = SessionMode::Range(IdRange::parse("1-5"));
        let waiting = State::ReceiveQuestionCount {
            kind: ContentKind::Vocabulary,
            mode: mode.clone(),
        };
        assert!(awaits_question_count(Some(&waiting), ContentKind::Vocabulary, &mode));

        // /start reset the chat, /cancel or a dialogue reset cleared it
        assert!(!awaits_question_count(Some(&State::ReceiveContentChoice), ContentKind::Vocabulary, &mode));
        assert!(!awaits_question_count(None, ContentKind::Vocabulary, &mode));

        // a newer request for something else is not ours to start
        let other = State::ReceiveQuestionCount {
            kind: ContentKind::Vocabulary,
            mode: SessionMode::WeakOnly,
        };
        assert!(!awaits_question_count(Some(&other), ContentKind::Vocabulary, &mode));
        assert!(!awaits_question_count(Some(&waiting), ContentKind::Grammar, &mode));
    }

    #[test]
    fn cancel_leaves_pending_setup() {
        let waiting = State::ReceiveQuestionCount {
            kind: ContentKind::Grammar,
            mode: SessionMode::Difficulty(None),
        };
        assert!(is_setting_up(&waiting));
        assert!(is_setting_up(&State::ReceiveDifficulty));
        assert!(!is_setting_up(&State::Start));
        assert!(!is_setting_up(&State::ReceiveContentChoice));
    }

    #[test]
    fn time_left_rounds_up_to_whole_seconds() {
        let limit = Some(Duration::from_secs(15));
        assert_eq!(time_left(Some(0.5), limit), Some(Duration::from_secs(8)));
        assert_eq!(time_left(Some(1.0), limit), Some(Duration::from_secs(15)));
        assert_eq!(time_left(Some(0.0), limit), Some(Duration::ZERO));
        assert_eq!(time_left(None, limit), None);
        assert_eq!(time_left(Some(0.5), None), None);
    }
}
