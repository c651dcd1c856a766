//! wordbank CLI Client
//!
//! Command-line caller of the storage contract and the quiz engine.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use wordbank::quiz::QuizReply;
use wordbank::vocabulary::{ensure_user, normalize_word, remember_word, set_quiz_type};
use wordbank::{
    storage, BackendKind, Config, DictionaryItem, Quiz, QuizEngine, QuizSettings, QuizType,
    Result, UserId,
};

/// wordbank CLI
#[derive(Parser, Debug)]
#[command(name = "wordbank-cli")]
#[command(about = "Manage a vocabulary and take quizzes")]
#[command(version)]
struct Args {
    /// Storage backend: memory, embedded:<path> or remote:<host:port>
    #[arg(short, long, default_value = "embedded:./wordbank.redb")]
    backend: BackendKind,

    /// User the command acts for
    #[arg(short, long, default_value = "1")]
    user: i64,

    /// Language quiz translations are drawn from
    #[arg(long, default_value = "ru")]
    language: String,

    /// Choices per quiz
    #[arg(long, default_value = "4")]
    choices: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a dictionary record (JSON) and add it to the user's list
    AddWord {
        /// The DictionaryItem as JSON
        json: String,
    },

    /// List the user's words
    Dictionary,

    /// Generate a quiz
    Quiz,

    /// Answer a quiz with a reply token (qr|<quiz id>|<choice>)
    Answer {
        /// The reply token
        token: String,
    },

    /// Set the user's quiz type
    QuizType {
        /// translations, rTranslations or meanings
        quiz_type: QuizType,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::builder()
        .backend(args.backend.clone())
        .quiz_language(&args.language)
        .quiz_choices(args.choices)
        .build();

    let storage = storage::open(&config)?;
    let user_id = UserId(args.user);
    let mut user = ensure_user(storage.as_ref(), user_id, "", &args.language)?;

    match args.command {
        Commands::AddWord { json } => {
            let mut item: DictionaryItem = wordbank::model::decode_record("<argument>", json.as_bytes())?;
            item.word = normalize_word(&item.word)?;
            let membership = remember_word(storage.as_ref(), user_id, &item)?;
            println!("{} added {}", membership.word, membership.created.to_rfc3339());
        }

        Commands::Dictionary => {
            let dictionary = storage.get_user_dictionary(user_id)?;
            if dictionary.is_empty() {
                println!("(empty)");
            }
            for (word, entry) in &dictionary {
                let last = entry
                    .item
                    .last_quiz
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                let translations: Vec<&str> = entry
                    .dictionary
                    .translations_in(&args.language)
                    .map(|t| t.text.as_str())
                    .collect();
                println!("{:<20} {:<40} last quiz: {}", word, translations.join(", "), last);
            }
        }

        Commands::Quiz => {
            let engine = QuizEngine::new(storage, QuizSettings::from(&config));
            let quiz = engine.generate(&user, &mut rand::thread_rng())?;
            print_quiz(&quiz);
        }

        Commands::Answer { token } => {
            let engine = QuizEngine::new(storage, QuizSettings::from(&config));
            let quiz = engine.answer_reply(user_id, &token)?;
            match quiz.result {
                Some(result) if result.correct => println!("Correct!"),
                _ => println!("Wrong! The answer was {}", quiz.word),
            }
            print_quiz(&quiz);
        }

        Commands::QuizType { quiz_type } => {
            set_quiz_type(storage.as_ref(), &mut user, quiz_type)?;
            println!("quiz type set to {}", quiz_type);
        }
    }
    Ok(())
}

fn print_quiz(quiz: &Quiz) {
    println!("Word: {}", quiz.display_word);
    println!("Choices:");
    for (idx, choice) in quiz.choices.iter().enumerate() {
        let mut marks = String::new();
        if let Some(result) = quiz.result {
            if result.choice == idx {
                marks.push_str("☑️ ");
            }
            if choice.correct {
                marks.push_str("✅ ");
            }
        }
        if quiz.is_answered() {
            println!("  {}{}: {}", marks, idx + 1, choice.text);
        } else {
            let reply = QuizReply::new(quiz.id.clone(), idx);
            println!("  {}: {:<40} [{}]", idx + 1, choice.text, reply);
        }
    }
}
