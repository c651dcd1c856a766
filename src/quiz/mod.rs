//! Quiz Module
//!
//! Multiple-choice recall tests over a user's vocabulary.
//!
//! ## Flow
//! ```text
//!   get_user_dictionary ──► select_word ──► build_choices ──► save_quiz
//!                                                                 │
//!   "qr|<id>|<n>" ──► QuizReply ──► get_quiz ──► set_result ◄─────┘
//!                                                   │
//!                                   correct? ──► stamp last_quiz
//! ```
//!
//! ## Responsibilities
//! - Eligibility per quiz type and recency-weighted selection
//! - Distractor assembly with exactly one correct choice
//! - Answer validation and persistence
//! - Reply token parsing

mod choices;
mod engine;
mod reply;
mod scoring;
mod selection;

pub use choices::{build_choices, choice_text, display_word};
pub use engine::{QuizEngine, QuizSettings};
pub use reply::{QuizReply, QUIZ_REPLY_KIND};
pub use selection::{eligible_entries, is_eligible, select_word, weights, UNQUIZZED_WEIGHT};
