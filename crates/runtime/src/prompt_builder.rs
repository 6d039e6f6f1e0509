//! Instruction assembly for the three generation call sites.
//!
//! Everything here is synchronous string building.  The controller decides
//! *when* to call the gateway; this module only decides *what* to send.

use chrono::{Datelike, NaiveDate};

/// A practice scene and its core vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scene {
    pub name: &'static str,
    pub words: [&'static str; 4],
}

pub const SCENES: &[Scene] = &[
    Scene {
        name: "방 (room)",
        words: ["의자 (chair)", "책상 (desk)", "문 (door)", "창문 (window)"],
    },
    Scene {
        name: "카페 (cafe)",
        words: ["커피 (coffee)", "빵 (bread)", "메뉴판 (menu)", "점원 (staff)"],
    },
    Scene {
        name: "공항 (airport)",
        words: ["비행기 (airplane)", "표 (ticket)", "짐 (luggage)", "여권 (passport)"],
    },
    Scene {
        name: "시장 (market)",
        words: ["과일 (fruit)", "가격 (price)", "봉투 (bag)", "아주머니 (shopkeeper)"],
    },
    Scene {
        name: "지하철 (subway)",
        words: ["역 (station)", "노선도 (route map)", "교통카드 (transit card)", "환승 (transfer)"],
    },
];

/// The scene for `date`.  Rotates through [`SCENES`] by day of the year so
/// consecutive days get different vocabulary.
pub fn scene_for(date: NaiveDate) -> Scene {
    SCENES[date.ordinal0() as usize % SCENES.len()]
}

// ─── topic ───────────────────────────────────────────────────────────────────

pub fn topic_instruction(tutor_name: &str) -> String {
    format!(
        "You are {tutor_name}, a friendly Korean conversation partner for a learner.\n\
         Write ONE short conversation starter for today's practice, in simple Korean \
         (two or three sentences at most).\n\
         Build it around the given scene and use at least two of its words.\n\
         End with a question the learner can answer in one or two sentences.\n\
         Reply with the conversation starter only. No preamble, no translation."
    )
}

pub fn topic_user_content(date: NaiveDate) -> String {
    let scene = scene_for(date);
    format!(
        "DATE: {date}\nSCENE: {scene}\nWORDS: {words}",
        scene = scene.name,
        words = scene.words.join(", "),
    )
}

// ─── chat turn ───────────────────────────────────────────────────────────────

pub fn reply_instruction(tutor_name: &str, topic: &str) -> String {
    format!(
        "You are {tutor_name}, a warm and patient Korean tutor chatting with one learner.\n\
         TODAY'S TOPIC:\n{topic}\n\n\
         Keep the conversation on today's topic where it feels natural.\n\
         Answer in short, simple Korean (polite 해요체), with an English gloss in \
         parentheses only for words the learner is likely to miss.\n\
         If the learner made a mistake, gently show the corrected sentence first.\n\
         If the learner asks what something means, explain it briefly with one example.\n\
         End with a short follow-up question to keep them talking."
    )
}

// ─── review ──────────────────────────────────────────────────────────────────

pub fn review_instruction(tutor_name: &str) -> String {
    format!(
        "You are {tutor_name}, a Korean tutor preparing a short review sheet.\n\
         The learner flagged the numbered messages below as confusing.\n\
         For EACH item: restate the tricky expression, explain its meaning in simple \
         English, and give one natural Korean example sentence with a translation.\n\
         Then finish with a recall quiz of three short questions (answers at the very end).\n\
         Keep it concise and friendly; use plain text, no tables."
    )
}

pub fn review_user_content(queue: &[String]) -> String {
    queue
        .iter()
        .enumerate()
        .map(|(idx, item)| format!("{}. {}", idx + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}
