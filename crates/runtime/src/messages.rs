//! Fixed user-facing texts.  Backend failures are always answered with one of
//! these, never with the error itself.

pub const START: &str = "안녕하세요! 👋 저는 당신의 한국어 연습 파트너예요.\n\
매일 하나의 주제로 대화해요.\n\n\
먼저 /me 를 눌러 나에게 인사해주세요!\n\n\
/topic  오늘의 주제 보기\n\
/review  헷갈렸던 표현 복습하기";

pub const REGISTERED: &str = "좋아요! 이제 매일 주제를 보낼게요 😊";

pub const NEEDS_REGISTRATION: &str = "먼저 /me 를 눌러 나에게 인사해주세요!";

pub const APOLOGY: &str = "앗, 지금은 대답하기가 조금 어려워요 😥 잠시 후에 다시 말해 주세요!";

pub const TOPIC_APOLOGY: &str =
    "오늘의 주제를 아직 만들지 못했어요 😥 조금 있다가 /topic 으로 다시 불러 주세요.";

pub const ENCOURAGEMENT: &str =
    "헷갈리는 표현이 아직 하나도 없어요! 👏 모르는 게 생기면 언제든지 물어보세요.";

pub const REVIEW_APOLOGY: &str = "복습 자료를 만들지 못했어요 😥 표현들은 그대로 저장해 둘게요. \
나중에 /review 로 다시 시도해 주세요.";

pub const UNKNOWN_COMMAND: &str = "모르는 명령어예요. /start 를 눌러 사용법을 확인해 주세요.";

pub const TOPIC_BANNER: &str = "📚 오늘의 주제";

pub const REVIEW_BANNER: &str = "📝 복습 시간!";

pub fn with_topic_banner(topic: &str) -> String {
    format!("{TOPIC_BANNER}\n\n{topic}")
}

pub fn with_review_banner(review: &str) -> String {
    format!("{REVIEW_BANNER}\n\n{review}")
}
