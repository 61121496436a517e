use once_cell::sync::Lazy;
use regex::Regex;

/// 説明が空の場合に表示する文字列。
pub const NO_DESCRIPTION: &str = "No description";

static BRACKET_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]").expect("invalid bracket token regex"));
static LEADING_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[[^\]]+\]\s*:?\s*").expect("invalid leading token regex"));
static TRAILING_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\[[^\]]+\]\s*$").expect("invalid trailing token regex"));

/// time entryの説明からタスクの参照を取り出すためのtrait。
///
/// 集計処理はこのtraitのみに依存するので、別の記法に差し替えられる。
pub trait TaskReference {
    /// 説明に埋め込まれたタスクの識別子を返す。
    fn token(&self, description: &str) -> Option<String>;

    /// 識別子を取り除いた表示用の説明を返す。
    fn display(&self, description: &str) -> String;
}

/// `[ABC-123]`のように角括弧で囲まれた識別子を扱う。
///
/// # Examples
///
/// ```
/// let reference = BracketReference;
/// assert_eq!(reference.token("[ABC-1]: Fix bug"), Some("ABC-1".to_string()));
/// assert_eq!(reference.display("[ABC-1]: Fix bug"), "Fix bug");
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct BracketReference;

impl TaskReference for BracketReference {
    fn token(&self, description: &str) -> Option<String> {
        BRACKET_TOKEN_REGEX
            .captures(description)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn display(&self, description: &str) -> String {
        let without_prefix = LEADING_TOKEN_REGEX.replace(description, "");
        let cleaned = TRAILING_TOKEN_REGEX.replace(&without_prefix, "");
        let cleaned = cleaned.trim();

        if cleaned.is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            cleaned.to_string()
        }
    }
}
