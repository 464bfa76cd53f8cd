//! Player-facing message log.

use std::collections::VecDeque;

use derive_more::Deref;

/// How many lines the log keeps before dropping the oldest.
pub const LOG_CAPACITY: usize = 50;

/// Scrolling narrative log shown to the player.
#[derive(Clone, Debug, Default, Deref)]
pub struct MessageLog(VecDeque<String>);

impl MessageLog {
    pub fn add(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::debug!("msg: {text}");
        self.0.push_back(text);
        while self.0.len() > LOG_CAPACITY {
            self.0.pop_front();
        }
    }

    /// Most recent message.
    pub fn last(&self) -> Option<&str> {
        self.0.back().map(|s| s.as_str())
    }

    /// Take every kept message, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        self.0.drain(..).collect()
    }

    /// Whether any of the kept messages contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.0.iter().any(|m| m.contains(needle))
    }
}

/// Write a formatted line into a game's message log.
#[macro_export]
macro_rules! msg {
    ($g:expr, $($fmt:tt)*) => {
        $g.log.add(format!($($fmt)*))
    };
}

/// Indefinite article for a noun.
pub fn a_or_an(noun: &str) -> &'static str {
    match noun.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn log_drops_oldest() {
        let mut log = MessageLog::default();
        for i in 0..(LOG_CAPACITY + 5) {
            log.add(format!("line {i}"));
        }
        assert_eq!(log.len(), LOG_CAPACITY);
        assert_eq!(log.front().map(|s| s.as_str()), Some("line 5"));
        assert_eq!(log.last(), Some("line 54"));
    }

    #[test]
    fn articles() {
        assert_eq!(a_or_an("imp"), "an");
        assert_eq!(a_or_an("Goblin"), "a");
        assert_eq!(a_or_an(""), "a");
    }
}
