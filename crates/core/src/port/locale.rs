// Locale Control Port
// The character-type locale is process-global state; escaping under a given
// locale goes through this port so it can be scoped and mocked.

/// Access to the process' LC_CTYPE setting
pub trait LocaleControl: Send + Sync {
    /// Current LC_CTYPE locale name, if it can be queried
    fn current(&self) -> Option<String>;

    /// Switch LC_CTYPE; returns `false` if the locale is unavailable
    fn set(&self, locale: &str) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// In-memory locale that records every switch
    pub struct MockLocale {
        current: Mutex<String>,
        available: Vec<String>,
        history: Mutex<Vec<String>>,
    }

    impl MockLocale {
        pub fn new(initial: &str, available: &[&str]) -> Self {
            Self {
                current: Mutex::new(initial.to_string()),
                available: available.iter().map(|s| s.to_string()).collect(),
                history: Mutex::new(Vec::new()),
            }
        }

        pub fn history(&self) -> Vec<String> {
            self.history.lock().unwrap().clone()
        }

        pub fn current_locale(&self) -> String {
            self.current.lock().unwrap().clone()
        }
    }

    impl LocaleControl for MockLocale {
        fn current(&self) -> Option<String> {
            Some(self.current.lock().unwrap().clone())
        }

        fn set(&self, locale: &str) -> bool {
            if !self.available.iter().any(|l| l == locale) {
                return false;
            }
            *self.current.lock().unwrap() = locale.to_string();
            self.history.lock().unwrap().push(locale.to_string());
            true
        }
    }
}
