// LC_CTYPE control through the C library
use std::ffi::{CStr, CString};
use tracing::debug;

use docexec_core::port::LocaleControl;

/// Switches the process-wide character-type locale with `setlocale`
///
/// `setlocale` is not thread-safe; callers that escape under a locale must
/// not do so concurrently with other locale-sensitive C code.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibcLocale;

impl LibcLocale {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl LocaleControl for LibcLocale {
    fn current(&self) -> Option<String> {
        // SAFETY: a null locale pointer only queries; the returned string is
        // copied before any other setlocale call can invalidate it.
        unsafe {
            let ptr = libc::setlocale(libc::LC_CTYPE, std::ptr::null());
            if ptr.is_null() {
                return None;
            }
            Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
        }
    }

    fn set(&self, locale: &str) -> bool {
        let Ok(name) = CString::new(locale) else {
            return false;
        };
        // SAFETY: `name` is a valid NUL-terminated string for the whole call.
        let applied = unsafe { !libc::setlocale(libc::LC_CTYPE, name.as_ptr()).is_null() };
        if !applied {
            debug!(locale = %locale, "setlocale rejected locale");
        }
        applied
    }
}

#[cfg(not(unix))]
impl LocaleControl for LibcLocale {
    fn current(&self) -> Option<String> {
        None
    }

    fn set(&self, locale: &str) -> bool {
        debug!(locale = %locale, "Locale switching is not supported on this platform");
        false
    }
}
