//! UI preferences stored next to the document state.
//!
//! # Responsibility
//! - Language, theme and font selection.
//! - Pomodoro timer persisted as a wall-clock target.
//!
//! # Invariants
//! - Preferences never read or write the document state key.
//! - Pomodoro remaining time is always recomputed from `now`, so reloads do
//!   not drift or restart the countdown.
//! - Unreadable stored values fall back to defaults instead of failing.

use crate::storage::{keys, KvStore, StorageError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Length of one pomodoro session.
pub const POMODORO_DURATION_MS: i64 = 25 * 60 * 1000;

/// Theme cycle order; the first entry is the default.
pub const THEMES: &[&str] = &[
    "tva",
    "ibm-light",
    "ibm-dark",
    "ibm-blue",
    "journal",
    "terminal",
];

/// Theme with a fixed typeface; font cycling is disabled there.
pub const FIXED_FONT_THEME: &str = "journal";

/// Editor typefaces selectable by index.
pub const FONTS: &[&str] = &[
    "\"Share Tech Mono\", monospace",
    "\"IBM Plex Mono\", monospace",
    "\"VT323\", monospace",
    "\"Courier New\", monospace",
];

/// Supported UI languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Pt,
    En,
    Es,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::Pt => "pt",
            Self::En => "en",
            Self::Es => "es",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "pt" => Some(Self::Pt),
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }
}

/// Lock-screen strings for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardMessages {
    pub welcome: &'static str,
    pub create_pass: &'static str,
    pub repeat_pass: &'static str,
    pub start_btn: &'static str,
    pub locked: &'static str,
    pub unlock_btn: &'static str,
    pub wrong_pass: &'static str,
    pub reset_warn: &'static str,
}

/// Localized lock-screen strings.
pub fn messages(language: Language) -> GuardMessages {
    match language {
        Language::Pt => GuardMessages {
            welcome: "INICIALIZANDO SISTEMA",
            create_pass: "CRIE SUA SENHA DE ACESSO",
            repeat_pass: "CONFIRME A SENHA",
            start_btn: "CRIAR SESSÃO",
            locked: "SISTEMA BLOQUEADO",
            unlock_btn: "DESBLOQUEAR",
            wrong_pass: "SENHA INCORRETA",
            reset_warn: "⚠️ PERIGO: ISSO APAGARÁ TUDO. CONTINUAR?",
        },
        Language::En => GuardMessages {
            welcome: "SYSTEM BOOTING",
            create_pass: "CREATE ACCESS PASSWORD",
            repeat_pass: "CONFIRM PASSWORD",
            start_btn: "CREATE SESSION",
            locked: "SYSTEM LOCKED",
            unlock_btn: "UNLOCK",
            wrong_pass: "WRONG PASSWORD",
            reset_warn: "⚠️ WARNING: THIS WILL WIPE EVERYTHING. PROCEED?",
        },
        Language::Es => GuardMessages {
            welcome: "INICIANDO SISTEMA",
            create_pass: "CREAR CONTRASEÑA",
            repeat_pass: "CONFIRMAR CONTRASEÑA",
            start_btn: "CREAR SESIÓN",
            locked: "SISTEMA BLOQUEADO",
            unlock_btn: "DESBLOQUEAR",
            wrong_pass: "CONTRASEÑA INCORRECTA",
            reset_warn: "⚠️ PELIGRO: ESTO BORRARÁ TODO. ¿SEGUIR?",
        },
    }
}

/// Pomodoro status at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PomodoroStatus {
    Idle,
    Running { remaining_ms: i64 },
    /// The target passed; the stored target has been cleared.
    Finished,
}

impl PomodoroStatus {
    /// `MM:SS` countdown label; `25:00` when idle, `00:00` when finished.
    pub fn label(self) -> String {
        let remaining_ms = match self {
            Self::Idle => POMODORO_DURATION_MS,
            Self::Running { remaining_ms } => remaining_ms,
            Self::Finished => 0,
        };
        let total_secs = remaining_ms.max(0) / 1000;
        format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
    }
}

#[derive(Debug)]
pub enum PreferenceError {
    UnsupportedLanguage(String),
    Storage(StorageError),
}

impl Display for PreferenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLanguage(code) => {
                write!(f, "unsupported language `{code}`; expected pt|en|es")
            }
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PreferenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::UnsupportedLanguage(_) => None,
        }
    }
}

impl From<StorageError> for PreferenceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

pub type PreferenceResult<T> = Result<T, PreferenceError>;

/// Preference accessors over the shared key-value store.
pub struct Preferences<S: KvStore> {
    storage: S,
}

impl<S: KvStore> Preferences<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Stored language, `pt` when unset or unknown.
    pub fn language(&self) -> PreferenceResult<Language> {
        Ok(self
            .storage
            .get(keys::LANGUAGE)?
            .and_then(|code| Language::parse(&code))
            .unwrap_or_default())
    }

    /// Like [`Preferences::language`], logging a storage failure and
    /// falling back to `pt`.
    pub fn language_or_default(&self) -> Language {
        self.language().unwrap_or_else(|err| {
            warn!(
                "event=prefs_language module=prefs status=degraded error_code=language_read_failed error={}",
                err
            );
            Language::default()
        })
    }

    pub fn set_language(&self, code: &str) -> PreferenceResult<Language> {
        let language = Language::parse(code)
            .ok_or_else(|| PreferenceError::UnsupportedLanguage(code.to_string()))?;
        self.storage.set(keys::LANGUAGE, language.code())?;
        Ok(language)
    }

    /// Stored theme, `tva` when unset.
    pub fn theme(&self) -> PreferenceResult<String> {
        Ok(self
            .storage
            .get(keys::THEME)?
            .unwrap_or_else(|| THEMES[0].to_string()))
    }

    /// Advances to the next theme; unknown themes restart the cycle.
    pub fn cycle_theme(&self) -> PreferenceResult<&'static str> {
        let current = self.theme()?;
        let next = THEMES
            .iter()
            .position(|theme| *theme == current)
            .map_or(0, |index| (index + 1) % THEMES.len());
        self.storage.set(keys::THEME, THEMES[next])?;
        Ok(THEMES[next])
    }

    /// Stored font index, `0` when unset, unparsable or out of range.
    pub fn font_index(&self) -> PreferenceResult<usize> {
        Ok(self
            .storage
            .get(keys::FONT_INDEX)?
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|index| *index < FONTS.len())
            .unwrap_or(0))
    }

    /// Advances the font; no-op in the fixed-font theme.
    pub fn cycle_font(&self) -> PreferenceResult<usize> {
        let current = self.font_index()?;
        if self.theme()? == FIXED_FONT_THEME {
            return Ok(current);
        }
        let next = (current + 1) % FONTS.len();
        self.storage.set(keys::FONT_INDEX, &next.to_string())?;
        Ok(next)
    }

    /// Starts a pomodoro when idle, cancels it when running.
    pub fn toggle_pomodoro(&self, now_ms: i64) -> PreferenceResult<PomodoroStatus> {
        match self.pomodoro_status(now_ms)? {
            PomodoroStatus::Running { .. } => {
                self.cancel_pomodoro()?;
                Ok(PomodoroStatus::Idle)
            }
            PomodoroStatus::Idle | PomodoroStatus::Finished => {
                let target = now_ms.saturating_add(POMODORO_DURATION_MS);
                self.storage
                    .set(keys::POMODORO_TARGET, &target.to_string())?;
                info!("event=pomodoro_start module=prefs status=ok target_ms={target}");
                Ok(PomodoroStatus::Running {
                    remaining_ms: POMODORO_DURATION_MS,
                })
            }
        }
    }

    /// Clears the stored target.
    pub fn cancel_pomodoro(&self) -> PreferenceResult<()> {
        self.storage.remove(keys::POMODORO_TARGET)?;
        Ok(())
    }

    /// Recomputes the countdown from the stored target.
    ///
    /// An expired or unreadable target is cleared.
    pub fn pomodoro_status(&self, now_ms: i64) -> PreferenceResult<PomodoroStatus> {
        let Some(raw) = self.storage.get(keys::POMODORO_TARGET)? else {
            return Ok(PomodoroStatus::Idle);
        };
        let Ok(target) = raw.trim().parse::<i64>() else {
            self.cancel_pomodoro()?;
            return Ok(PomodoroStatus::Idle);
        };

        let remaining_ms = target - now_ms;
        if remaining_ms <= 0 {
            self.cancel_pomodoro()?;
            info!("event=pomodoro_finish module=prefs status=ok");
            return Ok(PomodoroStatus::Finished);
        }
        Ok(PomodoroStatus::Running { remaining_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::{Language, PomodoroStatus, Preferences, POMODORO_DURATION_MS};
    use crate::storage::{keys, KvStore, MemoryKvStore};

    #[test]
    fn pomodoro_label_formats_minutes_and_seconds() {
        assert_eq!(PomodoroStatus::Idle.label(), "25:00");
        assert_eq!(
            PomodoroStatus::Running {
                remaining_ms: 61_999
            }
            .label(),
            "01:01"
        );
        assert_eq!(PomodoroStatus::Finished.label(), "00:00");
    }

    #[test]
    fn garbage_pomodoro_target_is_cleared() {
        let kv = MemoryKvStore::new();
        kv.set(keys::POMODORO_TARGET, "soon").unwrap();
        let prefs = Preferences::new(&kv);

        assert_eq!(prefs.pomodoro_status(0).unwrap(), PomodoroStatus::Idle);
        assert!(kv.get(keys::POMODORO_TARGET).unwrap().is_none());
    }

    #[test]
    fn toggle_after_finish_starts_a_new_session() {
        let kv = MemoryKvStore::new();
        let prefs = Preferences::new(&kv);
        prefs.toggle_pomodoro(0).unwrap();

        let status = prefs.toggle_pomodoro(POMODORO_DURATION_MS + 1).unwrap();
        assert_eq!(
            status,
            PomodoroStatus::Running {
                remaining_ms: POMODORO_DURATION_MS
            }
        );
    }

    #[test]
    fn language_parse_is_case_insensitive() {
        assert_eq!(Language::parse(" EN "), Some(Language::En));
        assert_eq!(Language::parse("fr"), None);
    }
}
