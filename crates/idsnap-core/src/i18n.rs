//! Translation catalog and the locale context shared by every text-producing component.
//!
//! The catalog is a static table per locale. A missing key resolves to the key
//! itself so the UI never renders a blank label.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};
use thiserror::Error;

/// Supported display locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ko => "ko",
        }
    }

    /// The other supported locale (the header's language toggle).
    pub fn toggled(self) -> Self {
        match self {
            Locale::En => Locale::Ko,
            Locale::Ko => Locale::En,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported locale: {0} (expected en or ko)")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ko" => Ok(Locale::Ko),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

const EN: &[(&str, &str)] = &[
    // Navigation
    ("home", "Home"),
    ("recognition", "Recognition"),
    ("addUser", "Add User"),
    ("language", "en"),
    // Home
    ("appName", "IDSnap"),
    ("appDescription", "Upload a photo and get the person's name and information instantly."),
    ("goToRecognition", "Go to Recognition"),
    ("addNewUser", "Add New User"),
    // Recognition
    ("faceRecognition", "Face Recognition"),
    ("uploadImage", "Upload Image"),
    ("dropImage", "Drop your image here or click to browse"),
    ("supportedFormats", "Supported formats: JPG, PNG, WEBP"),
    ("analyzing", "Analyzing..."),
    ("recognizedPerson", "Recognized Person"),
    ("noFaceDetected", "No face detected in the image"),
    ("faceLandmarks", "Face Landmarks"),
    // Add user
    ("addNewUserTitle", "Add New User"),
    ("addUserDescription", "Add a new person to the recognition database"),
    ("name", "Name"),
    ("namePlaceholder", "Enter person's name"),
    ("info", "Information"),
    ("infoPlaceholder", "Enter additional information about this person"),
    ("photo", "Photo"),
    ("submitUser", "Add User"),
    ("userAdded", "User added successfully!"),
    ("requiredFields", "Please fill in all required fields"),
    ("addUserFailed", "Failed to add user. Please try again."),
    // Intake
    ("fileTooLarge", "File is too large"),
    ("unsupportedType", "Unsupported file type"),
    ("noFileSelected", "No file selected"),
    // Common
    ("upload", "Upload"),
    ("submit", "Submit"),
    ("error", "Error"),
    ("success", "Success"),
    ("loading", "Loading..."),
];

const KO: &[(&str, &str)] = &[
    ("home", "홈"),
    ("recognition", "인식"),
    ("addUser", "사용자 추가"),
    ("language", "ko"),
    ("appName", "IDSnap"),
    ("appDescription", "사진을 업로드하고 즉시 사람의 이름과 정보를 확인하세요."),
    ("goToRecognition", "인식 시작"),
    ("addNewUser", "새 사용자 추가"),
    ("faceRecognition", "얼굴 인식"),
    ("uploadImage", "이미지 업로드"),
    ("dropImage", "이미지를 여기에 드롭하거나 클릭하여 찾아보세요"),
    ("supportedFormats", "지원 형식: JPG, PNG, WEBP"),
    ("analyzing", "분석 중..."),
    ("recognizedPerson", "인식된 사람"),
    ("noFaceDetected", "이미지에서 얼굴을 감지할 수 없습니다"),
    ("faceLandmarks", "얼굴 랜드마크"),
    ("addNewUserTitle", "새 사용자 추가"),
    ("addUserDescription", "새로운 사용자를 데이터베이스에 추가하세요"),
    ("name", "이름"),
    ("namePlaceholder", "사람의 이름을 입력하세요"),
    ("info", "정보"),
    ("infoPlaceholder", "이 사람에 대한 추가 정보를 입력하세요"),
    ("photo", "사진"),
    ("submitUser", "사용자 추가"),
    ("userAdded", "사용자가 성공적으로 추가되었습니다!"),
    ("requiredFields", "필수 항목을 모두 입력하세요"),
    ("addUserFailed", "사용자를 추가하지 못했습니다. 다시 시도하세요."),
    ("fileTooLarge", "파일이 너무 큽니다"),
    ("unsupportedType", "지원되지 않는 파일 형식입니다"),
    ("noFileSelected", "선택된 파일이 없습니다"),
    ("upload", "업로드"),
    ("submit", "제출"),
    ("error", "오류"),
    ("success", "성공"),
    ("loading", "로딩 중..."),
];

static CATALOG: OnceLock<HashMap<Locale, HashMap<&'static str, &'static str>>> = OnceLock::new();

fn catalog() -> &'static HashMap<Locale, HashMap<&'static str, &'static str>> {
    CATALOG.get_or_init(|| {
        HashMap::from([
            (Locale::En, EN.iter().copied().collect()),
            (Locale::Ko, KO.iter().copied().collect()),
        ])
    })
}

/// Resolve `key` under `locale`, falling back to the key itself.
pub fn lookup<'a>(locale: Locale, key: &'a str) -> &'a str {
    catalog()
        .get(&locale)
        .and_then(|table| table.get(key).copied())
        .unwrap_or(key)
}

/// All keys known to the catalog for a locale, sorted.
pub fn keys(locale: Locale) -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = catalog()
        .get(&locale)
        .map(|table| table.keys().copied().collect())
        .unwrap_or_default();
    keys.sort_unstable();
    keys
}

/// Process-wide locale selection.
///
/// Created once at startup and handed to components behind an `Arc`.
/// Only [`set_locale`](Self::set_locale) mutates it; every [`t`](Self::t)
/// reads the current value, so a switch shows up on the next render.
#[derive(Debug, Default)]
pub struct LocaleContext {
    current: RwLock<Locale>,
}

impl LocaleContext {
    pub fn new(locale: Locale) -> Self {
        Self {
            current: RwLock::new(locale),
        }
    }

    pub fn locale(&self) -> Locale {
        // A poisoned lock still holds a valid Locale.
        *self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_locale(&self, locale: Locale) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        let previous = *current;
        if previous != locale {
            tracing::debug!(from = %previous, to = %locale, "locale changed");
        }
        *current = locale;
    }

    /// Flip between the two supported locales and return the new one.
    pub fn toggle(&self) -> Locale {
        let next = self.locale().toggled();
        self.set_locale(next);
        next
    }

    /// Translate `key` in the current locale.
    pub fn t<'a>(&self, key: &'a str) -> &'a str {
        lookup(self.locale(), key)
    }
}
