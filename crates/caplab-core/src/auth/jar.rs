use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Cookie jar file name in cache directory
const COOKIE_FILE: &str = "cookies.json";

#[derive(Error, Debug)]
pub enum CookieError {
    #[error("Malformed cookie assignment: {0}")]
    Malformed(String),

    #[error("Failed to persist cookies: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse cookie file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A same-origin cookie store with `document.cookie` semantics.
///
/// Reading yields `name=value` pairs joined by `; `. Writing takes a single
/// `name=value;attr=...` assignment and replaces any cookie with that name.
pub trait CookieJar: Send + Sync {
    fn cookie_string(&self) -> String;

    fn write(&self, assignment: &str) -> Result<(), CookieError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredCookie {
    name: String,
    value: String,
    path: Option<String>,
    same_site: Option<String>,
}

impl StoredCookie {
    fn parse(assignment: &str) -> Result<Self, CookieError> {
        let mut parts = assignment.split(';');
        let pair = parts.next().unwrap_or_default();
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| CookieError::Malformed(assignment.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CookieError::Malformed(assignment.to_string()));
        }

        let mut cookie = StoredCookie {
            name: name.to_string(),
            value: value.trim().to_string(),
            path: None,
            same_site: None,
        };

        for attr in parts {
            let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
            match key.trim().to_ascii_lowercase().as_str() {
                "path" => cookie.path = Some(val.trim().to_string()),
                "samesite" => cookie.same_site = Some(val.trim().to_string()),
                _ => {}
            }
        }

        Ok(cookie)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Cookies {
    entries: Vec<StoredCookie>,
}

impl Cookies {
    fn apply(&mut self, cookie: StoredCookie) {
        match self.entries.iter_mut().find(|c| c.name == cookie.name) {
            Some(existing) => *existing = cookie,
            None => self.entries.push(cookie),
        }
    }

    fn render(&self) -> String {
        self.entries
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn lock(cookies: &Mutex<Cookies>) -> MutexGuard<'_, Cookies> {
    cookies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cookie jar that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<Cookies>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a jar from a `document.cookie` style string.
    pub fn with_cookies(cookie: &str) -> Result<Self, CookieError> {
        let jar = Self::new();
        for pair in cookie.split(';').filter(|p| !p.trim().is_empty()) {
            jar.write(pair)?;
        }
        Ok(jar)
    }
}

impl CookieJar for MemoryCookieJar {
    fn cookie_string(&self) -> String {
        lock(&self.cookies).render()
    }

    fn write(&self, assignment: &str) -> Result<(), CookieError> {
        let cookie = StoredCookie::parse(assignment)?;
        lock(&self.cookies).apply(cookie);
        Ok(())
    }
}

/// Cookie jar persisted as JSON in the cache directory.
pub struct FileCookieJar {
    path: PathBuf,
    cookies: Mutex<Cookies>,
}

impl FileCookieJar {
    /// Open the jar in `cache_dir`, loading any cookies saved by a previous run.
    pub fn open(cache_dir: &Path) -> Result<Self, CookieError> {
        let path = cache_dir.join(COOKIE_FILE);
        let cookies = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Cookies::default()
        };
        debug!(path = %path.display(), count = cookies.entries.len(), "Cookie jar loaded");

        Ok(Self {
            path,
            cookies: Mutex::new(cookies),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, cookies: &Cookies) -> Result<(), CookieError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(cookies)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl CookieJar for FileCookieJar {
    fn cookie_string(&self) -> String {
        lock(&self.cookies).render()
    }

    fn write(&self, assignment: &str) -> Result<(), CookieError> {
        let cookie = StoredCookie::parse(assignment)?;
        let mut cookies = lock(&self.cookies);
        cookies.apply(cookie);
        self.save(&cookies)
    }
}
