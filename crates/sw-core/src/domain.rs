//! Hostname normalization and URL host extraction
//!
//! Normalization is a typed branch: [`Domain::parse`] either yields a
//! canonical lowercase hostname or a [`DomainError`]. The classifier turns
//! the error into an UNKNOWN verdict.

use std::fmt;

/// Error type for hostname normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Empty domain")]
    Empty,
    #[error("Empty label in '{0}'")]
    EmptyLabel(String),
    #[error("Invalid character {0:?} in domain")]
    InvalidCharacter(char),
}

const WWW_PREFIX: &str = "www.";

// =============================================================================
// Normalized Domain
// =============================================================================

/// A normalized hostname: lowercase, no leading `www.`, no trailing dot,
/// every label non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Domain(String);

impl Domain {
    /// Normalize a raw hostname.
    ///
    /// Trims surrounding whitespace, lowercases, strips a single leading
    /// `www.` and drops one trailing dot.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let lowered = raw.trim().to_lowercase();
        let host = lowered.strip_prefix(WWW_PREFIX).unwrap_or(&lowered);
        let host = host.strip_suffix('.').unwrap_or(host);

        if host.is_empty() {
            return Err(DomainError::Empty);
        }

        if let Some(c) = host.chars().find(|&c| is_forbidden_char(c)) {
            return Err(DomainError::InvalidCharacter(c));
        }

        if host.split('.').any(str::is_empty) {
            return Err(DomainError::EmptyLabel(host.to_string()));
        }

        Ok(Self(host.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Number of dot-separated labels.
    pub fn label_count(&self) -> usize {
        self.0.split('.').count()
    }

    /// Parent domains from most to least specific, never yielding a single
    /// label.
    pub fn parents(&self) -> ParentDomains<'_> {
        ParentDomains::new(&self.0)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[inline]
fn is_forbidden_char(c: char) -> bool {
    c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | ':' | '@' | '?' | '#')
}

// =============================================================================
// Suffix Walk
// =============================================================================

/// Get the parent domain (strip leftmost label).
pub fn get_parent_domain(host: &str) -> Option<&str> {
    match host.find('.') {
        Some(idx) if idx < host.len() - 1 => Some(&host[idx + 1..]),
        _ => None,
    }
}

/// Iterator over the parents of a host, stopping before a bare TLD.
///
/// `mail.eu.example.com` yields `eu.example.com` then `example.com`.
pub struct ParentDomains<'a> {
    current: &'a str,
}

impl<'a> ParentDomains<'a> {
    pub fn new(host: &'a str) -> Self {
        Self { current: host }
    }
}

impl<'a> Iterator for ParentDomains<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let parent = get_parent_domain(self.current)?;
        // A parent without a dot is a single label
        if !parent.contains('.') {
            self.current = "";
            return None;
        }
        self.current = parent;
        Some(parent)
    }
}

// =============================================================================
// URL Host Extraction
// =============================================================================

/// URL schemes the front-ends classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

/// Fast scheme extraction without URL parsing.
/// Returns None for anything other than http/https.
#[inline]
pub fn extract_scheme(url: &str) -> Option<Scheme> {
    let bytes = url.trim_start().as_bytes();
    if bytes.len() >= 8 && bytes[..8].eq_ignore_ascii_case(b"https://") {
        Some(Scheme::Https)
    } else if bytes.len() >= 7 && bytes[..7].eq_ignore_ascii_case(b"http://") {
        Some(Scheme::Http)
    } else {
        None
    }
}

/// Bytes that end the authority of an http(s) URL. Browsers read `\` as `/`
/// for these schemes.
#[inline]
fn ends_authority(b: u8) -> bool {
    matches!(b, b'/' | b'\\' | b'?' | b'#')
}

/// Get the start and end positions of the hostname in an http(s) URL.
#[inline]
pub fn get_host_position(url: &str) -> Option<(usize, usize)> {
    let scheme_end = match extract_scheme(url)? {
        Scheme::Https => 8,
        Scheme::Http => 7,
    } + (url.len() - url.trim_start().len());
    let bytes = url.as_bytes();

    // Skip userinfo, up to the last '@' of the authority
    let mut host_start = scheme_end;
    for (i, &b) in bytes.iter().enumerate().skip(scheme_end) {
        if ends_authority(b) {
            break;
        }
        if b == b'@' {
            host_start = i + 1;
        }
    }

    // Find host end
    let mut host_end = bytes.len();
    for (i, &b) in bytes.iter().enumerate().skip(host_start) {
        if ends_authority(b) || b == b':' {
            host_end = i;
            break;
        }
    }

    Some((host_start, host_end))
}

/// Host extraction without allocations.
/// Returns a slice into the original URL, or None when the URL is not
/// http(s) or has no host.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let (host_start, host_end) = get_host_position(url)?;
    let host = url[host_start..host_end].trim_end();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}
