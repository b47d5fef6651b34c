//! Golden vectors for user-facing string formats.
//!
//! Expiration strings arrive from forms and API clients, and permission
//! masks show up in logs. These tables pin both formats so a change to
//! either is a deliberate one.

use pastegate_core::{Expiration, Permission};

/// An expiration string and what it must parse to.
#[derive(Debug, Clone, Copy)]
pub struct ExpirationVector {
    pub input: &'static str,
    /// `None` for inputs that must be rejected; `Some(None)` for "never".
    pub expected_secs: Option<Option<u64>>,
    /// Canonical rendering of the parsed value.
    pub canonical: Option<&'static str>,
}

/// All expiration vectors.
pub fn expiration_vectors() -> Vec<ExpirationVector> {
    let ok = |input, secs, canonical| ExpirationVector {
        input,
        expected_secs: Some(secs),
        canonical: Some(canonical),
    };
    let bad = |input| ExpirationVector {
        input,
        expected_secs: None,
        canonical: None,
    };
    vec![
        ok("-1", None, "-1"),
        ok("90", Some(90), "90s"),
        ok("60", Some(60), "1m"),
        ok("30m", Some(1800), "30m"),
        ok("2h", Some(7200), "2h"),
        ok("1d", Some(86_400), "1d"),
        ok("1w", Some(604_800), "1w"),
        ok("14d", Some(1_209_600), "2w"),
        ok("36H", Some(129_600), "36h"),
        bad(""),
        bad("0"),
        bad("-5"),
        bad("10y"),
        bad("h"),
        bad("1.5h"),
    ]
}

/// Check every expiration vector. Returns the inputs that disagree.
pub fn verify_expiration_vectors() -> Vec<&'static str> {
    expiration_vectors()
        .into_iter()
        .filter(|v| !expiration_matches(v))
        .map(|v| v.input)
        .collect()
}

fn expiration_matches(v: &ExpirationVector) -> bool {
    let parsed = v.input.parse::<Expiration>().ok();
    let secs = parsed.map(|e| match e {
        Expiration::Never => None,
        Expiration::After(d) => Some(d.as_secs()),
    });
    secs == v.expected_secs && parsed.map(|e| e.to_string()).as_deref() == v.canonical
}

/// Permission masks and their log rendering.
pub fn permission_vectors() -> Vec<(Permission, &'static str)> {
    vec![
        (Permission::NONE, "none"),
        (Permission::VIEW, "view"),
        (Permission::VIEW | Permission::EDIT, "view|edit"),
        (Permission::DELETE | Permission::GRANT, "delete|grant"),
        (Permission::ALL, "view|edit|delete|grant"),
    ]
}
