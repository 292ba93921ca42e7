//! The guarded file-access gateway.
//!
//! Exposes five filesystem primitives (list, read, write, mkdir,
//! delete) plus a secret-verification oracle, all addressed by path.
//! One designated file — the protected file — is shielded from the
//! general-purpose operations: it is filtered out of listings, and any
//! read, write, or delete that targets it resolves to `Denied`. Its
//! content is reachable only through [`Gateway::verify_secret`], which
//! leaks exactly one bit per call.
//!
//! The gateway is stateless apart from the filesystem it mediates; the
//! secret is re-read on every verification, so external changes to the
//! file take effect immediately.

mod guard;

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::security::{self, AuditAction};

/// Reason string attached to every policy denial. Safe to surface to
/// the end user verbatim.
const DENIED_REASON: &str = "protected file";

/// Outcome of a gateway operation: the caller only ever sees this
/// three-way shape, never a raw storage fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok { payload: Payload },
    Denied { reason: String },
    Failed { kind: FailureKind, message: String },
}

/// Successful payloads, one shape per operation family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    /// Directory entry names, in whatever order storage yields them.
    Listing(Vec<String>),
    /// Full text content of a file.
    Content(String),
    /// Human-readable confirmation of a mutation.
    Message(String),
    /// Verification result. Never carries the stored secret.
    Match(bool),
}

/// Structured category of a storage failure. Kept alongside the
/// descriptive message so callers are not forced to parse free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    #[error("not found")]
    NotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("not a directory")]
    NotADirectory,
    #[error("is a directory")]
    IsADirectory,
    #[error("invalid encoding")]
    InvalidEncoding,
    #[error("already exists")]
    AlreadyExists,
    #[error("i/o error")]
    Io,
}

impl From<&io::Error> for FailureKind {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::NotADirectory => Self::NotADirectory,
            io::ErrorKind::IsADirectory => Self::IsADirectory,
            io::ErrorKind::InvalidData => Self::InvalidEncoding,
            io::ErrorKind::AlreadyExists => Self::AlreadyExists,
            _ => Self::Io,
        }
    }
}

impl Outcome {
    fn ok(payload: Payload) -> Self {
        Self::Ok { payload }
    }

    fn denied() -> Self {
        Self::Denied {
            reason: DENIED_REASON.to_string(),
        }
    }

    fn failed(err: &io::Error, context: &str) -> Self {
        Self::Failed {
            kind: FailureKind::from(err),
            message: format!("{}: {}", context, err),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

/// The gateway itself. Constructed once per deployment with the
/// designated protected path; tests point it at a fixture file.
#[derive(Debug, Clone)]
pub struct Gateway {
    /// Full path of the protected secret file.
    protected: PathBuf,
    /// Lowercased basename of the protected file, for the
    /// case-insensitive name checks.
    protected_name: String,
    /// State directory holding the audit log of denials.
    state_dir: PathBuf,
}

impl Gateway {
    pub fn new(protected: PathBuf, state_dir: PathBuf) -> Self {
        let protected_name = guard::protected_basename(&protected);
        Self {
            protected,
            protected_name,
            state_dir,
        }
    }

    /// Basename of the protected file (lowercased).
    pub fn protected_name(&self) -> &str {
        &self.protected_name
    }

    /// List the immediate children of a directory, with the protected
    /// file's name filtered out.
    pub fn list_directory(&self, directory: &str) -> Outcome {
        debug!("Listing directory: {}", directory);

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Error listing directory {}: {}", directory, e);
                return Outcome::failed(&e, "cannot list directory");
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if guard::name_matches(&name, &self.protected_name) {
                        continue;
                    }
                    names.push(name);
                }
                Err(e) => {
                    warn!("Error reading directory entry in {}: {}", directory, e);
                    return Outcome::failed(&e, "cannot read directory entry");
                }
            }
        }

        Outcome::ok(Payload::Listing(names))
    }

    /// Read the full text content of a file.
    ///
    /// Two-stage protection check: first the nominal basename of the
    /// absolute path, then the basename of the symlink-resolved real
    /// target. Skipping the second stage would allow disclosure through
    /// a symlink with an innocent name.
    pub fn read_file(&self, path: &str) -> Outcome {
        if guard::nominal_is_protected(path, &self.protected_name) {
            return self.deny(AuditAction::ReadDenied, path, "gateway:read");
        }

        if guard::resolved_is_protected(path, &self.protected_name) {
            return self.deny(AuditAction::ReadDenied, path, "gateway:read");
        }

        debug!("Reading file: {}", path);

        match fs::read_to_string(path) {
            Ok(content) => Outcome::ok(Payload::Content(content)),
            Err(e) => {
                warn!("Error reading file {}: {}", path, e);
                Outcome::failed(&e, "cannot read file")
            }
        }
    }

    /// Create or truncate-and-replace a file with the given content.
    ///
    /// Nominal name check only — no symlink resolution (see guard.rs).
    /// Does not create missing parent directories; a path under a
    /// nonexistent parent fails like the underlying storage call.
    pub fn write_file(&self, path: &str, content: &str) -> Outcome {
        if guard::nominal_is_protected(path, &self.protected_name) {
            return self.deny(AuditAction::WriteDenied, path, "gateway:write");
        }

        debug!("Writing file: {}", path);

        match fs::write(path, content) {
            Ok(()) => Outcome::ok(Payload::Message(format!(
                "Successfully wrote content to {}",
                path
            ))),
            Err(e) => {
                warn!("Error writing to file {}: {}", path, e);
                Outcome::failed(&e, "cannot write file")
            }
        }
    }

    /// Create a directory and any missing intermediate directories.
    /// Succeeds if the directory already exists.
    pub fn create_directory(&self, path: &str) -> Outcome {
        debug!("Creating directory: {}", path);

        match fs::create_dir_all(path) {
            Ok(()) => Outcome::ok(Payload::Message(format!(
                "Successfully created directory {}",
                path
            ))),
            Err(e) => {
                warn!("Error creating directory {}: {}", path, e);
                Outcome::failed(&e, "cannot create directory")
            }
        }
    }

    /// Delete a file. Same nominal-name check as write.
    ///
    /// The gateway does not ask for confirmation; callers are expected
    /// to confirm with the end user before invoking this.
    pub fn delete_file(&self, path: &str) -> Outcome {
        if guard::nominal_is_protected(path, &self.protected_name) {
            return self.deny(AuditAction::DeleteDenied, path, "gateway:delete");
        }

        debug!("Deleting file: {}", path);

        match fs::remove_file(path) {
            Ok(()) => Outcome::ok(Payload::Message(format!(
                "Successfully deleted file {}",
                path
            ))),
            Err(e) => {
                warn!("Error deleting file {}: {}", path, e);
                Outcome::failed(&e, "cannot delete file")
            }
        }
    }

    /// Compare a guess against the stored secret.
    ///
    /// The secret is re-read from storage on every call. Both sides are
    /// trimmed of surrounding whitespace; the comparison is
    /// case-sensitive. The result is only ever a boolean — the stored
    /// value is never returned and never logged. No throttling is
    /// applied here; deployments wanting lockout must add it in front.
    pub fn verify_secret(&self, guess: &str) -> Outcome {
        let stored = match fs::read_to_string(&self.protected) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Secret file missing: {}", self.protected.display());
                return Outcome::Failed {
                    kind: FailureKind::NotFound,
                    message: "secret file not found".to_string(),
                };
            }
            Err(e) => {
                warn!("Error reading secret file: {}", e);
                return Outcome::failed(&e, "cannot read secret file");
            }
        };

        let matched = stored.trim() == guess.trim();

        let _ = security::append_audit_entry_with_detail(
            &self.state_dir,
            AuditAction::VerifyAttempt,
            &self.protected.to_string_lossy(),
            "gateway:verify",
            Some(&format!("match={}", matched)),
        );

        debug!("Verification attempt: match={}", matched);

        Outcome::ok(Payload::Match(matched))
    }

    /// Record a denial in the audit log and return the `Denied` outcome.
    fn deny(&self, action: AuditAction, path: &str, source: &str) -> Outcome {
        warn!("Denied {} on protected file (path: {})", source, path);
        let _ = security::append_audit_entry(&self.state_dir, action, path, source);
        Outcome::denied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A tempdir with a flag.txt secret in it and a gateway pointed at it.
    fn fixture() -> (TempDir, Gateway) {
        let tmp = tempfile::tempdir().unwrap();
        let flag = tmp.path().join("flag.txt");
        fs::write(&flag, "CTF{top-secret}\n").unwrap();
        let state_dir = tmp.path().join("state");
        fs::create_dir_all(&state_dir).unwrap();
        let gateway = Gateway::new(flag, state_dir);
        (tmp, gateway)
    }

    fn listing(outcome: Outcome) -> Vec<String> {
        match outcome {
            Outcome::Ok {
                payload: Payload::Listing(names),
            } => names,
            other => panic!("expected listing, got {:?}", other),
        }
    }

    fn content(outcome: Outcome) -> String {
        match outcome {
            Outcome::Ok {
                payload: Payload::Content(text),
            } => text,
            other => panic!("expected content, got {:?}", other),
        }
    }

    fn matched(outcome: Outcome) -> bool {
        match outcome {
            Outcome::Ok {
                payload: Payload::Match(m),
            } => m,
            other => panic!("expected match result, got {:?}", other),
        }
    }

    #[test]
    fn listing_omits_protected_file() {
        let (tmp, gateway) = fixture();
        fs::write(tmp.path().join("notes.txt"), "hi").unwrap();
        fs::write(tmp.path().join("other.md"), "x").unwrap();

        let names = listing(gateway.list_directory(tmp.path().to_str().unwrap()));
        assert!(names.contains(&"notes.txt".to_string()));
        assert!(names.contains(&"other.md".to_string()));
        assert!(!names.iter().any(|n| n.to_lowercase() == "flag.txt"));
    }

    #[test]
    fn listing_omits_case_variants_of_protected_name() {
        let (tmp, gateway) = fixture();
        // Aliased case variant alongside the real file
        fs::write(tmp.path().join("FLAG.TXT"), "decoy").unwrap();
        fs::write(tmp.path().join("keep.txt"), "x").unwrap();

        let names = listing(gateway.list_directory(tmp.path().to_str().unwrap()));
        assert!(!names.iter().any(|n| n.to_lowercase() == "flag.txt"));
        assert!(names.contains(&"keep.txt".to_string()));
    }

    #[test]
    fn listing_missing_directory_fails_not_found() {
        let (tmp, gateway) = fixture();
        let missing = tmp.path().join("nope");
        match gateway.list_directory(missing.to_str().unwrap()) {
            Outcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::NotFound),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn listing_file_fails_not_a_directory() {
        let (tmp, gateway) = fixture();
        let file = tmp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        match gateway.list_directory(file.to_str().unwrap()) {
            Outcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::NotADirectory),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn read_protected_denied_for_all_case_variants() {
        let (tmp, gateway) = fixture();
        for name in ["flag.txt", "FLAG.TXT", "Flag.Txt"] {
            let path = tmp.path().join(name);
            let outcome = gateway.read_file(path.to_str().unwrap());
            assert!(outcome.is_denied(), "{} should be denied", name);
        }
    }

    #[cfg(unix)]
    #[test]
    fn read_through_symlink_to_protected_denied() {
        let (tmp, gateway) = fixture();
        let link = tmp.path().join("innocent.txt");
        std::os::unix::fs::symlink(tmp.path().join("flag.txt"), &link).unwrap();

        let outcome = gateway.read_file(link.to_str().unwrap());
        assert!(outcome.is_denied(), "symlink indirection must be denied");
    }

    #[cfg(unix)]
    #[test]
    fn read_dangling_symlink_fails_not_found() {
        let (tmp, gateway) = fixture();
        let link = tmp.path().join("dangling.txt");
        std::os::unix::fs::symlink(tmp.path().join("gone.txt"), &link).unwrap();

        match gateway.read_file(link.to_str().unwrap()) {
            Outcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::NotFound),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn write_and_delete_protected_denied_and_content_unchanged() {
        let (tmp, gateway) = fixture();
        let flag = tmp.path().join("flag.txt");

        let outcome = gateway.write_file(flag.to_str().unwrap(), "overwritten");
        assert!(outcome.is_denied());

        let outcome = gateway.delete_file(flag.to_str().unwrap());
        assert!(outcome.is_denied());

        // On-disk content provably unchanged
        assert_eq!(fs::read_to_string(&flag).unwrap(), "CTF{top-secret}\n");
    }

    #[test]
    fn write_read_roundtrip() {
        let (tmp, gateway) = fixture();
        let path = tmp.path().join("notes.txt");
        let path = path.to_str().unwrap();

        assert!(gateway.write_file(path, "hello world").is_ok());
        assert_eq!(content(gateway.read_file(path)), "hello world");
    }

    #[test]
    fn write_under_missing_parent_fails() {
        let (tmp, gateway) = fixture();
        let path = tmp.path().join("no-such-dir").join("file.txt");
        match gateway.write_file(path.to_str().unwrap(), "x") {
            Outcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::NotFound),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn mkdir_is_idempotent_and_creates_intermediates() {
        let (tmp, gateway) = fixture();
        let nested = tmp.path().join("a").join("b").join("c");
        let nested = nested.to_str().unwrap();

        assert!(gateway.create_directory(nested).is_ok());
        assert!(gateway.create_directory(nested).is_ok());
        assert!(tmp.path().join("a/b/c").is_dir());
    }

    #[test]
    fn delete_missing_file_fails_not_found() {
        let (tmp, gateway) = fixture();
        let path = tmp.path().join("gone.txt");
        match gateway.delete_file(path.to_str().unwrap()) {
            Outcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::NotFound),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn verify_trims_both_sides_and_is_case_sensitive() {
        let (_tmp, gateway) = fixture();

        assert!(matched(gateway.verify_secret("CTF{top-secret}")));
        assert!(matched(gateway.verify_secret("  CTF{top-secret}\n")));
        assert!(!matched(gateway.verify_secret("ctf{top-secret}")));
        assert!(!matched(gateway.verify_secret("WRONGGUESS")));
    }

    #[test]
    fn verify_without_secret_file_fails_not_denied() {
        let tmp = tempfile::tempdir().unwrap();
        let gateway = Gateway::new(tmp.path().join("flag.txt"), tmp.path().to_path_buf());

        match gateway.verify_secret("anything") {
            Outcome::Failed { kind, message } => {
                assert_eq!(kind, FailureKind::NotFound);
                assert_eq!(message, "secret file not found");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn verify_is_not_throttled() {
        let (_tmp, gateway) = fixture();
        // Repeated wrong guesses keep getting answered; there is no
        // internal lockout.
        for _ in 0..50 {
            assert!(!matched(gateway.verify_secret("WRONG")));
        }
        assert!(matched(gateway.verify_secret("CTF{top-secret}")));
    }

    #[test]
    fn verify_never_discloses_secret_in_audit_log() {
        let (tmp, gateway) = fixture();
        let _ = gateway.verify_secret("WRONGGUESS");
        let _ = gateway.verify_secret("CTF{top-secret}");

        let log_path = tmp.path().join("state").join("filegate.audit.jsonl");
        let log = fs::read_to_string(log_path).unwrap();
        assert!(!log.contains("top-secret"), "audit log leaked the secret");
        assert!(!log.contains("WRONGGUESS"), "audit log recorded a guess");
    }

    #[test]
    fn denials_are_audited() {
        let (tmp, gateway) = fixture();
        let flag = tmp.path().join("flag.txt");
        let _ = gateway.read_file(flag.to_str().unwrap());
        let _ = gateway.write_file(flag.to_str().unwrap(), "x");

        let entries = security::read_audit_log(&tmp.path().join("state")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AuditAction::ReadDenied);
        assert_eq!(entries[1].action, AuditAction::WriteDenied);
    }

    #[test]
    fn end_to_end_scenario() {
        let (tmp, gateway) = fixture();
        let notes = tmp.path().join("notes.txt");
        let notes = notes.to_str().unwrap();

        assert!(gateway.write_file(notes, "hi").is_ok());
        assert_eq!(content(gateway.read_file(notes)), "hi");

        let names = listing(gateway.list_directory(tmp.path().to_str().unwrap()));
        assert!(names.contains(&"notes.txt".to_string()));
        assert!(!names.iter().any(|n| n.to_lowercase() == "flag.txt"));

        assert!(!matched(gateway.verify_secret("WRONGGUESS")));

        assert!(gateway.delete_file(notes).is_ok());
        match gateway.read_file(notes) {
            Outcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::NotFound),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn outcome_serializes_tagged() {
        let outcome = Outcome::Ok {
            payload: Payload::Match(false),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(json, r#"{"status":"ok","payload":{"match":false}}"#);

        let denied = Outcome::denied();
        let json = serde_json::to_string(&denied).unwrap();
        assert!(json.contains(r#""status":"denied""#));
    }
}
