//! Security module: the append-only audit trail of policy denials.

mod audit;

pub use audit::{
    AuditAction, AuditEntry, append_audit_entry, append_audit_entry_with_detail, audit_file_path,
    read_audit_log, verify_audit_chain,
};
