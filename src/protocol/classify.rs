//! Record classification
//!
//! A record's kind is decided entirely by its first field: an exact
//! (case-insensitive, trimmed) match against one of the reserved tokens
//! selects that kind, a blank first field marks the record as blank, and
//! anything else falls back to the supplied default kind with a
//! missing-label flag so the engine can synthesize the token.

use crate::config::ProtocolConfig;

/// The classified category of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// A row of measurement values
    Data,
    /// A row of column labels
    Label,
    /// An informational message (reserved, currently ignored)
    Message,
    /// Directive: reset the elapsed timer reference
    ResetTimer,
    /// Directive: reset the current output page
    ClearData,
    /// Empty record; observed when the read times out or the stream ends
    Blank,
}

impl RowKind {
    /// The wire token for this kind, as configured for the run.
    /// Blank records have no token.
    pub fn token<'a>(&self, cfg: &'a ProtocolConfig) -> &'a str {
        match self {
            RowKind::Data => &cfg.data_token,
            RowKind::Label => &cfg.label_token,
            RowKind::Message => &cfg.message_token,
            RowKind::ResetTimer => &cfg.reset_timer_token,
            RowKind::ClearData => &cfg.clear_data_token,
            RowKind::Blank => "",
        }
    }

    /// Directives mutate engine state instead of producing output rows
    pub fn is_directive(&self) -> bool {
        matches!(self, RowKind::ResetTimer | RowKind::ClearData)
    }
}

/// Result of classifying one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    /// The record's kind
    pub kind: RowKind,
    /// Number of delimiter-separated fields in the record
    pub field_count: usize,
    /// True when the first field was not a reserved token and the default
    /// kind was assumed; the engine must prepend the kind token before
    /// writing or graphing the record
    pub missing_label: bool,
}

/// Classify a record by its first field.
///
/// Total over any field list: never panics, always returns a kind from the
/// closed [`RowKind`] enumeration, and has no side effects.
pub fn classify(fields: &[String], default_kind: RowKind, cfg: &ProtocolConfig) -> Classified {
    let field_count = fields.len();

    let Some(first) = fields.first() else {
        return Classified {
            kind: RowKind::Blank,
            field_count,
            missing_label: false,
        };
    };

    let first = first.trim();
    if first.is_empty() {
        return Classified {
            kind: RowKind::Blank,
            field_count,
            missing_label: false,
        };
    }

    for kind in [
        RowKind::Data,
        RowKind::Label,
        RowKind::Message,
        RowKind::ResetTimer,
        RowKind::ClearData,
    ] {
        if first.eq_ignore_ascii_case(kind.token(cfg)) {
            return Classified {
                kind,
                field_count,
                missing_label: false,
            };
        }
    }

    Classified {
        kind: default_kind,
        field_count,
        missing_label: true,
    }
}
