// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export manifests: a module's own statement of the signatures it exports.
//
// C symbols carry no type information, so a module that wants its exports
// checked publishes `nativebridge_manifest`, a zero-argument function that
// returns a static string with one declaration per line.

use std::collections::BTreeMap;

use crate::error::{BridgeError, Result};
use crate::signature::{Declaration, Signature};

/// Symbol a module exports to publish its manifest.
pub const MANIFEST_SYMBOL: &str = "nativebridge_manifest";

/// Parsed export manifest, keyed by symbol name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<String, Signature>,
}

impl Manifest {
    /// Parse manifest text. Blank lines and `#` comments are ignored; a
    /// symbol declared twice is an error.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let decl = Declaration::parse(line).map_err(|e| {
                BridgeError::InvalidSignature(format!("manifest line {}: {e}", lineno + 1))
            })?;
            if entries.contains_key(&decl.name) {
                return Err(BridgeError::InvalidSignature(format!(
                    "manifest line {}: `{}` declared twice",
                    lineno + 1,
                    decl.name
                )));
            }
            entries.insert(decl.name, decl.signature);
        }
        Ok(Self { entries })
    }

    pub fn lookup(&self, symbol: &str) -> Option<&Signature> {
        self.entries.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declarations in symbol order.
    pub fn declarations(&self) -> impl Iterator<Item = Declaration> + '_ {
        self.entries.iter().map(|(name, signature)| Declaration {
            name: name.clone(),
            signature: signature.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    #[test]
    fn parses_lines_and_skips_comments() {
        let manifest = Manifest::parse(
            "# native-lib exports\n\
             text string_from_native()\n\
             \n\
             void nativebridge_free_text(handle)  # release\n",
        )
        .unwrap();
        assert_eq!(manifest.len(), 2);
        let sig = manifest.lookup("string_from_native").unwrap();
        assert_eq!(sig.ret, ValueType::Text);
        assert!(sig.params.is_empty());
        assert!(manifest.lookup("missing").is_none());
    }

    #[test]
    fn reports_the_bad_line() {
        let err = Manifest::parse("text ok()\nnonsense here\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn rejects_duplicates() {
        let err = Manifest::parse("text f()\ni32 f(i32)\n").unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn empty_manifest() {
        let manifest = Manifest::parse("\n# nothing\n").unwrap();
        assert!(manifest.is_empty());
        assert_eq!(manifest.declarations().count(), 0);
    }
}
