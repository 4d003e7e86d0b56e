//! Data model for authentication templates
//!
//! An authentication template is a declarative JSON document describing
//! how to lock and unlock coins: named entities owning typed variables,
//! plus named script fragments in the template mini-language. This crate
//! only models the document; compilation lives in `tessera-compiler`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A complete authentication template document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationTemplate {
    /// Schema reference carried by published template files.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Principals participating in the template, by entity id.
    pub entities: HashMap<String, TemplateEntity>,

    /// Script fragments, by script id.
    pub scripts: HashMap<String, TemplateScript>,

    /// Virtual-machine versions the template claims support for.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported: Vec<String>,

    /// Template format version.
    #[serde(default)]
    pub version: u32,
}

/// A named principal owning a set of variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateEntity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Script ids this entity must be able to compile, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts: Option<Vec<String>>,

    /// Variables owned by this entity, by variable id.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub variables: HashMap<String, Variable>,
}

/// A named script fragment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateScript {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The script id this script unlocks, for unlocking scripts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocks: Option<String>,

    /// Source text in the template mini-language.
    pub script: String,
}

/// A typed template variable.
///
/// The `type` field of the JSON document selects the variant; the
/// compiler selects operations by the same tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Variable {
    /// A plain ECDSA/Schnorr private-key holder.
    Key {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// A BIP32-style hierarchical key with per-address derivation.
    HdKey {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// Offset added to the address index when instantiating paths.
        #[serde(default, rename = "addressOffset")]
        address_offset: u32,
        /// Private derivation path; defaults to `m/i`.
        #[serde(skip_serializing_if = "Option::is_none", rename = "privateDerivationPath")]
        private_derivation_path: Option<String>,
        /// Public derivation path; defaults to the private path with the
        /// root re-written `m` → `M`.
        #[serde(skip_serializing_if = "Option::is_none", rename = "publicDerivationPath")]
        public_derivation_path: Option<String>,
    },
    /// Per-invocation bytes supplied by the caller at compile time.
    AddressData {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Cross-invocation bytes supplied by the caller at compile time.
    WalletData {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl Variable {
    /// The private derivation path of an `HdKey`, with its default applied.
    pub fn private_derivation_path(&self) -> Option<&str> {
        match self {
            Variable::HdKey {
                private_derivation_path,
                ..
            } => Some(private_derivation_path.as_deref().unwrap_or("m/i")),
            _ => None,
        }
    }

    /// The public derivation path of an `HdKey`, deriving the default from
    /// the private path when unset.
    pub fn public_derivation_path(&self) -> Option<String> {
        match self {
            Variable::HdKey {
                public_derivation_path,
                ..
            } => match public_derivation_path {
                Some(path) => Some(path.clone()),
                None => self
                    .private_derivation_path()
                    .map(|private| format!("M{}", &private[1..])),
            },
            _ => None,
        }
    }

    /// The address offset of an `HdKey` (zero otherwise).
    pub fn address_offset(&self) -> u32 {
        match self {
            Variable::HdKey { address_offset, .. } => *address_offset,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P2PKH: &str = r#"{
        "$schema": "https://example.com/authentication-template.schema.json",
        "name": "Single Signature (P2PKH)",
        "entities": {
            "owner": {
                "name": "Owner",
                "scripts": ["lock", "unlock"],
                "variables": {
                    "key": { "type": "HdKey", "privateDerivationPath": "m/0/i" }
                }
            }
        },
        "scripts": {
            "lock": {
                "script": "OP_DUP OP_HASH160 <$(<key.public_key> OP_HASH160)> OP_EQUALVERIFY OP_CHECKSIG"
            },
            "unlock": {
                "unlocks": "lock",
                "script": "<key.signature.all_outputs> <key.public_key>"
            }
        },
        "supported": ["BCH_2019_05"],
        "version": 0
    }"#;

    #[test]
    fn deserializes_a_template_document() {
        let template: AuthenticationTemplate = serde_json::from_str(P2PKH).unwrap();
        assert_eq!(template.name.as_deref(), Some("Single Signature (P2PKH)"));
        assert_eq!(template.supported, vec!["BCH_2019_05".to_string()]);
        assert_eq!(template.scripts["unlock"].unlocks.as_deref(), Some("lock"));

        let key = &template.entities["owner"].variables["key"];
        assert_eq!(key.private_derivation_path(), Some("m/0/i"));
        assert_eq!(key.public_derivation_path().as_deref(), Some("M/0/i"));
        assert_eq!(key.address_offset(), 0);
    }

    #[test]
    fn variable_tags_round_trip() {
        for (json, path) in [
            (r#"{"type":"Key"}"#, None),
            (r#"{"type":"AddressData"}"#, None),
            (r#"{"type":"WalletData"}"#, None),
            (r#"{"type":"HdKey"}"#, Some("m/i")),
        ] {
            let variable: Variable = serde_json::from_str(json).unwrap();
            assert_eq!(variable.private_derivation_path(), path);
            let encoded = serde_json::to_string(&variable).unwrap();
            let decoded: Variable = serde_json::from_str(&encoded).unwrap();
            assert_eq!(
                decoded.private_derivation_path(),
                variable.private_derivation_path()
            );
        }
    }

    #[test]
    fn unknown_variable_tag_is_rejected() {
        assert!(serde_json::from_str::<Variable>(r#"{"type":"Quantum"}"#).is_err());
    }
}
