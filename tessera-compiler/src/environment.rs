//! The static compilation environment
//!
//! A [`CompilationEnvironment`] is built once per template and shared by
//! every compilation against it: script sources, variables and their
//! owning entities, the opcode map of the target virtual machine, the
//! operation dispatch table, and optional capability handles. It is
//! never mutated during compilation.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tessera_crypto::capability::{Ripemd160, Secp256k1, Sha1, Sha256, Sha512};
use tessera_template::{AuthenticationTemplate, Variable};

use crate::compiler::ScriptCompiler;
use crate::operations::OperationsTable;

/// Opaque handle to an authentication virtual machine.
///
/// The resolver never calls into it; it exists so that the external
/// script-reduction backend can be handed a machine through the same
/// environment, and so operations can declare that one must be present.
pub type VmHandle = Arc<dyn Any + Send + Sync>;

/// Factory producing an initial program state from assembled
/// instructions. Opaque to the resolver, like [`VmHandle`].
pub type CreateStateFn = fn(Vec<u8>) -> Box<dyn Any + Send>;

pub struct CompilationEnvironment {
    /// Script sources, by script id.
    pub scripts: HashMap<String, String>,
    /// Variables, by variable id. Each id belongs to exactly one entity;
    /// templates with duplicate ids are assumed rejected upstream.
    pub variables: HashMap<String, Variable>,
    /// Owning entity id, by variable id.
    pub entity_ownership: HashMap<String, String>,
    /// Opcode name → byte, for the target virtual machine.
    pub opcodes: HashMap<String, u8>,
    /// The operation dispatch table.
    pub operations: &'static OperationsTable,

    pub sha1: Option<Arc<dyn Sha1>>,
    pub sha256: Option<Arc<dyn Sha256>>,
    pub sha512: Option<Arc<dyn Sha512>>,
    pub ripemd160: Option<Arc<dyn Ripemd160>>,
    pub secp256k1: Option<Arc<dyn Secp256k1>>,
    pub vm: Option<VmHandle>,
    pub create_state: Option<CreateStateFn>,

    /// The external tokenizer/parser/emitter; required for script
    /// inlining and data signatures.
    pub script_compiler: Option<Arc<dyn ScriptCompiler>>,
}

impl CompilationEnvironment {
    /// An empty environment dispatching through `operations`.
    pub fn new(operations: &'static OperationsTable) -> Self {
        Self {
            operations,
            scripts: Default::default(),
            variables: Default::default(),
            entity_ownership: Default::default(),
            opcodes: Default::default(),
            sha1: Default::default(),
            sha256: Default::default(),
            sha512: Default::default(),
            ripemd160: Default::default(),
            secp256k1: Default::default(),
            vm: Default::default(),
            create_state: Default::default(),
            script_compiler: Default::default(),
        }
    }

    /// Flatten a template into an environment: scripts by id, and each
    /// entity's variables merged into the variable and ownership maps.
    /// When two entities declare the same variable id the last write
    /// wins.
    pub fn from_template(
        template: &AuthenticationTemplate,
        operations: &'static OperationsTable,
    ) -> Self {
        let mut environment = Self::new(operations);
        for (id, script) in &template.scripts {
            environment.scripts.insert(id.clone(), script.script.clone());
        }
        for (entity_id, entity) in &template.entities {
            for (variable_id, variable) in &entity.variables {
                environment
                    .variables
                    .insert(variable_id.clone(), variable.clone());
                environment
                    .entity_ownership
                    .insert(variable_id.clone(), entity_id.clone());
            }
        }
        environment
    }

    pub fn script(mut self, id: impl Into<String>, source: impl Into<String>) -> Self {
        self.scripts.insert(id.into(), source.into());
        self
    }

    pub fn variable(
        mut self,
        id: impl Into<String>,
        entity: impl Into<String>,
        variable: Variable,
    ) -> Self {
        let id = id.into();
        self.entity_ownership.insert(id.clone(), entity.into());
        self.variables.insert(id, variable);
        self
    }

    pub fn opcodes(mut self, opcodes: HashMap<String, u8>) -> Self {
        self.opcodes = opcodes;
        self
    }

    pub fn sha1(mut self, sha1: Arc<dyn Sha1>) -> Self {
        self.sha1 = Some(sha1);
        self
    }

    pub fn sha256(mut self, sha256: Arc<dyn Sha256>) -> Self {
        self.sha256 = Some(sha256);
        self
    }

    pub fn sha512(mut self, sha512: Arc<dyn Sha512>) -> Self {
        self.sha512 = Some(sha512);
        self
    }

    pub fn ripemd160(mut self, ripemd160: Arc<dyn Ripemd160>) -> Self {
        self.ripemd160 = Some(ripemd160);
        self
    }

    pub fn secp256k1(mut self, secp256k1: Arc<dyn Secp256k1>) -> Self {
        self.secp256k1 = Some(secp256k1);
        self
    }

    pub fn vm(mut self, vm: VmHandle) -> Self {
        self.vm = Some(vm);
        self
    }

    pub fn create_state(mut self, create_state: CreateStateFn) -> Self {
        self.create_state = Some(create_state);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bch::BCH_OPERATIONS;
    use tessera_template::TemplateEntity;

    fn address_data_variable() -> Variable {
        Variable::AddressData {
            name: None,
            description: None,
        }
    }

    #[test]
    fn flattens_entities_into_ownership() {
        let mut template = AuthenticationTemplate::default();
        template.scripts.insert(
            "lock".to_string(),
            tessera_template::TemplateScript {
                script: "OP_1".to_string(),
                ..Default::default()
            },
        );
        let mut signer = TemplateEntity::default();
        signer
            .variables
            .insert("nonce".to_string(), address_data_variable());
        template.entities.insert("signer".to_string(), signer);

        let environment = CompilationEnvironment::from_template(&template, &BCH_OPERATIONS);
        assert_eq!(environment.scripts["lock"], "OP_1");
        assert_eq!(environment.entity_ownership["nonce"], "signer");
        assert!(environment.variables.contains_key("nonce"));
    }

    #[test]
    fn duplicate_variable_ids_keep_a_single_owner() {
        let mut template = AuthenticationTemplate::default();
        for entity_id in ["a", "b"] {
            let mut entity = TemplateEntity::default();
            entity
                .variables
                .insert("shared".to_string(), address_data_variable());
            template.entities.insert(entity_id.to_string(), entity);
        }

        let environment = CompilationEnvironment::from_template(&template, &BCH_OPERATIONS);
        assert_eq!(environment.variables.len(), 1);
        let owner = &environment.entity_ownership["shared"];
        assert!(owner == "a" || owner == "b");
    }
}
